use crate::domain::{ConfigurationError, PromptRecord, ResultRecord};
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait ResultWriter: Send + Sync {
    async fn persist_record(&self, record: ResultRecord) -> anyhow::Result<()>;
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Appends one serialized record per line. Each record is written and flushed
/// individually, so an interrupted run loses at most the in-flight pair.
pub struct FilesystemResultWriter {
    path: PathBuf,
}

impl FilesystemResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultWriter for FilesystemResultWriter {
    async fn persist_record(&self, record: ResultRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let line = serde_json::to_string(&record)? + "\n";
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(line.as_bytes())?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryResultWriter {
    pub records: Arc<Mutex<Vec<ResultRecord>>>,
}

impl InMemoryResultWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ResultRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultWriter for InMemoryResultWriter {
    async fn persist_record(&self, record: ResultRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Reads `{id, language, system_prompt}` records from a JSONL file. Blank
/// lines, unparseable lines, and records without a usable prompt are logged
/// and skipped; a missing id defaults to the line number.
pub fn read_prompts(
    path: &Path,
    logger: &SharedEventLogger,
) -> Result<Vec<PromptRecord>, ConfigurationError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| ConfigurationError::InputFile {
            path: path.display().to_string(),
            source,
        })?;

    let mut prompts = Vec::new();
    for (line_num, line) in contents.lines().enumerate() {
        let line_num = line_num + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut record: PromptRecord = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                logger.log(
                    LogEvent::new(LogLevel::Warn, "input.line.unparseable")
                        .with_field("line", line_num.to_string())
                        .with_field("error", e.to_string()),
                );
                continue;
            }
        };

        if record.system_prompt.trim().is_empty() {
            logger.log(
                LogEvent::new(LogLevel::Warn, "input.line.empty_prompt")
                    .with_field("line", line_num.to_string()),
            );
            continue;
        }
        if record.id.is_empty() {
            record.id = format!("prompt_{line_num}");
        }
        prompts.push(record);
    }

    if prompts.is_empty() {
        return Err(ConfigurationError::NoPrompts(path.display().to_string()));
    }
    Ok(prompts)
}

const SAMPLE_BASE_PROMPT: &str = "You are Salma, a debt collection agent for a UAE consumer lender. \
You are calling {FirstName} {LastName} about an overdue balance of {amount} that was due on {DueDate}. \
State that the call may be recorded for quality purposes, verify you are speaking with the right person, \
remain professional at all times, and close the call with the appropriate action tag.";

/// Writes a two-line example input file so a new user can run the pipeline
/// end to end immediately.
pub fn write_sample_prompts(path: &Path) -> anyhow::Result<()> {
    let samples = vec![
        serde_json::json!({
            "id": "english_prompt_1",
            "system_prompt": SAMPLE_BASE_PROMPT,
            "language": "english",
            "metadata": {"source": "sample", "version": "1.0"}
        }),
        serde_json::json!({
            "id": "english_prompt_2",
            "system_prompt": SAMPLE_BASE_PROMPT.replace("Salma", "Ahmed"),
            "language": "english",
            "metadata": {"source": "sample", "version": "1.0"}
        }),
    ];

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut f = std::fs::File::create(path)?;
    for sample in samples {
        writeln!(f, "{}", serde_json::to_string(&sample)?)?;
    }
    Ok(())
}
