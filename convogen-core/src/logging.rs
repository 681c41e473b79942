use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub prompt_id: Option<String>,
    pub scenario_id: Option<String>,
    pub variation: Option<u32>,
    pub output_dir: Option<String>,
    pub message: String,
    pub fields: HashMap<String, String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            ts: Utc::now(),
            level,
            prompt_id: None,
            scenario_id: None,
            variation: None,
            output_dir: None,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_prompt(mut self, prompt_id: impl Into<String>) -> Self {
        self.prompt_id = Some(prompt_id.into());
        self
    }

    pub fn with_scenario(mut self, scenario_id: impl Into<String>) -> Self {
        self.scenario_id = Some(scenario_id.into());
        self
    }

    pub fn with_variation(mut self, variation: u32) -> Self {
        self.variation = Some(variation);
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<String>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn with_field(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.fields.insert(k.into(), v.into());
        self
    }
}

pub trait EventLogger: Send + Sync {
    fn log(&self, event: LogEvent);
}

pub type SharedEventLogger = Arc<dyn EventLogger>;

#[derive(Default)]
pub struct NoopEventLogger;

impl EventLogger for NoopEventLogger {
    fn log(&self, _event: LogEvent) {}
}

/// Keeps a bounded ring of recent events in memory and mirrors events that
/// carry an output directory into a per-prompt `<prompt_id>.events.jsonl`
/// file next to the generated dataset.
pub struct BufferedFileEventLogger {
    seq: AtomicU64,
    max_events: usize,
    max_events_per_prompt: usize,
    state: Mutex<BufferedState>,
}

struct BufferedState {
    events: VecDeque<(u64, LogEvent)>,
    prompt_events: HashMap<String, VecDeque<(u64, LogEvent)>>,
}

impl BufferedFileEventLogger {
    pub fn new(max_events: usize, max_events_per_prompt: usize) -> Self {
        Self {
            seq: AtomicU64::new(0),
            max_events: max_events.max(1),
            max_events_per_prompt: max_events_per_prompt.max(1),
            state: Mutex::new(BufferedState {
                events: VecDeque::new(),
                prompt_events: HashMap::new(),
            }),
        }
    }

    pub fn events_since(&self, last_seq: u64) -> (u64, Vec<LogEvent>) {
        let state = self.state.lock().unwrap();
        let mut out = Vec::new();
        let mut new_last = last_seq;
        for (seq, ev) in state.events.iter() {
            if *seq > last_seq {
                out.push(ev.clone());
                new_last = new_last.max(*seq);
            }
        }
        (new_last, out)
    }

    pub fn prompt_events_tail(&self, prompt_id: &str, max: usize) -> Vec<LogEvent> {
        let state = self.state.lock().unwrap();
        let Some(q) = state.prompt_events.get(prompt_id) else {
            return Vec::new();
        };
        q.iter()
            .rev()
            .take(max)
            .cloned()
            .map(|(_, ev)| ev)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    fn event_path(event: &LogEvent) -> Option<PathBuf> {
        let output_dir = event.output_dir.as_ref()?;
        let prompt_id = event.prompt_id.as_ref()?;
        Some(Path::new(output_dir).join(format!("{prompt_id}.events.jsonl")))
    }

    fn write_to_file(event: &LogEvent) {
        let Some(path) = Self::event_path(event) else {
            return;
        };
        let Some(parent) = path.parent() else {
            return;
        };
        if std::fs::create_dir_all(parent).is_err() {
            return;
        }
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        let line = line + "\n";
        let Ok(mut f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
        else {
            return;
        };
        let _ = std::io::Write::write_all(&mut f, line.as_bytes());
    }
}

impl EventLogger for BufferedFileEventLogger {
    fn log(&self, event: LogEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;

        Self::write_to_file(&event);

        let mut state = self.state.lock().unwrap();
        state.events.push_back((seq, event.clone()));
        while state.events.len() > self.max_events {
            state.events.pop_front();
        }

        if let Some(prompt_id) = event.prompt_id.clone() {
            let q = state.prompt_events.entry(prompt_id).or_default();
            q.push_back((seq, event));
            while q.len() > self.max_events_per_prompt {
                q.pop_front();
            }
        }
    }
}

/// Prints events at or above a level to stderr; the CLI's default logger.
pub struct StderrEventLogger {
    min_level: LogLevel,
}

impl StderrEventLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    fn rank(level: LogLevel) -> u8 {
        match level {
            LogLevel::Trace => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
        }
    }
}

impl EventLogger for StderrEventLogger {
    fn log(&self, event: LogEvent) {
        if Self::rank(event.level) < Self::rank(self.min_level) {
            return;
        }
        let mut line = format!("[{:?}] {}", event.level, event.message);
        if let Some(p) = &event.prompt_id {
            line.push_str(&format!(" prompt={p}"));
        }
        if let Some(s) = &event.scenario_id {
            line.push_str(&format!(" scenario={s}"));
        }
        if let Some(v) = event.variation {
            line.push_str(&format!(" variation={v}"));
        }
        for (k, v) in &event.fields {
            line.push_str(&format!(" {k}={v}"));
        }
        eprintln!("{line}");
    }
}
