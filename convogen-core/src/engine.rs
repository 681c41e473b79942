use crate::composer;
use crate::domain::{
    PromptRecord, ResultRecord, RunConfig, ScenarioDefinition, Transcript, VariationJob,
};
use crate::expander::VariationExpander;
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use crate::metrics::Metrics;
use crate::provider::{GenerationClient, TransportError};
use crate::queue::{unbounded_queue, JobQueue};
use crate::retry::{AttemptEvent, Phase, RetryController};
use crate::storage::ResultWriter;
use crate::validation::{TranscriptValidator, ValidationOutcome};
use crate::worker::WorkerManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub prompts_processed: usize,
    pub total_records: u64,
    pub accepted: u64,
    pub exhausted: u64,
    pub average_quality: f32,
}

/// Batch driver. For every (prompt, scenario, variation) triple it expands
/// parameters, runs the generate/validate/retry pipeline, and persists exactly
/// one record. Collaborators are trait objects so tests inject fakes.
pub struct GenerationEngine {
    pub client: Arc<dyn GenerationClient>,
    pub scenarios: Vec<ScenarioDefinition>,
    pub expander: VariationExpander,
    pub validator: Arc<TranscriptValidator>,
    pub writer: Arc<dyn ResultWriter>,
    pub metrics: Arc<dyn Metrics>,
    pub logger: SharedEventLogger,
    pub config: RunConfig,
}

impl GenerationEngine {
    fn event(&self, level: LogLevel, message: &str) -> LogEvent {
        annotate(LogEvent::new(level, message), self.config.events_dir.as_deref())
    }

    pub async fn run(&self, prompts: &[PromptRecord]) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut quality_sum = 0.0f64;

        for prompt in prompts {
            self.logger.log(
                self.event(LogLevel::Info, "engine.prompt.started")
                    .with_prompt(prompt.id.clone())
                    .with_field("language", prompt.language.clone()),
            );

            let stats = self.run_prompt(prompt).await?;
            self.metrics.inc_prompt_processed();
            summary.prompts_processed += 1;
            summary.total_records += stats.records;
            summary.accepted += stats.accepted;
            summary.exhausted += stats.exhausted;
            quality_sum += stats.quality_sum;

            self.logger.log(
                self.event(LogLevel::Info, "engine.prompt.finished")
                    .with_prompt(prompt.id.clone())
                    .with_field("records", stats.records.to_string())
                    .with_field("accepted", stats.accepted.to_string())
                    .with_field("exhausted", stats.exhausted.to_string()),
            );
        }

        if summary.total_records > 0 {
            summary.average_quality = (quality_sum / summary.total_records as f64) as f32;
        }
        Ok(summary)
    }

    /// Runs one prompt across the configured scenario prefix. Jobs are
    /// independent, so workers fan out freely; completed records funnel back
    /// through one channel so the writer stays single-threaded and every
    /// record is flushed before the next is handled.
    pub async fn run_prompt(&self, prompt: &PromptRecord) -> anyhow::Result<PromptStats> {
        let scenario_count = self.config.num_scenarios.min(self.scenarios.len());
        let scenarios = &self.scenarios[..scenario_count];
        let prompt = Arc::new(prompt.clone());

        let mut jobs = Vec::new();
        for scenario in scenarios {
            let scenario = Arc::new(scenario.clone());
            for index in 1..=self.config.variations_per_scenario {
                let params = self.expander.expand(&scenario, index)?;
                self.metrics.inc_variation_expanded();
                jobs.push(VariationJob {
                    prompt: prompt.clone(),
                    scenario: scenario.clone(),
                    params,
                });
            }
        }
        let total = jobs.len() as u64;

        let queue: Arc<dyn JobQueue> = Arc::new(unbounded_queue(self.logger.clone()));
        for job in jobs {
            queue.enqueue(job).await?;
        }

        let pipeline = Arc::new(VariationPipeline {
            client: self.client.clone(),
            validator: self.validator.clone(),
            metrics: self.metrics.clone(),
            logger: self.logger.clone(),
            model: self.client.metadata().model,
            config: self.config.clone(),
        });

        let (tx, mut rx) = mpsc::channel::<ResultRecord>(64);
        let mut manager = WorkerManager::new();
        let worker_count = self.config.max_concurrency.max(1) as usize;
        manager
            .start(
                worker_count,
                pipeline,
                queue.clone(),
                tx,
                self.logger.clone(),
            )
            .await;

        let mut stats = PromptStats::default();
        while stats.records < total {
            let Some(record) = rx.recv().await else {
                break;
            };

            let event = if record.validation_passed {
                self.metrics.inc_record_accepted();
                stats.accepted += 1;
                self.event(LogLevel::Info, "engine.variation.accepted")
            } else {
                self.metrics.inc_record_exhausted();
                stats.exhausted += 1;
                self.event(LogLevel::Info, "engine.variation.exhausted")
            };
            self.logger.log(
                event
                    .with_prompt(record.metadata.prompt_id.clone())
                    .with_scenario(record.scenario_id.clone())
                    .with_variation(record.variation_id)
                    .with_field("quality", format!("{:.2}", record.quality_score))
                    .with_field("attempts", record.metadata.attempts_used.to_string()),
            );

            stats.quality_sum += f64::from(record.quality_score);
            self.writer.persist_record(record).await?;
            self.metrics.inc_record_written();
            stats.records += 1;
        }

        manager.stop().await;
        self.writer.flush().await?;

        if stats.records < total {
            anyhow::bail!(
                "writer loop ended early: {} of {} records for prompt {}",
                stats.records,
                total,
                prompt.id
            );
        }
        Ok(stats)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PromptStats {
    pub records: u64,
    pub accepted: u64,
    pub exhausted: u64,
    pub quality_sum: f64,
}

/// Per-variation pipeline shared by all workers. Drives the retry state
/// machine; every event comes from a real call, every transition is pure.
pub struct VariationPipeline {
    pub client: Arc<dyn GenerationClient>,
    pub validator: Arc<TranscriptValidator>,
    pub metrics: Arc<dyn Metrics>,
    pub logger: SharedEventLogger,
    pub model: String,
    pub config: RunConfig,
}

impl VariationPipeline {
    fn event(&self, level: LogLevel, message: &str, job: &VariationJob) -> LogEvent {
        annotate(LogEvent::new(level, message), self.config.events_dir.as_deref())
            .with_prompt(job.prompt.id.clone())
            .with_scenario(job.scenario.id.clone())
            .with_variation(job.params.variation_index)
    }

    /// Never fails: configuration problems are caught before jobs are built,
    /// and every other failure degrades into an exhausted record.
    pub async fn process(&self, job: VariationJob) -> ResultRecord {
        let scenario = job.scenario.as_ref();
        let params = &job.params;

        let mut ctl = RetryController::new(self.config.max_attempts).step(AttemptEvent::Start);
        let mut last_prompt = String::new();

        while !ctl.is_terminal() {
            match ctl.phase() {
                Phase::Generating => {
                    let request = composer::compose(
                        &job.prompt.system_prompt,
                        scenario,
                        params,
                        ctl.feedback(),
                        ctl.attempt(),
                    );
                    last_prompt = request.prompt.user.clone();
                    self.metrics.inc_generation_call();

                    ctl = match self.generate_with_transport_retry(&request).await {
                        Ok(raw) => match Transcript::parse(&raw) {
                            Some(transcript) => ctl.step(AttemptEvent::Generated(transcript)),
                            None => {
                                self.logger.log(
                                    self.event(
                                        LogLevel::Warn,
                                        "engine.generation.unparseable",
                                        &job,
                                    )
                                    .with_field("attempt", ctl.attempt().to_string()),
                                );
                                ctl.step(AttemptEvent::GenerationFailed(
                                    "model output did not contain a JSON conversation".to_string(),
                                ))
                            }
                        },
                        Err(e) => {
                            self.logger.log(
                                self.event(LogLevel::Warn, "engine.generation.failed", &job)
                                    .with_field("attempt", ctl.attempt().to_string())
                                    .with_field("error", e.to_string()),
                            );
                            ctl.step(AttemptEvent::GenerationFailed(e.to_string()))
                        }
                    };
                }
                Phase::Validating => {
                    let outcome = match ctl.last_transcript() {
                        Some(transcript) => self.validator.validate(transcript, scenario),
                        None => ValidationOutcome::generation_failure("missing transcript"),
                    };
                    if outcome.passed {
                        self.metrics.record_validation_pass();
                    } else {
                        self.metrics.record_validation_fail();
                    }
                    ctl = ctl.step(AttemptEvent::Validated(outcome));
                }
                Phase::Retrying => {
                    self.logger.log(
                        self.event(LogLevel::Debug, "engine.variation.retrying", &job)
                            .with_field("next_attempt", (ctl.attempt() + 1).to_string()),
                    );
                    ctl = ctl.step(AttemptEvent::Retry);
                }
                _ => break,
            }
        }

        let outcome = ctl
            .last_outcome()
            .cloned()
            .unwrap_or_else(|| ValidationOutcome::generation_failure("no attempts executed"));

        ResultRecord::build(
            scenario,
            params,
            &job.prompt,
            ctl.last_transcript(),
            &outcome,
            ctl.attempts_used(),
            &self.model,
            &last_prompt,
        )
    }

    /// Bounded timeout plus a small bounded number of transport retries,
    /// distinct from the validation-driven attempt budget.
    async fn generate_with_transport_retry(
        &self,
        request: &crate::domain::GenerationRequest,
    ) -> Result<String, TransportError> {
        let mut last_err = TransportError::Unavailable;
        for try_no in 0..=self.config.transport_retries {
            if try_no > 0 {
                self.metrics.inc_transport_retry();
            }
            match tokio::time::timeout(
                self.config.generation_timeout,
                self.client.generate(request),
            )
            .await
            {
                Ok(Ok(raw)) => return Ok(raw),
                Ok(Err(e)) => last_err = e,
                Err(_) => last_err = TransportError::Timeout,
            }
        }
        Err(last_err)
    }
}

fn annotate(event: LogEvent, events_dir: Option<&str>) -> LogEvent {
    match events_dir {
        Some(dir) => event.with_output_dir(dir.to_string()),
        None => event,
    }
}
