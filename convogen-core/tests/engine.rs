use async_trait::async_trait;
use chrono::NaiveDate;
use convogen_core::domain::{
    ExpanderConfig, GenerationRequest, PromptRecord, RunConfig, ScenarioDefinition,
};
use convogen_core::engine::GenerationEngine;
use convogen_core::expander::VariationExpander;
use convogen_core::logging::NoopEventLogger;
use convogen_core::metrics::{InMemoryMetrics, Metrics};
use convogen_core::provider::{ClientMetadata, GenerationClient, TransportError};
use convogen_core::scenarios::builtin_scenarios;
use convogen_core::storage::InMemoryResultWriter;
use convogen_core::validation::{TranscriptValidator, ValidationConfig};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays a scripted sequence of outputs, then repeats the fallback.
struct ScriptedClient {
    outputs: Mutex<VecDeque<String>>,
    fallback: String,
    calls: AtomicU32,
}

impl ScriptedClient {
    fn new(outputs: Vec<String>, fallback: String) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: "scripted".to_string(),
            name: "ScriptedClient".to_string(),
            model: "fake-model".to_string(),
        }
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let next = self.outputs.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

struct FailingClient {
    calls: AtomicU32,
}

#[async_trait]
impl GenerationClient for FailingClient {
    fn metadata(&self) -> ClientMetadata {
        ClientMetadata {
            id: "failing".to_string(),
            name: "FailingClient".to_string(),
            model: "fake-model".to_string(),
        }
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, TransportError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Err(TransportError::Transport)
    }
}

fn transcript_json(tags: &str, marker: &str) -> String {
    serde_json::json!([
        {"role": "assistant", "content": format!("Good morning, this call may be recorded for quality purposes. May I please confirm I am speaking about the overdue loan payment? {marker}")},
        {"role": "user", "content": "Yes, speaking. Well, I was actually expecting this call about my account balance."},
        {"role": "assistant", "content": "Thank you. I understand, the amount is past due and I need to verify when you can settle the debt."},
        {"role": "user", "content": "Sure, okay. I can really make the payment this Thursday if that works."},
        {"role": "assistant", "content": format!("Perfect, thank you, I will note that on the account now. {tags}")},
        {"role": "user", "content": "Thank you for being understanding, I appreciate it. Goodbye now."}
    ])
    .to_string()
}

fn scenario_by_id(id: &str) -> ScenarioDefinition {
    builtin_scenarios()
        .into_iter()
        .find(|s| s.id == id)
        .unwrap()
}

fn prompt(id: &str) -> PromptRecord {
    PromptRecord {
        id: id.to_string(),
        system_prompt: "You are Salma, calling {FirstName} about {amount} due on {DueDate}."
            .to_string(),
        language: "english".to_string(),
        metadata: Default::default(),
    }
}

fn build_engine(
    client: Arc<dyn GenerationClient>,
    scenarios: Vec<ScenarioDefinition>,
    variations: u32,
    max_attempts: u32,
) -> (GenerationEngine, Arc<InMemoryResultWriter>, Arc<InMemoryMetrics>) {
    let writer = Arc::new(InMemoryResultWriter::new());
    let metrics = Arc::new(InMemoryMetrics::new());
    let config = RunConfig {
        num_scenarios: scenarios.len(),
        variations_per_scenario: variations,
        max_attempts,
        max_concurrency: 1,
        generation_timeout: Duration::from_secs(5),
        transport_retries: 0,
        events_dir: None,
    };
    let expander_config = ExpanderConfig {
        reference_date: NaiveDate::from_ymd_opt(2025, 8, 7),
        ..ExpanderConfig::default()
    };
    let engine = GenerationEngine {
        client,
        scenarios,
        expander: VariationExpander::with_seed(expander_config, 11).unwrap(),
        validator: Arc::new(TranscriptValidator::new(ValidationConfig::default())),
        writer: writer.clone(),
        metrics: metrics.clone(),
        logger: Arc::new(NoopEventLogger),
        config,
    };
    (engine, writer, metrics)
}

#[tokio::test]
async fn emits_exactly_one_record_per_pair() {
    let client = Arc::new(ScriptedClient::new(
        vec![],
        transcript_json("(function_1)", "steady"),
    ));
    let scenarios = vec![
        scenario_by_id("basic_payment_willing"),
        scenario_by_id("basic_payment_delayed"),
    ];
    let (engine, writer, metrics) = build_engine(client.clone(), scenarios, 3, 3);

    let prompts = vec![prompt("p1"), prompt("p2")];
    let summary = engine.run(&prompts).await.unwrap();

    // 2 prompts x 2 scenarios x 3 variations.
    assert_eq!(summary.total_records, 12);
    assert_eq!(summary.accepted, 12);
    assert_eq!(summary.exhausted, 0);

    let records = writer.records();
    assert_eq!(records.len(), 12);
    let pairs: HashSet<_> = records
        .iter()
        .map(|r| {
            (
                r.metadata.prompt_id.clone(),
                r.scenario_id.clone(),
                r.variation_id,
            )
        })
        .collect();
    assert_eq!(pairs.len(), 12);

    for record in &records {
        assert!(record.validation_passed);
        assert_eq!(record.metadata.attempts_used, 1);
        assert_eq!(record.metadata.model, "fake-model");
        assert!(record.debug_prompt.is_none());
    }

    assert_eq!(client.calls(), 12);
    assert_eq!(metrics.snapshot().generation_calls, 12);
    assert_eq!(metrics.snapshot().records_written, 12);
}

#[tokio::test]
async fn missing_tag_recovers_on_second_attempt() {
    let client = Arc::new(ScriptedClient::new(
        vec![
            transcript_json("", "first attempt"),
            transcript_json("(disconnect)", "second attempt"),
        ],
        transcript_json("", "fallback"),
    ));
    let scenarios = vec![scenario_by_id("basic_payment_refused")];
    let (engine, writer, _metrics) = build_engine(client.clone(), scenarios, 1, 3);

    let summary = engine.run(&[prompt("p1")]).await.unwrap();
    assert_eq!(summary.total_records, 1);
    assert_eq!(summary.accepted, 1);

    let records = writer.records();
    let record = &records[0];
    assert!(record.validation_passed);
    assert_eq!(record.metadata.attempts_used, 2);
    assert!(record
        .special_tags_found
        .iter()
        .any(|t| t.name() == "disconnect"));
    // The retained conversation is attempt 2's, not attempt 1's.
    assert!(record.conversation[0].content.contains("second attempt"));
    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn exhausted_pair_keeps_final_attempt() {
    let client = Arc::new(ScriptedClient::new(
        vec![
            transcript_json("", "attempt one"),
            transcript_json("", "attempt two"),
            transcript_json("", "attempt three"),
        ],
        transcript_json("", "overflow"),
    ));
    let scenarios = vec![scenario_by_id("basic_payment_refused")];
    let (engine, writer, metrics) = build_engine(client.clone(), scenarios, 1, 3);

    let summary = engine.run(&[prompt("p1")]).await.unwrap();
    assert_eq!(summary.total_records, 1);
    assert_eq!(summary.exhausted, 1);

    let records = writer.records();
    let record = &records[0];
    assert!(!record.validation_passed);
    assert_eq!(record.metadata.attempts_used, 3);
    assert!(record.conversation[0].content.contains("attempt three"));
    assert!(record
        .issues
        .iter()
        .any(|i| i.message.contains("missing required tag (disconnect)")));
    // The recorded prompt is the final enhanced one.
    let debug_prompt = record.debug_prompt.as_deref().unwrap();
    assert!(debug_prompt.contains("CRITICAL REQUIREMENTS FOR THIS RETRY"));

    // Never more generation calls than the attempt budget.
    assert_eq!(client.calls(), 3);
    assert_eq!(metrics.snapshot().generation_calls, 3);
}

#[tokio::test]
async fn transport_failure_degrades_to_an_exhausted_record() {
    let client = Arc::new(FailingClient {
        calls: AtomicU32::new(0),
    });
    let scenarios = vec![scenario_by_id("basic_payment_willing")];
    let (engine, writer, _metrics) = build_engine(client.clone(), scenarios, 1, 3);

    let summary = engine.run(&[prompt("p1")]).await.unwrap();
    assert_eq!(summary.total_records, 1);
    assert_eq!(summary.exhausted, 1);

    let records = writer.records();
    let record = &records[0];
    assert!(!record.validation_passed);
    assert!(record.conversation.is_empty());
    assert_eq!(record.metadata.attempts_used, 3);
    assert_eq!(record.issues[0].code, "generation_failed");
    assert_eq!(client.calls.load(Ordering::Relaxed), 3);
}

#[tokio::test]
async fn unparseable_output_counts_as_a_failed_attempt() {
    let client = Arc::new(ScriptedClient::new(
        vec!["I cannot produce a conversation right now.".to_string()],
        transcript_json("(function_1)", "recovered"),
    ));
    let scenarios = vec![scenario_by_id("basic_payment_willing")];
    let (engine, writer, _metrics) = build_engine(client.clone(), scenarios, 1, 3);

    engine.run(&[prompt("p1")]).await.unwrap();
    let records = writer.records();
    let record = &records[0];
    assert!(record.validation_passed);
    assert_eq!(record.metadata.attempts_used, 2);
    assert!(record.conversation[0].content.contains("recovered"));
}

#[tokio::test]
async fn run_writes_per_prompt_event_log_file() {
    let events_dir = std::env::temp_dir().join(format!(
        "convogen-events-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));

    let client = Arc::new(ScriptedClient::new(
        vec![],
        transcript_json("(function_1)", "steady"),
    ));
    let scenarios = vec![scenario_by_id("basic_payment_willing")];
    let (mut engine, _writer, _metrics) = build_engine(client, scenarios, 1, 3);
    engine.config.events_dir = Some(events_dir.to_string_lossy().to_string());
    engine.logger = Arc::new(convogen_core::logging::BufferedFileEventLogger::new(500, 200));

    engine.run(&[prompt("p-log")]).await.unwrap();

    let events_path = events_dir.join("p-log.events.jsonl");
    let contents = std::fs::read_to_string(&events_path).unwrap();
    assert!(contents.contains("\"message\":\"engine.prompt.started\""));
    assert!(contents.contains("\"message\":\"engine.prompt.finished\""));
    assert!(contents.contains("\"message\":\"engine.variation.accepted\""));

    let _ = std::fs::remove_dir_all(events_dir);
}

#[tokio::test]
async fn concurrent_workers_still_emit_one_record_per_pair() {
    let client = Arc::new(ScriptedClient::new(
        vec![],
        transcript_json("(function_1)", "steady"),
    ));
    let scenarios = vec![
        scenario_by_id("basic_payment_willing"),
        scenario_by_id("basic_payment_delayed"),
        scenario_by_id("misc_perfect_resolution"),
    ];
    let (mut engine, writer, _metrics) = build_engine(client, scenarios, 4, 3);
    engine.config.max_concurrency = 4;

    let summary = engine.run(&[prompt("p1")]).await.unwrap();
    assert_eq!(summary.total_records, 12);

    let records = writer.records();
    let pairs: HashSet<_> = records
        .iter()
        .map(|r| (r.scenario_id.clone(), r.variation_id))
        .collect();
    assert_eq!(pairs.len(), 12);
}
