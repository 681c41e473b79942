use clap::Parser;
use convogen_core::domain::{ExpanderConfig, RunConfig};
use convogen_core::engine::GenerationEngine;
use convogen_core::expander::VariationExpander;
use convogen_core::logging::{LogLevel, SharedEventLogger, StderrEventLogger};
use convogen_core::metrics::{InMemoryMetrics, Metrics};
use convogen_core::provider::ClientConfig;
use convogen_core::providers::create_client;
use convogen_core::scenarios::builtin_scenarios;
use convogen_core::storage::{read_prompts, write_sample_prompts, FilesystemResultWriter};
use convogen_core::validation::{TranscriptValidator, ValidationConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Generate labeled debt-collection phone conversations from JSONL prompts.
#[derive(Parser)]
#[command(name = "convogen", version)]
struct Cli {
    /// Input JSONL file with system prompts
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Output JSONL file for generated conversations
    #[arg(long, short = 'o', required_unless_present = "create_sample")]
    output: Option<PathBuf>,

    /// Number of scenarios to generate (1-100)
    #[arg(long, short = 's', default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=100))]
    scenarios: u16,

    /// Variations per scenario
    #[arg(long, default_value_t = 10)]
    variations: u32,

    /// Generate-validate attempts per variation
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Workers fanning out over independent variations
    #[arg(long, default_value_t = 1)]
    concurrency: u32,

    /// Seed for reproducible variation expansion
    #[arg(long)]
    seed: Option<u64>,

    /// TOML config with provider endpoints and validation knobs
    #[arg(long)]
    config: Option<PathBuf>,

    /// Provider id to use; defaults to the first configured provider, or the
    /// built-in mock when none is configured
    #[arg(long)]
    provider: Option<String>,

    /// Create a sample input file at --input and exit
    #[arg(long)]
    create_sample: bool,

    /// Verbose event output
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[derive(serde::Deserialize, Default)]
struct GlobalConfig {
    providers: Option<ProvidersConfig>,
    validation: Option<ValidationToml>,
    generation: Option<GenerationToml>,
}

#[derive(serde::Deserialize, Default)]
struct ProvidersConfig {
    openrouter: Option<OpenRouterToml>,
    ollama: Option<OllamaToml>,
    script: Option<ScriptToml>,
}

#[derive(serde::Deserialize)]
struct OpenRouterToml {
    base_url: String,
    api_key_env: String,
    model: String,
}

#[derive(serde::Deserialize)]
struct OllamaToml {
    base_url: String,
    model: String,
}

#[derive(serde::Deserialize)]
struct ScriptToml {
    command: String,
    args: Option<Vec<String>>,
    timeout_ms: Option<u64>,
}

#[derive(serde::Deserialize, Default)]
struct ValidationToml {
    quality_threshold: Option<f32>,
    min_turns: Option<usize>,
    missing_tag_penalty: Option<f32>,
}

#[derive(serde::Deserialize, Default)]
struct GenerationToml {
    timeout_secs: Option<u64>,
    transport_retries: Option<u32>,
}

fn load_global_config(path: Option<&PathBuf>) -> anyhow::Result<GlobalConfig> {
    let Some(path) = path else {
        return Ok(GlobalConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}

fn available_clients(gc: &GlobalConfig) -> Vec<ClientConfig> {
    let mut configs = Vec::new();
    if let Some(providers) = &gc.providers {
        if let Some(or) = &providers.openrouter {
            if let Ok(key) = std::env::var(&or.api_key_env) {
                configs.push(ClientConfig::OpenRouter {
                    id: "openrouter".to_string(),
                    base_url: or.base_url.clone(),
                    api_key: key,
                    model: or.model.clone(),
                });
            } else {
                eprintln!(
                    "warning: skipping openrouter provider, env var {} is not set",
                    or.api_key_env
                );
            }
        }
        if let Some(ol) = &providers.ollama {
            configs.push(ClientConfig::Ollama {
                id: "ollama".to_string(),
                base_url: ol.base_url.clone(),
                model: ol.model.clone(),
            });
        }
        if let Some(sc) = &providers.script {
            configs.push(ClientConfig::Script {
                id: "script".to_string(),
                command: sc.command.clone(),
                args: sc.args.clone().unwrap_or_default(),
                timeout_ms: sc.timeout_ms,
            });
        }
    }
    configs.push(ClientConfig::Mock {
        id: "mock".to_string(),
    });
    configs
}

fn select_client(configs: Vec<ClientConfig>, requested: Option<&str>) -> anyhow::Result<ClientConfig> {
    match requested {
        Some(id) => configs
            .into_iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| anyhow::anyhow!("provider `{id}` is not configured")),
        None => Ok(configs
            .into_iter()
            .next()
            .expect("mock client is always present")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.create_sample {
        write_sample_prompts(&cli.input)?;
        println!("Created sample input file: {}", cli.input.display());
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .ok_or_else(|| anyhow::anyhow!("--output is required"))?;

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let logger: SharedEventLogger = Arc::new(StderrEventLogger::new(level));

    let gc = load_global_config(cli.config.as_ref())?;
    let client_config = select_client(available_clients(&gc), cli.provider.as_deref())?;
    println!(
        "Using provider `{}` (model `{}`)",
        client_config.id(),
        client_config.model()
    );
    let client = Arc::from(create_client(client_config, logger.clone()));

    let prompts = read_prompts(&cli.input, &logger)?;
    println!(
        "Loaded {} prompts from {}",
        prompts.len(),
        cli.input.display()
    );

    let mut validation_config = ValidationConfig::default();
    if let Some(v) = &gc.validation {
        if let Some(t) = v.quality_threshold {
            validation_config.quality_threshold = t;
        }
        if let Some(m) = v.min_turns {
            validation_config.min_turns = m;
        }
        if let Some(p) = v.missing_tag_penalty {
            validation_config.missing_tag_penalty = p;
        }
    }

    let expander = match cli.seed {
        Some(seed) => VariationExpander::with_seed(ExpanderConfig::default(), seed)?,
        None => VariationExpander::new(ExpanderConfig::default())?,
    };

    let generation = gc.generation.unwrap_or_default();
    let run_config = RunConfig {
        num_scenarios: cli.scenarios as usize,
        variations_per_scenario: cli.variations,
        max_attempts: cli.max_attempts,
        max_concurrency: cli.concurrency,
        generation_timeout: Duration::from_secs(generation.timeout_secs.unwrap_or(120)),
        transport_retries: generation.transport_retries.unwrap_or(2),
        events_dir: None,
    };

    let metrics = Arc::new(InMemoryMetrics::new());
    let engine = GenerationEngine {
        client,
        scenarios: builtin_scenarios(),
        expander,
        validator: Arc::new(TranscriptValidator::new(validation_config)),
        writer: Arc::new(FilesystemResultWriter::new(&output)),
        metrics: metrics.clone(),
        logger,
        config: run_config,
    };

    let started = Instant::now();
    let summary = engine.run(&prompts).await?;
    let elapsed = started.elapsed();

    println!("Saved {} conversations to {}", summary.total_records, output.display());

    println!("\n{}", "=".repeat(50));
    println!("PROCESSING STATISTICS");
    println!("{}", "=".repeat(50));
    println!("Total input prompts: {}", summary.prompts_processed);
    println!("Total conversations generated: {}", summary.total_records);
    println!("Successfully validated: {}", summary.accepted);
    println!("Failed validation: {}", summary.exhausted);
    if summary.total_records > 0 {
        println!(
            "Success rate: {:.1}%",
            summary.accepted as f64 / summary.total_records as f64 * 100.0
        );
    }
    println!("Average quality score: {:.2}", summary.average_quality);
    println!("Processing time: {:.1} seconds", elapsed.as_secs_f64());

    let snap = metrics.snapshot();
    println!(
        "metrics: generation_calls={} transport_retries={} validation_pass={} validation_fail={} records_written={}",
        snap.generation_calls,
        snap.transport_retries,
        snap.validation_pass,
        snap.validation_fail,
        snap.records_written
    );

    Ok(())
}
