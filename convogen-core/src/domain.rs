use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub type ScenarioId = String;
pub type PromptId = String;

/// A literal marker token the generated transcript must contain, stored as the
/// bare lowercase name ("disconnect") and rendered as "(disconnect)".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(name: impl AsRef<str>) -> Self {
        let bare = name
            .as_ref()
            .trim()
            .trim_matches(|c| c == '(' || c == ')' || c == '<' || c == '>')
            .to_lowercase();
        Self(bare)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn token(&self) -> String {
        format!("({})", self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CustomerBehavior {
    Cooperative,
    Uncooperative,
    Negotiating,
    Confused,
    Disputing,
    Hardship,
    Hostile,
    WrongPerson,
    Vulnerable,
    Legal,
    Technical,
    Distracted,
}

impl CustomerBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cooperative => "cooperative",
            Self::Uncooperative => "uncooperative",
            Self::Negotiating => "negotiating",
            Self::Confused => "confused",
            Self::Disputing => "disputing",
            Self::Hardship => "hardship",
            Self::Hostile => "hostile",
            Self::WrongPerson => "wrong_person",
            Self::Vulnerable => "vulnerable",
            Self::Legal => "legal",
            Self::Technical => "technical",
            Self::Distracted => "distracted",
        }
    }
}

impl fmt::Display for CustomerBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    Positive,
    Negative,
    Neutral,
    Dispute,
    Transfer,
    Disconnect,
    Legal,
}

impl OutcomeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Dispute => "dispute",
            Self::Transfer => "transfer",
            Self::Disconnect => "disconnect",
            Self::Legal => "legal",
        }
    }
}

impl fmt::Display for OutcomeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub id: ScenarioId,
    pub name: String,
    pub description: String,
    pub customer_behavior: CustomerBehavior,
    pub outcome: OutcomeType,
    pub required_tags: Vec<Tag>,
}

impl ScenarioDefinition {
    pub fn ensure_valid(&self) -> Result<(), ConfigurationError> {
        if self.id.trim().is_empty() {
            return Err(ConfigurationError::MissingScenarioField {
                scenario: "<unnamed>".to_string(),
                field: "id",
            });
        }
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::MissingScenarioField {
                scenario: self.id.clone(),
                field: "name",
            });
        }
        if self.required_tags.is_empty() {
            return Err(ConfigurationError::MissingScenarioField {
                scenario: self.id.clone(),
                field: "required_tags",
            });
        }
        Ok(())
    }
}

/// One randomized parameterization of a scenario. Immutable once created; has
/// no identity beyond its index.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VariationParameters {
    pub variation_index: u32,
    pub customer_name: String,
    pub agent_name: String,
    pub debt_amount: f64,
    pub due_date: NaiveDate,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_ORDINALS: [&str; 31] = [
    "first",
    "second",
    "third",
    "fourth",
    "fifth",
    "sixth",
    "seventh",
    "eighth",
    "ninth",
    "tenth",
    "eleventh",
    "twelfth",
    "thirteenth",
    "fourteenth",
    "fifteenth",
    "sixteenth",
    "seventeenth",
    "eighteenth",
    "nineteenth",
    "twentieth",
    "twenty-first",
    "twenty-second",
    "twenty-third",
    "twenty-fourth",
    "twenty-fifth",
    "twenty-sixth",
    "twenty-seventh",
    "twenty-eighth",
    "twenty-ninth",
    "thirtieth",
    "thirty-first",
];

impl VariationParameters {
    /// Renders the due date the way it would be spoken on a call, e.g.
    /// "August first".
    pub fn due_date_phrase(&self) -> String {
        use chrono::Datelike;
        let month = MONTH_NAMES[self.due_date.month0() as usize];
        let day = DAY_ORDINALS[self.due_date.day0() as usize];
        format!("{month} {day}")
    }

    pub fn amount_phrase(&self) -> String {
        format!("{:.0} dirhams", self.debt_amount)
    }

    pub fn first_name(&self) -> &str {
        self.customer_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.customer_name)
    }

    pub fn last_name(&self) -> &str {
        if self.customer_name.contains(' ') {
            self.customer_name
                .split_whitespace()
                .last()
                .unwrap_or_default()
        } else {
            ""
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Ordered dialogue produced by the generation service. Treated as opaque text
/// for tag scanning and as a turn sequence for structural checks.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Transcript {
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    /// Extracts the outermost JSON array from raw model output and parses it
    /// as a turn list. Models routinely wrap the array in prose or fencing.
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find('[')?;
        let end = raw.rfind(']')?;
        if end <= start {
            return None;
        }
        let turns: Vec<Turn> = serde_json::from_str(&raw[start..=end]).ok()?;
        Some(Self { turns })
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn full_text_lower(&self) -> String {
        self.turns
            .iter()
            .map(|t| t.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptSpec {
    pub system: Option<String>,
    pub user: String,
}

/// The composed request for one generation attempt. Built fresh per attempt,
/// never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub scenario_id: ScenarioId,
    pub variation_index: u32,
    pub attempt: u32,
    pub prompt: PromptSpec,
}

fn default_language() -> String {
    "english".to_string()
}

/// One input record: a base instruction prompt plus passthrough metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptRecord {
    #[serde(default)]
    pub id: PromptId,
    #[serde(alias = "prompt")]
    pub system_prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub attempts_used: u32,
    pub prompt_id: PromptId,
    pub language: String,
}

/// The unit persisted to output; one per (scenario, variation) pair whether or
/// not validation ever passed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultRecord {
    pub scenario_id: ScenarioId,
    pub variation_id: u32,
    pub conversation: Vec<Turn>,
    pub validation_passed: bool,
    pub special_tags_found: Vec<Tag>,
    pub quality_score: f32,
    pub issues: Vec<crate::validation::Issue>,
    pub metadata: RecordMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_prompt: Option<String>,
}

impl ResultRecord {
    /// Pure assembly. Validation failure is data, not an error; the last
    /// attempt's transcript and outcome land in the record either way.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        scenario: &ScenarioDefinition,
        variation: &VariationParameters,
        prompt: &PromptRecord,
        transcript: Option<&Transcript>,
        outcome: &crate::validation::ValidationOutcome,
        attempts_used: u32,
        model: &str,
        composed_prompt: &str,
    ) -> Self {
        Self {
            scenario_id: scenario.id.clone(),
            variation_id: variation.variation_index,
            conversation: transcript.map(|t| t.turns.clone()).unwrap_or_default(),
            validation_passed: outcome.passed,
            special_tags_found: outcome.tags_found.clone(),
            quality_score: outcome.quality_score,
            issues: outcome.issues.clone(),
            metadata: RecordMetadata {
                generated_at: Utc::now(),
                model: model.to_string(),
                attempts_used,
                prompt_id: prompt.id.clone(),
                language: prompt.language.clone(),
            },
            debug_prompt: if outcome.passed {
                None
            } else {
                Some(composed_prompt.to_string())
            },
        }
    }
}

/// Name pools and numeric/date ranges the expander draws from.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpanderConfig {
    pub agent_names: Vec<String>,
    pub customer_names: Vec<String>,
    /// Inclusive bounds, in dirhams.
    pub amount_range: (f64, f64),
    /// How many days in the past the due date may fall, inclusive bounds.
    pub due_days_past: (i64, i64),
    /// Anchor for due-date generation; `None` means today.
    pub reference_date: Option<NaiveDate>,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        let agent_names = [
            "Salma", "Ahmed", "Fatima", "Omar", "Layla", "Hassan", "Nour", "Khalid", "Amira",
            "Youssef", "Zara", "Ali", "Maryam", "Saeed", "Lina", "Tariq",
        ];
        let customer_names = [
            "Khalili",
            "Al-Rashid",
            "Mansour",
            "Al-Zahra",
            "Qasemi",
            "Al-Mahmoud",
            "Abdulla",
            "Al-Farisi",
            "Hamdan",
            "Al-Mansoori",
            "Sharif",
            "Al-Blooshi",
            "Nasser",
            "Al-Shamsi",
            "Rashed",
            "Al-Kaabi",
            "Salem",
            "Al-Dhaheri",
        ];
        Self {
            agent_names: agent_names.iter().map(|s| s.to_string()).collect(),
            customer_names: customer_names.iter().map(|s| s.to_string()).collect(),
            amount_range: (300.0, 2000.0),
            due_days_past: (5, 45),
            reference_date: None,
        }
    }
}

/// One unit of work: a (prompt, scenario, variation) triple. Pairs are fully
/// independent; no shared mutable state exists between them.
#[derive(Clone, Debug)]
pub struct VariationJob {
    pub prompt: std::sync::Arc<PromptRecord>,
    pub scenario: std::sync::Arc<ScenarioDefinition>,
    pub params: VariationParameters,
}

/// Batch-level knobs for one engine run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    pub num_scenarios: usize,
    pub variations_per_scenario: u32,
    pub max_attempts: u32,
    pub max_concurrency: u32,
    pub generation_timeout: std::time::Duration,
    pub transport_retries: u32,
    /// When set, engine events are stamped with this directory so a
    /// file-backed logger can mirror them into per-prompt event files.
    pub events_dir: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_scenarios: 100,
            variations_per_scenario: 10,
            max_attempts: 3,
            max_concurrency: 1,
            generation_timeout: std::time::Duration::from_secs(120),
            transport_retries: 2,
            events_dir: None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("scenario `{scenario}` is missing required field `{field}`")]
    MissingScenarioField {
        scenario: String,
        field: &'static str,
    },
    #[error("{pool} name pool is empty")]
    EmptyNamePool { pool: &'static str },
    #[error("amount range is invalid: {min} > {max}")]
    InvalidAmountRange { min: f64, max: f64 },
    #[error("due-date range is invalid: {min} > {max} days in the past")]
    InvalidDateRange { min: i64, max: i64 },
    #[error("variation index must be >= 1, got {0}")]
    InvalidVariationIndex(u32),
    #[error("failed to read input file {path}: {source}")]
    InputFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no usable prompts found in {0}")]
    NoPrompts(String),
}
