use crate::domain::{CustomerBehavior, Role, ScenarioDefinition, Tag, Transcript};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Derived per attempt, never mutated afterwards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub quality_score: f32,
    pub tags_found: Vec<Tag>,
    pub tags_missing: Vec<Tag>,
    pub issues: Vec<Issue>,
}

impl ValidationOutcome {
    /// Outcome recorded when the generation call itself failed and no
    /// transcript exists for the attempt.
    pub fn generation_failure(error: impl std::fmt::Display) -> Self {
        Self {
            passed: false,
            quality_score: 0.0,
            tags_found: Vec::new(),
            tags_missing: Vec::new(),
            issues: vec![Issue::new(
                "generation_failed",
                format!("generation call failed: {error}"),
                Severity::Error,
            )],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndicatorGroup {
    pub name: String,
    pub phrases: Vec<String>,
}

impl IndicatorGroup {
    pub fn new(name: &str, phrases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            phrases: phrases.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub quality_threshold: f32,
    pub min_turns: usize,
    pub max_turns: usize,
    /// Fixed score deduction per missing required tag.
    pub missing_tag_penalty: f32,
    pub quality_indicators: Vec<IndicatorGroup>,
    pub red_flags: Vec<String>,
    /// All tags scanned for; `tags_found` reports any of these present.
    pub known_tags: Vec<Tag>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 0.6,
            min_turns: 4,
            max_turns: 30,
            missing_tag_penalty: 0.15,
            quality_indicators: vec![
                IndicatorGroup::new(
                    "agent_professionalism",
                    &[
                        "good morning",
                        "good afternoon",
                        "good evening",
                        "thank you",
                        "please",
                        "may i",
                        "i understand",
                        "i appreciate",
                        "professional",
                        "courteous",
                    ],
                ),
                IndicatorGroup::new(
                    "debt_collection_terms",
                    &[
                        "debt",
                        "loan",
                        "payment",
                        "amount",
                        "balance",
                        "due",
                        "overdue",
                        "collection",
                        "account",
                    ],
                ),
                IndicatorGroup::new(
                    "regulatory_compliance",
                    &[
                        "recorded",
                        "quality purposes",
                        "verify",
                        "confirm",
                        "legal action",
                        "credit bureau",
                        "background check",
                    ],
                ),
                IndicatorGroup::new(
                    "natural_conversation",
                    &[
                        "how are you",
                        "i see",
                        "i understand",
                        "that's",
                        "well",
                        "actually",
                        "really",
                        "sure",
                        "okay",
                    ],
                ),
            ],
            red_flags: [
                "lorem ipsum",
                "placeholder",
                "example text",
                "sample conversation",
                "test message",
                "[insert",
                "{{",
                "}}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            known_tags: crate::scenarios::special_tags(),
        }
    }
}

const INDICATOR_WEIGHT: f32 = 0.4;
const RED_FLAG_WEIGHT: f32 = 0.3;
const STRUCTURE_WEIGHT: f32 = 0.3;

/// Scores a transcript against a scenario. Pure: identical
/// (transcript, scenario, config) inputs yield identical outcomes. Every check
/// runs; there is no short-circuit, so a transcript failing several rules
/// reports all of them.
pub struct TranscriptValidator {
    config: ValidationConfig,
}

impl TranscriptValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(
        &self,
        transcript: &Transcript,
        scenario: &ScenarioDefinition,
    ) -> ValidationOutcome {
        if transcript.is_empty() {
            return ValidationOutcome {
                passed: false,
                quality_score: 0.0,
                tags_found: Vec::new(),
                tags_missing: scenario.required_tags.clone(),
                issues: vec![Issue::new(
                    "structure.empty",
                    "empty conversation",
                    Severity::Error,
                )],
            };
        }

        let mut issues = Vec::new();

        // 1. Tag presence.
        let tags_found = self.find_tags(transcript);
        let tags_missing: Vec<Tag> = scenario
            .required_tags
            .iter()
            .filter(|t| !tags_found.contains(t))
            .cloned()
            .collect();
        for tag in &tags_missing {
            issues.push(Issue::new(
                "tag.missing",
                format!("missing required tag {}", tag.token()),
                Severity::Error,
            ));
        }

        // 2. Structural checks.
        let structure_rate = self.check_structure(transcript, &mut issues);
        self.check_behavior_consistency(transcript, scenario, &mut issues);

        // 3. Heuristic quality score.
        let full_text = transcript.full_text_lower();
        let indicator_presence = self.indicator_presence(&full_text);
        let red_flag_absence = self.red_flag_absence(&full_text);
        let base = INDICATOR_WEIGHT * indicator_presence
            + RED_FLAG_WEIGHT * red_flag_absence
            + STRUCTURE_WEIGHT * structure_rate;
        let penalty = self.config.missing_tag_penalty * tags_missing.len() as f32;
        let quality_score = (base - penalty).clamp(0.0, 1.0);

        // 4. Pass decision. The threshold boundary is inclusive.
        let fatal = issues.iter().any(|i| i.severity == Severity::Error);
        let passed =
            tags_missing.is_empty() && quality_score >= self.config.quality_threshold && !fatal;

        if !passed && quality_score < self.config.quality_threshold {
            issues.push(Issue::new(
                "quality.below_threshold",
                format!(
                    "quality_score {:.2} below threshold {}: make the conversation more natural and professional",
                    quality_score, self.config.quality_threshold
                ),
                Severity::Warning,
            ));
        }

        ValidationOutcome {
            passed,
            quality_score,
            tags_found,
            tags_missing,
            issues,
        }
    }

    /// Scans every turn for each known tag as "(tag)", "<tag>", or a
    /// whitespace-delimited bare word. Models emit all three forms.
    fn find_tags(&self, transcript: &Transcript) -> Vec<Tag> {
        let mut found = Vec::new();
        for tag in &self.config.known_tags {
            let token = tag.token();
            let angled = format!("<{}>", tag.name());
            let hit = transcript.turns.iter().any(|turn| {
                let content = turn.content.to_lowercase();
                content.contains(&token)
                    || content.contains(&angled)
                    || contains_bare_word(&content, tag.name())
            });
            if hit {
                found.push(tag.clone());
            }
        }
        found
    }

    fn check_structure(&self, transcript: &Transcript, issues: &mut Vec<Issue>) -> f32 {
        let turns = &transcript.turns;
        let mut passed = 0usize;
        let mut total = 0usize;

        total += 1;
        if turns.len() >= self.config.min_turns {
            passed += 1;
        } else {
            issues.push(Issue::new(
                "structure.too_short",
                format!(
                    "conversation too short ({} turns, minimum {})",
                    turns.len(),
                    self.config.min_turns
                ),
                Severity::Error,
            ));
        }

        total += 1;
        let empty = turns
            .iter()
            .filter(|t| t.content.trim().is_empty())
            .count();
        if empty == 0 {
            passed += 1;
        } else {
            issues.push(Issue::new(
                "structure.empty_messages",
                format!("{empty} empty messages found"),
                Severity::Error,
            ));
        }

        total += 1;
        if turns[0].role == Role::Assistant {
            passed += 1;
        } else {
            issues.push(Issue::new(
                "structure.opening",
                "conversation does not open with the agent",
                Severity::Warning,
            ));
        }

        // Two consecutive turns from the same role is a soft violation.
        total += 1;
        let alternation_violations = turns
            .windows(2)
            .filter(|pair| pair[0].role == pair[1].role)
            .count();
        if alternation_violations == 0 {
            passed += 1;
        } else {
            issues.push(Issue::new(
                "structure.alternation",
                format!("{alternation_violations} consecutive same-role turns"),
                Severity::Warning,
            ));
        }

        total += 1;
        let odd_lengths = turns
            .iter()
            .filter(|t| t.content.len() < 10 || t.content.len() > 500)
            .count();
        if odd_lengths as f32 / turns.len() as f32 <= 0.2 {
            passed += 1;
        }

        total += 1;
        if turns.len() <= self.config.max_turns {
            passed += 1;
        }

        if let Some(last) = turns.last() {
            if last.content.len() < 20 {
                issues.push(Issue::new(
                    "structure.abrupt_ending",
                    "conversation ending seems abrupt",
                    Severity::Warning,
                ));
            }
        }

        passed as f32 / total as f32
    }

    /// Warns when the dialogue never shows the behavior the scenario calls
    /// for. Informs retry feedback; never blocks acceptance on its own.
    fn check_behavior_consistency(
        &self,
        transcript: &Transcript,
        scenario: &ScenarioDefinition,
        issues: &mut Vec<Issue>,
    ) {
        let text = transcript.full_text_lower();
        let complaint = match scenario.customer_behavior {
            CustomerBehavior::WrongPerson
                if !text.contains("transfer") && !text.contains("wrong") =>
            {
                Some("wrong-person scenario should mention transfer or wrong person")
            }
            CustomerBehavior::Hostile
                if !text.contains("angry")
                    && !text.contains("upset")
                    && !text.contains("frustrated") =>
            {
                Some("hostile scenario should show customer anger or frustration")
            }
            CustomerBehavior::Legal
                if !text.contains("legal")
                    && !text.contains("attorney")
                    && !text.contains("lawyer") =>
            {
                Some("legal scenario should mention legal terms")
            }
            CustomerBehavior::Cooperative if !text.contains("pay") => {
                Some("cooperative scenario should discuss payment")
            }
            _ => None,
        };
        if let Some(message) = complaint {
            issues.push(Issue::new(
                "content.behavior",
                message,
                Severity::Warning,
            ));
        }
    }

    fn indicator_presence(&self, full_text: &str) -> f32 {
        let groups = &self.config.quality_indicators;
        if groups.is_empty() {
            return 1.0;
        }
        let sum: f32 = groups
            .iter()
            .map(|group| {
                let found = group
                    .phrases
                    .iter()
                    .filter(|p| full_text.contains(p.as_str()))
                    .count();
                let denom = (group.phrases.len() as f32 * 0.3).max(1.0);
                (found as f32 / denom).min(1.0)
            })
            .sum();
        sum / groups.len() as f32
    }

    fn red_flag_absence(&self, full_text: &str) -> f32 {
        if self.config.red_flags.is_empty() {
            return 1.0;
        }
        let found = self
            .config
            .red_flags
            .iter()
            .filter(|f| full_text.contains(f.as_str()))
            .count();
        1.0 - found as f32 / self.config.red_flags.len() as f32
    }
}

fn contains_bare_word(content: &str, word: &str) -> bool {
    content == word
        || content.starts_with(&format!("{word} "))
        || content.ends_with(&format!(" {word}"))
        || content.contains(&format!(" {word} "))
}
