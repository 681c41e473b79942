use convogen_core::domain::{Role, ScenarioDefinition, Tag, Transcript, Turn};
use convogen_core::scenarios::builtin_scenarios;
use convogen_core::validation::{Severity, TranscriptValidator, ValidationConfig};

fn turn(role: Role, content: &str) -> Turn {
    Turn {
        role,
        content: content.to_string(),
    }
}

fn scenario_by_id(id: &str) -> ScenarioDefinition {
    builtin_scenarios()
        .into_iter()
        .find(|s| s.id == id)
        .unwrap()
}

/// A rich payment call that should sail through validation when the closing
/// tag is present.
fn payment_call(closing: &str) -> Transcript {
    Transcript::new(vec![
        turn(
            Role::Assistant,
            "Good morning, this call may be recorded for quality purposes. May I please confirm I am speaking with the account holder about an overdue loan payment?",
        ),
        turn(
            Role::User,
            "Yes, speaking. Well, I was actually expecting this call about my account balance.",
        ),
        turn(
            Role::Assistant,
            "Thank you. I understand this is not pleasant, but the amount is past due and I need to verify when you can settle the debt.",
        ),
        turn(
            Role::User,
            "Sure, okay. I can really make the payment this Thursday if that works.",
        ),
        turn(Role::Assistant, closing),
        turn(
            Role::User,
            "Thank you for being understanding, I appreciate it. Goodbye now.",
        ),
    ])
}

#[test]
fn passing_transcript_reports_tags_and_no_issues() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");
    let transcript = payment_call(
        "Perfect, I will confirm Thursday as the payment date and note it on the account. (function_1)",
    );

    let outcome = validator.validate(&transcript, &scenario);
    assert!(outcome.passed, "issues: {:?}", outcome.issues);
    assert!(outcome.tags_found.contains(&Tag::new("function_1")));
    assert!(outcome.tags_missing.is_empty());
    assert!(outcome.quality_score >= 0.6);
}

#[test]
fn missing_tag_is_recorded_and_penalized() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");

    let with_tag = validator.validate(
        &payment_call("Perfect, I will note Thursday as the payment date. (function_1)"),
        &scenario,
    );
    let without_tag = validator.validate(
        &payment_call("Perfect, I will note Thursday as the payment date on the account."),
        &scenario,
    );

    assert!(!without_tag.passed);
    assert_eq!(without_tag.tags_missing, vec![Tag::new("function_1")]);
    assert!(without_tag
        .issues
        .iter()
        .any(|i| i.code == "tag.missing" && i.message.contains("(function_1)")));
    assert!(without_tag.quality_score <= with_tag.quality_score - 0.1);
}

#[test]
fn tag_forms_token_angled_and_bare_all_match() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("wrong_person_family");

    for closing in [
        "I understand, I will transfer you to the right department now, thank you. (transfer)",
        "I understand, I will hand this over to the right department now, thank you. <transfer>",
        "I understand, this call needs a transfer to the right department, thank you.",
    ] {
        let outcome = validator.validate(&payment_call(closing), &scenario);
        assert!(
            outcome.tags_found.contains(&Tag::new("transfer")),
            "tag not detected in: {closing}"
        );
        assert!(outcome.tags_missing.is_empty());
    }
}

#[test]
fn quality_score_equal_to_threshold_passes() {
    let scenario = scenario_by_id("basic_payment_willing");
    let transcript = payment_call("Noted, Thursday works for the payment, thank you. (function_1)");

    let probe = TranscriptValidator::new(ValidationConfig::default());
    let outcome = probe.validate(&transcript, &scenario);
    assert!(outcome.tags_missing.is_empty());
    assert!(!outcome
        .issues
        .iter()
        .any(|i| i.severity == Severity::Error));

    // The boundary is inclusive: a threshold exactly equal to the score
    // still accepts.
    let config = ValidationConfig {
        quality_threshold: outcome.quality_score,
        ..ValidationConfig::default()
    };
    let exact = TranscriptValidator::new(config).validate(&transcript, &scenario);
    assert_eq!(exact.quality_score, outcome.quality_score);
    assert!(exact.passed);
}

#[test]
fn alternation_violation_is_soft() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");

    let mut transcript = payment_call("Noted, I will confirm the payment date now, thank you. (function_1)");
    // Agent follows up twice in a row.
    transcript.turns.insert(
        1,
        turn(
            Role::Assistant,
            "Hello? Just checking that you can hear me clearly on this line.",
        ),
    );

    let outcome = validator.validate(&transcript, &scenario);
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.code == "structure.alternation" && i.severity == Severity::Warning));
    assert!(outcome.passed, "issues: {:?}", outcome.issues);
}

#[test]
fn empty_turn_content_is_fatal() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");

    let mut transcript = payment_call("Noted, I will confirm the payment date now, thank you. (function_1)");
    transcript.turns[3].content = "   ".to_string();

    let outcome = validator.validate(&transcript, &scenario);
    assert!(!outcome.passed);
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.code == "structure.empty_messages" && i.severity == Severity::Error));
}

#[test]
fn short_transcript_fails_with_all_checks_reported() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_refused");

    let transcript = Transcript::new(vec![
        turn(Role::Assistant, "Hello, collections."),
        turn(Role::User, "Not paying."),
    ]);

    let outcome = validator.validate(&transcript, &scenario);
    assert!(!outcome.passed);
    // No short-circuit: the tag check and the structural checks both report.
    assert!(outcome.issues.iter().any(|i| i.code == "tag.missing"));
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.code == "structure.too_short"));
}

#[test]
fn empty_transcript_scores_zero() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");

    let outcome = validator.validate(&Transcript::default(), &scenario);
    assert!(!outcome.passed);
    assert_eq!(outcome.quality_score, 0.0);
    assert_eq!(outcome.tags_missing, scenario.required_tags);
}

#[test]
fn behavior_consistency_warns_but_does_not_block() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("hostile_angry_yelling");

    // Calm transcript for a hostile scenario: warned, and still passing when
    // the tag and quality bar are met.
    let outcome = validator.validate(
        &payment_call("I understand. I am ending this call now, goodbye. (disconnect)"),
        &scenario,
    );
    assert!(outcome
        .issues
        .iter()
        .any(|i| i.code == "content.behavior" && i.severity == Severity::Warning));
    assert!(outcome.passed, "issues: {:?}", outcome.issues);
}

#[test]
fn validation_is_pure() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_refused");
    let transcript = payment_call("Understood, goodbye. (disconnect)");

    let a = validator.validate(&transcript, &scenario);
    let b = validator.validate(&transcript, &scenario);
    assert_eq!(a, b);
}

#[test]
fn red_flags_depress_the_score() {
    let validator = TranscriptValidator::new(ValidationConfig::default());
    let scenario = scenario_by_id("basic_payment_willing");

    let clean = validator.validate(
        &payment_call("Noted, I will confirm the payment now, thank you. (function_1)"),
        &scenario,
    );
    let flagged = validator.validate(
        &payment_call("Noted, placeholder text goes here, lorem ipsum. (function_1)"),
        &scenario,
    );
    assert!(flagged.quality_score < clean.quality_score);
}
