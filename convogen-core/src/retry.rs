use crate::domain::Transcript;
use crate::validation::ValidationOutcome;

/// Lifecycle of one (scenario, variation) pair.
///
/// ```text
/// Pending -> Generating -> Validating -> Accepted
///                ^              |
///                |              v
///                +-- Retrying <-+        (attempts remain)
///                               |
///                               v
///                           Exhausted    (attempt budget spent)
/// ```
///
/// `Accepted` and `Exhausted` are the only terminal phases; both yield exactly
/// one result record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Generating,
    Validating,
    Retrying,
    Accepted,
    Exhausted,
}

#[derive(Clone, Debug)]
pub enum AttemptEvent {
    Start,
    Generated(Transcript),
    GenerationFailed(String),
    Validated(ValidationOutcome),
    Retry,
}

/// Drives the bounded attempt loop for one pair. The transition function is
/// pure and consuming, so the whole machine is testable without a generation
/// client; the engine supplies events from real calls.
///
/// The controller retains the most recent transcript and outcome, so an
/// exhausted pair still records the final attempt's artifacts.
#[derive(Clone, Debug)]
pub struct RetryController {
    max_attempts: u32,
    attempt: u32,
    attempts_used: u32,
    phase: Phase,
    last_transcript: Option<Transcript>,
    last_outcome: Option<ValidationOutcome>,
}

impl RetryController {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempt: 0,
            attempts_used: 0,
            phase: Phase::Pending,
            last_transcript: None,
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current attempt number, 1-based once started.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Number of Generating transitions taken so far.
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Accepted | Phase::Exhausted)
    }

    pub fn last_transcript(&self) -> Option<&Transcript> {
        self.last_transcript.as_ref()
    }

    pub fn last_outcome(&self) -> Option<&ValidationOutcome> {
        self.last_outcome.as_ref()
    }

    /// The prior attempt's outcome, available while generating a retry.
    /// `None` on the first attempt, so first-attempt prompts carry no
    /// feedback block.
    pub fn feedback(&self) -> Option<&ValidationOutcome> {
        if self.phase == Phase::Generating && self.attempt > 1 {
            self.last_outcome.as_ref()
        } else {
            None
        }
    }

    /// Pure transition. Events that do not apply to the current phase leave
    /// the state unchanged; terminal phases absorb everything.
    pub fn step(mut self, event: AttemptEvent) -> Self {
        match (self.phase, event) {
            (Phase::Pending, AttemptEvent::Start) => {
                self.attempt = 1;
                self.attempts_used = 1;
                self.phase = Phase::Generating;
            }
            (Phase::Generating, AttemptEvent::Generated(transcript)) => {
                self.last_transcript = Some(transcript);
                self.phase = Phase::Validating;
            }
            (Phase::Generating, AttemptEvent::GenerationFailed(error)) => {
                self.last_outcome = Some(ValidationOutcome::generation_failure(error));
                self.phase = if self.attempt < self.max_attempts {
                    Phase::Retrying
                } else {
                    Phase::Exhausted
                };
            }
            (Phase::Validating, AttemptEvent::Validated(outcome)) => {
                let passed = outcome.passed;
                self.last_outcome = Some(outcome);
                self.phase = if passed {
                    Phase::Accepted
                } else if self.attempt < self.max_attempts {
                    Phase::Retrying
                } else {
                    Phase::Exhausted
                };
            }
            (Phase::Retrying, AttemptEvent::Retry) => {
                self.attempt += 1;
                self.attempts_used += 1;
                self.phase = Phase::Generating;
            }
            _ => {}
        }
        self
    }
}
