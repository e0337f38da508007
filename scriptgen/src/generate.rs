//! Bounded generate → validate → re-prompt loop.
//!
//! Each call starts its attempt counter at zero. Every attempt's prompt is
//! derived from the previous attempt's validation result, so attempts run
//! strictly in sequence.

use tracing::{debug, info, instrument, warn};

use crate::core::corrections::append_corrections;
use crate::core::retry::{RetryAction, determine_retry_action};
use crate::core::session::HearingContext;
use crate::core::types::{CtaIntent, GenerationOutcome};
use crate::core::validator::validate_script;
use crate::io::oracle::GenerationOracle;
use crate::io::prompt::{compose_dialogue_aware, compose_plain};

/// Attempts per call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

/// Reported when the loop runs out of attempts without another terminal outcome.
pub const RETRY_LIMIT_MESSAGE: &str = "retry limit reached";

/// What to generate from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationInput {
    /// Topic and intent only.
    Plain { topic: String, cta_intent: CtaIntent },
    /// A completed hearing.
    Hearing(HearingContext),
}

impl GenerationInput {
    pub fn cta_intent(&self) -> CtaIntent {
        match self {
            GenerationInput::Plain { cta_intent, .. } => *cta_intent,
            GenerationInput::Hearing(context) => context.cta_intent(),
        }
    }
}

/// Drives one generation call against an oracle.
pub struct GenerationOrchestrator<O> {
    oracle: O,
}

impl<O: GenerationOracle> GenerationOrchestrator<O> {
    pub fn new(oracle: O) -> Self {
        Self { oracle }
    }

    /// Run the bounded retry protocol for `input`.
    #[instrument(skip_all, fields(intent = %input.cta_intent()))]
    pub fn generate(&self, input: &GenerationInput) -> GenerationOutcome {
        let intent = input.cta_intent();
        let mut prompt = match compose_initial_prompt(input) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(err = %err, "failed to compose prompt");
                return GenerationOutcome::OracleFailure {
                    llm_error: format!("{err:#}"),
                };
            }
        };

        let mut attempt = 0u32;
        while attempt < MAX_ATTEMPTS {
            attempt += 1;
            debug!(attempt, prompt_bytes = prompt.len(), "invoking oracle");

            let response = self.oracle.generate(&prompt);
            let candidate = match response.script {
                Ok(candidate) => candidate,
                Err(err) => {
                    warn!(
                        attempt,
                        err = %err,
                        raw_bytes = response.raw_output.len(),
                        "oracle failure"
                    );
                    return GenerationOutcome::OracleFailure {
                        llm_error: err.to_string(),
                    };
                }
            };

            let validation = validate_script(&candidate, intent);
            if validation.valid {
                info!(attempt, chars = candidate.char_count(), "script accepted");
                return GenerationOutcome::Success { script: candidate };
            }

            let measured = candidate.char_count();
            let decision = determine_retry_action(&validation.errors, measured);
            debug!(
                attempt,
                measured,
                errors = validation.errors.len(),
                action = ?decision.action,
                "candidate rejected"
            );

            match decision.action {
                RetryAction::RequestMoreInformation => {
                    info!(attempt, ?decision, "requesting more information");
                    return GenerationOutcome::Rejected {
                        errors: validation.errors,
                        needs_more_info: true,
                    };
                }
                RetryAction::RetryWithAdjustedPrompt if attempt < MAX_ATTEMPTS => {
                    prompt = append_corrections(&prompt, &validation.errors, measured);
                }
                RetryAction::RetryWithAdjustedPrompt | RetryAction::NoRetry => {
                    info!(attempt, action = ?decision.action, "giving up with validation errors");
                    return GenerationOutcome::Rejected {
                        errors: validation.errors,
                        needs_more_info: false,
                    };
                }
            }
        }

        warn!(attempts = MAX_ATTEMPTS, "retry limit reached");
        GenerationOutcome::OracleFailure {
            llm_error: RETRY_LIMIT_MESSAGE.to_string(),
        }
    }
}

/// Dialogue-aware prompt when a transcript exists, plain prompt otherwise.
pub fn compose_initial_prompt(input: &GenerationInput) -> anyhow::Result<String> {
    match input {
        GenerationInput::Plain { topic, cta_intent } => compose_plain(topic, *cta_intent),
        GenerationInput::Hearing(context) if context.transcript().is_empty() => {
            compose_plain(context.topic(), context.cta_intent())
        }
        GenerationInput::Hearing(context) => compose_dialogue_aware(context),
    }
}
