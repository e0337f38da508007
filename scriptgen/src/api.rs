//! Transport-agnostic request handlers.
//!
//! Nothing is stored between calls: each request rebuilds its hearing session
//! from the topic, intent and history it carries.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::session::HearingSession;
use crate::core::types::{
    CtaIntent, DialogueTurn, GenerationOutcome, GenerationResult, is_alternating,
};
use crate::generate::{GenerationInput, GenerationOrchestrator};
use crate::hearing::{HearingDialogueDriver, HearingTurn};
use crate::io::dialogue_oracle::DialogueOracle;
use crate::io::oracle::GenerationOracle;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub topic: String,
    pub cta_purpose: CtaIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<DialogueTurn>>,
}

impl GenerateRequest {
    pub fn validate(&self) -> Result<()> {
        validate_topic(&self.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HearingTurnRequest {
    pub topic: String,
    #[serde(default)]
    pub history: Vec<DialogueTurn>,
}

impl HearingTurnRequest {
    pub fn validate(&self) -> Result<()> {
        validate_topic(&self.topic)
    }
}

/// Run generation for a request.
///
/// With a non-empty history the request goes through a hearing session that is
/// started, filled and completed here before generation is allowed.
pub fn handle_generate<O: GenerationOracle>(
    oracle: O,
    request: &GenerateRequest,
) -> GenerationResult {
    let input = match generation_input(request) {
        Ok(input) => input,
        Err(err) => {
            warn!(err = %err, "hearing session rejected request");
            return GenerationOutcome::OracleFailure {
                llm_error: err.to_string(),
            }
            .into();
        }
    };
    let outcome = GenerationOrchestrator::new(oracle).generate(&input);
    info!(success = outcome.is_success(), intent = %request.cta_purpose, "generation finished");
    outcome.into()
}

/// Ask for the next hearing question.
pub fn handle_hearing_turn<D: DialogueOracle>(
    oracle: D,
    request: &HearingTurnRequest,
) -> HearingTurn {
    warn_if_not_alternating(&request.history);
    HearingDialogueDriver::new(oracle).generate_next_question(&request.topic, &request.history)
}

/// Rebuild the generation input a request describes.
pub fn generation_input(request: &GenerateRequest) -> Result<GenerationInput> {
    let history = match request.history.as_deref() {
        Some(history) if !history.is_empty() => history,
        _ => {
            return Ok(GenerationInput::Plain {
                topic: request.topic.clone(),
                cta_intent: request.cta_purpose,
            });
        }
    };
    warn_if_not_alternating(history);

    let mut session = HearingSession::new(request.topic.clone(), request.cta_purpose);
    session.start()?;
    for turn in history {
        session.add_message(turn.clone());
    }
    session.complete()?;

    let gate = session.can_generate();
    if !gate.is_allowed() {
        return Err(anyhow!("generation not allowed: {gate:?}"));
    }
    Ok(GenerationInput::Hearing(session.context_for_generation()?))
}

fn validate_topic(topic: &str) -> Result<()> {
    if topic.trim().is_empty() {
        return Err(anyhow!("topic must be non-empty"));
    }
    Ok(())
}

fn warn_if_not_alternating(history: &[DialogueTurn]) {
    if !is_alternating(history) {
        warn!(turns = history.len(), "history does not alternate assistant/user");
    }
}
