//! Hearing session state machine.
//!
//! A session gates script generation until the guided hearing dialogue has
//! explicitly completed:
//!
//! ```text
//! NotStarted --start()--> InProgress --complete()--> Completed
//! ```
//!
//! States only move forward. Transcript collection is not gated: turns may be
//! added in any state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::{CtaIntent, DialogueTurn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HearingState {
    NotStarted,
    InProgress,
    Completed,
}

impl fmt::Display for HearingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HearingState::NotStarted => write!(f, "not-started"),
            HearingState::InProgress => write!(f, "in-progress"),
            HearingState::Completed => write!(f, "completed"),
        }
    }
}

/// Why generation is not yet allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateReason {
    HearingNotStarted,
    HearingNotCompleted,
}

/// Answer to "may generation run now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationGate {
    Allowed,
    Blocked(GateReason),
}

impl GenerationGate {
    pub fn is_allowed(self) -> bool {
        matches!(self, GenerationGate::Allowed)
    }
}

/// Session misuse. These are caller bugs, never content-quality issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HearingError {
    InvalidTransition {
        from: HearingState,
        to: HearingState,
    },
    NotCompleted {
        state: HearingState,
    },
}

impl fmt::Display for HearingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HearingError::InvalidTransition { from, to } => {
                write!(f, "invalid hearing transition {from} -> {to}")
            }
            HearingError::NotCompleted { state } => {
                write!(f, "hearing must be completed before generation (state={state})")
            }
        }
    }
}

impl std::error::Error for HearingError {}

/// Immutable snapshot handed to generation. Only a completed session produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HearingContext {
    topic: String,
    transcript: Vec<DialogueTurn>,
    cta_intent: CtaIntent,
}

impl HearingContext {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn transcript(&self) -> &[DialogueTurn] {
        &self.transcript
    }

    pub fn cta_intent(&self) -> CtaIntent {
        self.cta_intent
    }
}

/// Per-call hearing session. Built fresh from request data; never stored.
#[derive(Debug, Clone)]
pub struct HearingSession {
    topic: String,
    cta_intent: CtaIntent,
    transcript: Vec<DialogueTurn>,
    state: HearingState,
}

impl HearingSession {
    pub fn new(topic: impl Into<String>, cta_intent: CtaIntent) -> Self {
        Self {
            topic: topic.into(),
            cta_intent,
            transcript: Vec::new(),
            state: HearingState::NotStarted,
        }
    }

    pub fn state(&self) -> HearingState {
        self.state
    }

    pub fn transcript(&self) -> &[DialogueTurn] {
        &self.transcript
    }

    pub fn start(&mut self) -> Result<(), HearingError> {
        self.advance(HearingState::NotStarted, HearingState::InProgress)
    }

    pub fn complete(&mut self) -> Result<(), HearingError> {
        self.advance(HearingState::InProgress, HearingState::Completed)
    }

    /// Append a turn regardless of state.
    pub fn add_message(&mut self, turn: DialogueTurn) {
        self.transcript.push(turn);
    }

    pub fn can_generate(&self) -> GenerationGate {
        match self.state {
            HearingState::NotStarted => GenerationGate::Blocked(GateReason::HearingNotStarted),
            HearingState::InProgress => GenerationGate::Blocked(GateReason::HearingNotCompleted),
            HearingState::Completed => GenerationGate::Allowed,
        }
    }

    pub fn context_for_generation(&self) -> Result<HearingContext, HearingError> {
        if self.state != HearingState::Completed {
            return Err(HearingError::NotCompleted { state: self.state });
        }
        Ok(HearingContext {
            topic: self.topic.clone(),
            transcript: self.transcript.clone(),
            cta_intent: self.cta_intent,
        })
    }

    fn advance(&mut self, from: HearingState, to: HearingState) -> Result<(), HearingError> {
        if self.state != from {
            return Err(HearingError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}
