//! Dialogue oracle abstraction for the hearing interview.

use tracing::{instrument, warn};

use crate::io::config::OracleCommandConfig;
use crate::io::oracle::run_oracle_command;

/// Emitted by the interviewer instead of a question once enough material exists.
pub const COMPLETION_MARKER: &str = "[HEARING_COMPLETE]";

/// Interpreted reply from the dialogue oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueReply {
    /// The next question to ask.
    Question(String),
    /// Enough material has been gathered; optional closing remark.
    Complete(Option<String>),
    /// The oracle produced no content; the caller falls back to a fixed question.
    Empty,
    /// The oracle failed.
    Error(String),
}

impl DialogueReply {
    /// Interpret raw interviewer output.
    pub fn from_raw(raw: &str) -> Self {
        let text = raw.trim();
        if text.is_empty() {
            return DialogueReply::Empty;
        }
        if text.contains(COMPLETION_MARKER) {
            let remark = text.replace(COMPLETION_MARKER, "").trim().to_string();
            return DialogueReply::Complete((!remark.is_empty()).then_some(remark));
        }
        DialogueReply::Question(text.to_string())
    }
}

/// Abstraction over interviewer backends.
pub trait DialogueOracle {
    fn ask(&self, prompt: &str) -> DialogueReply;
}

impl<T: DialogueOracle + ?Sized> DialogueOracle for &T {
    fn ask(&self, prompt: &str) -> DialogueReply {
        (**self).ask(prompt)
    }
}

/// Dialogue oracle backed by a configured command.
#[derive(Debug, Clone)]
pub struct CommandDialogueOracle {
    config: OracleCommandConfig,
}

impl CommandDialogueOracle {
    pub fn new(config: OracleCommandConfig) -> Self {
        Self { config }
    }
}

impl DialogueOracle for CommandDialogueOracle {
    #[instrument(skip_all, fields(prompt_bytes = prompt.len()))]
    fn ask(&self, prompt: &str) -> DialogueReply {
        match run_oracle_command(&self.config, prompt) {
            Ok(raw) => DialogueReply::from_raw(&raw),
            Err(message) => {
                warn!(err = %message, "dialogue oracle call failed");
                DialogueReply::Error(message)
            }
        }
    }
}
