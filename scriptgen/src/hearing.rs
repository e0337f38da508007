//! Hearing dialogue driver: turns a transcript into the next question or a
//! completion signal.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::types::{DialogueTurn, Role};
use crate::io::dialogue_oracle::{DialogueOracle, DialogueReply};
use crate::io::prompt::compose_hearing;

/// Questions used when the oracle supplies no content, cycled by assistant-turn count.
pub const FALLBACK_QUESTIONS: [&str; 3] = [
    "その内容で、視聴者にとって一番のメリットは何ですか？",
    "実際に体験したエピソードや、印象に残っている出来事があれば教えてください。",
    "説得力を持たせる数字やデータ、具体例はありますか？",
];

/// Opening question for an empty transcript.
pub fn opening_question(topic: &str) -> String {
    format!(
        "「{}」について動画台本を作りましょう。まず、この動画で一番伝えたいことは何ですか？",
        topic.trim()
    )
}

/// Result of one hearing turn (wire shape `{type, content?, error?}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HearingTurn {
    Question {
        content: String,
    },
    Complete {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    Error {
        error: String,
    },
}

/// Asks the dialogue oracle for the next step of the hearing.
pub struct HearingDialogueDriver<D> {
    oracle: D,
}

impl<D: DialogueOracle> HearingDialogueDriver<D> {
    pub fn new(oracle: D) -> Self {
        Self { oracle }
    }

    pub fn generate_next_question(&self, topic: &str, transcript: &[DialogueTurn]) -> HearingTurn {
        let prompt = match compose_hearing(topic, transcript) {
            Ok(prompt) => prompt,
            Err(err) => {
                warn!(err = %err, "failed to compose hearing prompt");
                return HearingTurn::Error {
                    error: format!("{err:#}"),
                };
            }
        };

        match self.oracle.ask(&prompt) {
            DialogueReply::Error(error) => HearingTurn::Error { error },
            DialogueReply::Complete(content) => {
                debug!(turns = transcript.len(), "hearing complete");
                HearingTurn::Complete { content }
            }
            DialogueReply::Question(content) => HearingTurn::Question { content },
            DialogueReply::Empty => {
                debug!(turns = transcript.len(), "dialogue oracle gave no content, using fallback");
                HearingTurn::Question {
                    content: fallback_question(topic, transcript),
                }
            }
        }
    }
}

/// Deterministic question for when the oracle supplies nothing.
pub fn fallback_question(topic: &str, transcript: &[DialogueTurn]) -> String {
    if transcript.is_empty() {
        return opening_question(topic);
    }
    let asked = transcript
        .iter()
        .filter(|turn| turn.role == Role::Assistant)
        .count();
    FALLBACK_QUESTIONS[asked % FALLBACK_QUESTIONS.len()].to_string()
}
