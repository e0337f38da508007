//! Test-only helpers: scripted oracles, candidate and transcript builders.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::core::types::{DialogueTurn, ScriptCandidate};
use crate::io::dialogue_oracle::{DialogueOracle, DialogueReply};
use crate::io::oracle::{GenerationOracle, OracleResponse};

const HOOK: &str = "朝の使い方で一日が決まる";
const FILLER: char = 'あ';

/// Candidate with the given `hook`, `body` and `cta` and no optional fields.
pub fn script(hook: &str, body: &str, cta: &str) -> ScriptCandidate {
    ScriptCandidate {
        hook: hook.to_string(),
        context: None,
        body: body.to_string(),
        proof: None,
        transition: None,
        cta: cta.to_string(),
    }
}

/// Emoji-free candidate whose concatenated length is exactly `len` characters.
///
/// The body is padded so that hook + body + cta sum to `len`.
pub fn candidate_with_len(len: usize, cta: &str) -> ScriptCandidate {
    let fixed = HOOK.chars().count() + cta.chars().count();
    assert!(len > fixed, "len {len} too small for hook + cta ({fixed})");
    let body: String = std::iter::repeat_n(FILLER, len - fixed).collect();
    script(HOOK, &body, cta)
}

/// Two answered questions, assistant first.
pub fn sample_transcript() -> Vec<DialogueTurn> {
    vec![
        DialogueTurn::assistant("一番伝えたいことは何ですか？"),
        DialogueTurn::user("朝5時に起きると一日が変わる"),
        DialogueTurn::assistant("具体的なエピソードはありますか？"),
        DialogueTurn::user("早起きを始めて3か月で読書量が倍になった"),
    ]
}

/// One scripted oracle reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Serialized to JSON and parsed like real output.
    Script(ScriptCandidate),
    /// Raw text run through the output parser.
    Raw(String),
    /// Transport failure with this message.
    Transport(String),
}

impl ScriptedReply {
    fn into_response(self) -> OracleResponse {
        match self {
            ScriptedReply::Script(candidate) => OracleResponse::from_raw(
                serde_json::to_string(&candidate).expect("serialize scripted candidate"),
            ),
            ScriptedReply::Raw(raw) => OracleResponse::from_raw(raw),
            ScriptedReply::Transport(message) => OracleResponse::transport_failure(message),
        }
    }
}

/// Generation oracle that replays queued replies and records every prompt.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<ScriptedReply>>,
    repeat: Option<ScriptedReply>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Oracle that answers every call with `reply`.
    pub fn repeating(reply: ScriptedReply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            repeat: Some(reply),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl GenerationOracle for ScriptedOracle {
    fn generate(&self, prompt: &str) -> OracleResponse {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        let next = self.replies.lock().expect("replies lock").pop_front();
        next.or_else(|| self.repeat.clone())
            .expect("scripted oracle exhausted")
            .into_response()
    }
}

/// Dialogue oracle that replays queued replies and records every prompt.
pub struct ScriptedDialogueOracle {
    replies: Mutex<VecDeque<DialogueReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedDialogueOracle {
    pub fn new(replies: Vec<DialogueReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl DialogueOracle for ScriptedDialogueOracle {
    fn ask(&self, prompt: &str) -> DialogueReply {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or(DialogueReply::Empty)
    }
}
