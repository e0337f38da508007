//! Shared deterministic types for the script generation core.
//!
//! These types define stable contracts between core components and the wire
//! shapes exchanged with callers. They must not depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) on the concatenated script length, in characters.
pub const MIN_SCRIPT_CHARS: usize = 250;
/// Upper bound (inclusive) on the concatenated script length, in characters.
pub const MAX_SCRIPT_CHARS: usize = 400;

/// The viewer action a script's closing line should drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CtaIntent {
    LongVideo,
    Like,
    Comment,
}

impl CtaIntent {
    /// Keywords accepted in the `cta` field for this intent (any one suffices).
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            CtaIntent::LongVideo => &["長尺", "本編", "フル"],
            CtaIntent::Like => &["いいね", "高評価", "グッド"],
            CtaIntent::Comment => &["コメント", "感想", "教えて"],
        }
    }

    /// Error code reported when the `cta` field carries none of the keywords.
    pub fn mismatch_code(self) -> ValidationErrorCode {
        match self {
            CtaIntent::LongVideo => ValidationErrorCode::CtaMismatchLongVideo,
            CtaIntent::Like => ValidationErrorCode::CtaMismatchLike,
            CtaIntent::Comment => ValidationErrorCode::CtaMismatchComment,
        }
    }

    /// Human-readable instruction embedded in prompts.
    pub fn instruction(self) -> &'static str {
        match self {
            CtaIntent::LongVideo => "視聴者を長尺の本編動画へ誘導する",
            CtaIntent::Like => "視聴者に高評価（いいね）を促す",
            CtaIntent::Comment => "視聴者にコメントで感想を書いてもらう",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CtaIntent::LongVideo => "longVideo",
            CtaIntent::Like => "like",
            CtaIntent::Comment => "comment",
        }
    }
}

impl fmt::Display for CtaIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CtaIntent {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "longVideo" => Ok(CtaIntent::LongVideo),
            "like" => Ok(CtaIntent::Like),
            "comment" => Ok(CtaIntent::Comment),
            other => Err(format!(
                "unknown cta intent '{other}' (expected longVideo, like or comment)"
            )),
        }
    }
}

/// One generated script, not yet known to satisfy validation.
///
/// Optional fields are `None` when omitted; they are never stored as empty
/// strings standing in for "absent". Missing required fields deserialize as
/// empty strings so the validator can report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptCandidate {
    #[serde(default)]
    pub hook: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(default)]
    pub cta: String,
}

impl ScriptCandidate {
    /// Fields in spoken order: hook, context, body, proof, transition, cta.
    ///
    /// Omitted optional fields are skipped entirely.
    pub fn spoken_parts(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.hook.as_str()),
            self.context.as_deref(),
            Some(self.body.as_str()),
            self.proof.as_deref(),
            self.transition.as_deref(),
            Some(self.cta.as_str()),
        ]
        .into_iter()
        .flatten()
    }

    /// Concatenation of all present fields with no separators.
    pub fn full_text(&self) -> String {
        self.spoken_parts().collect()
    }

    /// Total character count of the present fields.
    pub fn char_count(&self) -> usize {
        self.spoken_parts().map(|part| part.chars().count()).sum()
    }
}

/// Closed set of structural and stylistic violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorCode {
    MissingHook,
    MissingBody,
    MissingCta,
    MalformedOrder,
    ContainsEmoji,
    TooShort,
    TooLong,
    CtaMismatchLongVideo,
    CtaMismatchLike,
    CtaMismatchComment,
}

impl ValidationErrorCode {
    /// Whether re-prompting alone can fix this violation.
    ///
    /// Length violations are handled by their own thresholds and are not part
    /// of this set.
    pub fn is_retryable(self) -> bool {
        match self {
            ValidationErrorCode::MissingHook
            | ValidationErrorCode::MissingBody
            | ValidationErrorCode::MissingCta
            | ValidationErrorCode::MalformedOrder
            | ValidationErrorCode::ContainsEmoji
            | ValidationErrorCode::CtaMismatchLongVideo
            | ValidationErrorCode::CtaMismatchLike
            | ValidationErrorCode::CtaMismatchComment => true,
            ValidationErrorCode::TooShort | ValidationErrorCode::TooLong => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationErrorCode::MissingHook => "MISSING_HOOK",
            ValidationErrorCode::MissingBody => "MISSING_BODY",
            ValidationErrorCode::MissingCta => "MISSING_CTA",
            ValidationErrorCode::MalformedOrder => "MALFORMED_ORDER",
            ValidationErrorCode::ContainsEmoji => "CONTAINS_EMOJI",
            ValidationErrorCode::TooShort => "TOO_SHORT",
            ValidationErrorCode::TooLong => "TOO_LONG",
            ValidationErrorCode::CtaMismatchLongVideo => "CTA_MISMATCH_LONG_VIDEO",
            ValidationErrorCode::CtaMismatchLike => "CTA_MISMATCH_LIKE",
            ValidationErrorCode::CtaMismatchComment => "CTA_MISMATCH_COMMENT",
        }
    }
}

impl fmt::Display for ValidationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single violation with a stable code and a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ValidationErrorCode,
    pub message: String,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of validating one candidate. `valid` iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn has(&self, code: ValidationErrorCode) -> bool {
        self.errors.iter().any(|err| err.code == code)
    }
}

/// Speaker of a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// One turn of the hearing dialogue, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: Role,
    pub content: String,
}

impl DialogueTurn {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Whether turns alternate assistant/user starting with the assistant.
pub fn is_alternating(transcript: &[DialogueTurn]) -> bool {
    transcript.iter().enumerate().all(|(idx, turn)| {
        let expected = if idx % 2 == 0 {
            Role::Assistant
        } else {
            Role::User
        };
        turn.role == expected
    })
}

/// Terminal outcome of one orchestrator call.
///
/// Exactly one of: a validated script, structural errors, or an oracle-level
/// failure. The wire shape is [`GenerationResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success {
        script: ScriptCandidate,
    },
    Rejected {
        errors: Vec<ValidationError>,
        needs_more_info: bool,
    },
    OracleFailure {
        llm_error: String,
    },
}

impl GenerationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Success { .. })
    }
}

/// Wire shape of a generation outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_more_info: Option<bool>,
}

impl From<GenerationOutcome> for GenerationResult {
    fn from(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Success { script } => Self {
                success: true,
                script: Some(script),
                errors: None,
                llm_error: None,
                needs_more_info: None,
            },
            GenerationOutcome::Rejected {
                errors,
                needs_more_info,
            } => Self {
                success: false,
                script: None,
                errors: Some(errors),
                llm_error: None,
                needs_more_info: needs_more_info.then_some(true),
            },
            GenerationOutcome::OracleFailure { llm_error } => Self {
                success: false,
                script: None,
                errors: None,
                llm_error: Some(llm_error),
                needs_more_info: None,
            },
        }
    }
}
