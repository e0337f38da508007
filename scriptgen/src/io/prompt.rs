//! Prompt composition for the generation and dialogue oracles.

use std::fmt;
use std::sync::LazyLock;

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::session::HearingContext;
use crate::core::types::{CtaIntent, DialogueTurn, MAX_SCRIPT_CHARS, MIN_SCRIPT_CHARS, Role};
use crate::io::dialogue_oracle::COMPLETION_MARKER;

const CONTRACT_TEMPLATE: &str = include_str!("prompts/contract.md");
const PLAIN_TEMPLATE: &str = include_str!("prompts/plain.md");
const DIALOGUE_TEMPLATE: &str = include_str!("prompts/dialogue.md");
const HEARING_TEMPLATE: &str = include_str!("prompts/hearing.md");

static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("contract", CONTRACT_TEMPLATE)
        .expect("contract template should be valid");
    env.add_template("plain", PLAIN_TEMPLATE)
        .expect("plain template should be valid");
    env.add_template("dialogue", DIALOGUE_TEMPLATE)
        .expect("dialogue template should be valid");
    env.add_template("hearing", HEARING_TEMPLATE)
        .expect("hearing template should be valid");
    env
});

/// The dialogue-aware composer was called without any transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoTranscriptError;

impl fmt::Display for NoTranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dialogue-aware prompt requires a non-empty transcript")
    }
}

impl std::error::Error for NoTranscriptError {}

/// One question/answer pair lifted from the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
struct SpeakerLine<'a> {
    speaker: &'static str,
    content: &'a str,
}

/// Build the first prompt when no hearing transcript exists.
pub fn compose_plain(topic: &str, intent: CtaIntent) -> Result<String> {
    let template = TEMPLATES.get_template("plain")?;
    let rendered = template.render(context! {
        topic => topic.trim(),
        ..contract_context(intent)
    })?;
    debug!(intent = %intent, bytes = rendered.len(), "composed plain prompt");
    Ok(rendered)
}

/// Build the first prompt from a completed hearing.
///
/// Fails with [`NoTranscriptError`] when the transcript is empty.
pub fn compose_dialogue_aware(hearing: &HearingContext) -> Result<String> {
    if hearing.transcript().is_empty() {
        return Err(NoTranscriptError.into());
    }
    let pairs = qa_pairs(hearing.transcript());
    let template = TEMPLATES.get_template("dialogue")?;
    let rendered = template.render(context! {
        topic => hearing.topic().trim(),
        qa_pairs => pairs,
        ..contract_context(hearing.cta_intent())
    })?;
    debug!(
        intent = %hearing.cta_intent(),
        turns = hearing.transcript().len(),
        bytes = rendered.len(),
        "composed dialogue-aware prompt"
    );
    Ok(rendered)
}

/// Build the interviewer prompt for the next hearing question.
pub fn compose_hearing(topic: &str, transcript: &[DialogueTurn]) -> Result<String> {
    let lines: Vec<SpeakerLine<'_>> = transcript
        .iter()
        .map(|turn| SpeakerLine {
            speaker: match turn.role {
                Role::Assistant => "インタビュアー",
                Role::User => "投稿者",
            },
            content: turn.content.trim(),
        })
        .collect();
    let template = TEMPLATES.get_template("hearing")?;
    let rendered = template.render(context! {
        topic => topic.trim(),
        transcript => lines,
        marker => COMPLETION_MARKER,
        min_chars => MIN_SCRIPT_CHARS,
        max_chars => MAX_SCRIPT_CHARS,
    })?;
    Ok(rendered)
}

/// Pair turns two at a time from index 0: `(i, i + 1)` is question then answer.
///
/// A trailing unpaired turn is omitted.
pub fn qa_pairs(transcript: &[DialogueTurn]) -> Vec<QaPair> {
    transcript
        .chunks_exact(2)
        .map(|pair| QaPair {
            question: pair[0].content.trim().to_string(),
            answer: pair[1].content.trim().to_string(),
        })
        .collect()
}

fn contract_context(intent: CtaIntent) -> minijinja::Value {
    let keywords = intent
        .keywords()
        .iter()
        .map(|keyword| format!("「{keyword}」"))
        .collect::<Vec<_>>()
        .join("");
    context! {
        cta_instruction => intent.instruction(),
        cta_keywords => keywords,
        min_chars => MIN_SCRIPT_CHARS,
        max_chars => MAX_SCRIPT_CHARS,
    }
}
