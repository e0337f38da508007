//! Loading hearing transcripts from JSON files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::types::DialogueTurn;

/// Read a JSON array of `{role, content}` turns.
pub fn load_transcript(path: &Path) -> Result<Vec<DialogueTurn>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read transcript {}", path.display()))?;
    let turns: Vec<DialogueTurn> = serde_json::from_str(&contents)
        .with_context(|| format!("parse transcript {}", path.display()))?;
    debug!(path = %path.display(), turns = turns.len(), "transcript loaded");
    Ok(turns)
}

/// Read an optional transcript; `None` yields an empty transcript.
pub fn load_optional_transcript(path: Option<&Path>) -> Result<Vec<DialogueTurn>> {
    match path {
        Some(path) => load_transcript(path),
        None => Ok(Vec::new()),
    }
}
