//! Shared application state for the API server.

use std::sync::Arc;

use scriptgen::io::config::ScriptgenConfig;
use scriptgen::io::dialogue_oracle::{CommandDialogueOracle, DialogueOracle};
use scriptgen::io::oracle::{CommandOracle, GenerationOracle};

/// Oracles shared by all request handlers. Holds no per-session data.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<dyn GenerationOracle + Send + Sync>,
    pub dialogue: Arc<dyn DialogueOracle + Send + Sync>,
}

impl AppState {
    pub fn new(
        generation: Arc<dyn GenerationOracle + Send + Sync>,
        dialogue: Arc<dyn DialogueOracle + Send + Sync>,
    ) -> Self {
        Self {
            generation,
            dialogue,
        }
    }

    /// Command-backed oracles from the `[generation]` and `[hearing]` tables.
    pub fn from_config(config: &ScriptgenConfig) -> Self {
        Self::new(
            Arc::new(CommandOracle::new(config.generation.clone())),
            Arc::new(CommandDialogueOracle::new(config.hearing.clone())),
        )
    }
}
