//! I/O-facing helpers: prompts, oracles, processes and configuration.

pub mod config;
pub mod dialogue_oracle;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod transcript;
