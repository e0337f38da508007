//! Closed-loop short-video script generation.
//!
//! A topic and a call-to-action intent are turned into a spoken script by an
//! untrusted text-generation oracle. Every candidate is validated, and failures
//! are either corrected by re-prompting or sent back to the hearing dialogue for
//! more source material. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (validation, retry planning, the
//!   hearing session state machine, corrective directives). No I/O.
//! - **[`io`]**: Prompt templates, oracle adapters, process plumbing, config.
//!
//! Orchestration modules ([`generate`], [`hearing`], [`api`]) coordinate core
//! logic with the oracles.

pub mod api;
pub mod core;
pub mod exit_codes;
pub mod generate;
pub mod hearing;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
