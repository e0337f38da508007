//! Generation oracle abstraction.
//!
//! The [`GenerationOracle`] trait decouples the orchestrator from whatever
//! produces script text. [`CommandOracle`] pipes the prompt into a configured
//! command; tests use scripted oracles that replay predetermined outputs.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::types::ScriptCandidate;
use crate::io::config::OracleCommandConfig;
use crate::io::process::run_with_input;

static FENCED_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").expect("fenced block pattern should be valid")
});

/// Failures on the oracle channel. These never become validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The oracle could not be reached or exited abnormally.
    Transport(String),
    /// The output did not contain parseable JSON.
    Parse(String),
    /// A required field was absent, not a string, or empty.
    MissingField(&'static str),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Transport(msg) => write!(f, "oracle transport failed: {msg}"),
            OracleError::Parse(msg) => write!(f, "failed to parse oracle output as JSON: {msg}"),
            OracleError::MissingField(field) => {
                write!(f, "oracle output missing required field '{field}'")
            }
        }
    }
}

impl std::error::Error for OracleError {}

/// One oracle call: the parsed candidate or a failure, plus the raw text for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResponse {
    pub script: Result<ScriptCandidate, OracleError>,
    pub raw_output: String,
}

impl OracleResponse {
    /// Parse `raw_output` into a response.
    pub fn from_raw(raw_output: String) -> Self {
        Self {
            script: parse_script_output(&raw_output),
            raw_output,
        }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Self {
            script: Err(OracleError::Transport(message.into())),
            raw_output: String::new(),
        }
    }
}

/// Abstraction over script-generating backends.
pub trait GenerationOracle {
    /// Produce one candidate for `prompt`.
    fn generate(&self, prompt: &str) -> OracleResponse;
}

impl<T: GenerationOracle + ?Sized> GenerationOracle for &T {
    fn generate(&self, prompt: &str) -> OracleResponse {
        (**self).generate(prompt)
    }
}

/// Oracle that writes the prompt to a command's stdin and parses its stdout.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    config: OracleCommandConfig,
}

impl CommandOracle {
    pub fn new(config: OracleCommandConfig) -> Self {
        Self { config }
    }
}

impl GenerationOracle for CommandOracle {
    #[instrument(skip_all, fields(prompt_bytes = prompt.len()))]
    fn generate(&self, prompt: &str) -> OracleResponse {
        match run_oracle_command(&self.config, prompt) {
            Ok(raw) => {
                let response = OracleResponse::from_raw(raw);
                if let Err(err) = &response.script {
                    warn!(
                        err = %err,
                        raw_bytes = response.raw_output.len(),
                        "oracle output rejected"
                    );
                }
                response
            }
            Err(message) => {
                warn!(err = %message, "oracle call failed");
                OracleResponse::transport_failure(message)
            }
        }
    }
}

/// Run a command-backed oracle and return its stdout, or a transport failure message.
pub(crate) fn run_oracle_command(
    config: &OracleCommandConfig,
    prompt: &str,
) -> Result<String, String> {
    let output = run_with_input(
        &config.command,
        prompt.as_bytes(),
        config.timeout(),
        config.output_limit_bytes,
    )
    .map_err(|err| format!("{err:#}"))?;

    if output.timed_out {
        return Err(format!("timed out after {}s", config.timeout_secs));
    }
    if !output.status.success() {
        let tail = output.stderr_tail();
        return Err(if tail.is_empty() {
            format!("exited with status {:?}", output.status.code())
        } else {
            format!("exited with status {:?}: {tail}", output.status.code())
        });
    }
    debug!(bytes = output.stdout.len(), "oracle returned output");
    Ok(output.stdout_text())
}

/// Extract and parse a script from free-form oracle output.
///
/// Accepts pure JSON, JSON in a fenced code block, or JSON surrounded by prose
/// (first `{` to last `}`). Required fields are checked in the order hook,
/// body, cta. Optional fields that are absent, empty, or not strings are
/// treated as omitted.
pub fn parse_script_output(raw: &str) -> Result<ScriptCandidate, OracleError> {
    let json = extract_json(raw);
    let value: Value =
        serde_json::from_str(json).map_err(|err| OracleError::Parse(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| OracleError::Parse("expected a JSON object".to_string()))?;

    let required = |field: &'static str| -> Result<String, OracleError> {
        match object.get(field).and_then(Value::as_str) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(OracleError::MissingField(field)),
        }
    };
    let optional = |field: &str| -> Option<String> {
        object
            .get(field)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    };

    Ok(ScriptCandidate {
        hook: required("hook")?,
        body: required("body")?,
        cta: required("cta")?,
        context: optional("context"),
        proof: optional("proof"),
        transition: optional("transition"),
    })
}

fn extract_json(raw: &str) -> &str {
    if let Some(inner) = FENCED_BLOCK_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
    {
        return inner.as_str().trim();
    }
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw.trim(),
    }
}
