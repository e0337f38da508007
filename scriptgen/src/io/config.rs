//! Oracle configuration stored in `scriptgen.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scriptgen.toml";

/// Top-level configuration (TOML).
///
/// Missing tables and fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ScriptgenConfig {
    /// Command that turns a script prompt into a JSON script.
    pub generation: OracleCommandConfig,
    /// Command that asks the next hearing question.
    pub hearing: OracleCommandConfig,
}

/// How to invoke one command-backed oracle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleCommandConfig {
    /// Argv to execute; the prompt is written to its stdin (e.g. `["llm", "-m", "gpt-4o"]`).
    pub command: Vec<String>,
    /// Wall-clock limit for one oracle call.
    pub timeout_secs: u64,
    /// Truncate captured stdout beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for OracleCommandConfig {
    fn default() -> Self {
        Self {
            command: vec!["llm".to_string()],
            timeout_secs: 120,
            output_limit_bytes: 100_000,
        }
    }
}

impl OracleCommandConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self, table: &str) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(anyhow!("{table}.timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("{table}.output_limit_bytes must be > 0"));
        }
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(anyhow!("{table}.command must be a non-empty array"));
        }
        Ok(())
    }
}

impl ScriptgenConfig {
    pub fn validate(&self) -> Result<()> {
        self.generation.validate("generation")?;
        self.hearing.validate("hearing")?;
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScriptgenConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScriptgenConfig> {
    if !path.exists() {
        let cfg = ScriptgenConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScriptgenConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ScriptgenConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, buf)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
