//! Short-video script generator CLI.
//!
//! Turns a topic and a call-to-action intent into a validated spoken script,
//! runs single hearing turns, and validates script files offline. Oracle
//! commands are read from `scriptgen.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use scriptgen::api::{
    GenerateRequest, HearingTurnRequest, generation_input, handle_generate, handle_hearing_turn,
};
use scriptgen::core::types::{CtaIntent, GenerationResult, ScriptCandidate};
use scriptgen::core::validator::validate_script;
use scriptgen::exit_codes;
use scriptgen::generate::compose_initial_prompt;
use scriptgen::hearing::HearingTurn;
use scriptgen::io::config::{DEFAULT_CONFIG_FILE, load_config};
use scriptgen::io::dialogue_oracle::CommandDialogueOracle;
use scriptgen::io::oracle::CommandOracle;
use scriptgen::io::transcript::load_optional_transcript;
use scriptgen::logging;

#[derive(Parser)]
#[command(
    name = "scriptgen",
    version,
    about = "Closed-loop short-video script generator"
)]
struct Cli {
    /// Path to the oracle configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a script and print the result JSON.
    Generate {
        #[arg(long)]
        topic: String,
        /// One of longVideo, like, comment.
        #[arg(long)]
        cta: CtaIntent,
        /// JSON array of `{role, content}` hearing turns.
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Ask for the next hearing question.
    Hearing {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Validate a script JSON file against an intent.
    Validate {
        #[arg(long)]
        cta: CtaIntent,
        script: PathBuf,
    },
    /// Print the initial generation prompt without calling any oracle.
    Prompt {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        cta: CtaIntent,
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            topic,
            cta,
            history,
        } => cmd_generate(&cli.config, topic, cta, history.as_deref()),
        Command::Hearing { topic, history } => cmd_hearing(&cli.config, topic, history.as_deref()),
        Command::Validate { cta, script } => cmd_validate(cta, &script),
        Command::Prompt {
            topic,
            cta,
            history,
        } => cmd_prompt(topic, cta, history.as_deref()),
    }
}

fn cmd_generate(
    config_path: &Path,
    topic: String,
    cta: CtaIntent,
    history: Option<&Path>,
) -> Result<i32> {
    let request = generate_request(topic, cta, history)?;
    request.validate()?;
    let config = load_config(config_path)?;
    let result = handle_generate(CommandOracle::new(config.generation), &request);
    print_json(&result)?;
    Ok(generate_exit_code(&result))
}

fn cmd_hearing(config_path: &Path, topic: String, history: Option<&Path>) -> Result<i32> {
    let request = HearingTurnRequest {
        topic,
        history: load_optional_transcript(history)?,
    };
    request.validate()?;
    let config = load_config(config_path)?;
    let turn = handle_hearing_turn(CommandDialogueOracle::new(config.hearing), &request);
    print_json(&turn)?;
    Ok(match turn {
        HearingTurn::Error { .. } => exit_codes::INVALID,
        HearingTurn::Question { .. } | HearingTurn::Complete { .. } => exit_codes::OK,
    })
}

fn cmd_validate(cta: CtaIntent, path: &Path) -> Result<i32> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let candidate: ScriptCandidate =
        serde_json::from_str(&raw).with_context(|| format!("parse script {}", path.display()))?;
    let result = validate_script(&candidate, cta);
    print_json(&result)?;
    Ok(if result.valid {
        exit_codes::OK
    } else {
        exit_codes::REJECTED
    })
}

fn cmd_prompt(topic: String, cta: CtaIntent, history: Option<&Path>) -> Result<i32> {
    let request = generate_request(topic, cta, history)?;
    request.validate()?;
    let input = generation_input(&request)?;
    println!("{}", compose_initial_prompt(&input)?);
    Ok(exit_codes::OK)
}

fn generate_request(
    topic: String,
    cta: CtaIntent,
    history: Option<&Path>,
) -> Result<GenerateRequest> {
    let history = load_optional_transcript(history)?;
    Ok(GenerateRequest {
        topic,
        cta_purpose: cta,
        history: (!history.is_empty()).then_some(history),
    })
}

fn generate_exit_code(result: &GenerationResult) -> i32 {
    if result.success {
        exit_codes::OK
    } else if result.needs_more_info == Some(true) {
        exit_codes::NEEDS_MORE_INFO
    } else if result.errors.is_some() {
        exit_codes::REJECTED
    } else {
        exit_codes::INVALID
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}
