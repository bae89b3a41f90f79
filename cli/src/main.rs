//! Quill CLI
//!
//! Sends one free-text request to the router agent and prints its answer.
//!
//! Usage:
//!   quill Generate a list component with an add button
//!   QUILL_CONFIG=quill.toml quill Add routing to the app
//!
//! Every argument is part of the request; there are no flags. With no
//! request, a built-in sample request is used.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quill_angular::{Quill, SAMPLE_REQUEST};
use quill_config::QuillConfig;
use quill_contracts::error::QuillResult;

const CONFIG_ENV: &str = "QUILL_CONFIG";

// ── CLI definition ────────────────────────────────────────────────────────────

/// Quill: Angular code-generation agents.
#[derive(Parser)]
#[command(
    name = "quill",
    about = "Turn a feature request into docs, skills, a TODO list and code",
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Cli {
    /// The request. Words are joined with spaces.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    request: Vec<String>,
}

impl Cli {
    /// The joined request, or the sample request when it is blank.
    fn request(&self) -> String {
        let joined = self.request.join(" ");
        match joined.trim() {
            "" => SAMPLE_REQUEST.to_string(),
            trimmed => trimmed.to_string(),
        }
    }
}

/// The configuration file named by `QUILL_CONFIG`, if set and non-empty.
fn config_path(value: Option<OsString>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(answer) => println!("{answer}"),
        Err(e) => {
            eprintln!("quill: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> QuillResult<String> {
    let config = match config_path(std::env::var_os(CONFIG_ENV)) {
        Some(path) => QuillConfig::from_file(&path)?,
        None => QuillConfig::default(),
    };

    let request = cli.request();
    info!(request_len = request.len(), "starting request");

    let quill = Quill::from_config(&config)?;
    let output = quill.run(&request)?;
    if output.truncated {
        info!(iterations = output.iterations, "router stopped at its step budget");
    }
    Ok(output.answer)
}
