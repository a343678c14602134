//! `gestura` – command line front end for the Gestura recognizer.
//!
//! ```text
//! gestura replay <session.jsonl> [--config <path>]
//! gestura config [--init] [--config <path>]
//! gestura help
//! ```
//!
//! `replay` pushes a recorded session through the recognizer and prints one
//! JSON result per frame on stdout.  A colored summary and all log output go
//! to stderr, so the result stream can be piped straight into `jq`.

mod config;
mod replay;

use colored::Colorize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Replay {
        session: PathBuf,
        config: Option<PathBuf>,
    },
    Config {
        init: bool,
        config: Option<PathBuf>,
    },
    Help,
}

fn main() -> ExitCode {
    let _guard = gestura_runtime::init_tracing("gestura");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            print_usage();
            return ExitCode::from(2);
        }
    };

    let outcome = match command {
        Command::Replay { session, config } => run_replay(&session, config.as_deref()),
        Command::Config { init, config } => run_config(init, config.as_deref()),
        Command::Help => {
            print_usage();
            Ok(())
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn run_replay(session: &Path, config_path: Option<&Path>) -> Result<(), String> {
    let (cfg, source) = config::resolve(config_path)?;
    match &source {
        Some(p) => info!(path = %p.display(), "loaded config"),
        None => info!("no config file; using defaults"),
    }

    let file = File::open(session)
        .map_err(|e| format!("Failed to open session {}: {}", session.display(), e))?;
    let frames = replay::parse_session(BufReader::new(file))?;
    info!(frames = frames.len(), session = %session.display(), "replaying session");

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let summary = replay::replay(&frames, cfg.recognizer, &mut out)?;
    out.flush().map_err(|e| format!("Failed to flush output: {}", e))?;

    eprintln!();
    eprintln!("{}", "Replay summary".bold().cyan());
    eprintln!("  frames      {}", summary.frames);
    eprintln!("  no hand     {}", summary.no_hand);
    eprintln!("  collecting  {}", summary.collecting);
    eprintln!("  predicted   {}", summary.predicted.to_string().green());
    eprintln!("  stable      {}", summary.stable.to_string().green());
    if summary.failed > 0 {
        eprintln!("  failed      {}", summary.failed.to_string().red());
    }
    if summary.rejected > 0 {
        eprintln!("  rejected    {}", summary.rejected.to_string().yellow());
    }
    if let Some(label) = &summary.last_label {
        eprintln!("  last label  {}", label.bold());
    }
    Ok(())
}

fn run_config(init: bool, config_path: Option<&Path>) -> Result<(), String> {
    if init {
        let path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config::config_path);
        if path.exists() {
            return Err(format!("{} already exists", path.display()));
        }
        config::save_to(&config::Config::default(), &path)?;
        println!("{} {}", "✓ Wrote default config to".green(), path.display());
        return Ok(());
    }

    let (cfg, source) = config::resolve(config_path)?;
    match source {
        Some(p) => println!("{} {}", "# config:".dimmed(), p.display()),
        None => println!("{}", "# config: built-in defaults".dimmed()),
    }
    let raw =
        toml::to_string_pretty(&cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    print!("{raw}");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut iter = args.iter();
    let Some(sub) = iter.next() else {
        return Ok(Command::Help);
    };

    let mut positional = Vec::new();
    let mut config = None;
    let mut init = false;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = iter
                    .next()
                    .ok_or_else(|| format!("{arg} expects a path"))?;
                config = Some(PathBuf::from(value));
            }
            "--init" => init = true,
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            value => positional.push(value.to_string()),
        }
    }

    match sub.as_str() {
        "replay" => {
            if init {
                return Err("--init is only valid for `config`".into());
            }
            match positional.as_slice() {
                [session] => Ok(Command::Replay {
                    session: PathBuf::from(session),
                    config,
                }),
                [] => Err("replay expects a session file".into()),
                _ => Err("replay takes exactly one session file".into()),
            }
        }
        "config" => {
            if !positional.is_empty() {
                return Err("config takes no positional arguments".into());
            }
            Ok(Command::Config { init, config })
        }
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(format!("unknown command `{other}`")),
    }
}

fn print_usage() {
    eprintln!();
    eprintln!(
        "  {} {}",
        "gestura".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!("  Hand gesture recognition");
    eprintln!();
    eprintln!("{}", "Usage:".bold());
    eprintln!("  gestura replay <session.jsonl> [--config <path>]   Replay a recorded session");
    eprintln!("  gestura config [--init] [--config <path>]          Show or create the config");
    eprintln!("  gestura help                                       Show this message");
    eprintln!();
}
