use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use webreplay::{ReplayConfig, Replayer};

/// webreplay: Replay recorded browser sessions over plain HTTP
#[derive(Parser)]
#[command(name = "webreplay", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an action script
    Run(RunArgs),
    /// Print the JSON Schema of the action script format
    Schema,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Action script (JSON)
    script: PathBuf,
    /// JSON file with replay options (camelCase keys)
    #[arg(long)]
    config: Option<PathBuf>,
    /// First step to execute
    #[arg(long)]
    start: Option<i64>,
    /// Last step to execute (inclusive)
    #[arg(long)]
    end: Option<i64>,
    /// Cookie store loaded before and saved after the run
    #[arg(long)]
    cookies: Option<PathBuf>,
    /// Treat assert-title steps as no-ops
    #[arg(long)]
    no_verify_titles: bool,
    /// Increase verbosity (-dd also dumps every response)
    #[arg(short, long, action = ArgAction::Count)]
    debug: u8,
    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
    /// Placeholder value, as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    replacements: Vec<String>,
}

impl RunArgs {
    fn config(&self) -> anyhow::Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::from_json_file(path)?,
            None => ReplayConfig::default(),
        };
        if self.no_verify_titles {
            config.verify_titles = false;
        }
        if self.debug > 0 {
            config.debug = self.debug;
        }
        if self.quiet {
            config.quiet = true;
        }
        if self.cookies.is_some() {
            config.cookie_path = self.cookies.clone();
        }
        Ok(config)
    }
}

fn init_logging(config: &ReplayConfig) {
    let default_level = if config.quiet {
        "warn"
    } else if config.debug > 0 {
        "debug"
    } else {
        "info"
    };
    // stdout carries the match set, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let config = args.config()?;
    init_logging(&config);

    let mut replayer = Replayer::new(config)?;
    for pair in &args.replacements {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("--set expects KEY=VALUE, got '{}'", pair);
        };
        replayer.set_replacement(key, value);
    }

    if !replayer.load(&args.script) {
        eprintln!("{}", replayer.error());
        return Ok(ExitCode::from(2));
    }

    if replayer.run(args.start, args.end).await {
        for group in replayer.matches() {
            println!("{}", group);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", replayer.error());
        Ok(ExitCode::FAILURE)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args).await,
        Command::Schema => {
            let schema = serde_json::to_string_pretty(&webreplay::script::script_schema())
                .context("Failed to render schema")?;
            println!("{}", schema);
            Ok(ExitCode::SUCCESS)
        }
    }
}
