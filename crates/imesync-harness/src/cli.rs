#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use imesync_core::event::InputEvent;
use imesync_core::logging::{self, LogFormat, LogOptions};
use imesync_edit::AdapterConfig;

use crate::error::{HarnessError, Result};
use crate::session::ImeSession;
use crate::transcript::{SessionStep, TranscriptReader, replay};

#[derive(Debug, Parser)]
#[command(
    name = "imesync-replay",
    about = "Record, inspect and replay imesync session transcripts",
    version
)]
pub struct Cli {
    /// Log output format. The filter comes from IMESYNC_LOG.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormatArg::Pretty, global = true)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a JSON list of input events and write the transcript.
    Record(RecordArgs),

    /// Replay a transcript and report the first divergence.
    Replay(ReplayArgs),

    /// Print the steps of a transcript.
    Inspect(InspectArgs),

    /// Validate an adapter config file (TOML or JSON).
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    /// JSON array of input events.
    #[arg(long)]
    pub events: PathBuf,

    /// Transcript output path.
    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value = "session")]
    pub name: String,

    /// Adapter config file (TOML or JSON).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Text to place on the clipboard before the first event.
    #[arg(long)]
    pub clipboard: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    pub transcript: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    pub transcript: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Json => LogFormat::Json,
    };
    logging::init(&LogOptions {
        format,
        default_filter: "warn".to_owned(),
    });
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Record(args) => run_record(args),
        Commands::Replay(args) => run_replay(args),
        Commands::Inspect(args) => run_inspect(args),
        Commands::CheckConfig(args) => {
            let config = load_config(&args.path)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn run_record(args: RecordArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => AdapterConfig::default(),
    };
    let events: Vec<InputEvent> =
        serde_json::from_slice(&std::fs::read(&args.events)?).map_err(HarnessError::Events)?;

    let mut session = ImeSession::with_config(args.name, config);
    if let Some(text) = &args.clipboard {
        session.set_clipboard_text(text);
    }
    session.dispatch_all(events);

    let transcript = session.transcript();
    let file = std::fs::File::create(&args.output)?;
    transcript.write_to(file)?;
    println!(
        "recorded {} steps, {} notifications -> {}",
        transcript.steps().len(),
        transcript.notification_count(),
        args.output.display()
    );
    Ok(())
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let transcript = TranscriptReader::open(&args.transcript)?;
    let report = replay(&transcript);

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(HarnessError::Report)?;
        println!("{json}");
    } else if let Some(divergence) = &report.divergence {
        println!("{}: diverged at step {}", report.session_name, divergence.seq);
        println!(
            "  handled: expected {}, got {}",
            divergence.expected_handled, divergence.actual_handled
        );
        println!("  expected: {:?}", divergence.expected);
        println!("  actual:   {:?}", divergence.actual);
    } else {
        println!(
            "{}: {} steps, {} notifications, clean",
            report.session_name, report.steps_replayed, report.notifications
        );
    }

    match report.divergence {
        Some(divergence) => Err(HarnessError::Diverged {
            session: report.session_name,
            seq: divergence.seq,
        }),
        None => Ok(()),
    }
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let transcript = TranscriptReader::open(&args.transcript)?;
    println!("session: {}", transcript.session_name());
    println!("config:  {:?}", transcript.config());
    for (seq, step) in transcript.steps().iter().enumerate() {
        match step {
            SessionStep::Input {
                event,
                handled,
                notifications,
            } => {
                let mark = if *handled { ' ' } else { '!' };
                println!(
                    "{seq:>4}{mark} {:<22} {} notification(s)",
                    event.operation_name(),
                    notifications.len()
                );
            }
            SessionStep::SetClipboard { text } => {
                println!("{seq:>4}  {:<22} {text:?}", "clipboard");
            }
            SessionStep::ShowImeIfNeeded { shown } => {
                let mark = if *shown { ' ' } else { '!' };
                println!("{seq:>4}{mark} {:<22}", "show_ime_if_needed");
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<AdapterConfig> {
    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => AdapterConfig::from_json_file(path)?,
        _ => AdapterConfig::from_toml_file(path)?,
    };
    Ok(config)
}
