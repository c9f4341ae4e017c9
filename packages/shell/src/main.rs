use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use keymap_settings::FileSettings;
use keymap_shell::host::{terminal::EDIT_MODE_VAR, PlainHost};
use keymap_shell::{ReplCore, ShellContext};
use keymap_slots::config::{DEFAULT_LAYERS, DEFAULT_SLOTS};
use keymap_slots::SlotConfig;
use keymap_switch::{FeedbackPulse, MemoryPin};

/// keymap - manage stored keymap slots
#[derive(Parser, Debug)]
#[command(name = "keymap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to the local data directory)
    #[arg(long, env = "KEYMAP_SETTINGS")]
    settings: Option<PathBuf>,

    /// Number of keymap layers
    #[arg(long, env = "KEYMAP_LAYERS", default_value_t = DEFAULT_LAYERS)]
    layers: usize,

    /// Number of slots
    #[arg(long, env = "KEYMAP_SLOTS", default_value_t = DEFAULT_SLOTS)]
    slots: usize,

    /// How long the feedback LED stays on after a press, in milliseconds
    #[arg(long, env = "KEYMAP_FEEDBACK_MS", default_value_t = 500)]
    feedback_ms: u64,

    /// Log level written to stderr
    #[arg(long, env = "KEYMAP_LOG", default_value = "warn")]
    log_level: tracing::Level,

    /// Force vi editing mode
    #[arg(long)]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,

    /// Run one command and exit with its status code
    #[arg(short = 'c', long)]
    command: Option<String>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    if args.vi {
        std::env::set_var(EDIT_MODE_VAR, "vi");
    } else if args.emacs {
        std::env::set_var(EDIT_MODE_VAR, "emacs");
    }

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<i32, Box<dyn std::error::Error>> {
    let path = match args.settings {
        Some(path) => path,
        None => dirs::data_local_dir()
            .ok_or("no local data directory; pass --settings")?
            .join("keymap-shell")
            .join("settings.json"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let settings = FileSettings::open(path.clone())?;
    let config = SlotConfig::new(args.layers, args.slots)?;
    tracing::info!(path = %path.display(), ?config, "opened settings");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()?;
    let led = MemoryPin::new(false);
    let feedback = FeedbackPulse::new(
        Duration::from_millis(args.feedback_ms),
        runtime.handle().clone(),
    )
    .with_primary(led.clone());
    let ctx = ShellContext::new(settings, config).with_feedback(feedback, led);

    match args.command {
        Some(command) => Ok(ReplCore::new(ctx).execute(&command, &mut PlainHost::new())?),
        None => {
            keymap_shell::run(ctx)?;
            Ok(0)
        }
    }
}
