//! Journal Biometrics CLI
//!
//! Replays recorded keystrokes, simulates typing profiles, or tracks a live
//! key feed from stdin, writing one JSON signature per aggregation cycle to
//! stdout.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use journal_biometrics::{
    collector::{generate, read_key_events, KeyEvent, TypingProfile},
    config::EngineConfig,
    replay::Replayer,
    scheduler::spawn_tracker,
    sink::JsonLinesSink,
    SignalEngine, VERSION,
};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "journal-biometrics")]
#[command(version = VERSION)]
#[command(about = "Keystroke-timing signal engine for journaling", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the placeholder pressure signal
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded key events (JSON lines) and emit signatures
    Replay {
        /// File of key events, one JSON object per line ("-" for stdin)
        input: PathBuf,

        /// User the session belongs to
        #[arg(long, default_value = "local")]
        user_id: String,

        /// Write signatures here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Generate a synthetic typing stream and emit its signatures
    Simulate {
        /// Typing profile (steady, bursty, hesitant, revising)
        #[arg(long, default_value = "steady")]
        profile: TypingProfile,

        /// Number of key presses to generate
        #[arg(long, default_value = "120")]
        keys: usize,

        /// Base interval between key presses in milliseconds
        #[arg(long, default_value = "110")]
        interval_ms: i64,

        /// User the session belongs to
        #[arg(long, default_value = "simulated")]
        user_id: String,
    },

    /// Track key names read line by line from stdin in real time
    Live {
        /// User the session belongs to
        #[arg(long, default_value = "local")]
        user_id: String,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the default location
        #[arg(long)]
        save: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Replay {
            input,
            user_id,
            output,
        } => cmd_replay(config, &input, &user_id, output.as_deref()),
        Commands::Simulate {
            profile,
            keys,
            interval_ms,
            user_id,
        } => cmd_simulate(config, profile, keys, interval_ms, &user_id),
        Commands::Live { user_id } => cmd_live(config, user_id),
        Commands::Config { save } => cmd_config(&config, save),
    }
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EngineConfig::load().context("loading configuration")?,
    };
    if seed.is_some() {
        config.pressure.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_replay(
    config: EngineConfig,
    input: &Path,
    user_id: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let events = if input == Path::new("-") {
        read_key_events(io::stdin().lock())?
    } else {
        let file =
            File::open(input).with_context(|| format!("opening {}", input.display()))?;
        read_key_events(BufReader::new(file))?
    };

    let writer: Box<dyn Write + Send> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };

    let mut replayer = Replayer::new(SignalEngine::new(config), JsonLinesSink::new(writer))
        .context("preparing replay")?;
    let delivered = replayer.run(user_id, Uuid::new_v4(), &events)?;
    eprintln!(
        "Replayed {} key events into {} signatures",
        events.len(),
        delivered
    );
    Ok(())
}

fn cmd_simulate(
    config: EngineConfig,
    profile: TypingProfile,
    keys: usize,
    interval_ms: i64,
    user_id: &str,
) -> anyhow::Result<()> {
    if interval_ms <= 0 {
        bail!("--interval-ms must be positive");
    }

    let events = generate(profile, keys, interval_ms, Utc::now());
    let mut replayer = Replayer::new(
        SignalEngine::new(config),
        JsonLinesSink::new(io::stdout()),
    )?;
    let delivered = replayer.run(user_id, Uuid::new_v4(), &events)?;
    eprintln!("Simulated {keys} {profile:?} key presses into {delivered} signatures");
    Ok(())
}

fn cmd_live(config: EngineConfig, user_id: String) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;

    let stats = runtime.block_on(async move {
        let handle = spawn_tracker(
            SignalEngine::new(config),
            user_id,
            JsonLinesSink::new(io::stdout()),
        )?;
        eprintln!("Tracking session {}", handle.session_id());
        eprintln!("Enter one key name per line (e.g. \"a\", \"Backspace\"). Ctrl+C to stop.");

        let token = handle.cancellation_token();
        ctrlc::set_handler(move || token.cancel()).context("installing Ctrl+C handler")?;

        let sender = handle.sender();
        std::thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                let key = line.trim();
                if key.is_empty() {
                    continue;
                }
                if sender.send(KeyEvent::now(key)).is_err() {
                    break;
                }
            }
        });

        Ok::<_, anyhow::Error>(handle.wait().await)
    })?;

    eprintln!();
    eprintln!("{}", stats.summary());
    Ok(())
}

fn cmd_config(config: &EngineConfig, save: bool) -> anyhow::Result<()> {
    if save {
        config.save().context("saving configuration")?;
        println!("Saved configuration.");
    }
    println!("Config file: {}", EngineConfig::config_path().display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
