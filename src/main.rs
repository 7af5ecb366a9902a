use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use openlore_overlay::ambience::{SoundPlayer, SoundSelection, SoundSelector};
use openlore_overlay::audio::default_player;
use openlore_overlay::command::{Command, HELP};
use openlore_overlay::config::Config;
use openlore_overlay::error::OverlayError;
use openlore_overlay::overlay::{render_json, render_status};
use openlore_overlay::platform::SystemAccessibility;
use openlore_overlay::state::TrackerState;
use openlore_overlay::tracker::Tracker;

/// OpenLore: live word count, goal progress and focus time for whatever you are writing
#[derive(Parser, Debug)]
#[command(name = "openlore")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (TOML format)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Directory containing the ambient sound files
    #[arg(long = "sounds-dir")]
    sounds_dir: Option<PathBuf>,

    /// Word goal for this session (100-10000, default 2000)
    #[arg(short = 'g', long = "goal")]
    goal: Option<i64>,

    /// Print one JSON object per update instead of a status line
    #[arg(long = "json")]
    json: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

/// How the session ended
enum Exit {
    Quit,
    Interrupted,
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("openlore=debug,openlore_overlay=debug,info")
    } else {
        EnvFilter::new("openlore=info,openlore_overlay=info,warn")
    };

    // stdout is the overlay itself
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config, OverlayError> {
    let mut config = match cli.config {
        Some(ref path) => Config::from_file(path)?,
        None => match Config::default_path() {
            Some(path) if path.is_file() => {
                info!("Using config file {}", path.display());
                Config::from_file(&path)?
            }
            _ => Config::default(),
        },
    };

    config.merge_cli_args(cli.sounds_dir.clone());
    Ok(config)
}

fn show(state: &TrackerState, sound: SoundSelection, json: bool) {
    if json {
        match render_json(state, sound) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("failed to encode state: {}", e),
        }
    } else {
        println!("{}", render_status(state, sound));
    }
}

fn handle_command<P: SoundPlayer>(
    command: Command,
    tracker: &Tracker,
    selector: &mut SoundSelector<P>,
    json: bool,
) -> Option<Exit> {
    match command {
        Command::Goal(words) => {
            let stored = tracker.update_goal(words);
            if stored as i64 != words {
                eprintln!("{} goal set to {}", "NOTE:".yellow().bold(), stored);
            }
        }
        Command::Reset => tracker.reset_timer(),
        Command::Toggle(sound) => {
            let selection = selector.toggle(sound);
            show(&tracker.snapshot(), selection, json);
        }
        Command::Status => show(&tracker.snapshot(), selector.selection(), json),
        Command::Help => eprintln!("{}", HELP),
        Command::Quit => return Some(Exit::Quit),
    }
    None
}

async fn run(
    config: Config,
    goal: Option<i64>,
    json: bool,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Exit {
    let accessibility = Arc::new(SystemAccessibility::new());
    let tracker = Tracker::new(config.tracker.clone(), accessibility.clone(), accessibility);
    if let Some(goal) = goal {
        tracker.update_goal(goal);
    }

    if !tracker.snapshot().has_accessibility_permission {
        warn!("Accessibility permission is not granted; word counts stay at 0 until it is");
    }
    info!("Ambient sounds from {}", config.ambience.sounds_dir.display());

    let mut selector = SoundSelector::new(default_player(&config.ambience));
    let mut state_rx = tracker.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    show(&state_rx.borrow_and_update().clone(), selector.selection(), json);
    tracker.start();

    let exit = loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break Exit::Quit;
                }
                let state = state_rx.borrow_and_update().clone();
                show(&state, selector.selection(), json);
            }
            line = lines.next_line(), if input_open => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match line.parse::<Command>() {
                        Ok(command) => {
                            if let Some(exit) = handle_command(command, &tracker, &mut selector, json) {
                                break exit;
                            }
                        }
                        Err(e) => eprintln!("{} {} (type 'help')", "ERROR:".red().bold(), e),
                    },
                    Ok(None) => {
                        info!("Command input closed; overlay keeps running until Ctrl+C");
                        input_open = false;
                    }
                    Err(e) => {
                        warn!("{}", OverlayError::InputError(e));
                        input_open = false;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                break Exit::Interrupted;
            }
        }
    };

    tracker.stop();
    selector.shutdown();
    exit
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // Setup shutdown signal handling
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, shutting down...");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
        }
    });

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    match run(config, cli.goal, cli.json, shutdown_rx).await {
        Exit::Quit => std::process::exit(0),
        Exit::Interrupted => {
            println!("\n{} Shutdown requested", "INTERRUPTED:".yellow().bold());
            std::process::exit(130); // Standard exit code for Ctrl+C
        }
    }
}
