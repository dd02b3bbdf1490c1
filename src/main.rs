//! irmpc - infrared remote control for MPD
//!
//! Reads key presses from lircd (or an interactive console) and drives a
//! Music Player Daemon with them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use irmpc::config::{AppConfig, ConfigWatcher, MpdConfig};
use irmpc::input::{ConsoleSource, EventSource, LircSource};
use irmpc::player::{MpdConnector, PlayerConnector};
use irmpc::system::executor_for;
use irmpc::Dispatcher;

/// irmpc - control MPD with an infrared remote through lircd
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (watched for changes)
    #[arg(short, long, env = "IRMPC_CONFIG")]
    config: Option<PathBuf>,

    /// MPD host
    #[arg(short = 'H', long, env = "MPD_HOST")]
    hostname: Option<String>,

    /// MPD port
    #[arg(short = 'P', long, env = "MPD_PORT")]
    port: Option<u16>,

    /// MPD password
    #[arg(short, long, env = "MPD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Attempts per command, including reconnects
    #[arg(short, long)]
    maxtries: Option<u32>,

    /// Presses needed to save the current playlist
    #[arg(short, long)]
    updaterepeat: Option<u32>,

    /// Volume change per key press, in percent
    #[arg(short = 's', long)]
    volumestep: Option<u8>,

    /// lircd socket path
    #[arg(short, long)]
    lircsocket: Option<String>,

    /// Maximum seconds between presses of a multi-press command
    #[arg(short = 't', long)]
    keytimespan: Option<u64>,

    /// Command run when power off is confirmed
    #[arg(short = 'C', long)]
    powercmd: Option<String>,

    /// Presses needed to run the power command
    #[arg(short = 'r', long)]
    powerrepeat: Option<u32>,

    /// Show log targets
    #[arg(short, long)]
    verbose: bool,

    /// Shortcut for --log-level debug
    #[arg(short, long)]
    debug: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Read events from an interactive prompt instead of lircd
    ///
    /// System commands (power off) are logged, not run.
    #[arg(long)]
    console: bool,

    /// Print the configured playlists and exit
    #[arg(long)]
    list_playlists: bool,
}

impl Args {
    /// Command-line values win over the configuration file
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.hostname {
            config.mpd.host = host.clone();
        }
        if let Some(port) = self.port {
            config.mpd.port = port;
        }
        if let Some(password) = &self.password {
            config.mpd.password = Some(password.clone());
        }
        if let Some(tries) = self.maxtries {
            config.mpd.max_tries = tries;
        }
        if let Some(repeat) = self.updaterepeat {
            config.mpd.update_repeat = repeat;
        }
        if let Some(step) = self.volumestep {
            config.mpd.volume_step = step;
        }
        if let Some(socket) = &self.lircsocket {
            config.lirc.socket = socket.clone();
        }
        if let Some(span) = self.keytimespan {
            config.lirc.key_timespan = span;
        }
        if let Some(command) = &self.powercmd {
            config.system.power_command = Some(command.clone());
        }
        if let Some(repeat) = self.powerrepeat {
            config.system.power_repeat = repeat;
        }
    }

    fn log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(args.log_level(), args.verbose)?;

    info!("Starting irmpc v{}...", env!("CARGO_PKG_VERSION"));

    let (config_watcher, mut config) = match &args.config {
        Some(path) => {
            info!("Configuration file: {}", path.display());
            let (watcher, config) = ConfigWatcher::new(path.clone()).await?;
            info!("Configuration loaded successfully with hot-reload enabled");
            (Some(watcher), config)
        }
        None => {
            info!("No configuration file given, using defaults");
            (None, AppConfig::default())
        }
    };

    args.apply(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;

    if args.list_playlists {
        print_playlists(&config);
        return Ok(());
    }

    log_effective_config(&config);

    let mut dispatcher = Dispatcher::from_config(
        &config,
        connector_for(&config.mpd),
        executor_for(args.console),
    );

    let source: Box<dyn EventSource> = if args.console {
        Box::new(ConsoleSource::spawn()?)
    } else {
        Box::new(LircSource::connect(&config.lirc).await?)
    };

    if let Some(slot) = config.startup_playlist {
        if let Err(e) = dispatcher.load_slot(slot).await {
            warn!("⚠️  Startup playlist not loaded: {:#}", e);
        }
    }

    run_app(
        dispatcher,
        source,
        config,
        config_watcher,
        &args,
        shutdown_signal(),
    )
    .await?;

    info!("irmpc shutdown complete");
    Ok(())
}

async fn run_app(
    mut dispatcher: Dispatcher,
    mut source: Box<dyn EventSource>,
    mut config: AppConfig,
    mut config_watcher: Option<ConfigWatcher>,
    args: &Args,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    info!(
        "🎵 Ready, waiting for {} events ({} playlists, {} tries per command)",
        source.name(),
        dispatcher.directory().len(),
        dispatcher.settings().max_tries
    );

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            // One event at a time; the command finishes before the next read
            event = source.next_event() => {
                match event {
                    Ok(Some(event)) => {
                        if event.trim().is_empty() {
                            continue;
                        }
                        debug!("Received event: {}", event);
                        if let Err(e) = dispatcher.handle_event(&event).await {
                            warn!("⚠️  {:#}", e);
                        }
                    }
                    Ok(None) => {
                        info!("{} input ended", source.name());
                        break;
                    }
                    Err(e) => {
                        error!("❌ {} input failed: {:#}", source.name(), e);
                        break;
                    }
                }
            }

            // Handle config reload
            Some(mut new_config) = next_config(&mut config_watcher) => {
                info!("📝 Configuration file changed, reloading...");

                args.apply(&mut new_config);
                if let Err(e) = new_config.validate() {
                    warn!("⚠️  Failed to reload config (keeping old config): {:#}", e);
                    continue;
                }

                if !config.mpd.same_endpoint(&new_config.mpd) {
                    dispatcher.reconfigure_player(
                        connector_for(&new_config.mpd),
                        new_config.mpd.password.clone(),
                    );
                }
                dispatcher.apply_config(&new_config);
                source.update_keymap(&new_config.lirc.keymap);

                config = new_config;
                log_effective_config(&config);
                info!("✅ Configuration reloaded successfully");
            }

            // Handle shutdown signal
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    dispatcher.shutdown();

    Ok(())
}

fn connector_for(mpd: &MpdConfig) -> Arc<dyn PlayerConnector> {
    Arc::new(MpdConnector::new(mpd.host.clone(), mpd.port, mpd.timeout()))
}

/// Next reloaded config, or never when running without a config file
async fn next_config(watcher: &mut Option<ConfigWatcher>) -> Option<AppConfig> {
    match watcher {
        Some(watcher) => watcher.next_config().await,
        None => std::future::pending().await,
    }
}

fn log_effective_config(config: &AppConfig) {
    debug!(
        host = %config.mpd.host,
        port = config.mpd.port,
        max_tries = config.mpd.max_tries,
        volume_step = config.mpd.volume_step,
        update_repeat = config.mpd.update_repeat,
        key_timespan = config.lirc.key_timespan,
        power_repeat = config.system.power_repeat,
        "Effective options"
    );

    let directory = config.playlist_directory();
    debug!("{} playlists configured", directory.len());
    for entry in directory.iter() {
        debug!("{}", entry);
    }
}

fn print_playlists(config: &AppConfig) {
    use colored::*;

    let directory = config.playlist_directory();

    println!("\n{}", "=== Configured Playlists ===".bold().cyan());

    if directory.is_empty() {
        println!("  {}", "(none)".yellow());
        return;
    }

    for entry in directory.iter() {
        let line = entry.to_string();
        if config.startup_playlist == Some(entry.slot) {
            println!("{}  {}", line.green().bold(), "[startup]".cyan());
        } else {
            println!("{}", line.green());
        }
    }

    println!(
        "\n  Total playlists: {}",
        directory.len().to_string().green()
    );
}

fn init_logging(level: &str, show_target: bool) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(show_target)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
