#![forbid(unsafe_code)]

mod browser;
mod config;
mod constants;
mod gui;
mod instance;
mod lifecycle;
mod server;
#[cfg(unix)]
mod signals;
mod tray;

use clap::Parser;
use std::sync::mpsc;
use tracing::{Level as TraceLevel, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use constants::app;
use instance::AcquireError;
use lifecycle::{Lifecycle, Phase};

/// Desktop wrapper for the embedded WebDesk demo server
#[derive(Parser, Debug)]
#[command(name = "webdesk", version, about)]
struct Cli {
    /// Port for the embedded web server (overrides the config file, 0 = ephemeral)
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let mut lifecycle = Lifecycle::new();
    info!("{} is starting...", app::NAME);

    let lock = match instance::acquire() {
        Ok(lock) => lock,
        Err(AcquireError::AlreadyRunning { path }) => {
            warn!(path = %path.display(), "{} is already running!", app::NAME);
            notify_already_running();
            lifecycle.advance(Phase::Terminated);
            return Ok(());
        }
        Err(err) => {
            error!(error = ?err, "Cannot prepare the single-instance lock");
            notify_fatal("Cannot prepare the single-instance lock file.");
            return Err(err.into());
        }
    };

    let config = AppConfig::load();
    let port = cli.port.unwrap_or(config.port);

    let server = match server::start(port, config.greeting.clone()) {
        Ok(server) => server,
        Err(err) => {
            error!(error = ?err, "Failed to start embedded server");
            lock.release();
            notify_fatal("Failed to start the embedded web server.");
            return Err(err.into());
        }
    };

    if !tray::is_supported() {
        // Supported terminal path: nothing to wrap without a tray
        warn!("No system tray support, application exiting");
        let mut server = server;
        if let Err(err) = server.shutdown() {
            error!(error = ?err, "Failed to stop embedded server");
        }
        lock.release();
        lifecycle.advance(Phase::Terminated);
        return Ok(());
    }

    let (command_tx, command_rx) = mpsc::channel();
    let state = gui::AppState {
        lifecycle,
        lock: lock.clone(),
        server,
        commands: command_tx,
        command_rx,
    };

    if let Err(err) = gui::run_gui(state) {
        error!(error = ?err, "Status window failed");
        lock.release();
        notify_fatal("Failed to initialize the user interface.");
        return Err(err.into());
    }

    info!("{} terminated", app::NAME);
    Ok(())
}

/// Modal notice shown when another instance holds the lock
fn notify_already_running() {
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Warning)
        .set_title(app::NAME)
        .set_description(format!("{} is already running!", app::NAME))
        .show();
}

/// Modal notice for fatal startup errors, shown before the controlled exit
fn notify_fatal(message: &str) {
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title(app::NAME)
        .set_description(message)
        .show();
}
