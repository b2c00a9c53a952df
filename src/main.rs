//! Vahana - terminal client for the vehicle simulation server
//!
//! Connects, authenticates, prints telemetry as it streams in and forwards
//! commands typed on stdin (admins only; observers are refused locally).
//!
//! ## Usage
//!
//! ```bash
//! VAHANA_PASSWORD=secret vahana --host 10.0.0.5 --user alice --role admin
//! vahana --config vahana.toml --user bob --password secret --command "LIST USERS"
//! ```

mod terminal;

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::Parser;
use crossbeam_channel::{Receiver, select, unbounded};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vahana::{
    ChannelSurface, ClientConfig, Credentials, Result, Role, Session, SurfaceEvent,
    VehicleCommand,
};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_PATH: &str = "vahana.toml";

/// Vehicle telemetry client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Server port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Username (overrides config)
    #[arg(short, long)]
    user: Option<String>,

    /// Password
    #[arg(long, env = "VAHANA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Requested role (overrides config)
    #[arg(short, long, value_enum, ignore_case = true)]
    role: Option<Role>,

    /// Command to send right after connecting (repeatable)
    #[arg(long = "command")]
    commands: Vec<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = load_config(args.config.as_deref())?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vahana={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Vahana v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {} (server {})", source, config.address());

    let credentials = Credentials {
        host: args.host.unwrap_or_else(|| config.connection.host.clone()),
        port: args.port.unwrap_or(config.connection.port),
        username: args
            .user
            .or_else(|| config.credentials.username.clone())
            .unwrap_or_default(),
        password: args.password.unwrap_or_default(),
        role: args.role.unwrap_or(config.credentials.role),
    };
    credentials.validate()?;

    let (surface, events) = ChannelSurface::new();
    let session = Session::connect_with(&credentials, Arc::new(surface), &config.connect_options())?;
    terminal::banner(&session);

    for command in &args.commands {
        submit(&session, command);
    }

    let lines = spawn_stdin_reader();

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(SurfaceEvent::Disconnected) | Err(_) => {
                    terminal::render(&SurfaceEvent::Disconnected);
                    break;
                }
                Ok(event) => terminal::render(&event),
            },
            recv(lines) -> line => match line {
                Ok(line) => submit(&session, &line),
                Err(_) => {
                    info!("Input closed, disconnecting");
                    session.disconnect();
                    for event in events.try_iter() {
                        terminal::render(&event);
                    }
                    break;
                }
            },
        }
    }

    session.wait();
    let stats = session.stats();
    info!(
        "Session ended: {} messages dispatched, {} frames dropped",
        stats.dispatched, stats.dropped
    );
    Ok(())
}

/// Load the explicit config, else `vahana.toml` if present, else defaults.
fn load_config(path: Option<&Path>) -> Result<(ClientConfig, String)> {
    if let Some(path) = path {
        return Ok((ClientConfig::load(path)?, path.display().to_string()));
    }
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        Ok((ClientConfig::load(default_path)?, DEFAULT_CONFIG_PATH.to_string()))
    } else {
        Ok((ClientConfig::default(), "defaults".to_string()))
    }
}

/// Send one command line, reporting failures on the terminal.
fn submit(session: &Session, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    if let Err(e) = session.send_command(VehicleCommand::from(line)) {
        warn!("Command {:?} failed: {}", line, e);
        terminal::render_error(&e);
    }
}

/// Forward stdin lines over a channel so the main loop can also watch events.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    let spawned = thread::Builder::new()
        .name("stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        warn!("Failed to spawn stdin reader: {}", e);
    }
    rx
}
