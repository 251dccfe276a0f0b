//! stdio-bridge
//!
//! Connects to a TCP destination and relays it over this process's stdin and
//! stdout, e.g. as an SSH `ProxyCommand`.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                  STDIO BRIDGE                     │
//!                 │                                                   │
//!   stdin ───────▶│  ┌─────────────┐    ┌───────────┐    ┌────────┐  │
//!                 │  │ StdioStream │◀──▶│ Forwarder │◀──▶│ Dialer │──┼──▶ destination
//!   stdout ◀──────│  └─────────────┘    └───────────┘    └────────┘  │
//!                 │                                                   │
//!                 │  ┌──────────────────────────────────────────────┐ │
//!                 │  │ Server accept loop on SyntheticListener       │ │
//!                 │  │ (parks until shutdown closes the listener)   │ │
//!                 │  └──────────────────────────────────────────────┘ │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! With `--listen ADDR` the same bridge serves TCP clients instead, each one
//! forwarded to the destination.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use stdio_bridge::config::validation::validate_config;
use stdio_bridge::config::{load_config, BridgeConfig, ConfigError};
use stdio_bridge::handler::{CopyForwarder, StdioHandler};
use stdio_bridge::lifecycle::{signals, Shutdown};
use stdio_bridge::net::{Listener, SyntheticListener, TcpAcceptor, TcpDialer};
use stdio_bridge::observability::init_logging;
use stdio_bridge::server::{ForwardToDestination, Server};

#[derive(Parser, Debug)]
#[command(name = "stdio-bridge", version)]
#[command(about = "Relay a TCP connection over stdin/stdout", long_about = None)]
struct Cli {
    /// Destination to connect to (host:port).
    destination: String,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connect timeout in seconds (overrides the config file).
    #[arg(long, value_name = "SECS")]
    connect_timeout: Option<u64>,

    /// Log level or filter directive (overrides the config file; RUST_LOG wins).
    #[arg(long)]
    log_level: Option<String>,

    /// Serve TCP clients on ADDR instead of using stdio.
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("stdio-bridge: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(cli));

    // A blocking stdin read may still be parked; do not wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("stdio-bridge: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli)?;

    if let Err(e) = init_logging(&config.observability.log_level) {
        eprintln!("stdio-bridge: logging disabled: {e}");
    }

    tracing::info!(
        destination = %cli.destination,
        connect_timeout_secs = config.timeouts.connect_secs,
        mode = if cli.listen.is_some() { "listen" } else { "stdio" },
        "stdio-bridge v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let bridge = StdioHandler::new(
        Arc::new(TcpDialer::with_connect_timeout(config.timeouts.connect())),
        Arc::new(CopyForwarder),
    );
    let shutdown = Shutdown::new();
    tokio::spawn(signals::trigger_on_signal(shutdown.clone()));

    if cli.listen.is_some() {
        let acceptor = TcpAcceptor::bind(&config.listener).await?;
        let server = build_server(Arc::new(acceptor), &bridge, &cli.destination, &config);
        server.run(shutdown).await;
        return Ok(());
    }

    let listener = SyntheticListener::new(
        config.listener.network.clone(),
        config.listener.bind_address.clone(),
    );
    let server = build_server(Arc::new(listener), &bridge, &cli.destination, &config);
    let serving = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { server.run(shutdown).await }
    });

    let ctx = match config.timeouts.session() {
        Some(timeout) => shutdown.context().with_timeout(timeout),
        None => shutdown.context(),
    };
    let result = bridge
        .handle(&ctx, tokio::io::stdin(), tokio::io::stdout(), &cli.destination)
        .await;

    shutdown.trigger();
    serving.await?;

    match result {
        Ok(()) => {
            tracing::info!("Session complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Session failed");
            Err(e.into())
        }
    }
}

/// Defaults, then the config file, then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<BridgeConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };

    if let Some(secs) = cli.connect_timeout {
        config.timeouts.connect_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(addr) = &cli.listen {
        config.listener.bind_address = addr.clone();
    }

    // Free-form filter directives are allowed on the command line.
    let level_overridden = cli.log_level.is_some();
    match validate_config(&config) {
        Ok(()) => Ok(config),
        Err(errors) => {
            let errors: Vec<_> = errors
                .into_iter()
                .filter(|e| !(level_overridden && e.field == "observability.log_level"))
                .collect();
            if errors.is_empty() {
                Ok(config)
            } else {
                Err(ConfigError::Validation(errors))
            }
        }
    }
}

fn build_server(
    listener: Arc<dyn Listener>,
    bridge: &StdioHandler,
    destination: &str,
    config: &BridgeConfig,
) -> Server {
    let handler = ForwardToDestination::new(bridge.clone(), destination);
    Server::new(listener, Arc::new(handler))
        .with_session_timeout(config.timeouts.session())
        .with_drain_timeout(config.timeouts.shutdown())
}
