use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil::config::ConfigStore;
use vigil::events::EventBus;
use vigil::focus::{FocusState, RandomWalkSource, TaskList};
use vigil::gaze::TracingNotifier;
use vigil::monitor::{DemoSessionSource, MonitorService, SessionLog};
use vigil::state::AppState;
use vigil::web;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// vigil command line arguments
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about = "A lightweight alertness monitoring agent", long_about = None)]
struct CliArgs {
    /// Listen address (overrides stored config)
    #[arg(short = 'a', long, value_name = "ADDRESS")]
    address: Option<String>,

    /// HTTP port (overrides stored config)
    #[arg(short = 'p', long, value_name = "PORT")]
    http_port: Option<u16>,

    /// Signaling endpoint URL (overrides stored config)
    #[arg(short = 's', long, value_name = "URL")]
    signaling_url: Option<String>,

    /// Camera device path (overrides stored config)
    #[arg(short = 'c', long, value_name = "DEVICE")]
    camera: Option<String>,

    /// Data directory path (default: ~/.vigil)
    #[arg(short = 'd', long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging with CLI arguments
    init_logging(args.log_level, args.verbose);

    tracing::info!("Starting vigil v{}", env!("CARGO_PKG_VERSION"));

    // Determine data directory (CLI arg takes precedence)
    let data_dir = args.data_dir.unwrap_or_else(get_data_dir);
    tracing::info!("Data directory: {}", data_dir.display());
    tokio::fs::create_dir_all(&data_dir).await?;

    // Initialize configuration store
    let db_path = data_dir.join("vigil.db");
    let config_store = ConfigStore::new(&db_path).await?;
    let mut config = (*config_store.get()).clone();

    // Apply CLI argument overrides to config (only if explicitly specified)
    let mut config_updated = false;
    if let Some(addr) = args.address {
        config.web.bind_address = addr;
        config_updated = true;
    }
    if let Some(port) = args.http_port {
        config.web.http_port = port;
        config_updated = true;
    }
    if let Some(url) = args.signaling_url {
        config.signaling.url = url;
        config_updated = true;
    }
    if let Some(device) = args.camera {
        config.camera.device = Some(device);
        config_updated = true;
    }
    if config_updated {
        config_store.set(config.clone()).await?;
    }

    tracing::info!("Signaling endpoint: {}", config.signaling.url);

    // Assemble application state
    let events = Arc::new(EventBus::new());
    let sessions = Arc::new(SessionLog::with_source(&DemoSessionSource::default()));
    let tasks = Arc::new(TaskList::new());
    let focus = Arc::new(FocusState::new(
        &config.pomodoro,
        Box::new(RandomWalkSource::from_entropy()),
    ));
    let notifier = Arc::new(TracingNotifier);
    let monitor = MonitorService::new(
        config_store.clone(),
        events.clone(),
        notifier,
        sessions.clone(),
        focus.clone(),
    );

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(
        config_store,
        monitor.clone(),
        sessions,
        tasks,
        focus,
        events,
        shutdown_tx.clone(),
    );

    // Start the web server
    let addr: SocketAddr = format!("{}:{}", config.web.bind_address, config.web.http_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let router = web::create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let serve_shutdown = shutdown_tx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            let _ = serve_shutdown.send(());
        })
        .await?;

    // Make sure an active session releases the camera on the way out
    if let Err(e) = monitor.stop().await {
        tracing::warn!("Failed to stop monitor during shutdown: {}", e);
    }

    tracing::info!("vigil stopped");
    Ok(())
}

/// Default data directory: ~/.vigil, falling back to /var/lib/vigil
fn get_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".vigil"))
        .unwrap_or_else(|| PathBuf::from("/var/lib/vigil"))
}

/// Initialize the tracing subscriber
fn init_logging(level: LogLevel, verbose: u8) {
    let level = match (level, verbose) {
        (_, v) if v >= 2 => "trace",
        (_, 1) => "debug",
        (LogLevel::Error, _) => "error",
        (LogLevel::Warn, _) => "warn",
        (LogLevel::Info, _) => "info",
        (LogLevel::Debug, _) => "debug",
        (LogLevel::Trace, _) => "trace",
    };

    // Quiet the noisier dependencies unless explicitly overridden
    let default_filter = format!(
        "vigil={level},tower_http=warn,webrtc=warn,sqlx=warn",
        level = level
    );

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
