// # whod - who directory daemon
//
// The whod daemon is responsible for:
// 1. Reading configuration from environment variables and the JSON file
// 2. Initializing logging and the runtime
// 3. Registering providers and building the propagator
// 4. Serving the HTTP routes until SIGINT/SIGTERM
//
// Propagation tasks still in flight at shutdown are abandoned.
//
// ## Example
//
// ```bash
// export WHOAMI_PORT_NUMBER=8080
// export WHO_CONFIG=/etc/who/config.json
// export WHO_VERBOSE=true
//
// whod
// ```

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;
use who_core::WhoConfig;
use whod::config::{DaemonConfig, load_who_config};
use whod::routes::{AppState, router};

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum WhoExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WhoExitCode> for ExitCode {
    fn from(code: WhoExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match DaemonConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WhoExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WhoExitCode::ConfigError.into();
    }

    let who_config = match load_who_config(config.config_path.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return WhoExitCode::ConfigError.into();
        }
    };

    info!("Starting whod daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WhoExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config, who_config).await {
            error!("Daemon error: {:#}", e);
            WhoExitCode::RuntimeError
        } else {
            WhoExitCode::CleanShutdown
        }
    });

    // Do not wait for detached propagation tasks
    rt.shutdown_background();

    result.into()
}

/// Run the daemon
async fn run_daemon(config: DaemonConfig, who_config: WhoConfig) -> Result<()> {
    let propagator = Arc::new(whod::build_propagator(&who_config));
    let app = router(AppState::new(propagator), config.verbose);

    let shutdown = Shutdown::install()?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Starting up on port {}", config.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let signal = shutdown.wait().await;
        info!("Received shutdown signal: {}", signal);
        info!("Shutting down daemon");
    })
    .await
    .context("HTTP server failed")?;

    Ok(())
}

/// Shutdown signal handlers (SIGTERM, SIGINT)
///
/// Installed before serving so a failure to register them is a startup
/// error rather than an immediate shutdown.
#[cfg(unix)]
struct Shutdown {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl Shutdown {
    fn install() -> Result<Self> {
        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for either signal and return its name
    async fn wait(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Shutdown on CTRL-C only
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
struct Shutdown;

#[cfg(not(unix))]
impl Shutdown {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn wait(self) -> &'static str {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to wait for CTRL-C: {}", e);
        }
        "SIGINT"
    }
}
