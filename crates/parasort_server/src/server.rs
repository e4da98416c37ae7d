//! Server setup and lifecycle.

use log::{info, warn};
use parasort_core::{init_logging, init_stderr_logging};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes::create_router;
use crate::state::AppState;

/// Initializes core logging for the configured target.
pub fn init_server_logging(config: &ServerConfig) -> Result<(), ServerError> {
    let result = match config.log_dir.as_deref() {
        Some(dir) => init_logging(&config.log_level, dir),
        None => init_stderr_logging(&config.log_level),
    };
    result.map_err(ServerError::Logging)
}

/// Opens storage, binds the listener and serves until a shutdown signal.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let bind_target = (config.host.clone(), config.port);
    let state = Arc::new(AppState::open(config)?);
    let router = create_router(state);

    let listener = TcpListener::bind(bind_target).await?;
    let addr = listener.local_addr()?;
    info!("event=server_start module=server status=ok addr={addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

/// Entry point for running the server from environment variables.
pub async fn run_from_env() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;
    init_server_logging(&config)?;
    run(config).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("event=signal_install module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(
                    "event=signal_install module=server status=error signal=sigterm error={err}"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("event=server_shutdown module=server status=start signal=ctrl_c");
        },
        () = terminate => {
            info!("event=server_shutdown module=server status=start signal=sigterm");
        },
    }
}
