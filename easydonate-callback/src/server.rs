//! HTTP and HTTPS listeners.
//!
//! Plain HTTP is served by `axum::serve`. HTTPS accepts TCP connections
//! itself, performs the rustls handshake per connection and hands the stream
//! to hyper.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use rustls::ServerConfig;
use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::tls::{self, TlsError};
use crate::Config;

/// Pause after a failed `accept` (e.g. out of file descriptors), matching
/// `axum::serve`.
pub const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// Bind the configured port and serve `app` until `shutdown` resolves.
///
/// Listens on all interfaces; the configured host only appears in the log.
pub async fn run<F>(config: &Config, app: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    // Load TLS material before binding so misconfiguration fails fast.
    let tls_config = if config.use_https {
        Some(tls::server_config(&config.tls)?)
    } else {
        None
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(
        address = %addr,
        url = %config.public_url(),
        https = config.use_https,
        "server_listening"
    );

    match tls_config {
        Some(tls_config) => serve_tls(listener, app, tls_config, shutdown).await,
        None => serve_plain(listener, app, shutdown).await,
    }
}

/// Serve plain HTTP with graceful shutdown.
pub async fn serve_plain<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serve HTTPS. Stops accepting once `shutdown` resolves.
pub async fn serve_tls<F>(
    listener: TcpListener,
    app: Router,
    tls_config: Arc<ServerConfig>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let acceptor = TlsAcceptor::from(tls_config);
    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    accept_error_backoff(&e).await;
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };

        let acceptor = acceptor.clone();
        let service = TowerToHyperService::new(app.clone());

        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(s) => s,
                Err(e) => {
                    warn!(peer = %peer, error = %e, "tls_handshake_failed");
                    return;
                }
            };

            if let Err(e) = auto::Builder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(TokioIo::new(stream), service)
                .await
            {
                debug!(peer = %peer, error = %e, "tls_connection_error");
            }
        });
    }

    Ok(())
}

async fn accept_error_backoff(error: &io::Error) {
    warn!(
        error = %error,
        backoff_ms = ACCEPT_ERROR_BACKOFF.as_millis() as u64,
        "tcp_accept_failed"
    );
    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
}

/// Create a future that completes when a shutdown signal is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("server_shutting_down");
}
