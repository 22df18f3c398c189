//! Server lifecycle: bind, serve, and shut down.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{info, warn};

use crate::config::{Config, ConfigError, ServerConfig, ServiceMode};
use crate::grpc::{ContactRelay, EchoContact};
use crate::messaging::{DispatchError, MessagingClient};
use crate::proto::contact::contact_server::{Contact, ContactServer};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("gRPC server failed: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("gRPC server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Binds the listening socket. Failing here aborts startup.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serves the configured Contact service on `listener` until `shutdown`
/// resolves, then waits at most the configured grace period for in-flight
/// calls before aborting them.
pub async fn serve<F>(listener: TcpListener, config: &Config, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send,
{
    match config.server.mode {
        ServiceMode::Relay => {
            let dispatcher = Arc::new(MessagingClient::new(&config.messaging)?);
            info!("Relaying to messaging service at {}", config.messaging.target());
            let relay = ContactRelay::from_config(dispatcher, config);
            serve_contact(relay, listener, &config.server, shutdown).await
        }
        ServiceMode::Echo => {
            info!("Echo mode: messages are not forwarded");
            serve_contact(EchoContact, listener, &config.server, shutdown).await
        }
    }
}

async fn serve_contact<S, F>(
    service: S,
    listener: TcpListener,
    config: &ServerConfig,
    shutdown: F,
) -> Result<(), ServerError>
where
    S: Contact,
    F: Future<Output = ()> + Send,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Contact service listening on {}", addr);
    }

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(
        Server::builder()
            .add_service(ContactServer::new(service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                stop_rx.await.ok();
            }),
    );

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = shutdown => info!("Shutdown requested, no longer accepting connections"),
    }

    stop_tx.send(()).ok();

    match tokio::time::timeout(config.shutdown_grace(), &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!("Grace period of {:?} elapsed, aborting in-flight requests", config.shutdown_grace());
            server.abort();
        }
    }

    info!("Contact service stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Validates `config`, binds the listener, and serves until Ctrl+C or SIGTERM.
pub async fn run(config: Config) -> Result<(), ServerError> {
    config.validate()?;
    let listener = bind(&config.server).await?;
    serve(listener, &config, shutdown_signal()).await
}
