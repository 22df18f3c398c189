//! Client side of the downstream Messaging service.
//!
//! The relay talks to Messaging through the [`MessagingDispatcher`] trait so the
//! transport can be swapped out in tests. [`MessagingClient`] is the tonic-backed
//! implementation used in production.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tonic::Request;
use tracing::debug;

use crate::config::MessagingConfig;
use crate::envelope::OutboundEnvelope;
use crate::proto::messaging::messaging_client::MessagingClient as MessagingGrpcClient;

/// Error types for downstream dispatch
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid messaging endpoint {target}: {source}")]
    Endpoint {
        target: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("messaging call timed out after {0:?}")]
    Timeout(Duration),

    #[error("messaging call failed: {0}")]
    Rpc(#[from] tonic::Status),
}

/// Delivers envelopes to the Messaging service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagingDispatcher: Send + Sync {
    /// Sends one envelope. Must not run longer than `timeout`.
    async fn post_message(&self, envelope: OutboundEnvelope, timeout: Duration) -> Result<(), DispatchError>;

    /// `host:port` the dispatcher delivers to, for log records.
    fn target(&self) -> String;
}

/// gRPC client for the Messaging service.
///
/// Holds one lazily connected channel. Cloning the inner client is cheap and
/// the channel multiplexes concurrent calls, so a single instance is shared by
/// every request handler.
#[derive(Debug, Clone)]
pub struct MessagingClient {
    client: MessagingGrpcClient<Channel>,
    target: String,
}

impl MessagingClient {
    /// Creates a client for the configured target. No connection is made until
    /// the first call.
    pub fn new(config: &MessagingConfig) -> Result<Self, DispatchError> {
        let target = config.target();
        let channel = Endpoint::from_shared(config.endpoint_uri())
            .map_err(|source| DispatchError::Endpoint {
                target: target.clone(),
                source,
            })?
            .connect_timeout(config.timeout())
            .connect_lazy();

        debug!("Messaging channel prepared for {}", target);

        Ok(Self {
            client: MessagingGrpcClient::new(channel),
            target,
        })
    }
}

#[async_trait]
impl MessagingDispatcher for MessagingClient {
    async fn post_message(&self, envelope: OutboundEnvelope, timeout: Duration) -> Result<(), DispatchError> {
        let mut client = self.client.clone();
        let mut request = Request::new(envelope);
        request.set_timeout(timeout);

        // The gRPC deadline does not cover a peer that stalls during connection setup.
        tokio::time::timeout(timeout, client.post_message(request))
            .await
            .map_err(|_| DispatchError::Timeout(timeout))??;

        Ok(())
    }

    fn target(&self) -> String {
        self.target.clone()
    }
}
