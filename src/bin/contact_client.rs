//! Contact test client
//!
//! Sends one fixed message to a running Contact service and prints the
//! response as JSON. Target is read from `CONTACT_CLIENT_HOST`,
//! `CONTACT_CLIENT_PORT` and `CONTACT_CLIENT_TIMEOUT_SECS`.

use anyhow::Context;
use contact_relay::config::ClientConfig;
use contact_relay::proto::contact::contact_client::ContactClient;
use contact_relay::proto::contact::PostMessageRequest;
use tonic::Request;
use tracing::{debug, Level};
use tracing_subscriber::fmt;

const SAMPLE_MESSAGE: &str = "This does not please me.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let config = ClientConfig::from_env()?;
    let endpoint = config.endpoint_uri();
    debug!("Connecting to {}", endpoint);

    let mut client = ContactClient::connect(endpoint.clone())
        .await
        .with_context(|| format!("could not connect to {}", endpoint))?;

    let mut request = Request::new(PostMessageRequest {
        message: SAMPLE_MESSAGE.to_string(),
    });
    request.set_timeout(config.timeout());

    let response = client.post_message(request).await?.into_inner();
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}
