//! Contact Relay Library
//!
//! Core of the Contact service: accepts free-text customer messages over gRPC,
//! wraps each one in a Messaging envelope, and forwards it to the Messaging
//! service. Downstream failures are logged and never reach the caller.
//!
//! # Modules
//! - `proto`: Wire types and generated gRPC stubs
//! - `envelope`: Inbound message to envelope translation
//! - `messaging`: Downstream Messaging client
//! - `grpc`: Contact service implementations (relay and echo)
//! - `server`: Listener, serving, and shutdown
//! - `config`: Configuration management
//!
//! # Example
//! ```no_run
//! use contact_relay::{config::Config, server};
//!
//! async fn start() {
//!     let config = Config::new().expect("Failed to load configuration");
//!     server::run(config).await.expect("Contact service failed");
//! }
//! ```
//!
//! # License
//! Licensed under the AGPLv3 license.

pub mod config;
pub mod envelope;
pub mod grpc;
pub mod messaging;
pub mod proto;
pub mod server;
