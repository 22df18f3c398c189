//! Translation of inbound contact messages into Messaging envelopes.

use serde::{Deserialize, Serialize};

use crate::proto::contact;
use crate::proto::messaging::{CustomerMessage, PostMessageRequest, Sender};

/// Request forwarded to the Messaging service.
pub type OutboundEnvelope = PostMessageRequest;

/// Who a forwarded message is attributed to.
///
/// Supplied to the relay at construction. The defaults are placeholders
/// until callers carry their own identity.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SenderIdentity {
    pub name: String,
    pub email: String,
}

impl Default for SenderIdentity {
    fn default() -> Self {
        Self {
            name: "Mrs.".to_string(),
            email: "foo@example.com".to_string(),
        }
    }
}

impl From<&SenderIdentity> for Sender {
    fn from(identity: &SenderIdentity) -> Self {
        Sender {
            name: identity.name.clone(),
            email: identity.email.clone(),
        }
    }
}

/// Builds the envelope for one inbound message. The body is copied verbatim,
/// empty strings included.
pub fn build_envelope(request: &contact::PostMessageRequest, sender: &SenderIdentity) -> OutboundEnvelope {
    PostMessageRequest {
        customer_message: Some(CustomerMessage {
            body: request.message.clone(),
            sender: Some(sender.into()),
        }),
    }
}
