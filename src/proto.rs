//! Wire types for the Contact and Messaging services.
//!
//! The message structs mirror the `bobsknobshop.contact.v1` and
//! `bobsknobshop.messaging.v1` protobuf packages field for field. The client
//! and server stubs are generated by `build.rs`.

/// `bobsknobshop.contact.v1`
pub mod contact {
    use serde::Serialize;

    /// Inbound customer message.
    #[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize)]
    pub struct PostMessageRequest {
        #[prost(string, tag = "1")]
        pub message: String,
    }

    /// Acknowledgement returned to the caller. `echoed_request` is only set by
    /// the echo service.
    #[derive(Clone, PartialEq, ::prost::Message, Serialize)]
    pub struct PostMessageResponse {
        #[prost(message, optional, tag = "1")]
        #[serde(skip_serializing_if = "Option::is_none")]
        pub echoed_request: Option<PostMessageRequest>,
    }

    tonic::include_proto!("bobsknobshop.contact.v1.Contact");
}

/// `bobsknobshop.messaging.v1`
pub mod messaging {
    use serde::Serialize;

    #[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize)]
    pub struct Sender {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub email: String,
    }

    #[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize)]
    pub struct CustomerMessage {
        #[prost(string, tag = "1")]
        pub body: String,
        #[prost(message, optional, tag = "2")]
        pub sender: Option<Sender>,
    }

    /// Envelope forwarded to the Messaging service.
    #[derive(Clone, PartialEq, Eq, Hash, ::prost::Message, Serialize)]
    pub struct PostMessageRequest {
        #[prost(message, optional, tag = "1")]
        pub customer_message: Option<CustomerMessage>,
    }

    #[derive(Clone, PartialEq, ::prost::Message, Serialize)]
    pub struct PostMessageResponse {}

    tonic::include_proto!("bobsknobshop.messaging.v1.Messaging");
}
