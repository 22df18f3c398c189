//! Build Script for the Contact Relay
//!
//! Generates the gRPC client and server stubs for the Contact and Messaging
//! services. The message types live in `src/proto.rs` as `prost` derives, so
//! the stubs are described here with `tonic_build::manual` and no `protoc`
//! toolchain is required.
//!
//! # License
//! Licensed under the AGPLv3 license.

use tonic_build::manual::{Builder, Method, Service};

fn post_message(input_type: &str, output_type: &str) -> Method {
    Method::builder()
        .name("post_message")
        .route_name("PostMessage")
        .input_type(input_type)
        .output_type(output_type)
        .codec_path("tonic::codec::ProstCodec")
        .build()
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let contact = Service::builder()
        .name("Contact")
        .package("bobsknobshop.contact.v1")
        .method(post_message(
            "crate::proto::contact::PostMessageRequest",
            "crate::proto::contact::PostMessageResponse",
        ))
        .build();

    let messaging = Service::builder()
        .name("Messaging")
        .package("bobsknobshop.messaging.v1")
        .method(post_message(
            "crate::proto::messaging::PostMessageRequest",
            "crate::proto::messaging::PostMessageResponse",
        ))
        .build();

    Builder::new().compile(&[contact, messaging]);
}
