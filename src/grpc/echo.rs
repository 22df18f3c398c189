use tonic::{Request, Response, Status};
use tracing::debug;

use crate::proto::contact::{contact_server::Contact, PostMessageRequest, PostMessageResponse};

/// Contact service that answers with the request it received.
///
/// Makes no downstream call; used to exercise callers locally without a
/// Messaging deployment.
#[derive(Debug, Default, Clone)]
pub struct EchoContact;

#[tonic::async_trait]
impl Contact for EchoContact {
    async fn post_message(
        &self,
        request: Request<PostMessageRequest>,
    ) -> Result<Response<PostMessageResponse>, Status> {
        let request = request.into_inner();
        debug!("Echoing contact message: {:?}", request.message);

        Ok(Response::new(PostMessageResponse {
            echoed_request: Some(request),
        }))
    }
}
