use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tonic::{Request, Response, Status};
use tracing::{debug, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::Config;
use crate::envelope::{build_envelope, SenderIdentity};
use crate::messaging::MessagingDispatcher;
use crate::proto::contact::{contact_server::Contact, PostMessageRequest, PostMessageResponse};

pub mod echo;

pub use echo::EchoContact;

/// Implementation of the Contact gRPC service that relays to Messaging.
///
/// Downstream failures never reach the caller: they are logged once and the
/// caller gets the usual empty acknowledgement.
pub struct ContactRelay {
    dispatcher: Arc<dyn MessagingDispatcher>,
    sender: SenderIdentity,
    timeout: Duration,
    workers: Arc<Semaphore>,
    span: Span,
}

impl ContactRelay {
    pub fn new(
        dispatcher: Arc<dyn MessagingDispatcher>,
        sender: SenderIdentity,
        timeout: Duration,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            dispatcher,
            sender,
            timeout,
            workers: Arc::new(Semaphore::new(max_concurrent_requests)),
            span: info_span!("contact_relay"),
        }
    }

    pub fn from_config(dispatcher: Arc<dyn MessagingDispatcher>, config: &Config) -> Self {
        Self::new(
            dispatcher,
            config.relay.sender.clone(),
            config.messaging.timeout(),
            config.server.max_concurrent_requests,
        )
    }

    /// Emits this relay's log records under `span` instead of its own.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn relay(&self, request: PostMessageRequest) {
        let request_id = Uuid::new_v4();
        let envelope = build_envelope(&request, &self.sender);

        debug!(%request_id, bytes = request.message.len(), "Relaying contact message");

        match self.dispatcher.post_message(envelope, self.timeout).await {
            Ok(()) => debug!(%request_id, "Message delivered to messaging service"),
            Err(e) => warn!(
                %request_id,
                target = %self.dispatcher.target(),
                error = %e,
                "Failed to relay message to messaging service"
            ),
        }
    }
}

#[tonic::async_trait]
impl Contact for ContactRelay {
    async fn post_message(
        &self,
        request: Request<PostMessageRequest>,
    ) -> Result<Response<PostMessageResponse>, Status> {
        // The semaphore is never closed, so this only waits for a free slot.
        let _permit = self.workers.acquire().await.ok();

        self.relay(request.into_inner())
            .instrument(self.span.clone())
            .await;

        Ok(Response::new(PostMessageResponse::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{DispatchError, MockMessagingDispatcher};
    use crate::proto::messaging;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    fn request(message: &str) -> Request<PostMessageRequest> {
        Request::new(PostMessageRequest {
            message: message.to_string(),
        })
    }

    fn body_of(envelope: &messaging::PostMessageRequest) -> &str {
        &envelope.customer_message.as_ref().unwrap().body
    }

    fn relay_with(mock: MockMessagingDispatcher) -> ContactRelay {
        ContactRelay::new(Arc::new(mock), SenderIdentity::default(), Duration::from_secs(10), 10)
    }

    #[tokio::test]
    async fn forwards_envelope_with_message_body() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .withf(|envelope, timeout| {
                let message = envelope.customer_message.as_ref().unwrap();
                let sender = message.sender.as_ref().unwrap();
                message.body == "This does not please me."
                    && sender.name == "Mrs."
                    && sender.email == "foo@example.com"
                    && *timeout == Duration::from_secs(10)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let response = relay_with(mock)
            .post_message(request("This does not please me."))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response, PostMessageResponse::default());
    }

    #[tokio::test]
    async fn empty_message_is_forwarded() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .withf(|envelope, _| body_of(envelope).is_empty())
            .times(1)
            .returning(|_, _| Ok(()));

        assert!(relay_with(mock).post_message(request("")).await.is_ok());
    }

    #[tokio::test]
    #[traced_test]
    async fn downstream_failure_is_logged_once_and_swallowed() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .times(1)
            .returning(|_, _| Err(DispatchError::Rpc(Status::unavailable("connection refused"))));
        mock.expect_target()
            .return_const("messaging-service:8080".to_string());

        let response = relay_with(mock).post_message(request("")).await;

        assert_eq!(response.unwrap().into_inner(), PostMessageResponse::default());
        assert!(logs_contain("Failed to relay message to messaging service"));
        assert!(logs_contain("connection refused"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("WARN")).count() {
                1 => Ok(()),
                n => Err(format!("expected one warning, got {}", n)),
            }
        });
    }

    #[tokio::test]
    #[traced_test]
    async fn downstream_timeout_is_swallowed() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .times(1)
            .returning(|_, timeout| Err(DispatchError::Timeout(timeout)));
        mock.expect_target()
            .return_const("messaging-service:8080".to_string());

        let relay = ContactRelay::new(Arc::new(mock), SenderIdentity::default(), Duration::from_secs(2), 10);
        assert!(relay.post_message(request("hello")).await.is_ok());
        assert!(logs_contain("timed out after 2s"));
    }

    #[tokio::test]
    #[traced_test]
    async fn successful_delivery_logs_no_warning() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message().returning(|_, _| Ok(()));

        relay_with(mock).post_message(request("hello")).await.unwrap();
        assert!(!logs_contain("WARN"));
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_under_injected_span() {
        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .returning(|_, _| Err(DispatchError::Rpc(Status::unavailable("down"))));
        mock.expect_target().return_const("messaging-service:8080".to_string());

        let relay = relay_with(mock).with_span(tracing::info_span!("support_inbox"));
        relay.post_message(request("hello")).await.unwrap();

        assert!(logs_contain("support_inbox"));
    }

    #[tokio::test]
    async fn configured_sender_is_used() {
        let mut config = Config::default();
        config.relay.sender = SenderIdentity {
            name: "Support Desk".to_string(),
            email: "support@example.com".to_string(),
        };
        config.messaging.timeout_secs = 3;

        let mut mock = MockMessagingDispatcher::new();
        mock.expect_post_message()
            .withf(|envelope, timeout| {
                let sender = envelope.customer_message.as_ref().unwrap().sender.as_ref().unwrap();
                sender.name == "Support Desk" && *timeout == Duration::from_secs(3)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let relay = ContactRelay::from_config(Arc::new(mock), &config);
        relay.post_message(request("hi")).await.unwrap();
    }

    /// Dispatcher that tracks how many calls are in flight at once.
    struct SlowDispatcher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MessagingDispatcher for SlowDispatcher {
        async fn post_message(
            &self,
            _envelope: messaging::PostMessageRequest,
            _timeout: Duration,
        ) -> Result<(), DispatchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }

        fn target(&self) -> String {
            "slow:0".to_string()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_capped() {
        let dispatcher = Arc::new(SlowDispatcher {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let relay = Arc::new(ContactRelay::new(
            dispatcher.clone(),
            SenderIdentity::default(),
            Duration::from_secs(10),
            3,
        ));

        let calls: Vec<_> = (0..12)
            .map(|i| {
                let relay = relay.clone();
                tokio::spawn(async move { relay.post_message(request(&format!("message {}", i))).await })
            })
            .collect();
        for call in calls {
            assert!(call.await.unwrap().is_ok());
        }

        assert!(dispatcher.peak.load(Ordering::SeqCst) <= 3);
        assert!(dispatcher.peak.load(Ordering::SeqCst) >= 1);
    }
}
