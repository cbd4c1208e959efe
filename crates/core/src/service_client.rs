use std::pin::Pin;
use std::sync::Arc;

use chatroom_model::{ChatService, ChatServiceError, Message};
use tracing::Instrument;

pub type PostResult = Result<Vec<Message>, Box<dyn ChatServiceError>>;
pub type BoxedPostFuture = Pin<Box<dyn Future<Output = PostResult> + Send>>;
type HandlerFn = Arc<dyn Fn(&[Message]) -> BoxedPostFuture + Send + Sync>;

/// A wrapper around a chat service that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ServiceClient {
    handler_fn: HandlerFn,
}

impl ServiceClient {
    #[inline]
    pub fn new<S: ChatService + 'static>(service: S) -> Self {
        // We have to erase the type `S`, since `ServiceClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn =
            Arc::new(move |messages: &[Message]| -> BoxedPostFuture {
                let fut = service.post(messages);
                let sent = messages.len();
                Box::pin(
                    async move {
                        trace!("posting {sent} messages");
                        match fut.await {
                            Ok(messages) => {
                                trace!("got {} messages", messages.len());
                                Ok(messages)
                            }
                            Err(err) => {
                                error!("got an error: {err:?}");
                                Err(Box::new(err) as Box<dyn ChatServiceError>)
                            }
                        }
                    }
                    .instrument(trace_span!("service client post")),
                )
            });
        Self { handler_fn }
    }

    /// Posts the messages to the service.
    ///
    /// The returned future is independent of `messages`, so it can be
    /// spawned right away.
    #[inline]
    pub fn post(
        &self,
        messages: &[Message],
    ) -> BoxedPostFuture {
        (self.handler_fn)(messages)
    }
}
