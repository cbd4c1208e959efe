use std::error::Error;

use crate::error::ErrorKind;
use crate::message::Message;

/// The error type for a chat service.
///
/// The `Display` output of the error is shown to the user as is, so it
/// should be a readable sentence rather than a debug dump.
pub trait ChatServiceError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A remote chat-completion service.
///
/// The service takes the whole conversation so far and returns the whole
/// conversation after its reply, which is the input messages followed by
/// one or more assistant messages. The result is a complete sequence, not
/// a delta, and callers use it to replace what they have.
///
/// Once the service is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the service should be prepared for being dropped anytime.
pub trait ChatService: Send + Sync {
    /// The error type that may be returned by the service.
    type Error: ChatServiceError;

    /// Posts the conversation to the service and waits for its reply.
    ///
    /// The returned future must not borrow `self` or `messages`.
    fn post(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static;
}
