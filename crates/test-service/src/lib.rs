//! A local fake chat service for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chatroom_model::{
    ChatService, ChatServiceError, ErrorKind, Message, Role,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl ChatServiceError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A local fake chat service for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// service should answer each user turn. The preset is selected by the
/// number of user messages in the request, so the first user message gets
/// the first preset, and so on. If there is no preset for a turn, an error
/// will be returned.
///
/// Every request is recorded and can be inspected with
/// [`TestChatService::requests`]. Clones share the same record.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestChatService {
    script: Vec<PresetReply>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl TestChatService {
    /// Adds the preset for the next user turn.
    #[inline]
    pub fn add_reply(&mut self, preset: PresetReply) {
        self.script.push(preset);
    }

    /// Sets the delay for presets that don't specify one.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ChatService for TestChatService {
    type Error = crate::Error;

    fn post(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static
    {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(messages.to_vec());

        let user_turns = messages
            .iter()
            .filter(|msg| msg.role() == Role::User)
            .count();
        let preset = user_turns
            .checked_sub(1)
            .and_then(|idx| self.script.get(idx))
            .cloned();
        let delay = preset
            .as_ref()
            .and_then(PresetReply::delay)
            .or(self.delay)
            .unwrap_or(Duration::from_millis(1));
        let mut messages = messages.to_vec();

        async move {
            sleep(delay).await;

            let Some(preset) = preset else {
                return Err(Error {
                    message: "no preset reply for this turn".to_owned(),
                    kind: ErrorKind::Other,
                });
            };
            if let Some(failure) = preset.failure {
                return Err(Error {
                    message: failure.message,
                    kind: failure.kind,
                });
            }

            let replies = preset.replies.into_iter().map(Message::assistant);
            messages.extend(replies);
            Ok(messages)
        }
    }
}
