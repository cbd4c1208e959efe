mod builder;
mod output;
mod state;

use std::fmt::{self, Debug};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chatroom_model::{Message, MessageId};
use tokio::runtime::Handle;
use tracing::Instrument;

use crate::service_client::{PostResult, ServiceClient};
use crate::transcript::Transcript;
pub use builder::ChatRoomBuilder;
pub use output::Output;
use state::{ChatRoomState, Notice, Submission};
pub use state::StaleReplyPolicy;

/// A conversation with a chat service.
///
/// The chat room owns the transcript and is the only thing that changes
/// it. Every change is announced to the bound [`Output`], which is how a
/// presentation layer learns what to display.
///
/// Submitting a message appends it to the transcript and announces the
/// new transcript right away, on the caller's stack, before the service is
/// even called. The exception is when announcements are already being
/// made, by another thread or by a handler calling back into the room:
/// the new transcript is then announced right after those, so snapshots
/// always arrive in the order the transcript changed.
///
/// The service is then called in the background with the whole
/// transcript. Its reply replaces the transcript and is announced
/// again. If the call fails, the error is announced instead and the
/// submitted message stays in the transcript, unanswered.
///
/// Submissions are not serialized. If a message is submitted while an
/// earlier call is still in flight, both calls proceed, and by default the
/// one that resolves last decides the transcript. See
/// [`StaleReplyPolicy`] for the alternative.
///
/// The handle is cheap to clone. Calls still in flight when the last
/// handle is dropped have their replies discarded.
#[derive(Clone)]
pub struct ChatRoom {
    inner: Arc<Inner>,
}

struct Inner {
    service_client: ServiceClient,
    stale_reply_policy: StaleReplyPolicy,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
    runtime: Handle,
    state: Mutex<ChatRoomState>,
}

impl ChatRoom {
    /// Submits a user message.
    ///
    /// The text is taken verbatim, empty text included. Returns the id of
    /// the message added to the transcript.
    pub fn submit<S: Into<String>>(&self, text: S) -> MessageId {
        let message = Message::user(text);
        let message_id = message.id();

        let Submission {
            request_id,
            transcript,
        } = self.inner.lock_state().submit(message);
        debug!("submitted message {message_id} as request #{request_id}");

        self.inner.deliver();

        let post_fut = self.inner.service_client.post(transcript.messages());

        let inner = Arc::downgrade(&self.inner);
        self.inner.runtime.spawn(
            async move {
                let result = post_fut.await;
                let Some(inner) = inner.upgrade() else {
                    warn!("chat room has been dropped, discard the reply");
                    return;
                };
                inner.finish_request(request_id, result);
            }
            .instrument(trace_span!("post", request_id)),
        );

        message_id
    }

    /// Binds the output that receives subsequent events.
    ///
    /// Only one output is bound at a time. Binding a new one silently
    /// replaces the previous one, which won't receive anything afterwards.
    pub fn bind_output(&self, output: Output) {
        self.inner.lock_state().bind_output(Some(Arc::new(output)));
    }

    /// Unbinds the current output, if any.
    pub fn unbind_output(&self) {
        self.inner.lock_state().bind_output(None);
    }

    /// Returns the current transcript.
    #[inline]
    pub fn transcript(&self) -> Transcript {
        self.inner.lock_state().transcript().clone()
    }

    /// Returns the description of the most recent error, if any.
    ///
    /// The error is kept after later successful replies.
    #[inline]
    pub fn last_error(&self) -> Option<String> {
        self.inner.lock_state().last_error().map(ToOwned::to_owned)
    }

    /// Returns the version of the current transcript, which increases by
    /// one on every change.
    #[inline]
    pub fn version(&self) -> u64 {
        self.inner.lock_state().version()
    }

    /// Returns the number of service calls that haven't resolved yet.
    #[inline]
    pub fn in_flight_requests(&self) -> usize {
        self.inner.lock_state().in_flight()
    }
}

impl Debug for ChatRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("ChatRoom")
            .field("messages", &state.transcript().len())
            .field("version", &state.version())
            .field("in_flight", &state.in_flight())
            .field("stale_reply_policy", &self.inner.stale_reply_policy)
            .finish_non_exhaustive()
    }
}

impl Inner {
    #[inline]
    fn lock_state(&self) -> MutexGuard<'_, ChatRoomState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish_request(&self, request_id: u64, result: PostResult) {
        self.lock_state().finish_request(
            request_id,
            result,
            self.stale_reply_policy,
        );
        self.deliver();
    }

    /// Delivers pending notices in order, with the state unlocked so that
    /// handlers may call back into the room.
    ///
    /// Only one thread delivers at a time. Notices queued by others in the
    /// meantime, including by handlers themselves, are delivered by that
    /// thread before it returns.
    fn deliver(&self) {
        if !self.lock_state().start_delivery() {
            trace!("notices are being delivered elsewhere");
            return;
        }
        loop {
            let next = self.lock_state().next_delivery();
            let Some((notice, output)) = next else {
                break;
            };
            match notice {
                Notice::Output(event) => {
                    if let Some(output) = output {
                        output.emit(&event);
                    }
                }
                Notice::Idle => {
                    trace!("no more requests in flight");
                    if let Some(on_idle) = &self.on_idle {
                        on_idle();
                    }
                }
            }
        }
    }
}
