use std::sync::Mutex;

use chatroom_model::ChatService;
use tokio::runtime::Handle;

use super::state::{ChatRoomState, StaleReplyPolicy};
use super::{ChatRoom, Inner};
use crate::service_client::ServiceClient;

/// [`ChatRoom`] builder.
pub struct ChatRoomBuilder {
    service_client: ServiceClient,
    stale_reply_policy: StaleReplyPolicy,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
    runtime: Option<Handle>,
}

impl ChatRoomBuilder {
    /// Creates a new builder with the specified chat service.
    #[inline]
    pub fn with_chat_service<S: ChatService + 'static>(service: S) -> Self {
        Self {
            service_client: ServiceClient::new(service),
            stale_reply_policy: Default::default(),
            on_idle: None,
            runtime: None,
        }
    }

    /// Attaches a callback to be invoked when a service call resolves and
    /// no other call is in flight.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Sets how replies to superseded requests are handled.
    #[inline]
    pub fn with_stale_reply_policy(mut self, policy: StaleReplyPolicy) -> Self {
        self.stale_reply_policy = policy;
        self
    }

    /// Sets the runtime that service calls are spawned on.
    ///
    /// Use this when the chat room is driven from a thread that is not
    /// part of a Tokio runtime.
    #[inline]
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the chat room.
    ///
    /// # Panics
    ///
    /// Panics if no runtime is set and this is called outside of a Tokio
    /// runtime.
    pub fn build(self) -> ChatRoom {
        let Self {
            service_client,
            stale_reply_policy,
            on_idle,
            runtime,
        } = self;

        let inner = Inner {
            service_client,
            stale_reply_policy,
            on_idle,
            runtime: runtime.unwrap_or_else(Handle::current),
            state: Mutex::new(ChatRoomState::new()),
        };
        ChatRoom {
            inner: inner.into(),
        }
    }
}
