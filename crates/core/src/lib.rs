//! Core logic of the chat room: the transcript, the conversation
//! controller, and the output binding a presentation layer attaches to.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod chat_room;
mod service_client;
pub mod transcript;

pub use chat_room::{ChatRoom, ChatRoomBuilder, Output, StaleReplyPolicy};
pub use transcript::Transcript;
