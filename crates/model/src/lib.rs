//! Data model shared by the chat room and the services it talks to.
//!
//! This crate establishes the contract between the conversation
//! controller and a remote chat-completion service: what a message looks
//! like, and how a service takes a transcript and hands back the extended
//! one. Implementations of the service live in their own crates, so that
//! the controller can switch between them without modifying its code.
//!
//! Types in this crate don't define any behavior beyond constructing
//! values, instead they are the constraints that the implementors should
//! adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod service;

pub use error::*;
pub use message::*;
pub use service::*;
