//! A terminal chat room that talks to an OpenAI-compatible service.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to reconcile transcript snapshots in your own
//! presentation layer.

#![deny(missing_docs)]

mod view;

pub use view::{Changes, TranscriptView};

/// Re-exports of [`chatroom_core`] crate.
pub mod core {
    pub use chatroom_core::*;
}

/// Re-exports of [`chatroom_model`] crate.
pub mod model {
    pub use chatroom_model::*;
}
