use std::fmt::{self, Debug};

use crate::transcript::Transcript;

type TranscriptChangedFn = Box<dyn Fn(&Transcript) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&str) + Send + Sync>;

/// Callbacks that a presentation layer binds to a [`ChatRoom`].
///
/// `on_transcript_changed` receives the whole transcript every time it
/// changes, never a delta. Working out what to animate between two
/// snapshots is up to the receiver.
///
/// [`ChatRoom`]: super::ChatRoom
#[derive(Default)]
pub struct Output {
    on_transcript_changed: Option<TranscriptChangedFn>,
    on_error: Option<ErrorFn>,
}

impl Output {
    /// Creates an output with no callbacks.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the callback to be invoked when the transcript changes.
    #[inline]
    pub fn on_transcript_changed(
        mut self,
        on_transcript_changed: impl Fn(&Transcript) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript_changed = Some(Box::new(on_transcript_changed));
        self
    }

    /// Sets the callback to be invoked when a service call fails.
    #[inline]
    pub fn on_error(
        mut self,
        on_error: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }

    pub(crate) fn emit(&self, event: &Event) {
        match event {
            Event::TranscriptChanged(transcript) => {
                if let Some(f) = &self.on_transcript_changed {
                    f(transcript);
                }
            }
            Event::Error(description) => {
                if let Some(f) = &self.on_error {
                    f(description);
                }
            }
        }
    }
}

impl Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field(
                "on_transcript_changed",
                &self.on_transcript_changed.is_some(),
            )
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub(crate) enum Event {
    TranscriptChanged(Transcript),
    Error(String),
}
