use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;

use chatroom_model::{ChatServiceError, Message};

use super::output::{Event, Output};
use crate::service_client::PostResult;
use crate::transcript::Transcript;

/// Decides what happens to a successful reply whose request has been
/// superseded, that is, another message was submitted after it.
///
/// Failures are always reported, whatever the policy is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StaleReplyPolicy {
    /// Every successful reply replaces the transcript, so the call that
    /// resolves last wins.
    ///
    /// When two calls overlap and the earlier one resolves last, its reply
    /// replaces a transcript that already contains the later exchange, and
    /// that exchange is lost.
    #[default]
    LastReplyWins,
    /// Successful replies to superseded requests are discarded, only the
    /// reply to the latest request may replace the transcript. Calls are
    /// not cancelled, they still run to completion.
    DiscardSuperseded,
}

pub(super) struct Submission {
    pub request_id: u64,
    pub transcript: Transcript,
}

/// Something to tell the outside world, in the order it happened.
#[derive(Debug)]
pub(super) enum Notice {
    Output(Event),
    Idle,
}

pub(super) struct ChatRoomState {
    transcript: Transcript,
    version: u64,
    last_error: Option<String>,
    output: Option<Arc<Output>>,
    next_request_id: u64,
    in_flight: usize,
    pending: VecDeque<Notice>,
    delivering: bool,
}

impl ChatRoomState {
    #[inline]
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            version: 0,
            last_error: None,
            output: None,
            next_request_id: 1,
            in_flight: 0,
            pending: VecDeque::new(),
            delivering: false,
        }
    }

    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[inline]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    #[inline]
    pub fn bind_output(&mut self, output: Option<Arc<Output>>) {
        if self.output.is_some() {
            debug!("replacing the bound output");
        }
        self.output = output;
    }

    /// Appends the user message and registers a new request for it.
    pub fn submit(&mut self, message: Message) -> Submission {
        let transcript = self.transcript.append(message);
        self.commit(transcript);

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight += 1;

        Submission {
            request_id,
            transcript: self.transcript.clone(),
        }
    }

    pub fn finish_request(
        &mut self,
        request_id: u64,
        result: PostResult,
        policy: StaleReplyPolicy,
    ) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let superseded = request_id + 1 < self.next_request_id;

        match result {
            Ok(_) if superseded
                && policy == StaleReplyPolicy::DiscardSuperseded =>
            {
                warn!(
                    "request #{request_id} has been superseded, discard the \
                     reply"
                );
            }
            Ok(messages) => {
                if superseded {
                    warn!(
                        "reply to superseded request #{request_id} replaces \
                         the transcript"
                    );
                }
                let transcript =
                    mem::take(&mut self.transcript).replace(messages);
                self.commit(transcript);
            }
            Err(err) => {
                let description = describe_error(&*err);
                info!("request #{request_id} failed: {description}");
                self.last_error = Some(description.clone());
                self.pending
                    .push_back(Notice::Output(Event::Error(description)));
            }
        }

        if self.in_flight == 0 {
            self.pending.push_back(Notice::Idle);
        }
    }

    /// Claims the right to deliver pending notices. Returns `false` if
    /// someone else is already delivering them, in which case they will
    /// also deliver the ones queued so far.
    #[inline]
    pub fn start_delivery(&mut self) -> bool {
        !mem::replace(&mut self.delivering, true)
    }

    /// Pops the next notice along with the output bound right now. Ends
    /// the delivery when there is nothing left.
    pub fn next_delivery(&mut self) -> Option<(Notice, Option<Arc<Output>>)> {
        let Some(notice) = self.pending.pop_front() else {
            self.delivering = false;
            return None;
        };
        Some((notice, self.output.clone()))
    }

    #[inline]
    fn commit(&mut self, transcript: Transcript) {
        self.transcript = transcript;
        self.version += 1;
        debug!(
            "transcript is now at version {} with {} messages",
            self.version,
            self.transcript.len()
        );
        self.pending.push_back(Notice::Output(Event::TranscriptChanged(
            self.transcript.clone(),
        )));
    }
}

/// Describes the error for display. Never returns an empty string.
fn describe_error(err: &dyn ChatServiceError) -> String {
    let description = err.to_string();
    if description.trim().is_empty() {
        err.kind().to_string()
    } else {
        description
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::fmt::{self, Display, Formatter};

    use chatroom_model::ErrorKind;

    use super::*;

    #[derive(Debug)]
    struct SilentError;

    impl Display for SilentError {
        fn fmt(&self, _f: &mut Formatter<'_>) -> fmt::Result {
            Ok(())
        }
    }

    impl Error for SilentError {}

    impl ChatServiceError for SilentError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Transport
        }
    }

    fn drain(state: &mut ChatRoomState) -> Vec<Notice> {
        assert!(state.start_delivery());
        let mut notices = vec![];
        while let Some((notice, _)) = state.next_delivery() {
            notices.push(notice);
        }
        notices
    }

    #[test]
    fn test_submit_and_replace() {
        let mut state = ChatRoomState::new();
        let submission = state.submit(Message::user("hello"));
        assert_eq!(submission.request_id, 1);
        assert_eq!(submission.transcript.len(), 1);
        assert_eq!(state.version(), 1);
        assert_eq!(state.in_flight(), 1);

        let reply = vec![Message::user("hello"), Message::assistant("hi")];
        state.finish_request(
            1,
            Ok(reply.clone()),
            StaleReplyPolicy::LastReplyWins,
        );
        assert_eq!(state.transcript().messages(), &reply[..]);
        assert_eq!(state.version(), 2);

        let notices = drain(&mut state);
        assert_eq!(notices.len(), 3);
        assert!(matches!(
            &notices[0],
            Notice::Output(Event::TranscriptChanged(t)) if t.len() == 1
        ));
        assert!(matches!(
            &notices[1],
            Notice::Output(Event::TranscriptChanged(t))
                if t.messages() == &reply[..]
        ));
        assert!(matches!(notices[2], Notice::Idle));
    }

    #[test]
    fn test_failure_keeps_transcript() {
        let mut state = ChatRoomState::new();
        let submission = state.submit(Message::user("hello"));
        drain(&mut state);

        state.finish_request(
            submission.request_id,
            Err(Box::new(SilentError)),
            StaleReplyPolicy::LastReplyWins,
        );
        let notices = drain(&mut state);
        let [Notice::Output(Event::Error(description)), Notice::Idle] =
            &notices[..]
        else {
            panic!("expected an error and idle, got {notices:?}");
        };
        assert_eq!(description, &ErrorKind::Transport.to_string());
        assert_eq!(state.last_error(), Some(description.as_str()));
        assert_eq!(state.transcript(), &submission.transcript);
        assert_eq!(state.version(), 1);
    }

    #[test]
    fn test_superseded_reply() {
        for policy in [
            StaleReplyPolicy::LastReplyWins,
            StaleReplyPolicy::DiscardSuperseded,
        ] {
            let mut state = ChatRoomState::new();
            state.submit(Message::user("a"));
            let latest = state.submit(Message::user("b"));
            drain(&mut state);

            let stale = vec![Message::user("a"), Message::assistant("A")];
            state.finish_request(1, Ok(stale.clone()), policy);
            let notices = drain(&mut state);

            match policy {
                StaleReplyPolicy::LastReplyWins => {
                    assert_eq!(notices.len(), 1);
                    assert_eq!(state.transcript().messages(), &stale[..]);
                }
                StaleReplyPolicy::DiscardSuperseded => {
                    assert!(notices.is_empty());
                    assert_eq!(state.transcript(), &latest.transcript);
                }
            }
        }
    }

    #[test]
    fn test_single_delivery() {
        let mut state = ChatRoomState::new();
        assert!(state.start_delivery());
        assert!(!state.start_delivery());

        // Notices queued mid-delivery go to the current deliverer.
        state.submit(Message::user("a"));
        assert!(state.next_delivery().is_some());
        assert!(state.next_delivery().is_none());
        assert!(state.start_delivery());
    }
}
