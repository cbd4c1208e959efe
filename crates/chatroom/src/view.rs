use std::collections::HashSet;

use chatroom_core::Transcript;
use chatroom_model::{Message, MessageId};

/// What changed between the displayed messages and a new snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes<'a> {
    /// Messages that haven't been displayed yet, oldest first.
    pub added: Vec<&'a Message>,
    /// Displayed messages that are gone from the snapshot.
    pub removed: Vec<MessageId>,
}

/// Tracks which messages a presentation layer has displayed.
///
/// The chat room only hands out whole transcripts. Feeding each snapshot
/// to [`TranscriptView::reconcile`] tells what to add and what to take
/// away, comparing messages by id.
#[derive(Debug, Default)]
pub struct TranscriptView {
    displayed: Vec<MessageId>,
}

impl TranscriptView {
    /// Creates a view with nothing displayed.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the view with `transcript`, after which everything in
    /// `transcript` counts as displayed.
    pub fn reconcile<'a>(
        &mut self,
        transcript: &'a Transcript,
    ) -> Changes<'a> {
        let current: HashSet<_> =
            transcript.iter().map(Message::id).collect();
        let displayed: HashSet<_> = self.displayed.iter().copied().collect();

        let removed = self
            .displayed
            .iter()
            .filter(|id| !current.contains(*id))
            .copied()
            .collect();
        let added = transcript
            .iter()
            .filter(|msg| !displayed.contains(&msg.id()))
            .collect();

        self.displayed = transcript.iter().map(Message::id).collect();
        Changes { added, removed }
    }

    /// Returns the number of displayed messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    /// Returns `true` if nothing is displayed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_messages() {
        let mut view = TranscriptView::new();
        let hello = Message::user("hello");
        let first = Transcript::new().append(hello.clone());

        let changes = view.reconcile(&first);
        assert_eq!(changes.added, [&hello]);
        assert!(changes.removed.is_empty());

        let reply = Message::assistant("hi there");
        let second = Transcript::from(vec![hello.clone(), reply.clone()]);
        let changes = view.reconcile(&second);
        assert_eq!(changes.added, [&reply]);
        assert!(changes.removed.is_empty());
        assert_eq!(view.len(), 2);

        assert_eq!(view.reconcile(&second), Changes::default());
    }

    #[test]
    fn test_same_content_is_a_new_message() {
        let mut view = TranscriptView::new();
        let first = Transcript::new().append(Message::user("again"));
        view.reconcile(&first);

        let second = first.append(Message::user("again"));
        let changes = view.reconcile(&second);
        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].id(), second[1].id());
    }

    #[test]
    fn test_removed_messages() {
        let mut view = TranscriptView::new();
        let a = Message::user("a");
        let b = Message::user("b");
        view.reconcile(&Transcript::from(vec![a.clone(), b.clone()]));

        let reply = Message::assistant("reply a");
        let replaced = Transcript::from(vec![a, reply.clone()]);
        let changes = view.reconcile(&replaced);
        assert_eq!(changes.added, [&reply]);
        assert_eq!(changes.removed, [b.id()]);
        assert_eq!(view.len(), 2);
    }
}
