//! Transcript-related types.

use std::ops::Index;
use std::slice;
use std::sync::Arc;

use chatroom_model::Message;

/// The ordered message history of a conversation, oldest first.
///
/// A transcript is an immutable value. Every change produces a new
/// transcript, so a snapshot handed to an observer never changes under its
/// feet. Cloning is cheap since the messages are shared.
#[derive(Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct Transcript {
    messages: Arc<[Message]>,
}

impl Transcript {
    /// Creates an empty transcript.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new transcript with `message` added at the end.
    pub fn append(&self, message: Message) -> Self {
        let messages = self
            .messages
            .iter()
            .cloned()
            .chain(Some(message))
            .collect();
        Self { messages }
    }

    /// Returns a transcript made of `messages` alone.
    ///
    /// The old messages are dropped rather than merged, so `messages`
    /// must be the complete sequence.
    #[inline]
    pub fn replace<M: Into<Vec<Message>>>(self, messages: M) -> Self {
        Self::from(messages.into())
    }

    /// Returns the messages in this transcript.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the number of messages.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if there are no messages.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the most recent message.
    #[inline]
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Returns an iterator over the messages, oldest first.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

impl From<Vec<Message>> for Transcript {
    #[inline]
    fn from(messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into(),
        }
    }
}

impl Index<usize> for Transcript {
    type Output = Message;

    #[inline]
    fn index(&self, index: usize) -> &Message {
        &self.messages[index]
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = slice::Iter<'a, Message>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use chatroom_model::Role;

    use super::*;

    #[test]
    fn test_append() {
        let empty = Transcript::new();
        let hello = Message::user("hello");
        let one = empty.append(hello.clone());

        assert!(empty.is_empty());
        assert_eq!(one.len(), 1);
        assert_eq!(one.last(), Some(&hello));

        let reply = Message::assistant("hi there");
        let two = one.append(reply.clone());
        assert_eq!(one.len(), 1);
        assert_eq!(two.messages(), &[hello, reply]);
    }

    #[test]
    fn test_replace() {
        let old = Transcript::new()
            .append(Message::user("a"))
            .append(Message::user("b"));
        let new_messages = vec![Message::user("c")];
        let new = old.clone().replace(new_messages.clone());

        assert_eq!(new.messages(), &new_messages[..]);
        assert_eq!(old.len(), 2);
    }

    #[test]
    fn test_iterate() {
        let transcript = Transcript::from(vec![
            Message::user("hello"),
            Message::assistant("hi there"),
        ]);
        let roles: Vec<_> = transcript.iter().map(Message::role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
        assert_eq!(transcript[1].content(), "hi there");

        let mut count = 0;
        for _ in &transcript {
            count += 1;
        }
        assert_eq!(count, 2);
    }
}
