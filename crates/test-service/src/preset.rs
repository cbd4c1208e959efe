use std::time::Duration;

use chatroom_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// A failure that a preset turn answers with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    /// Kind of the returned error.
    pub kind: ErrorKind,
    /// Message of the returned error.
    pub message: String,
}

/// The preset reply for one user turn.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetReply {
    /// Assistant messages appended to the conversation.
    pub replies: Vec<String>,
    /// If set, the request fails with this error instead of replying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<PresetFailure>,
    /// How long the service waits before answering, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl PresetReply {
    /// Creates a `PresetReply` that answers with the specified messages.
    #[inline]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Creates a `PresetReply` that fails with the specified error.
    #[inline]
    pub fn failing<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self {
            failure: Some(PresetFailure {
                kind,
                message: message.into(),
            }),
            ..Default::default()
        }
    }

    /// Sets how long the service waits before answering this turn.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.delay_ms = Some(millis);
        self
    }

    #[inline]
    pub(crate) fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let preset = PresetReply::failing(
            ErrorKind::Transport,
            "network unreachable",
        )
        .with_delay(Duration::from_millis(20));

        let serialized = serde_json::to_value(&preset).unwrap();
        assert_eq!(
            serialized,
            json!({
                "replies": [],
                "failure": {
                    "kind": "transport",
                    "message": "network unreachable"
                },
                "delay_ms": 20
            })
        );

        let deserialized: PresetReply =
            serde_json::from_value(serialized).unwrap();
        assert_eq!(preset, deserialized);
    }

    #[test]
    fn test_huge_delay_saturates() {
        let preset = PresetReply::default().with_delay(Duration::MAX);
        assert_eq!(preset.delay_ms, Some(u64::MAX));
    }

    #[test]
    fn test_deserialize_short_form() {
        let preset: PresetReply =
            serde_json::from_value(json!({ "replies": ["hi there"] }))
                .unwrap();
        assert_eq!(preset, PresetReply::with_replies(["hi there"]));
        assert_eq!(preset.delay(), None);
    }
}
