use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred while calling a chat service.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The service could not be reached, or the connection broke.
    Transport,
    /// The service answered with something that is not a valid reply.
    MalformedResponse,
    /// The service refused the request.
    Rejected,
    /// Any other errors.
    Other,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "Could not reach the service"),
            ErrorKind::MalformedResponse => {
                write!(f, "The service returned a malformed response")
            }
            ErrorKind::Rejected => {
                write!(f, "The service rejected the request")
            }
            ErrorKind::Other => write!(f, "Unknown error"),
        }
    }
}
