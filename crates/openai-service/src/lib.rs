//! A chat service for OpenAI-compatible APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use chatroom_model::{ChatService, ChatServiceError, ErrorKind, Message};
use mime::Mime;
use reqwest::{Client, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};
use proto::ChatCompletion;

/// Error type for [`OpenAIChatService`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ChatServiceError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// OpenAI-compatible chat service.
///
/// Each post is a single non-streaming `/chat/completions` request. The
/// reply is appended to the posted messages, which keep their ids.
#[derive(Clone, Debug)]
pub struct OpenAIChatService {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIChatService {
    /// Creates a new `OpenAIChatService` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ChatService for OpenAIChatService {
    type Error = Error;

    fn post(
        &self,
        messages: &[Message],
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(messages, &self.config);
        let resp_fut = self
            .client
            .post(format!("{}{}", self.config.base_url, "/chat/completions"))
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::ACCEPT, "application/json")
            .json(&openai_req)
            .send();
        let messages = messages.to_vec();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(
                        format!("{err}"),
                        ErrorKind::Transport,
                    ));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                debug!("request rejected with {status}: {body}");
                return Err(Error::new(
                    proto::describe_rejection(status.as_u16(), &body),
                    ErrorKind::Rejected,
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if let Some(content_type) = content_type {
                let is_json = content_type
                    .parse()
                    .map(|m: Mime| m.subtype() == mime::JSON)
                    .unwrap_or(false);
                if !is_json {
                    return Err(Error::new(
                        format!("Unexpected content type: {content_type}"),
                        ErrorKind::MalformedResponse,
                    ));
                }
            }

            // Here we got a successful response.
            let body = resp.bytes().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            let completion = serde_json::from_slice::<ChatCompletion>(&body)
                .map_err(|err| {
                    Error::new(
                        format!("Invalid completion: {err}"),
                        ErrorKind::MalformedResponse,
                    )
                })?;
            trace!("got completion {}", completion.id);

            proto::append_reply(messages, completion)
        }
    }
}
