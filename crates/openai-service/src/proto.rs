use chatroom_model::{ErrorKind, Message, Role};
use serde::{Deserialize, Serialize};

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: ResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub refusal: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
struct ErrorDetail {
    message: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RequestMessage {
    role: &'static str,
    content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<RequestMessage>,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    messages: &[Message],
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    let system_prompt = config.system_prompt.as_ref().map(|prompt| {
        RequestMessage {
            role: Role::System.as_str(),
            content: prompt.clone(),
        }
    });
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: system_prompt
            .into_iter()
            .chain(messages.iter().map(create_message))
            .collect(),
        stream: false,
    }
}

#[inline]
fn create_message(msg: &Message) -> RequestMessage {
    RequestMessage {
        role: msg.role().as_str(),
        content: msg.content().to_owned(),
    }
}

/// Appends the assistant messages in `completion` to `messages`.
pub fn append_reply(
    mut messages: Vec<Message>,
    completion: ChatCompletion,
) -> Result<Vec<Message>, Error> {
    let mut choices = completion.choices;
    if choices.is_empty() {
        return Err(Error::new(
            format!("Completion {} has no choices", completion.id),
            ErrorKind::MalformedResponse,
        ));
    }
    choices.sort_by_key(|choice| choice.index);

    let sent = messages.len();
    for choice in choices {
        trace!(
            "choice {} finished with {:?}",
            choice.index, choice.finish_reason
        );
        let ResponseMessage { content, refusal } = choice.message;
        // A refusal takes the place of the content.
        if let Some(text) = content.or(refusal) {
            messages.push(Message::assistant(text));
        }
    }

    if messages.len() == sent {
        return Err(Error::new(
            format!("Completion {} has no content", completion.id),
            ErrorKind::MalformedResponse,
        ));
    }
    Ok(messages)
}

/// Describes a non-successful response for the user.
pub fn describe_rejection(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(body) => format!("{} (HTTP {status})", body.error.message),
        Err(_) => format!("The service responded with HTTP {status}"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::OpenAIConfigBuilder;

    #[test]
    fn test_create_request() {
        let messages = vec![
            Message::user("Hello"),
            Message::assistant("Hi there!"),
            Message::user(""),
        ];
        let config = OpenAIConfigBuilder::with_api_key("xxx")
            .with_model("custom")
            .with_system_prompt("You are a helpful assistant.")
            .build();

        let request = create_request(&messages, &config);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "custom",
                "messages": [
                    {
                        "role": "system",
                        "content": "You are a helpful assistant."
                    },
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi there!" },
                    { "role": "user", "content": "" }
                ],
                "stream": false
            })
        );
    }

    #[test]
    fn test_create_request_without_system_prompt() {
        let config = OpenAIConfigBuilder::with_api_key("xxx").build();
        let request = create_request(&[Message::user("Hello")], &config);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
    }

    #[test]
    fn test_append_reply() {
        let completion: ChatCompletion = serde_json::from_str(include_str!(
            "../fixtures/test_completion.json"
        ))
        .unwrap();
        let sent = vec![Message::user("Hello")];

        let messages = append_reply(sent.clone(), completion).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], sent[0]);
        assert_eq!(messages[1].role(), Role::Assistant);
        assert_eq!(
            messages[1].content(),
            "Hi there! How can I help you today?"
        );
    }

    #[test]
    fn test_append_multiple_choices() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "choices": [
                {
                    "index": 1,
                    "message": { "content": "second" },
                    "finish_reason": "stop"
                },
                {
                    "index": 0,
                    "message": { "content": null, "refusal": "I can't." },
                    "finish_reason": "stop"
                }
            ]
        }))
        .unwrap();

        let messages = append_reply(vec![], completion).unwrap();
        let contents: Vec<_> =
            messages.iter().map(Message::content).collect();
        assert_eq!(contents, ["I can't.", "second"]);
    }

    #[test]
    fn test_malformed_reply() {
        let completion: ChatCompletion =
            serde_json::from_value(json!({ "id": "chatcmpl-2", "choices": [] }))
                .unwrap();
        let err = append_reply(vec![], completion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);

        let completion: ChatCompletion = serde_json::from_value(json!({
            "id": "chatcmpl-3",
            "choices": [{ "message": { "content": null } }]
        }))
        .unwrap();
        let err = append_reply(vec![], completion).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_describe_rejection() {
        let description =
            describe_rejection(401, include_str!("../fixtures/test_error.json"));
        assert!(description.starts_with("Incorrect API key provided"));
        assert!(description.ends_with("(HTTP 401)"));

        assert_eq!(
            describe_rejection(502, "<html>Bad Gateway</html>"),
            "The service responded with HTTP 502"
        );
    }
}
