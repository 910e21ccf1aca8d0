use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation transcript. The assistant's in-flight
/// message is the last element and is updated in place while streaming.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Deserialize)]
struct AnswerPayload {
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndPayload {
    conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
}

/// A parsed upstream stream event, keyed by the SSE event name.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Partial or full answer text from `message` / `message_replace`.
    /// Whether it is a delta or the whole answer-so-far is resolved by the
    /// merge algorithm, not here.
    Answer { text: String },
    /// `message_end` — terminal success event.
    End { conversation_id: Option<String> },
    /// Relay-injected `error` event (never sent by the upstream itself).
    Error { message: String },
}

impl StreamEvent {
    /// Maps a named SSE event and its data string onto a [`StreamEvent`].
    ///
    /// Returns `None` for unknown event names and for fragment events whose
    /// payload is malformed or carries no string `answer` — those single
    /// events are dropped and the stream continues. A malformed
    /// `message_end` still ends the stream, it just carries no identifier.
    pub fn parse(event: &str, data: &str) -> Option<StreamEvent> {
        match event {
            "message" | "message_replace" => {
                let payload: AnswerPayload = serde_json::from_str(data).ok()?;
                payload.answer.map(|text| StreamEvent::Answer { text })
            }
            "message_end" => {
                let conversation_id = serde_json::from_str::<EndPayload>(data)
                    .ok()
                    .and_then(|p| p.conversation_id);
                Some(StreamEvent::End { conversation_id })
            }
            "error" => {
                let message = serde_json::from_str::<ErrorPayload>(data)
                    .ok()
                    .and_then(|p| p.error)
                    .unwrap_or_else(|| data.to_string());
                Some(StreamEvent::Error { message })
            }
            _ => None,
        }
    }
}
