use serde::{Deserialize, Serialize};

/// Query parameters accepted by `GET /api/chat`.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// The user's query text (URL-decoded by the extractor).
    #[serde(default)]
    pub q: Option<String>,
    /// Opaque upstream conversation identifier, forwarded verbatim.
    #[serde(default)]
    pub cid: Option<String>,
}

/// Request body sent to the upstream `chat-messages` streaming endpoint.
/// `inputs` is always an empty object; the upstream requires the key.
#[derive(Debug, Serialize)]
pub struct UpstreamChatRequest<'a> {
    pub inputs: serde_json::Map<String, serde_json::Value>,
    pub query: &'a str,
    pub response_mode: &'a str,
    pub user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<&'a str>,
}

impl<'a> UpstreamChatRequest<'a> {
    pub fn streaming(query: &'a str, user: &'a str, conversation_id: Option<&'a str>) -> Self {
        Self {
            inputs: serde_json::Map::new(),
            query,
            response_mode: "streaming",
            user,
            conversation_id,
        }
    }
}
