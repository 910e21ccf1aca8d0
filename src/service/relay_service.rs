use axum::http::header;
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::UpstreamChatRequest;

/// Opens streaming chat requests against the upstream service. Holds no
/// per-request state; one instance is shared by every handler.
#[derive(Clone)]
pub struct RelayService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    user: String,
}

impl RelayService {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        user: String,
    ) -> Self {
        Self { http, base_url, api_key, user }
    }

    /// Validates the query, then opens the upstream streaming request.
    ///
    /// Returns the still-open [`reqwest::Response`] on success so the route
    /// layer can pipe its body through unchanged. Any failure before the
    /// first streamed byte comes back as an [`AppError`] and no partial
    /// stream is ever delivered.
    pub async fn open_stream(
        &self,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        if query.trim().is_empty() {
            return Err(AppError::empty_field("q"));
        }
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AppError::MissingCredential { name: "DIFY_API_KEY" })?;

        let url = format!("{}/chat-messages", self.base_url.trim_end_matches('/'));
        let payload = UpstreamChatRequest::streaming(query, &self.user, conversation_id);

        debug!(url, has_conversation = conversation_id.is_some(), "POST (chat-messages)");

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .header(header::ACCEPT, "text/event-stream")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach upstream at {url}: {e}");
                AppError::UpstreamUnreachable(e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Upstream rejected chat request: {status} {body}");
            return Err(AppError::UpstreamRejected { status, body });
        }

        Ok(response)
    }
}
