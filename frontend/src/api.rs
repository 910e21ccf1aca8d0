/// Base URL of the relay server.
const API_BASE: &str = "http://localhost:3000";

/// Builds the relay URL for one streamed query. The conversation identifier
/// is only attached once the upstream has assigned one.
pub fn stream_url(query: &str, conversation_id: Option<&str>) -> String {
    let mut url = format!("{API_BASE}/api/chat?q={}", urlencoding::encode(query));
    if let Some(cid) = conversation_id {
        url.push_str("&cid=");
        url.push_str(&urlencoding::encode(cid));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_query() {
        assert_eq!(
            stream_url("hello world?", None),
            format!("{API_BASE}/api/chat?q=hello%20world%3F")
        );
    }

    #[test]
    fn attaches_conversation_id_only_when_known() {
        assert!(!stream_url("hi", None).contains("cid="));
        assert_eq!(
            stream_url("hi", Some("c 1")),
            format!("{API_BASE}/api/chat?q=hi&cid=c%201")
        );
    }
}
