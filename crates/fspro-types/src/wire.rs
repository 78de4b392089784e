use serde::{Deserialize, Serialize};

use crate::SessionId;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<SessionId>,
}

/// Response of `POST /chat`; `response` is HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: SessionId,
    pub response: String,
}

/// Body of `POST /summarize-title`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub session_id: SessionId,
}

/// Response of `POST /summarize-title`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub title: String,
}

/// A successful reply, as handed to the session store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub session_id: SessionId,
    pub markup: String,
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        Self {
            session_id: response.session_id,
            markup: response.response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serializes_null_session() {
        let req = ChatRequest {
            message: "Hello".to_string(),
            session_id: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"message":"Hello","session_id":null}"#);
    }

    #[test]
    fn test_chat_response_deserialize() {
        let json = r#"{"session_id":"abc","response":"<p>Hi</p>"}"#;
        let reply: ChatReply = serde_json::from_str::<ChatResponse>(json).unwrap().into();
        assert_eq!(reply.session_id.as_str(), "abc");
        assert_eq!(reply.markup, "<p>Hi</p>");
    }

    #[test]
    fn test_summarize_request_serialize() {
        let req = SummarizeRequest {
            session_id: SessionId::from("abc"),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""session_id":"abc""#));
    }
}
