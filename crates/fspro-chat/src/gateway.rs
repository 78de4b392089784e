//! The two calls made to the remote responder.
//!
//! Transport is supplied by the platform (see the browser crate's HTTP
//! gateway); this module owns the request shapes and turns raw
//! status/body pairs into normalized outcomes.

use async_trait::async_trait;
use fspro_types::{
    ChatReply, ChatRequest, ChatResponse, NetworkError, SessionId, SummarizeRequest,
    SummarizeResponse,
};
use std::rc::Rc;

use crate::title::normalize_summary;

#[async_trait(?Send)]
pub trait ChatGateway {
    /// `POST /chat`. Any failure is a [`NetworkError`]; callers do not distinguish causes.
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, NetworkError>;

    /// `POST /summarize-title`
    async fn summarize_title(&self, session_id: &SessionId) -> Result<String, NetworkError>;
}

#[async_trait(?Send)]
impl<G: ChatGateway + ?Sized> ChatGateway for Rc<G> {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, NetworkError> {
        (**self).send_message(text, session_id).await
    }

    async fn summarize_title(&self, session_id: &SessionId) -> Result<String, NetworkError> {
        (**self).summarize_title(session_id).await
    }
}

/// Build the `/chat` body. Locally minted ids are never sent.
pub fn chat_request(text: &str, session_id: Option<&SessionId>) -> ChatRequest {
    ChatRequest {
        message: text.to_string(),
        session_id: session_id.filter(|id| id.is_remote()).cloned(),
    }
}

pub fn summarize_request(session_id: &SessionId) -> SummarizeRequest {
    SummarizeRequest {
        session_id: session_id.clone(),
    }
}

/// Normalize a `/chat` response
pub fn parse_chat_response(status: u16, body: &str) -> Result<ChatReply, NetworkError> {
    check_status(status, body)?;

    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))?;

    if response.session_id.as_str().trim().is_empty() {
        return Err(NetworkError::Decode("empty session_id".to_string()));
    }

    Ok(response.into())
}

/// Normalize a `/summarize-title` response
pub fn parse_summarize_response(status: u16, body: &str) -> Result<String, NetworkError> {
    check_status(status, body)?;

    let response: SummarizeResponse =
        serde_json::from_str(body).map_err(|e| NetworkError::Decode(e.to_string()))?;

    normalize_summary(&response.title)
        .ok_or_else(|| NetworkError::Decode("empty title".to_string()))
}

fn check_status(status: u16, body: &str) -> Result<(), NetworkError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(NetworkError::Status {
            status,
            body: body.chars().take(200).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_chat_request_drops_local_ids() {
        let local = SessionId::local();
        assert_eq!(chat_request("hi", Some(&local)).session_id, None);

        let remote = SessionId::from("abc");
        assert_eq!(chat_request("hi", Some(&remote)).session_id, Some(remote));
        assert_eq!(chat_request("hi", None).session_id, None);
    }

    #[test]
    fn test_parse_chat_success() {
        let reply = parse_chat_response(200, r#"{"session_id":"abc","response":"<p>Hi</p>"}"#).unwrap();
        assert_eq!(
            reply,
            ChatReply {
                session_id: SessionId::from("abc"),
                markup: "<p>Hi</p>".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_chat_non_success_status() {
        let err = parse_chat_response(400, r#"{"detail":"Empty message"}"#).unwrap_err();
        assert!(matches!(err, NetworkError::Status { status: 400, .. }));
    }

    #[test]
    fn test_parse_chat_bad_body() {
        assert!(matches!(
            parse_chat_response(200, "<html>gateway timeout</html>"),
            Err(NetworkError::Decode(_))
        ));
        assert!(matches!(
            parse_chat_response(200, r#"{"session_id":"","response":"x"}"#),
            Err(NetworkError::Decode(_))
        ));
    }

    #[test]
    fn test_parse_summarize() {
        assert_eq!(
            parse_summarize_response(200, r#"{"title":" Sorting in Rust "}"#).unwrap(),
            "Sorting in Rust"
        );
        assert!(parse_summarize_response(200, r#"{"title":""}"#).is_err());
        assert!(parse_summarize_response(500, "boom").is_err());
    }
}
