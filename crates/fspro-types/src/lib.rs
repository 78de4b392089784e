//! Core types and structures for fspro-chat
//!
//! This crate provides the data model shared by the session core and the
//! browser client: messages, conversations, the active-session snapshot,
//! the JSON bodies exchanged with the responder, and the error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

mod error;
mod wire;

pub use error::{ChatError, NetworkError, Result, StorageError};
pub use wire::{ChatReply, ChatRequest, ChatResponse, SummarizeRequest, SummarizeResponse};

// ============================================================================
// Constants
// ============================================================================

/// Title used when summarization fails or returns nothing usable
pub const FALLBACK_TITLE: &str = "Chat History";

/// Provisional title shown while a summarization request is outstanding
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Markup of the synthetic bot message appended when a send fails
pub const ERROR_REPLY_MARKUP: &str =
    r#"<p class="error-text" style="color: var(--error);">❌ Error processing response. Please try again.</p>"#;

/// Prefix of ids minted on the client for conversations the responder never saw
pub const LOCAL_ID_PREFIX: &str = "local-";

// ============================================================================
// Session Identity
// ============================================================================

/// Identifier of a conversation.
///
/// Normally issued by the responder on the first successful exchange. A draft
/// that is flushed without ever getting one is stored under a locally minted
/// id (see [`SessionId::local`]); those never leave the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a client-side id for a conversation with no remote identity
    pub fn local() -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    pub fn is_remote(&self) -> bool {
        !self.is_local()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// A single chat message.
///
/// User text is kept raw and escaped at render time; bot text is markup as
/// delivered by the responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(markup: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: markup.into(),
        }
    }

    /// The synthetic reply recorded when a send fails
    pub fn error_reply() -> Self {
        Self::bot(ERROR_REPLY_MARKUP)
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    pub fn is_error_reply(&self) -> bool {
        self.sender == Sender::Bot && self.text == ERROR_REPLY_MARKUP
    }
}

// ============================================================================
// Conversation Types
// ============================================================================

/// Whether a conversation title may still be replaced by summarization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleState {
    /// Placeholder set on flush, waiting for a summarization result
    Provisional,
    /// Summarized, fallen back, or derived locally; never overwritten again
    #[default]
    Final,
}

/// A named conversation in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: SessionId,
    pub title: String,
    #[serde(default)]
    pub title_state: TitleState,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
}

impl Conversation {
    pub fn title_is_final(&self) -> bool {
        self.title_state == TitleState::Final
    }
}

/// The persisted part of the active session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSnapshot {
    #[serde(default)]
    pub id: Option<SessionId>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ActiveSnapshot {
    pub fn is_empty_draft(&self) -> bool {
        self.id.is_none() && self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_local_ids_are_distinct_and_flagged() {
        let a = SessionId::local();
        let b = SessionId::local();
        assert_ne!(a, b);
        assert!(a.is_local());
        assert!(!a.is_remote());
        assert!(SessionId::from("abc").is_remote());
    }

    #[test]
    fn test_message_serializes_sender_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"sender":"user","text":"hi"}"#);
    }

    #[test]
    fn test_conversation_without_title_state_defaults_to_final() {
        let json = r#"{"id":"abc","title":"Old","messages":[],"last_updated":"2024-01-01T00:00:00Z"}"#;
        let convo: Conversation = serde_json::from_str(json).unwrap();
        assert_eq!(convo.title_state, TitleState::Final);
        assert_eq!(convo.id, SessionId::from("abc"));
    }

    #[test]
    fn test_error_reply_is_recognized() {
        assert!(Message::error_reply().is_error_reply());
        assert!(!Message::bot("<p>fine</p>").is_error_reply());
        assert!(!Message::user(ERROR_REPLY_MARKUP).is_error_reply());
    }

    #[test]
    fn test_empty_draft_snapshot() {
        assert!(ActiveSnapshot::default().is_empty_draft());
        let snapshot = ActiveSnapshot {
            id: None,
            messages: vec![Message::user("x")],
        };
        assert!(!snapshot.is_empty_draft());
    }
}
