use std::str::FromStr;

use fspro_types::{ChatError, Result, FALLBACK_TITLE};
use serde::{Deserialize, Serialize};

use crate::formatter::FormatOptions;
use crate::storage::StorageKeys;

fn default_chat_path() -> String {
    "/chat".to_string()
}

fn default_summarize_path() -> String {
    "/summarize-title".to_string()
}

fn default_storage_prefix() -> String {
    "fspro".to_string()
}

fn default_fallback_title() -> String {
    FALLBACK_TITLE.to_string()
}

fn default_assistant_name() -> String {
    "FSPro Assistant".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_markdown() -> bool {
    true
}

/// Client configuration, handed to the browser entry point as JSON.
///
/// Every field is optional; an empty object yields the same-origin defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the responder; empty means same origin as the page
    #[serde(default)]
    pub api_base: String,
    #[serde(default = "default_chat_path")]
    pub chat_path: String,
    #[serde(default = "default_summarize_path")]
    pub summarize_path: String,
    #[serde(default = "default_storage_prefix")]
    pub storage_prefix: String,
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_markdown")]
    pub markdown_user_messages: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            chat_path: default_chat_path(),
            summarize_path: default_summarize_path(),
            storage_prefix: default_storage_prefix(),
            fallback_title: default_fallback_title(),
            assistant_name: default_assistant_name(),
            log_level: default_log_level(),
            markdown_user_messages: default_markdown(),
        }
    }
}

impl ClientConfig {
    /// Parse a JSON config; a blank string means defaults
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json).map_err(|e| ChatError::Config(e.to_string()))
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.api_base, &self.chat_path)
    }

    pub fn summarize_url(&self) -> String {
        join_url(&self.api_base, &self.summarize_path)
    }

    pub fn storage_keys(&self) -> StorageKeys {
        StorageKeys::with_prefix(&self.storage_prefix)
    }

    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            assistant_name: self.assistant_name.clone(),
            markdown_user_messages: self.markdown_user_messages,
        }
    }

    /// Configured log level, `Info` if it does not parse
    pub fn log_level(&self) -> log::Level {
        log::Level::from_str(&self.log_level).unwrap_or(log::Level::Info)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_json_uses_defaults() {
        assert_eq!(ClientConfig::from_json("{}").unwrap(), ClientConfig::default());
        assert_eq!(ClientConfig::from_json("  ").unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ClientConfig::from_json(r#"{"api_base":"http://localhost:8000/","log_level":"debug"}"#).unwrap();
        assert_eq!(config.chat_url(), "http://localhost:8000/chat");
        assert_eq!(config.summarize_url(), "http://localhost:8000/summarize-title");
        assert_eq!(config.log_level(), log::Level::Debug);
        assert_eq!(config.fallback_title, "Chat History");
    }

    #[test]
    fn test_same_origin_urls() {
        let config = ClientConfig::default();
        assert_eq!(config.chat_url(), "/chat");
        assert_eq!(config.storage_keys().conversations, "fspro.conversations");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let err = ClientConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let config = ClientConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_level(), log::Level::Info);
    }
}
