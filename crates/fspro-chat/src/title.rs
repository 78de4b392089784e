use fspro_types::Message;

use crate::formatter::strip_tags;

/// Maximum characters kept from the first user message
const PREVIEW_CHARS: usize = 25;

/// Title derived locally from the first user message.
///
/// Used for conversations the responder never assigned an id to, so they
/// cannot be summarized remotely.
pub fn preview_title(messages: &[Message], fallback: &str) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user()) else {
        return fallback.to_string();
    };

    let text = strip_tags(&first.text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        fallback.to_string()
    } else if text.chars().count() > PREVIEW_CHARS {
        format!("{}...", text.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        text
    }
}

/// Clean up a summarization result; `None` if nothing usable is left
pub fn normalize_summary(raw: &str) -> Option<String> {
    let title = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_uses_first_user_message() {
        let messages = vec![Message::bot("<p>hi</p>"), Message::user("How do I  parse\nJSON?")];
        assert_eq!(preview_title(&messages, "Chat History"), "How do I parse JSON?");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let messages = vec![Message::user("Explain the borrow checker in great detail please")];
        assert_eq!(preview_title(&messages, "Chat History"), "Explain the borrow checke...");
    }

    #[test]
    fn test_preview_falls_back_without_user_text() {
        assert_eq!(preview_title(&[], "Chat History"), "Chat History");
        assert_eq!(preview_title(&[Message::user("<br>")], "Chat History"), "Chat History");
    }

    #[test]
    fn test_normalize_summary() {
        assert_eq!(normalize_summary("  \"Rust lifetimes\" "), Some("Rust lifetimes".to_string()));
        assert_eq!(normalize_summary("   "), None);
        assert_eq!(normalize_summary("\"\""), None);
    }
}
