//! Sidebar: the history list derived from the store, and the intents it emits.

use chrono::{DateTime, Utc};
use fspro_types::{Conversation, SessionId};

use crate::controller::UiEvent;
use crate::formatter::escape_html;

/// One row of the history list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub id: SessionId,
    pub title: String,
    pub last_updated: DateTime<Utc>,
    pub active: bool,
    /// Title is still the placeholder
    pub title_pending: bool,
}

/// What a click on the sidebar means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarIntent {
    /// Row clicked
    Select(SessionId),
    /// Delete control clicked; must not also select
    Delete(SessionId),
}

impl From<SidebarIntent> for UiEvent {
    fn from(intent: SidebarIntent) -> Self {
        match intent {
            SidebarIntent::Select(id) => UiEvent::Select(id),
            SidebarIntent::Delete(id) => UiEvent::Delete(id),
        }
    }
}

/// Rows sorted newest first.
///
/// `sort_by` is stable, so conversations with equal timestamps keep their
/// list order.
pub fn sidebar_items(conversations: &[Conversation], active: Option<&SessionId>) -> Vec<SidebarItem> {
    let mut items: Vec<SidebarItem> = conversations
        .iter()
        .map(|convo| SidebarItem {
            id: convo.id.clone(),
            title: convo.title.clone(),
            last_updated: convo.last_updated,
            active: active == Some(&convo.id),
            title_pending: !convo.title_is_final(),
        })
        .collect();

    items.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    items
}

/// Class list for a row
pub fn item_class(item: &SidebarItem) -> String {
    let mut class = String::from("history-item");
    if item.active {
        class.push_str(" active");
    }
    if item.title_pending {
        class.push_str(" pending-title");
    }
    class
}

/// Inner markup for a row: icon, title, delete control
pub fn item_html(item: &SidebarItem) -> String {
    format!(
        r#"<i class="fas fa-comment"></i> <span class="history-title">{}</span><span class="delete-btn" title="Delete conversation">&times;</span>"#,
        escape_html(&item.title)
    )
}

pub const EMPTY_SIDEBAR_TEXT: &str = "No conversations yet";
