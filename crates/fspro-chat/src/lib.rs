//! Conversation and session management for fspro-chat
//!
//! This crate holds the platform-neutral core of the browser client: the
//! session store that reconciles in-memory chat state with persisted history
//! and the remote responder, plus the pieces it drives (storage adapter,
//! gateway trait, sidebar derivation, render pipeline, event dispatch).
//! Nothing here touches the DOM; the browser crate supplies the
//! [`KeyValueStore`], [`ChatGateway`] and [`ChatView`] implementations.

pub mod config;
pub mod controller;
pub mod formatter;
pub mod gateway;
pub mod render;
pub mod sidebar;
pub mod storage;
pub mod store;
pub mod title;

// Re-export commonly used types
pub use config::ClientConfig;
pub use controller::{ChatController, UiEvent};
pub use formatter::{escape_html, format_message, FormatOptions, FormattedMessage};
pub use gateway::ChatGateway;
pub use render::{ChatView, RenderPipeline};
pub use sidebar::{sidebar_items, SidebarIntent, SidebarItem};
pub use storage::{KeyValueStore, LoadedState, MemoryStore, StorageAdapter, StorageKeys};
pub use store::{ActiveSession, ReplyOutcome, ReplyTicket, SendSlot, SessionStore, StoreChange, StoreView, TitleJob};

pub use fspro_types::*;
