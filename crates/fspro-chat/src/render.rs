//! Render pipeline: store changes in, view calls out.
//!
//! The pipeline keeps no state of its own. Every redraw is computed from the
//! [`StoreView`] passed with the change notification.

use fspro_types::Message;

use crate::formatter::{format_message, typing_indicator, FormatOptions, FormattedMessage};
use crate::sidebar::{sidebar_items, SidebarItem};
use crate::storage::KeyValueStore;
use crate::store::{SendSlot, SessionStore, StoreChange, StoreView};

/// Surface the pipeline draws on (the DOM in the browser)
pub trait ChatView {
    /// Remove every rendered message, including the typing indicator
    fn clear_messages(&self);
    fn append_message(&self, message: &FormattedMessage);
    fn set_welcome_visible(&self, visible: bool);
    fn show_typing(&self, indicator: &FormattedMessage);
    fn set_input_enabled(&self, enabled: bool);
    fn render_sidebar(&self, items: &[SidebarItem]);
    fn scroll_to_bottom(&self);
}

/// Current wall-clock time as `HH:MM`
pub fn local_time_label() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

pub struct RenderPipeline<V> {
    view: V,
    options: FormatOptions,
    clock: fn() -> String,
}

impl<V: ChatView> RenderPipeline<V> {
    pub fn new(view: V, options: FormatOptions) -> Self {
        Self {
            view,
            options,
            clock: local_time_label,
        }
    }

    /// Replace the time-label source
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn handle(&self, change: &StoreChange, state: &StoreView<'_>) {
        match change {
            StoreChange::MessagesChanged
            | StoreChange::ReplyPending
            | StoreChange::ReplyResolved { .. } => self.render_thread(state),
            StoreChange::ConversationsChanged => self.render_sidebar(state),
            StoreChange::ActiveSessionChanged => {
                self.render_thread(state);
                self.render_sidebar(state);
            }
        }
    }

    /// Full redraw, used once after start-up
    pub fn render_all(&self, state: &StoreView<'_>) {
        self.render_thread(state);
        self.render_sidebar(state);
    }

    fn render_thread(&self, state: &StoreView<'_>) {
        self.view.clear_messages();
        self.view.set_input_enabled(state.slot == SendSlot::Idle);

        let messages: &[Message] = state.active.messages();
        self.view.set_welcome_visible(messages.is_empty());

        let time_label = (self.clock)();
        for msg in messages {
            self.view
                .append_message(&format_message(msg, &self.options, &time_label));
        }

        if state.awaiting_reply {
            self.view.show_typing(&typing_indicator(&self.options, &time_label));
        }

        if !messages.is_empty() || state.awaiting_reply {
            self.view.scroll_to_bottom();
        }
    }

    fn render_sidebar(&self, state: &StoreView<'_>) {
        let items = sidebar_items(state.conversations, state.active.id());
        self.view.render_sidebar(&items);
    }
}

impl<V: ChatView + 'static> RenderPipeline<V> {
    /// Draw the current state and subscribe to future changes
    pub fn attach<S: KeyValueStore>(self, store: &mut SessionStore<S>) {
        self.render_all(&store.view());
        store.subscribe(move |change, state| self.handle(change, state));
    }
}
