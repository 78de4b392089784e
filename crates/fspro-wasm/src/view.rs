use fspro_chat::sidebar::{item_class, item_html, EMPTY_SIDEBAR_TEXT};
use fspro_chat::{ChatView, FormattedMessage, SidebarItem};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement};

use crate::dom::{self, TextInput};

pub const CHAT_BOX_ID: &str = "chat-box";
pub const WELCOME_ID: &str = "welcome";
pub const INPUT_ID: &str = "user-input";
pub const SIDEBAR_ID: &str = "conversation-list";
pub const SEND_BUTTON_ID: &str = "send-button";
pub const NEW_CHAT_BUTTON_ID: &str = "new-chat";
const TYPING_ID: &str = "typing";

/// [`ChatView`] over the chat page's DOM
pub struct DomChatView {
    document: Document,
    chat_box: Element,
    /// Lives inside the chat box on the stock page and survives clears
    welcome: Option<HtmlElement>,
    sidebar: Element,
    input: TextInput,
    send_button: Option<HtmlButtonElement>,
}

impl DomChatView {
    pub fn new(document: &Document) -> Result<Self, JsValue> {
        let chat_box = dom::get_element_by_id(document, CHAT_BOX_ID)?;
        let sidebar = dom::get_element_by_id(document, SIDEBAR_ID)?;
        let input = TextInput::by_id(document, INPUT_ID)?;
        let welcome = dom::get_html_element_by_id(document, WELCOME_ID).ok();
        if welcome.is_none() {
            log::debug!("No #{} element; welcome screen disabled", WELCOME_ID);
        }
        let send_button = document
            .get_element_by_id(SEND_BUTTON_ID)
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());

        Ok(Self {
            document: document.clone(),
            chat_box,
            welcome,
            sidebar,
            input,
            send_button,
        })
    }

    fn append_bubble(&self, message: &FormattedMessage, id: Option<&str>) -> Result<(), JsValue> {
        let bubble = dom::create_element_with_class(&self.document, "div", message.class_name)?;
        if let Some(id) = id {
            bubble.set_id(id);
        }
        bubble.set_inner_html(&message.inner_html);
        self.chat_box.append_child(&bubble)?;
        Ok(())
    }

    fn fill_sidebar(&self, items: &[SidebarItem]) -> Result<(), JsValue> {
        self.sidebar.set_inner_html("");

        if items.is_empty() {
            let empty = dom::create_element_with_class(&self.document, "div", "empty-state")?;
            empty.set_text_content(Some(EMPTY_SIDEBAR_TEXT));
            self.sidebar.append_child(&empty)?;
            return Ok(());
        }

        for item in items {
            let row = dom::create_element_with_class(&self.document, "div", &item_class(item))?;
            row.set_attribute("data-id", item.id.as_str())?;
            row.set_inner_html(&item_html(item));
            self.sidebar.append_child(&row)?;
        }
        Ok(())
    }
}

impl ChatView for DomChatView {
    fn clear_messages(&self) {
        let keep = self.welcome.as_ref().map(|w| w.unchecked_ref::<Element>());
        dom::truncate_children(&self.chat_box, keep);
    }

    fn append_message(&self, message: &FormattedMessage) {
        if let Err(e) = self.append_bubble(message, None) {
            log::error!("Failed to render message: {:?}", e);
        }
    }

    fn set_welcome_visible(&self, visible: bool) {
        if let Some(welcome) = &self.welcome {
            if visible {
                dom::show_element(welcome);
            } else {
                dom::hide_element(welcome);
            }
        }
    }

    fn show_typing(&self, indicator: &FormattedMessage) {
        if let Err(e) = self.append_bubble(indicator, Some(TYPING_ID)) {
            log::error!("Failed to render typing indicator: {:?}", e);
        }
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.input.set_read_only(!enabled);
        if let Some(button) = &self.send_button {
            button.set_disabled(!enabled);
        }
        let result = if enabled {
            self.chat_box.remove_attribute("aria-busy")
        } else {
            self.chat_box.set_attribute("aria-busy", "true")
        };
        if let Err(e) = result {
            log::debug!("Could not update busy state: {:?}", e);
        }
    }

    fn render_sidebar(&self, items: &[SidebarItem]) {
        if let Err(e) = self.fill_sidebar(items) {
            log::error!("Failed to render conversation list: {:?}", e);
        }
    }

    fn scroll_to_bottom(&self) {
        dom::scroll_to_bottom(&self.chat_box);
    }
}
