use fspro_chat::{
    ChatController, ClientConfig, RenderPipeline, SessionId, SessionStore, SidebarIntent,
    StorageAdapter, UiEvent,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element};

use crate::dom::{self, TextInput};
use crate::http_gateway::HttpGateway;
use crate::local_storage::BrowserStore;
use crate::spawner::BrowserSpawner;
use crate::view::{DomChatView, INPUT_ID, NEW_CHAT_BUTTON_ID, SEND_BUTTON_ID, SIDEBAR_ID};

type Controller = ChatController<BrowserStore, HttpGateway, BrowserSpawner>;

pub struct ChatApp {
    document: Document,
    controller: Controller,
    input: TextInput,
}

impl ChatApp {
    pub fn new(config: ClientConfig) -> Result<Self, JsValue> {
        let window = crate::window()?;
        let document = crate::document()?;

        let storage = StorageAdapter::new(BrowserStore::open(&window), config.storage_keys());
        let mut store = SessionStore::open(storage, config.fallback_title.clone());

        let view = DomChatView::new(&document)?;
        RenderPipeline::new(view, config.format_options()).attach(&mut store);

        let controller = ChatController::new(store, HttpGateway::new(&config), BrowserSpawner);
        let input = TextInput::by_id(&document, INPUT_ID)?;

        Ok(Self {
            document,
            controller,
            input,
        })
    }

    pub fn start(self) -> Result<(), JsValue> {
        self.setup_message_input()?;
        self.setup_buttons()?;
        self.setup_sidebar()?;

        self.controller.resume_pending_titles();
        self.input.focus();

        let persistent = self.controller.store().borrow().storage().store().is_persistent();
        log::info!(
            "Chat ready (history {})",
            if persistent { "in localStorage" } else { "in memory only" }
        );
        Ok(())
    }

    fn setup_message_input(&self) -> Result<(), JsValue> {
        let controller = self.controller.clone();
        let input = self.input.clone();

        // Enter sends, Shift+Enter keeps the newline
        let closure = Closure::wrap(Box::new(move |event: web_sys::KeyboardEvent| {
            if event.key() == "Enter" && !event.shift_key() {
                event.prevent_default();
                submit_input(&controller, &input);
            }
        }) as Box<dyn FnMut(_)>);

        self.input
            .as_element()
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();

        Ok(())
    }

    fn setup_buttons(&self) -> Result<(), JsValue> {
        if let Some(send_btn) = self.document.get_element_by_id(SEND_BUTTON_ID) {
            let controller = self.controller.clone();
            let input = self.input.clone();
            dom::add_click_listener(&send_btn, move |_| submit_input(&controller, &input))?;
        } else {
            log::debug!("No #{} button; Enter is the only way to send", SEND_BUTTON_ID);
        }

        if let Some(new_chat_btn) = self.document.get_element_by_id(NEW_CHAT_BUTTON_ID) {
            let controller = self.controller.clone();
            let input = self.input.clone();
            dom::add_click_listener(&new_chat_btn, move |_| {
                input.clear();
                dispatch(&controller, UiEvent::NewSession);
            })?;
        }

        Ok(())
    }

    /// One delegated listener for every row, so re-rendering the list does not
    /// leak closures
    fn setup_sidebar(&self) -> Result<(), JsValue> {
        let list = dom::get_element_by_id(&self.document, SIDEBAR_ID)?;
        let controller = self.controller.clone();

        dom::add_click_listener(&list, move |event: web_sys::MouseEvent| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            if let Some(intent) = sidebar_intent(&target) {
                // A delete click must not bubble into a row selection
                event.stop_propagation();
                dispatch(&controller, intent.into());
            }
        })
    }
}

/// Work out what a click inside the conversation list asked for
fn sidebar_intent(target: &Element) -> Option<SidebarIntent> {
    let row = target.closest(".history-item").ok().flatten()?;
    let id = SessionId::from(row.get_attribute("data-id")?);

    let on_delete = target.closest(".delete-btn").ok().flatten().is_some();
    if on_delete {
        Some(SidebarIntent::Delete(id))
    } else {
        Some(SidebarIntent::Select(id))
    }
}

fn submit_input(controller: &Controller, input: &TextInput) {
    // Keep the text if it cannot be sent yet
    if controller.store().borrow().is_busy() {
        log::debug!("Reply still pending; keeping input");
        return;
    }

    let text = input.value();
    if text.trim().is_empty() {
        return;
    }

    input.clear();
    input.focus();
    dispatch(controller, UiEvent::Submit(text));
}

fn dispatch(controller: &Controller, event: UiEvent) {
    let controller = controller.clone();
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = controller.dispatch(event).await {
            log::warn!("Chat action failed: {}", e);
        }
    });
}
