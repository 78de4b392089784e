#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use fspro_chat::{
    ChatController, ChatGateway, ChatView, FormattedMessage, MemoryStore, SessionStore,
    SidebarItem, StorageAdapter, StorageKeys,
};
use fspro_types::{ChatReply, NetworkError, SessionId, FALLBACK_TITLE};
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};

// Scripted gateway for testing
#[derive(Default)]
pub struct MockGateway {
    replies: RefCell<VecDeque<Result<ChatReply, NetworkError>>>,
    titles: RefCell<HashMap<SessionId, Result<String, NetworkError>>>,
    send_gate: RefCell<Option<oneshot::Receiver<()>>>,
    title_gates: RefCell<HashMap<SessionId, oneshot::Receiver<()>>>,
    pub sent: RefCell<Vec<(String, Option<SessionId>)>>,
    pub title_requests: RefCell<Vec<SessionId>>,
}

impl MockGateway {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn reply_with(&self, session_id: &str, markup: &str) {
        self.replies.borrow_mut().push_back(Ok(ChatReply {
            session_id: SessionId::from(session_id),
            markup: markup.to_string(),
        }));
    }

    pub fn fail_next_send(&self) {
        self.replies
            .borrow_mut()
            .push_back(Err(NetworkError::Transport("connection refused".to_string())));
    }

    pub fn title_for(&self, session_id: &str, result: Result<&str, NetworkError>) {
        self.titles
            .borrow_mut()
            .insert(SessionId::from(session_id), result.map(str::to_string));
    }

    /// Keep the next `send_message` pending until the returned sender fires
    pub fn hold_next_send(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.send_gate.borrow_mut() = Some(rx);
        tx
    }

    /// Keep the summarization for `session_id` pending until the returned sender fires
    pub fn hold_title(&self, session_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.title_gates
            .borrow_mut()
            .insert(SessionId::from(session_id), rx);
        tx
    }
}

#[async_trait(?Send)]
impl ChatGateway for MockGateway {
    async fn send_message(
        &self,
        text: &str,
        session_id: Option<&SessionId>,
    ) -> Result<ChatReply, NetworkError> {
        self.sent
            .borrow_mut()
            .push((text.to_string(), session_id.cloned()));

        let gate = self.send_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let next = self.replies.borrow_mut().pop_front();
        next.unwrap_or_else(|| Err(NetworkError::Transport("no scripted reply".to_string())))
    }

    async fn summarize_title(&self, session_id: &SessionId) -> Result<String, NetworkError> {
        self.title_requests.borrow_mut().push(session_id.clone());

        let gate = self.title_gates.borrow_mut().remove(session_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let scripted = self.titles.borrow_mut().remove(session_id);
        scripted.unwrap_or_else(|| Ok(format!("Summary of {}", session_id)))
    }
}

/// What the recording view currently shows
#[derive(Debug, Default)]
pub struct Screen {
    pub messages: Vec<FormattedMessage>,
    pub typing: bool,
    pub welcome_visible: bool,
    pub input_enabled: bool,
    pub sidebar: Vec<SidebarItem>,
    pub scrolls: usize,
}

#[derive(Clone, Default)]
pub struct RecordingView {
    pub screen: Rc<RefCell<Screen>>,
}

impl ChatView for RecordingView {
    fn clear_messages(&self) {
        let mut screen = self.screen.borrow_mut();
        screen.messages.clear();
        screen.typing = false;
    }

    fn append_message(&self, message: &FormattedMessage) {
        self.screen.borrow_mut().messages.push(message.clone());
    }

    fn set_welcome_visible(&self, visible: bool) {
        self.screen.borrow_mut().welcome_visible = visible;
    }

    fn show_typing(&self, _indicator: &FormattedMessage) {
        self.screen.borrow_mut().typing = true;
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.screen.borrow_mut().input_enabled = enabled;
    }

    fn render_sidebar(&self, items: &[SidebarItem]) {
        self.screen.borrow_mut().sidebar = items.to_vec();
    }

    fn scroll_to_bottom(&self) {
        self.screen.borrow_mut().scrolls += 1;
    }
}

pub type TestController = ChatController<Rc<MemoryStore>, Rc<MockGateway>, LocalSpawner>;

pub fn create_test_store(backing: Rc<MemoryStore>) -> SessionStore<Rc<MemoryStore>> {
    SessionStore::open(
        StorageAdapter::new(backing, StorageKeys::default()),
        FALLBACK_TITLE,
    )
}

// Helper function to create a controller over fresh storage
pub fn create_test_controller(gateway: Rc<MockGateway>) -> (TestController, LocalPool) {
    let pool = LocalPool::new();
    let store = create_test_store(Rc::new(MemoryStore::new()));
    let controller = ChatController::new(store, gateway, pool.spawner());
    (controller, pool)
}
