//! Event dispatch: user intents in, store operations and network calls out.

use std::cell::RefCell;
use std::rc::Rc;

use fspro_types::{ChatError, NetworkError, Result, SessionId};
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::gateway::ChatGateway;
use crate::storage::KeyValueStore;
use crate::store::{ReplyOutcome, SessionStore, TitleJob};

/// Everything the page can ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Submit(String),
    NewSession,
    Select(SessionId),
    Delete(SessionId),
}

/// Connects the store to the gateway.
///
/// Cheap to clone; clones share the same store. Title summarizations run as
/// detached tasks on the supplied spawner and write back into the store when
/// they finish.
pub struct ChatController<S, G, P> {
    store: Rc<RefCell<SessionStore<S>>>,
    gateway: Rc<G>,
    spawner: P,
}

impl<S, G, P: Clone> Clone for ChatController<S, G, P> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            gateway: self.gateway.clone(),
            spawner: self.spawner.clone(),
        }
    }
}

impl<S, G, P> ChatController<S, G, P>
where
    S: KeyValueStore + 'static,
    G: ChatGateway + 'static,
    P: LocalSpawn,
{
    pub fn new(store: SessionStore<S>, gateway: G, spawner: P) -> Self {
        Self {
            store: Rc::new(RefCell::new(store)),
            gateway: Rc::new(gateway),
            spawner,
        }
    }

    pub fn store(&self) -> &Rc<RefCell<SessionStore<S>>> {
        &self.store
    }

    /// Route one UI event
    pub async fn dispatch(&self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::Submit(text) => self.submit(&text).await.map(|_| ()),
            UiEvent::NewSession => {
                self.new_session();
                Ok(())
            }
            UiEvent::Select(id) => self.select_session(&id),
            UiEvent::Delete(id) => self.delete_session(&id),
        }
    }

    /// Append the user's message and ask for a reply.
    ///
    /// Blank input returns `Ok(None)`. While a reply is in flight the input is
    /// rejected with [`ChatError::Busy`] before anything is appended.
    pub async fn submit(&self, text: &str) -> Result<Option<ReplyOutcome>> {
        {
            let mut store = self.store.borrow_mut();
            if store.is_busy() {
                log::warn!("Ignoring submit while a reply is in flight");
                return Err(ChatError::Busy);
            }
            if !store.append_user_message(text) {
                return Ok(None);
            }
        }

        self.request_bot_reply(text.trim()).await.map(Some)
    }

    /// One `/chat` round trip for the active session
    pub async fn request_bot_reply(&self, text: &str) -> Result<ReplyOutcome> {
        let ticket = self.store.borrow_mut().begin_reply(text)?;
        log::debug!(
            "Sending message (session: {})",
            ticket.session_id().map(SessionId::as_str).unwrap_or("new")
        );

        let result = self
            .gateway
            .send_message(ticket.text(), ticket.session_id())
            .await;

        Ok(self.store.borrow_mut().finish_reply(result))
    }

    pub fn new_session(&self) {
        let job = self.store.borrow_mut().start_new_session();
        self.run_title_jobs(job);
    }

    pub fn select_session(&self, id: &SessionId) -> Result<()> {
        let job = self.store.borrow_mut().select_session(id)?;
        self.run_title_jobs(job);
        Ok(())
    }

    pub fn delete_session(&self, id: &SessionId) -> Result<()> {
        self.store.borrow_mut().delete_session(id)
    }

    /// Re-request titles left as placeholders by a previous page load
    pub fn resume_pending_titles(&self) {
        let jobs = self.store.borrow_mut().take_pending_title_jobs();
        if !jobs.is_empty() {
            log::info!("Resuming {} pending title request(s)", jobs.len());
        }
        self.run_title_jobs(jobs);
    }

    fn run_title_jobs(&self, jobs: impl IntoIterator<Item = TitleJob>) {
        for job in jobs {
            self.spawn_title_job(job);
        }
    }

    fn spawn_title_job(&self, job: TitleJob) {
        let store = self.store.clone();
        let gateway = self.gateway.clone();
        let session_id = job.session_id.clone();

        let task = async move {
            let result = gateway.summarize_title(&job.session_id).await;
            store.borrow_mut().apply_title(&job.session_id, result);
        };

        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("Could not schedule title request for {}: {}", session_id, e);
            self.store.borrow_mut().apply_title(
                &session_id,
                Err(NetworkError::Transport("title request not scheduled".to_string())),
            );
        }
    }
}
