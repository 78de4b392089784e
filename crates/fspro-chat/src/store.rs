//! The session store: authoritative chat state.
//!
//! Owns the active session, the conversation list, and the single in-flight
//! reply slot. Every mutation persists through the [`StorageAdapter`] and is
//! announced to observers as a [`StoreChange`]. Network calls are not made
//! here; the controller awaits the gateway between [`SessionStore::begin_reply`]
//! and [`SessionStore::finish_reply`] so no borrow is held across a suspension.

use std::collections::HashSet;

use chrono::Utc;
use fspro_types::{
    ActiveSnapshot, ChatError, ChatReply, Conversation, Message, NetworkError, Result, SessionId,
    TitleState, PLACEHOLDER_TITLE,
};

use crate::storage::{KeyValueStore, StorageAdapter};
use crate::title::preview_title;

/// Single-slot guard for `/chat` requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendSlot {
    #[default]
    Idle,
    Sending,
}

/// What changed, as seen by observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    /// A message was appended to the active session
    MessagesChanged,
    /// The conversation list (membership, order keys, or titles) changed
    ConversationsChanged,
    /// A different session became active, or the active one was reset
    ActiveSessionChanged,
    /// A `/chat` request was issued
    ReplyPending,
    /// The outstanding `/chat` request resolved
    ReplyResolved { failed: bool },
}

/// The open session: a draft (no remote id) or bound to a remote id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSession {
    id: Option<SessionId>,
    messages: Vec<Message>,
}

impl ActiveSession {
    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Bound once the responder has assigned an id
    pub fn is_bound(&self) -> bool {
        self.id.as_ref().is_some_and(SessionId::is_remote)
    }

    pub fn is_draft(&self) -> bool {
        !self.is_bound()
    }

    fn snapshot(&self) -> ActiveSnapshot {
        ActiveSnapshot {
            id: self.id.clone(),
            messages: self.messages.clone(),
        }
    }
}

/// Read-only view handed to observers
#[derive(Debug, Clone, Copy)]
pub struct StoreView<'a> {
    pub active: &'a ActiveSession,
    pub conversations: &'a [Conversation],
    pub slot: SendSlot,
    /// A reply is outstanding for the session currently on screen
    pub awaiting_reply: bool,
}

/// Captured at [`SessionStore::begin_reply`]; what to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTicket {
    text: String,
    session_id: Option<SessionId>,
}

impl ReplyTicket {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Remote id to send, `None` for drafts
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }
}

/// How a reply was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Bot message appended; the session is bound to `session_id`
    Replied { session_id: SessionId },
    /// Error notice appended; session id untouched
    Failed { error: NetworkError },
    /// The originating session was deleted while the request was in flight
    Discarded,
}

/// A summarization to run for a flushed conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleJob {
    pub session_id: SessionId,
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    /// Set if the originating session was flushed before the reply arrived
    flushed_as: Option<SessionId>,
}

type Observer = Box<dyn FnMut(&StoreChange, &StoreView<'_>)>;

pub struct SessionStore<S> {
    storage: StorageAdapter<S>,
    fallback_title: String,
    active: ActiveSession,
    conversations: Vec<Conversation>,
    slot: SendSlot,
    in_flight: Option<InFlight>,
    /// Bumped whenever the active slot is replaced
    generation: u64,
    pending_titles: HashSet<SessionId>,
    observers: Vec<Observer>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Rehydrate from storage.
    ///
    /// Storage problems are logged and treated as missing history.
    /// Local-only conversations left with a placeholder title are finalized
    /// here; remote ones are picked up by [`Self::take_pending_title_jobs`].
    pub fn open(storage: StorageAdapter<S>, fallback_title: impl Into<String>) -> Self {
        let loaded = storage.load();
        for warning in &loaded.warnings {
            log::warn!("Ignoring stored chat history: {}", warning);
        }

        let fallback_title = fallback_title.into();
        let mut conversations = loaded.conversations;
        for convo in conversations.iter_mut() {
            if !convo.title_is_final() && convo.id.is_local() {
                convo.title = preview_title(&convo.messages, &fallback_title);
                convo.title_state = TitleState::Final;
            }
        }

        let active = loaded
            .active
            .map(|snapshot| ActiveSession {
                id: snapshot.id,
                messages: snapshot.messages,
            })
            .unwrap_or_default();

        log::info!(
            "Restored {} conversation(s), active session: {}",
            conversations.len(),
            active
                .id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "draft".to_string())
        );

        Self {
            storage,
            fallback_title,
            active,
            conversations,
            slot: SendSlot::Idle,
            in_flight: None,
            generation: 0,
            pending_titles: HashSet::new(),
            observers: Vec::new(),
        }
    }

    /// Register a change observer
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&StoreChange, &StoreView<'_>) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub fn active(&self) -> &ActiveSession {
        &self.active
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn conversation(&self, id: &SessionId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn slot(&self) -> SendSlot {
        self.slot
    }

    pub fn is_busy(&self) -> bool {
        self.slot == SendSlot::Sending
    }

    pub fn storage(&self) -> &StorageAdapter<S> {
        &self.storage
    }

    pub fn view(&self) -> StoreView<'_> {
        StoreView {
            active: &self.active,
            conversations: &self.conversations,
            slot: self.slot,
            awaiting_reply: self
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == self.generation),
        }
    }

    /// Append the user's text to the active session.
    ///
    /// Returns `false` and changes nothing for blank input.
    pub fn append_user_message(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        self.active.messages.push(Message::user(text));
        self.persist();
        self.notify(StoreChange::MessagesChanged);
        true
    }

    /// Claim the send slot for a reply to `text`
    pub fn begin_reply(&mut self, text: &str) -> Result<ReplyTicket> {
        if self.is_busy() {
            log::warn!("Rejecting send while a reply is in flight");
            return Err(ChatError::Busy);
        }

        self.slot = SendSlot::Sending;
        self.in_flight = Some(InFlight {
            generation: self.generation,
            flushed_as: None,
        });
        self.notify(StoreChange::ReplyPending);

        Ok(ReplyTicket {
            text: text.to_string(),
            session_id: self.active.id.clone().filter(SessionId::is_remote),
        })
    }

    /// Apply the gateway outcome and release the send slot
    pub fn finish_reply(&mut self, result: std::result::Result<ChatReply, NetworkError>) -> ReplyOutcome {
        self.slot = SendSlot::Idle;
        let Some(in_flight) = self.in_flight.take() else {
            log::warn!("Reply arrived with no request in flight");
            return ReplyOutcome::Discarded;
        };

        if in_flight.generation != self.generation {
            return self.finish_detached_reply(in_flight.flushed_as, result);
        }

        let outcome = match result {
            Ok(reply) => {
                let session_id = self.bind_active(reply.session_id);
                self.active.messages.push(Message::bot(reply.markup));
                ReplyOutcome::Replied { session_id }
            }
            Err(error) => {
                log::warn!("Chat request failed: {}", error);
                self.active.messages.push(Message::error_reply());
                ReplyOutcome::Failed { error }
            }
        };

        self.persist();
        self.notify(StoreChange::ReplyResolved {
            failed: matches!(outcome, ReplyOutcome::Failed { .. }),
        });
        outcome
    }

    /// Flush the active session and reset to an empty draft
    pub fn start_new_session(&mut self) -> Option<TitleJob> {
        let job = self.flush_active();
        self.replace_active(ActiveSession::default());
        job
    }

    /// Switch to a stored conversation, flushing the current one first.
    ///
    /// Selecting the already-active session does nothing.
    pub fn select_session(&mut self, id: &SessionId) -> Result<Option<TitleJob>> {
        if self.active.id.as_ref() == Some(id) {
            return Ok(None);
        }
        if self.conversation(id).is_none() {
            return Err(ChatError::UnknownSession(id.clone()));
        }

        let job = self.flush_active();

        // The flush cannot remove entries, so the target is still there.
        let messages = self
            .conversation(id)
            .map(|c| c.messages.clone())
            .unwrap_or_default();

        self.replace_active(ActiveSession {
            id: Some(id.clone()),
            messages,
        });
        self.reattach_in_flight(id);
        Ok(job)
    }

    /// Re-opening the conversation a reply is still outstanding for makes
    /// it the active request again, so the reply lands in the active slot
    fn reattach_in_flight(&mut self, id: &SessionId) {
        let generation = self.generation;
        let Some(in_flight) = self.in_flight.as_mut() else {
            return;
        };
        if in_flight.flushed_as.as_ref() != Some(id) {
            return;
        }

        in_flight.generation = generation;
        in_flight.flushed_as = None;
        log::debug!("Reply for {} is pending again", id);
        self.notify(StoreChange::ReplyPending);
    }

    /// Remove a conversation; deleting the active one resets to an empty draft.
    ///
    /// The deleted session is not flushed, so it cannot reappear.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<()> {
        let before = self.conversations.len();
        self.conversations.retain(|c| &c.id != id);
        let removed = self.conversations.len() != before;
        let was_active = self.active.id.as_ref() == Some(id);

        if !removed && !was_active {
            return Err(ChatError::UnknownSession(id.clone()));
        }

        log::info!("Deleted conversation {}", id);
        if was_active {
            self.replace_active(ActiveSession::default());
        } else {
            self.persist();
        }
        self.notify(StoreChange::ConversationsChanged);
        Ok(())
    }

    /// Record a summarization result.
    ///
    /// Only a conversation still carrying its placeholder is touched, so a
    /// title is set automatically at most once. Results for deleted
    /// conversations are dropped.
    pub fn apply_title(
        &mut self,
        id: &SessionId,
        result: std::result::Result<String, NetworkError>,
    ) -> bool {
        self.pending_titles.remove(id);

        let fallback = &self.fallback_title;
        let Some(convo) = self.conversations.iter_mut().find(|c| &c.id == id) else {
            log::debug!("Dropping title for deleted conversation {}", id);
            return false;
        };
        if convo.title_is_final() {
            return false;
        }

        convo.title = match result {
            Ok(title) if !title.trim().is_empty() => title.trim().to_string(),
            Ok(_) => {
                log::warn!("Empty title for {}, using fallback", id);
                fallback.clone()
            }
            Err(e) => {
                log::warn!("Title summarization failed for {}: {}", id, e);
                fallback.clone()
            }
        };
        convo.title_state = TitleState::Final;

        self.persist();
        self.notify(StoreChange::ConversationsChanged);
        true
    }

    /// Jobs for remote conversations whose placeholder was never replaced
    /// (e.g. the page closed mid-request). Each id is returned once.
    pub fn take_pending_title_jobs(&mut self) -> Vec<TitleJob> {
        let mut jobs = Vec::new();
        for convo in &self.conversations {
            if !convo.title_is_final()
                && convo.id.is_remote()
                && self.pending_titles.insert(convo.id.clone())
            {
                jobs.push(TitleJob {
                    session_id: convo.id.clone(),
                });
            }
        }
        jobs
    }

    /// Commit the active session into the conversation list.
    ///
    /// Updates in place when the id is already listed, inserts otherwise.
    /// Drafts that never got a remote id are stored under a local id.
    fn flush_active(&mut self) -> Option<TitleJob> {
        if self.active.is_empty() {
            return None;
        }

        let id = self.active.id.clone().unwrap_or_else(SessionId::local);
        if let Some(in_flight) = self.in_flight.as_mut() {
            if in_flight.generation == self.generation {
                in_flight.flushed_as = Some(id.clone());
            }
        }

        let messages = self.active.messages.clone();
        let now = Utc::now();
        let idx = match self.conversations.iter().position(|c| c.id == id) {
            Some(idx) => {
                let convo = &mut self.conversations[idx];
                // Only a changed thread moves up the list
                if convo.messages != messages {
                    convo.messages = messages;
                    convo.last_updated = now;
                }
                idx
            }
            None => {
                self.conversations.push(Conversation {
                    id: id.clone(),
                    title: PLACEHOLDER_TITLE.to_string(),
                    title_state: TitleState::Provisional,
                    messages,
                    last_updated: now,
                });
                self.conversations.len() - 1
            }
        };

        let job = self.title_job_for(idx);
        log::debug!(
            "Flushed {} message(s) into conversation {}",
            self.conversations[idx].messages.len(),
            id
        );
        self.notify(StoreChange::ConversationsChanged);
        job
    }

    fn title_job_for(&mut self, idx: usize) -> Option<TitleJob> {
        let convo = &mut self.conversations[idx];
        if convo.title_is_final() {
            return None;
        }

        if convo.id.is_local() {
            convo.title = preview_title(&convo.messages, &self.fallback_title);
            convo.title_state = TitleState::Final;
            return None;
        }

        convo.title = PLACEHOLDER_TITLE.to_string();
        if self.pending_titles.insert(convo.id.clone()) {
            Some(TitleJob {
                session_id: convo.id.clone(),
            })
        } else {
            None
        }
    }

    /// First bind only: a remote id, once set, is never replaced
    fn bind_active(&mut self, remote: SessionId) -> SessionId {
        match self.active.id.take() {
            Some(current) if current.is_remote() => {
                if current != remote {
                    log::warn!(
                        "Responder returned session {} for bound session {}; keeping {}",
                        remote,
                        current,
                        current
                    );
                }
                self.active.id = Some(current.clone());
                current
            }
            Some(local) => {
                self.rekey_conversation(&local, &remote);
                log::info!("Session bound to {}", remote);
                self.active.id = Some(remote.clone());
                remote
            }
            None => {
                log::info!("Session bound to {}", remote);
                self.active.id = Some(remote.clone());
                remote
            }
        }
    }

    /// Move a local-only conversation to its remote id, once the responder knows it
    fn rekey_conversation(&mut self, local: &SessionId, remote: &SessionId) {
        if self.conversation(remote).is_some() {
            return;
        }
        let Some(convo) = self.conversations.iter_mut().find(|c| &c.id == local) else {
            return;
        };
        convo.id = remote.clone();
        self.notify(StoreChange::ConversationsChanged);
    }

    /// A reply whose session was flushed out of the active slot before it arrived
    fn finish_detached_reply(
        &mut self,
        flushed_as: Option<SessionId>,
        result: std::result::Result<ChatReply, NetworkError>,
    ) -> ReplyOutcome {
        let Some(id) = flushed_as else {
            return ReplyOutcome::Discarded;
        };
        let Some(idx) = self.conversations.iter().position(|c| c.id == id) else {
            log::debug!("Dropping reply for deleted conversation {}", id);
            return ReplyOutcome::Discarded;
        };

        let outcome = match result {
            Ok(reply) => {
                let remote = reply.session_id;
                let remote_taken = self.conversations.iter().any(|c| c.id == remote);
                let convo = &mut self.conversations[idx];
                convo.messages.push(Message::bot(reply.markup));
                convo.last_updated = Utc::now();
                if convo.id.is_local() && !remote_taken {
                    convo.id = remote;
                }
                ReplyOutcome::Replied {
                    session_id: self.conversations[idx].id.clone(),
                }
            }
            Err(error) => {
                log::warn!("Chat request failed: {}", error);
                let convo = &mut self.conversations[idx];
                convo.messages.push(Message::error_reply());
                convo.last_updated = Utc::now();
                ReplyOutcome::Failed { error }
            }
        };

        self.persist();
        self.notify(StoreChange::ConversationsChanged);
        self.notify(StoreChange::ReplyResolved {
            failed: matches!(outcome, ReplyOutcome::Failed { .. }),
        });
        outcome
    }

    fn replace_active(&mut self, next: ActiveSession) {
        self.active = next;
        self.generation += 1;
        self.persist();
        self.notify(StoreChange::ActiveSessionChanged);
    }

    fn persist(&self) {
        let snapshot = if self.active.is_empty() && self.active.id.is_none() {
            None
        } else {
            Some(self.active.snapshot())
        };

        if let Err(e) = self.storage.save(&self.conversations, snapshot.as_ref()) {
            log::warn!("Failed to persist chat state: {}", e);
        }
    }

    fn notify(&mut self, change: StoreChange) {
        let mut observers = std::mem::take(&mut self.observers);
        {
            let view = self.view();
            for observer in observers.iter_mut() {
                observer(&change, &view);
            }
        }
        self.observers = observers;
    }
}
