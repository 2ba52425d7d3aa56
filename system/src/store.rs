use std::collections::HashMap;

use crate::identity::{IdAllocator, UuidAllocator};
use crate::session::Session;
use crate::types::SessionId;

/// Owns every live session and the id source used to name them.
pub struct SessionStore<A = UuidAllocator> {
    sessions: HashMap<SessionId, Session>,
    ids: A,
}

impl SessionStore<UuidAllocator> {
    pub fn new() -> Self {
        Self::with_allocator(UuidAllocator)
    }
}

impl Default for SessionStore<UuidAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: IdAllocator> SessionStore<A> {
    pub fn with_allocator(ids: A) -> Self {
        Self {
            sessions: HashMap::new(),
            ids,
        }
    }

    pub fn allocate_id(&mut self) -> uuid::Uuid {
        self.ids.allocate()
    }

    pub fn create_session(&mut self) -> SessionId {
        // a session id is never reused while the old one is alive
        let mut session_id = self.ids.allocate();
        while self.sessions.contains_key(&session_id) {
            log::error!("session id {} allocated twice", session_id);
            session_id = self.ids.allocate();
        }
        self.sessions.insert(session_id, Session::new(session_id));
        log::info!("created session {}", session_id);
        session_id
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn get_mut(&mut self, session_id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(session_id)
    }

    pub fn has_session(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn remove(&mut self, session_id: &SessionId) -> Option<Session> {
        let session = self.sessions.remove(session_id)?;
        log::info!(
            "removed session {} after {:?}",
            session_id,
            session.created_at.elapsed()
        );
        Some(session)
    }

    /// Removes every session without players and returns their ids.
    pub fn remove_empty(&mut self) -> Vec<SessionId> {
        let empty = self
            .sessions
            .values()
            .filter(|session| session.is_empty())
            .map(|session| session.id)
            .collect::<Vec<_>>();
        for session_id in &empty {
            self.remove(session_id);
        }
        empty
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> + '_ {
        self.sessions.values_mut()
    }
}
