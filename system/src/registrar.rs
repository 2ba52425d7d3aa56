use std::collections::HashMap;

use crate::error::{Operation, SessionError};
use crate::identity::{IdAllocator, UuidAllocator};
use crate::message::{Envelope, ServerMessage};
use crate::store::SessionStore;
use crate::types::{PlayerId, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    InLobby,
    Joined(SessionId),
}

/// All whiteboard state of the process: sessions and which connection is
/// bound to which session. Connections are identified by their player id.
pub struct Whiteboard<A = UuidAllocator> {
    pub(crate) store: SessionStore<A>,
    pub(crate) connection_states: HashMap<PlayerId, ConnectionState>,
    pub(crate) remove_empty_sessions: bool,
}

impl Whiteboard<UuidAllocator> {
    pub fn new() -> Self {
        Self::with_allocator(UuidAllocator)
    }
}

impl Default for Whiteboard<UuidAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: IdAllocator> Whiteboard<A> {
    pub fn with_allocator(ids: A) -> Self {
        Self {
            store: SessionStore::with_allocator(ids),
            connection_states: HashMap::new(),
            remove_empty_sessions: true,
        }
    }

    /// Keep sessions around after their last player left.
    pub fn keep_empty_sessions(mut self, keep: bool) -> Self {
        self.remove_empty_sessions = !keep;
        self
    }

    pub fn store(&self) -> &SessionStore<A> {
        &self.store
    }

    pub fn connection_state(&self, player_id: &PlayerId) -> Option<&ConnectionState> {
        self.connection_states.get(player_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connection_states.len()
    }

    /// Registers a new connection and returns its player id together with the
    /// handshake that must be sent to it.
    pub fn connect(&mut self) -> (PlayerId, Envelope) {
        let mut player_id = self.store.allocate_id();
        while self.connection_states.contains_key(&player_id) {
            log::error!("player id {} allocated twice", player_id);
            player_id = self.store.allocate_id();
        }
        self.connection_states
            .insert(player_id, ConnectionState::InLobby);
        log::info!("player {} connected", player_id);

        (
            player_id,
            Envelope::new(player_id, ServerMessage::Handshake { id: player_id }),
        )
    }

    pub fn create_and_join(&mut self, from: &PlayerId) -> Result<Vec<Envelope>, SessionError> {
        self.ensure_in_lobby(from, Operation::CreateSession)?;
        let session_id = self.store.create_session();
        self.bind(from, &session_id, Operation::CreateSession)?;
        Ok(vec![Envelope::new(
            *from,
            ServerMessage::SessionCreated { session_id },
        )])
    }

    pub fn join(&mut self, from: &PlayerId, session_id: &SessionId) -> Result<(), SessionError> {
        self.ensure_in_lobby(from, Operation::JoinSession)?;
        self.bind(from, session_id, Operation::JoinSession)
    }

    /// Forgets the connection. Returns the session it was bound to, if any.
    pub fn disconnect(&mut self, player_id: &PlayerId) -> Option<SessionId> {
        match self.connection_states.remove(player_id)? {
            ConnectionState::InLobby => {
                log::info!("player {} disconnected from lobby", player_id);
                None
            }
            ConnectionState::Joined(session_id) => {
                if let Some(session) = self.store.get_mut(&session_id) {
                    session.remove_player(player_id);
                    log::info!(
                        "player {} disconnected from session {}",
                        player_id,
                        session_id
                    );
                } else {
                    log::warn!(
                        "player {} was bound to missing session {}",
                        player_id,
                        session_id
                    );
                }
                Some(session_id)
            }
        }
    }

    fn ensure_in_lobby(&self, from: &PlayerId, operation: Operation) -> Result<(), SessionError> {
        match self.connection_states.get(from) {
            Some(ConnectionState::InLobby) => Ok(()),
            Some(ConnectionState::Joined(_)) => Err(SessionError::AlreadyInSession(operation)),
            None => Err(SessionError::NotInSession(operation)),
        }
    }

    fn bind(
        &mut self,
        from: &PlayerId,
        session_id: &SessionId,
        operation: Operation,
    ) -> Result<(), SessionError> {
        let session = self
            .store
            .get_mut(session_id)
            .ok_or(SessionError::SessionNotFound {
                operation,
                session_id: *session_id,
            })?;
        session.add_player(*from);
        self.connection_states
            .insert(*from, ConnectionState::Joined(*session_id));
        log::info!("player {} joined session {}", from, session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn it_sends_handshake_with_new_id() {
        let mut whiteboard = Whiteboard::new();
        let (player_id, handshake) = whiteboard.connect();
        assert_eq!(handshake.to, player_id);
        assert_eq!(handshake.message, ServerMessage::Handshake { id: player_id });
        assert_eq!(
            whiteboard.connection_state(&player_id),
            Some(&ConnectionState::InLobby)
        );
    }

    #[test]
    fn it_acknowledges_creation_to_creator_only() {
        let mut whiteboard = Whiteboard::new();
        let (a, _) = whiteboard.connect();
        let out = whiteboard.create_and_join(&a).expect("");
        assert_eq!(out.len(), 1);
        let session_id = match &out[0] {
            Envelope {
                to,
                message: ServerMessage::SessionCreated { session_id },
            } if *to == a => *session_id,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(
            whiteboard.connection_state(&a),
            Some(&ConnectionState::Joined(session_id))
        );
        assert!(whiteboard.store().get(&session_id).expect("").has_player(&a));
    }

    #[test]
    fn it_fails_to_join_unknown_session() {
        let mut whiteboard = Whiteboard::new();
        let (a, _) = whiteboard.connect();
        let missing = Uuid::new_v4();
        let err = whiteboard.join(&a, &missing).unwrap_err();
        assert_eq!(
            err,
            SessionError::SessionNotFound {
                operation: Operation::JoinSession,
                session_id: missing,
            }
        );
        assert_eq!(
            whiteboard.connection_state(&a),
            Some(&ConnectionState::InLobby)
        );
    }

    #[test]
    fn it_binds_a_connection_only_once() {
        let mut whiteboard = Whiteboard::new();
        let (a, _) = whiteboard.connect();
        whiteboard.create_and_join(&a).expect("");
        assert_eq!(
            whiteboard.create_and_join(&a).unwrap_err(),
            SessionError::AlreadyInSession(Operation::CreateSession)
        );
        assert_eq!(whiteboard.store().len(), 1);
    }

    #[test]
    fn it_disconnects_from_bound_session() {
        let mut whiteboard = Whiteboard::new();
        let (a, _) = whiteboard.connect();
        let (b, _) = whiteboard.connect();
        whiteboard.create_and_join(&a).expect("");
        let session_id = match whiteboard.connection_state(&a) {
            Some(ConnectionState::Joined(session_id)) => *session_id,
            _ => panic!("not joined"),
        };
        whiteboard.join(&b, &session_id).expect("");

        assert_eq!(whiteboard.disconnect(&b), Some(session_id));
        assert_eq!(whiteboard.disconnect(&b), None);
        assert!(!whiteboard.store().get(&session_id).expect("").has_player(&b));
        assert_eq!(whiteboard.connection_count(), 1);
    }
}
