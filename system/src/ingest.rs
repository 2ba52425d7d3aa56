use crate::error::{Operation, SessionError};
use crate::identity::IdAllocator;
use crate::message::{ClientMessage, Envelope};
use crate::registrar::{ConnectionState, Whiteboard};
use crate::session::Session;
use crate::types::{PlayerId, Position, SessionId};

impl<A: IdAllocator> Whiteboard<A> {
    /// Applies one client message. Any error is fatal for the sending
    /// connection only and leaves session state untouched.
    pub fn handle(
        &mut self,
        from: &PlayerId,
        message: ClientMessage,
    ) -> Result<Vec<Envelope>, SessionError> {
        match message {
            ClientMessage::CreateSession => self.create_and_join(from),
            ClientMessage::JoinSession { session_id } => {
                self.join(from, &session_id).map(|_| Vec::new())
            }
            ClientMessage::Move {
                x,
                y,
                is_drawing,
                session_id,
            } => {
                let session = self.bound_session(from, session_id.as_ref(), Operation::Move)?;
                log::trace!("{} moved to ({}, {}) drawing={}", from, x, y, is_drawing);
                session.move_player(from, Position::new(x, y))?;
                Ok(Vec::new())
            }
            ClientMessage::StartDrawing {
                x,
                y,
                color,
                player_id,
                session_id,
            } => {
                if player_id.map_or(false, |claimed| claimed != *from) {
                    return Err(SessionError::BindingMismatch(Operation::StartDrawing));
                }
                let stroke_id = self.store.allocate_id();
                let session =
                    self.bound_session(from, session_id.as_ref(), Operation::StartDrawing)?;
                session.start_stroke(stroke_id, *from, color, Position::new(x, y))?;
                log::debug!("{} started stroke {} in {}", from, stroke_id, session.id);
                Ok(Vec::new())
            }
            ClientMessage::StopDrawing { session_id, .. } => {
                let session =
                    self.bound_session(from, session_id.as_ref(), Operation::StopDrawing)?;
                if let Some(stroke_id) = session.stop_stroke(from) {
                    log::debug!("{} finished stroke {} in {}", from, stroke_id, session.id);
                }
                Ok(Vec::new())
            }
        }
    }

    fn bound_session(
        &mut self,
        from: &PlayerId,
        claimed: Option<&SessionId>,
        operation: Operation,
    ) -> Result<&mut Session, SessionError> {
        let session_id = match self.connection_states.get(from) {
            Some(ConnectionState::Joined(session_id)) => *session_id,
            _ => return Err(SessionError::NotInSession(operation)),
        };
        if claimed.map_or(false, |claimed| *claimed != session_id) {
            return Err(SessionError::BindingMismatch(operation));
        }
        self.store
            .get_mut(&session_id)
            .ok_or(SessionError::SessionNotFound {
                operation,
                session_id,
            })
    }
}
