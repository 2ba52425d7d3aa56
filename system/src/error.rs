use std::fmt;

use crate::message::CloseReason;
use crate::types::{SessionId, StrokeId};

/// The client operation that was being applied when a fatal error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateSession,
    JoinSession,
    Move,
    StartDrawing,
    StopDrawing,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateSession => "CreateSession",
            Self::JoinSession => "JoinSession",
            Self::Move => "Move",
            Self::StartDrawing => "StartDrawing",
            Self::StopDrawing => "StopDrawing",
        };
        f.write_str(name)
    }
}

/// Fatal conditions. Any of these closes the offending connection and
/// nothing else.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("[{operation}] session {session_id} has ended")]
    SessionNotFound {
        operation: Operation,
        session_id: SessionId,
    },
    #[error("[{0}] connection isn't in any session")]
    NotInSession(Operation),
    #[error("[{0}] connection is already in a session")]
    AlreadyInSession(Operation),
    #[error("[{0}] payload does not match the connection's binding")]
    BindingMismatch(Operation),
    #[error("[{operation}] active stroke {stroke_id} is missing")]
    MissingActiveStroke {
        operation: Operation,
        stroke_id: StrokeId,
    },
    #[error("[{operation}] freshly allocated id {id} is already in use")]
    IdCollision {
        operation: Operation,
        id: uuid::Uuid,
    },
}

impl SessionError {
    pub fn close_reason(&self) -> CloseReason {
        match self {
            Self::SessionNotFound { .. } => CloseReason::SessionNotFound,
            Self::NotInSession(_) | Self::AlreadyInSession(_) | Self::BindingMismatch(_) => {
                CloseReason::InvalidState
            }
            Self::MissingActiveStroke { .. } => CloseReason::InconsistentDrawState,
            Self::IdCollision { .. } => CloseReason::IdCollision,
        }
    }
}
