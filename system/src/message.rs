use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Color, PathPoint, PlayerId, SessionId, StrokeId};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Messages sent by a client. The `kind` field selects the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClientMessage {
    #[serde(alias = "PlayerClientCreateSession")]
    CreateSession,
    #[serde(alias = "PlayerClientJoinSession", rename_all = "camelCase")]
    JoinSession { session_id: SessionId },
    #[serde(alias = "PlayerClientSideMoving", rename_all = "camelCase")]
    Move {
        x: f64,
        y: f64,
        #[serde(default)]
        is_drawing: bool,
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    #[serde(alias = "PlayerClientStartDrawing", rename_all = "camelCase")]
    StartDrawing {
        x: f64,
        y: f64,
        color: Color,
        #[serde(default)]
        player_id: Option<PlayerId>,
        #[serde(default)]
        session_id: Option<SessionId>,
    },
    #[serde(alias = "PlayerClientStopDrawing", rename_all = "camelCase")]
    StopDrawing {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
        #[serde(default)]
        session_id: Option<SessionId>,
    },
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Messages sent by the server. Everything except `Handshake` and
/// `SessionCreated` is produced by the tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ServerMessage {
    Handshake {
        id: PlayerId,
    },
    #[serde(rename_all = "camelCase")]
    SessionCreated {
        session_id: SessionId,
    },
    PlayerJoined {
        id: PlayerId,
    },
    PlayerLeft {
        id: PlayerId,
    },
    PlayerMoved {
        id: PlayerId,
        x: f64,
        y: f64,
    },
    #[serde(rename_all = "camelCase")]
    PlayerDrawing {
        drawing_id: StrokeId,
        paths: Vec<PathPoint>,
        player_id: PlayerId,
        color: Color,
    },
}

impl ServerMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A server message addressed to a single player.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub to: PlayerId,
    pub message: ServerMessage,
}

impl Envelope {
    pub fn new(to: PlayerId, message: ServerMessage) -> Self {
        Self { to, message }
    }
}

/// Why a connection was closed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    MissingAddress,
    ConnectionLimitExceeded,
    SessionNotFound,
    InconsistentDrawState,
    MalformedMessage,
    InvalidState,
    IdCollision,
}

impl CloseReason {
    /// Private-use WebSocket close code.
    pub fn code(&self) -> u16 {
        match self {
            Self::MissingAddress => 4000,
            Self::ConnectionLimitExceeded => 4001,
            Self::SessionNotFound => 4002,
            Self::InconsistentDrawState => 4003,
            Self::MalformedMessage => 4004,
            Self::InvalidState => 4005,
            Self::IdCollision => 4006,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingAddress => "no remote address",
            Self::ConnectionLimitExceeded => "exceeded connection limit",
            Self::SessionNotFound => "session not found",
            Self::InconsistentDrawState => "inconsistent draw state",
            Self::MalformedMessage => "malformed message",
            Self::InvalidState => "invalid command for connection state",
            Self::IdCollision => "identifier collision",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}
