//! Session and tick engine of the collaborative whiteboard.
//!
//! Connections are represented by their player id. The transport feeds
//! [`ClientMessage`]s into [`Whiteboard::handle`], calls [`Whiteboard::tick`]
//! at a fixed rate and delivers the returned [`Envelope`]s.

pub extern crate euclid;
pub extern crate serde;
pub extern crate serde_json;
pub extern crate uuid;

mod drawing;
mod error;
mod identity;
mod ingest;
mod message;
mod registrar;
mod session;
mod store;
mod tick;
mod types;

pub use drawing::{Canvas, Stroke};
pub use error::{Operation, SessionError};
pub use identity::{IdAllocator, UuidAllocator};
pub use message::{ClientMessage, CloseReason, DecodeError, Envelope, ServerMessage};
pub use registrar::{ConnectionState, Whiteboard};
pub use session::{Player, Session};
pub use store::SessionStore;
pub use tick::{tick_period, DEFAULT_TICK_RATE};
pub use types::{Color, PathPoint, PlayerId, Position, SessionId, StrokeId};
