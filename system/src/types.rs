use euclid::default::Point2D;
use serde::{Deserialize, Serialize};

pub type PlayerId = uuid::Uuid;
pub type SessionId = uuid::Uuid;
pub type StrokeId = uuid::Uuid;

/// Canvas coordinates as reported by the client.
pub type Position = Point2D<f64>;

/// CSS color string chosen by the drawing client, e.g. `"#fff"`.
pub type Color = String;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl From<Position> for PathPoint {
    fn from(pos: Position) -> Self {
        Self { x: pos.x, y: pos.y }
    }
}
