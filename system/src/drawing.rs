use std::collections::HashMap;

use crate::error::{Operation, SessionError};
use crate::message::ServerMessage;
use crate::types::{Color, PlayerId, Position, StrokeId};

/// One continuous drawing gesture.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub id: StrokeId,
    pub owner_id: PlayerId,
    pub color: Color,
    path: Vec<Position>,
    // number of points already broadcast
    flushed: usize,
}

impl Stroke {
    pub fn new(id: StrokeId, owner_id: PlayerId, color: Color, start: Position) -> Self {
        Self {
            id,
            owner_id,
            color,
            path: vec![start],
            flushed: 0,
        }
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn has_unflushed_points(&self) -> bool {
        self.path.len() > self.flushed
    }

    /// Full path from the first point, so a receiver can redraw idempotently.
    pub fn to_message(&self) -> ServerMessage {
        ServerMessage::PlayerDrawing {
            drawing_id: self.id,
            paths: self.path.iter().map(|p| (*p).into()).collect(),
            player_id: self.owner_id,
            color: self.color.clone(),
        }
    }
}

/// All strokes of a session plus the one currently being drawn.
///
/// Strokes are kept for the life of the session in creation order, which is
/// also the order they are broadcast and rendered in.
#[derive(Debug, Default)]
pub struct Canvas {
    strokes: HashMap<StrokeId, Stroke>,
    order: Vec<StrokeId>,
    active: Option<StrokeId>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_stroke_id(&self) -> Option<&StrokeId> {
        self.active.as_ref()
    }

    pub fn get(&self, stroke_id: &StrokeId) -> Option<&Stroke> {
        self.strokes.get(stroke_id)
    }

    pub fn contains(&self, stroke_id: &StrokeId) -> bool {
        self.strokes.contains_key(stroke_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn strokes(&self) -> impl Iterator<Item = &Stroke> + '_ {
        self.order.iter().filter_map(move |id| self.strokes.get(id))
    }

    /// Registers `stroke` and makes it the active one. Any previously active
    /// stroke is finalized.
    pub fn begin(&mut self, stroke: Stroke) -> Result<(), SessionError> {
        if self.strokes.contains_key(&stroke.id) {
            return Err(SessionError::IdCollision {
                operation: Operation::StartDrawing,
                id: stroke.id,
            });
        }
        let stroke_id = stroke.id;
        if let Some(previous) = self.active.replace(stroke_id) {
            log::debug!("stroke {} finalized by a newer stroke", previous);
        }
        self.order.push(stroke_id);
        self.strokes.insert(stroke_id, stroke);
        Ok(())
    }

    /// Appends `point` to the active stroke if `by` owns it. Returns whether
    /// a point was appended.
    pub fn extend(&mut self, by: &PlayerId, point: Position) -> Result<bool, SessionError> {
        let stroke_id = match self.active {
            Some(stroke_id) => stroke_id,
            None => return Ok(false),
        };
        let stroke = self
            .strokes
            .get_mut(&stroke_id)
            .ok_or(SessionError::MissingActiveStroke {
                operation: Operation::Move,
                stroke_id,
            })?;
        if stroke.owner_id != *by {
            return Ok(false);
        }
        stroke.path.push(point);
        Ok(true)
    }

    /// Finalizes the active stroke if `by` owns it. Stops from other players
    /// are ignored, since clients send one whenever the pointer leaves the canvas.
    pub fn finish(&mut self, by: &PlayerId) -> Option<StrokeId> {
        let stroke_id = self.active?;
        let owned = self
            .strokes
            .get(&stroke_id)
            .map(|stroke| stroke.owner_id == *by)
            // a dangling active id is cleared by anyone
            .unwrap_or(true);
        if owned {
            self.active = None;
            Some(stroke_id)
        } else {
            None
        }
    }

    /// Drawing updates for every stroke that gained points since the last
    /// call, marking them flushed.
    pub fn take_updates(&mut self) -> Vec<(StrokeId, ServerMessage)> {
        let mut updates = Vec::new();
        for id in &self.order {
            if let Some(stroke) = self.strokes.get_mut(id) {
                if stroke.has_unflushed_points() {
                    stroke.flushed = stroke.path.len();
                    updates.push((stroke.id, stroke.to_message()));
                }
            }
        }
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn stroke_by(owner_id: PlayerId) -> Stroke {
        Stroke::new(
            Uuid::new_v4(),
            owner_id,
            "#fff".into(),
            Position::new(10.0, 10.0),
        )
    }

    #[test]
    fn it_appends_only_for_the_owner() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut canvas = Canvas::new();
        let stroke = stroke_by(owner);
        let stroke_id = stroke.id;
        canvas.begin(stroke).expect("");

        assert!(canvas.extend(&owner, Position::new(12.0, 11.0)).expect(""));
        assert!(!canvas.extend(&other, Position::new(99.0, 99.0)).expect(""));

        let path = canvas.get(&stroke_id).expect("").path().to_vec();
        assert_eq!(path, vec![Position::new(10.0, 10.0), Position::new(12.0, 11.0)]);
    }

    #[test]
    fn it_ignores_moves_without_active_stroke() {
        let mut canvas = Canvas::new();
        assert!(!canvas.extend(&Uuid::new_v4(), Position::new(1.0, 1.0)).expect(""));
        assert!(canvas.is_empty());
    }

    #[test]
    fn it_keeps_finished_strokes() {
        let owner = Uuid::new_v4();
        let mut canvas = Canvas::new();
        let stroke = stroke_by(owner);
        let stroke_id = stroke.id;
        canvas.begin(stroke).expect("");

        assert_eq!(canvas.finish(&Uuid::new_v4()), None);
        assert_eq!(canvas.finish(&owner), Some(stroke_id));
        assert_eq!(canvas.active_stroke_id(), None);
        assert!(canvas.contains(&stroke_id));

        // no longer appended to
        assert!(!canvas.extend(&owner, Position::new(5.0, 5.0)).expect(""));
        assert_eq!(canvas.get(&stroke_id).expect("").path().len(), 1);
    }

    #[test]
    fn it_rejects_colliding_stroke_ids() {
        let owner = Uuid::new_v4();
        let mut canvas = Canvas::new();
        let stroke = stroke_by(owner);
        let duplicate = Stroke::new(stroke.id, owner, "#000".into(), Position::new(0.0, 0.0));
        canvas.begin(stroke).expect("");
        canvas.finish(&owner);

        let err = canvas.begin(duplicate).unwrap_err();
        assert!(matches!(err, SessionError::IdCollision { .. }));
        assert_eq!(canvas.len(), 1);
        assert_eq!(canvas.active_stroke_id(), None);
    }

    #[test]
    fn it_reports_a_dangling_active_stroke() {
        let mut canvas = Canvas::new();
        let dangling = Uuid::new_v4();
        canvas.active = Some(dangling);

        let err = canvas
            .extend(&Uuid::new_v4(), Position::new(1.0, 2.0))
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::MissingActiveStroke {
                operation: Operation::Move,
                stroke_id: dangling,
            }
        );
    }

    #[test]
    fn it_flushes_only_strokes_with_new_points() {
        let owner = Uuid::new_v4();
        let mut canvas = Canvas::new();
        let first = stroke_by(owner);
        let first_id = first.id;
        canvas.begin(first).expect("");
        canvas.finish(&owner);
        let second = stroke_by(owner);
        let second_id = second.id;
        canvas.begin(second).expect("");

        let ids = canvas
            .take_updates()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![first_id, second_id]);
        assert!(canvas.take_updates().is_empty());

        canvas.extend(&owner, Position::new(3.0, 4.0)).expect("");
        let updates = canvas.take_updates();
        assert_eq!(updates.len(), 1);
        match &updates[0].1 {
            ServerMessage::PlayerDrawing {
                drawing_id, paths, ..
            } => {
                assert_eq!(*drawing_id, second_id);
                assert_eq!(paths.len(), 2);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
}
