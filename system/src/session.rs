use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::drawing::{Canvas, Stroke};
use crate::error::{Operation, SessionError};
use crate::message::{Envelope, ServerMessage};
use crate::types::{Color, PlayerId, Position, SessionId, StrokeId};

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub position: Option<Position>,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self { id, position: None }
    }
}

/// One shared canvas and its roster.
///
/// `joined`, `left` and `moved` hold what happened since the last tick and
/// are emptied by [`Session::flush`] whether or not anybody received them.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub created_at: Instant,
    players: HashMap<PlayerId, Player>,
    joined: Vec<PlayerId>,
    left: Vec<PlayerId>,
    moved: HashMap<PlayerId, Position>,
    canvas: Canvas,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Instant::now(),
            players: HashMap::new(),
            joined: Vec::new(),
            left: Vec::new(),
            moved: HashMap::new(),
            canvas: Canvas::new(),
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.players.values()
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.get(player_id)
    }

    pub fn has_player(&self, player_id: &PlayerId) -> bool {
        self.players.contains_key(player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.joined.is_empty() || !self.left.is_empty() || !self.moved.is_empty()
    }

    pub fn add_player(&mut self, player_id: PlayerId) {
        self.players.insert(player_id, Player::new(player_id));
        if !self.joined.contains(&player_id) {
            self.joined.push(player_id);
        }
    }

    /// Removes `player_id`. A player nobody has been told about yet leaves no
    /// trace; otherwise peers learn about the departure on the next tick.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<Player> {
        let player = self.players.remove(player_id)?;
        self.moved.remove(player_id);
        if let Some(stroke_id) = self.canvas.finish(player_id) {
            log::debug!("stroke {} finalized by disconnect of {}", stroke_id, player_id);
        }
        if let Some(pos) = self.joined.iter().position(|id| id == player_id) {
            self.joined.remove(pos);
        } else if !self.left.contains(player_id) {
            self.left.push(*player_id);
        }
        Some(player)
    }

    pub fn move_player(&mut self, player_id: &PlayerId, pos: Position) -> Result<(), SessionError> {
        if !self.players.contains_key(player_id) {
            return Err(SessionError::NotInSession(Operation::Move));
        }
        self.canvas.extend(player_id, pos)?;
        self.moved.insert(*player_id, pos);
        if let Some(player) = self.players.get_mut(player_id) {
            player.position = Some(pos);
        }
        Ok(())
    }

    pub fn start_stroke(
        &mut self,
        stroke_id: StrokeId,
        owner_id: PlayerId,
        color: Color,
        start: Position,
    ) -> Result<(), SessionError> {
        if !self.players.contains_key(&owner_id) {
            return Err(SessionError::NotInSession(Operation::StartDrawing));
        }
        self.canvas
            .begin(Stroke::new(stroke_id, owner_id, color, start))
    }

    pub fn stop_stroke(&mut self, by: &PlayerId) -> Option<StrokeId> {
        self.canvas.finish(by)
    }

    /// Produces everything peers need to catch up with the changes since the
    /// previous call, then clears the pending buffers.
    pub fn flush(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        let joined = std::mem::take(&mut self.joined)
            .into_iter()
            .filter(|id| self.players.contains_key(id))
            .collect::<Vec<_>>();

        // Arrivals meet the whole roster, the rest of the roster meets arrivals.
        for joined_id in &joined {
            for player_id in self.players.keys().filter(|id| *id != joined_id) {
                out.push(Envelope::new(
                    *joined_id,
                    ServerMessage::PlayerJoined { id: *player_id },
                ));
            }
        }
        for player_id in self.players.keys().filter(|id| !joined.contains(id)) {
            for joined_id in &joined {
                out.push(Envelope::new(
                    *player_id,
                    ServerMessage::PlayerJoined { id: *joined_id },
                ));
            }
        }

        for left_id in std::mem::take(&mut self.left) {
            for player_id in self.players.keys().filter(|id| **id != left_id) {
                out.push(Envelope::new(
                    *player_id,
                    ServerMessage::PlayerLeft { id: left_id },
                ));
            }
        }

        for (moved_id, pos) in std::mem::take(&mut self.moved) {
            for player_id in self.players.keys().filter(|id| **id != moved_id) {
                out.push(Envelope::new(
                    *player_id,
                    ServerMessage::PlayerMoved {
                        id: moved_id,
                        x: pos.x,
                        y: pos.y,
                    },
                ));
            }
        }

        let updates = self.canvas.take_updates();
        for (_, message) in &updates {
            for player_id in self.players.keys() {
                out.push(Envelope::new(*player_id, message.clone()));
            }
        }
        if !joined.is_empty() {
            let updated = updates.iter().map(|(id, _)| *id).collect::<HashSet<_>>();
            for stroke in self.canvas.strokes().filter(|s| !updated.contains(&s.id)) {
                let message = stroke.to_message();
                for joined_id in &joined {
                    out.push(Envelope::new(*joined_id, message.clone()));
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn messages_to<'a>(out: &'a [Envelope], to: &PlayerId) -> Vec<&'a ServerMessage> {
        out.iter()
            .filter(|e| e.to == *to)
            .map(|e| &e.message)
            .collect()
    }

    #[test]
    fn it_introduces_same_tick_joiners_exactly_once() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);

        let out = session.flush();
        assert_eq!(
            messages_to(&out, &a),
            vec![&ServerMessage::PlayerJoined { id: b }]
        );
        assert_eq!(
            messages_to(&out, &b),
            vec![&ServerMessage::PlayerJoined { id: a }]
        );
        assert!(!session.has_pending_changes());
    }

    #[test]
    fn it_announces_a_newcomer_to_the_existing_roster() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);
        session.flush();

        session.add_player(c);
        let out = session.flush();
        assert_eq!(
            messages_to(&out, &a),
            vec![&ServerMessage::PlayerJoined { id: c }]
        );
        assert_eq!(
            messages_to(&out, &b),
            vec![&ServerMessage::PlayerJoined { id: c }]
        );
        let to_c = messages_to(&out, &c);
        assert_eq!(to_c.len(), 2);
        assert!(to_c.contains(&&ServerMessage::PlayerJoined { id: a }));
        assert!(to_c.contains(&&ServerMessage::PlayerJoined { id: b }));
    }

    #[test]
    fn it_cancels_join_and_leave_within_one_tick() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.flush();

        session.add_player(b);
        session.remove_player(&b).expect("");
        assert!(session.flush().is_empty());
    }

    #[test]
    fn it_notifies_departures_to_remaining_players() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);
        session.flush();

        session.move_player(&b, Position::new(1.0, 1.0)).expect("");
        session.remove_player(&b).expect("");
        let out = session.flush();
        assert_eq!(out, vec![Envelope::new(a, ServerMessage::PlayerLeft { id: b })]);
        assert!(session.remove_player(&b).is_none());
    }

    #[test]
    fn it_coalesces_moves_within_a_tick() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);
        session.flush();

        for i in 0..5 {
            session
                .move_player(&a, Position::new(i as f64, 2.0 * i as f64))
                .expect("");
        }
        let out = session.flush();
        assert!(messages_to(&out, &a).is_empty());
        assert_eq!(
            messages_to(&out, &b),
            vec![&ServerMessage::PlayerMoved {
                id: a,
                x: 4.0,
                y: 8.0
            }]
        );
        assert_eq!(
            session.player(&a).expect("").position,
            Some(Position::new(4.0, 8.0))
        );
        assert!(session.flush().is_empty());
    }

    #[test]
    fn it_broadcasts_drawings_to_everyone_including_owner() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);
        session.flush();

        let stroke_id = Uuid::new_v4();
        session
            .start_stroke(stroke_id, a, "#fff".into(), Position::new(10.0, 10.0))
            .expect("");
        session.move_player(&a, Position::new(12.0, 11.0)).expect("");
        session.stop_stroke(&a);

        let out = session.flush();
        let drawing = session.canvas().get(&stroke_id).expect("").to_message();
        assert!(messages_to(&out, &a).contains(&&drawing));
        assert!(messages_to(&out, &b).contains(&&drawing));

        // nothing new, nothing sent
        assert!(session.flush().is_empty());
    }

    #[test]
    fn it_sends_finished_strokes_to_late_joiners() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let c = Uuid::new_v4();
        session.add_player(a);
        let stroke_id = Uuid::new_v4();
        session
            .start_stroke(stroke_id, a, "#f00".into(), Position::new(0.0, 0.0))
            .expect("");
        session.stop_stroke(&a);
        session.flush();

        session.add_player(c);
        let out = session.flush();
        let drawing = session.canvas().get(&stroke_id).expect("").to_message();
        assert_eq!(
            messages_to(&out, &c),
            vec![&ServerMessage::PlayerJoined { id: a }, &drawing]
        );
        assert_eq!(
            messages_to(&out, &a),
            vec![&ServerMessage::PlayerJoined { id: c }]
        );
    }

    #[test]
    fn it_finalizes_owned_stroke_on_departure() {
        let mut session = Session::new(Uuid::new_v4());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        session.add_player(a);
        session.add_player(b);
        let stroke_id = Uuid::new_v4();
        session
            .start_stroke(stroke_id, a, "#fff".into(), Position::new(0.0, 0.0))
            .expect("");

        session.remove_player(&b);
        assert_eq!(session.canvas().active_stroke_id(), Some(&stroke_id));

        session.remove_player(&a);
        assert_eq!(session.canvas().active_stroke_id(), None);
        assert!(session.canvas().contains(&stroke_id));
    }
}
