use std::time::Duration;

use crate::identity::IdAllocator;
use crate::message::Envelope;
use crate::registrar::Whiteboard;

pub const DEFAULT_TICK_RATE: u32 = 60;

/// Period between two ticks for a rate in Hz. A rate of zero is treated as one.
pub fn tick_period(rate: u32) -> Duration {
    Duration::from_secs(1) / rate.max(1)
}

impl<A: IdAllocator> Whiteboard<A> {
    /// One broadcast step over all sessions. Pending buffers of every session
    /// are emptied; sessions left without players are removed afterwards
    /// unless configured otherwise.
    pub fn tick(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        for session in self.store.iter_mut() {
            out.extend(session.flush());
        }
        if self.remove_empty_sessions {
            let removed = self.store.remove_empty();
            if !removed.is_empty() {
                log::debug!("removed {} empty sessions", removed.len());
            }
        }
        if !out.is_empty() {
            log::trace!(
                "tick produced {} messages over {} sessions",
                out.len(),
                self.store.len()
            );
        }
        out
    }
}
