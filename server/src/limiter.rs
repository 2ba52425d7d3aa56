use std::collections::HashMap;
use std::net::IpAddr;

use system::{CloseReason, PlayerId};

/// Counts open connections per remote address.
pub struct ConnectionLimiter {
    limit: usize,
    counts: HashMap<IpAddr, usize>,
    owners: HashMap<PlayerId, IpAddr>,
}

impl ConnectionLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            counts: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Checks whether a connection from `addr` may be accepted.
    pub fn check(&self, addr: Option<IpAddr>) -> Result<IpAddr, CloseReason> {
        let addr = addr.ok_or(CloseReason::MissingAddress)?;
        if self.count(&addr) >= self.limit {
            Err(CloseReason::ConnectionLimitExceeded)
        } else {
            Ok(addr)
        }
    }

    pub fn acquire(&mut self, player_id: PlayerId, addr: IpAddr) {
        *self.counts.entry(addr).or_insert(0) += 1;
        self.owners.insert(player_id, addr);
    }

    pub fn release(&mut self, player_id: &PlayerId) {
        if let Some(addr) = self.owners.remove(player_id) {
            match self.counts.get_mut(&addr) {
                Some(count) if *count > 1 => *count -= 1,
                _ => {
                    self.counts.remove(&addr);
                }
            }
        }
    }

    pub fn count(&self, addr: &IpAddr) -> usize {
        self.counts.get(addr).copied().unwrap_or(0)
    }
}
