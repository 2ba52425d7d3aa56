use crate::connection::{Closing, ConnectionEvent};
use std::collections::HashMap;
use system::PlayerId;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};

pub type ConnectionRx = mpsc::Receiver<ConnectionEvent>;
pub type CloseRx = oneshot::Receiver<Closing>;

/// Connected and Handshake are queued back to back.
const MIN_OUTBOUND_BUFFER: usize = 2;

/// Server side of a connection. Events go through a bounded queue; the close
/// travels separately so a full queue can never swallow it.
#[derive(Debug)]
pub struct ConnectionTx {
    events: mpsc::Sender<ConnectionEvent>,
    close: oneshot::Sender<Closing>,
}

impl ConnectionTx {
    pub fn close(self, closing: Closing) {
        // fails only once the connection's forwarder is gone
        let _ = self.close.send(closing);
    }
}

pub fn connection_channel(buffer: usize) -> (ConnectionTx, ConnectionRx, CloseRx) {
    let (events, rx) = mpsc::channel(buffer.max(MIN_OUTBOUND_BUFFER));
    let (close, close_rx) = oneshot::channel();
    (ConnectionTx { events, close }, rx, close_rx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Queue full; the frame is dropped and the next tick supersedes it.
    Dropped,
    /// The connection is gone.
    Closed,
}

pub struct ConnectionTxStorage {
    connection_txs: HashMap<PlayerId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, player_id: PlayerId, tx: ConnectionTx) {
        self.connection_txs.insert(player_id, tx);
    }

    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.connection_txs.contains_key(player_id)
    }

    /// Never waits; the server task must not stall on a slow client.
    pub fn send(&mut self, to: &PlayerId, event: ConnectionEvent) -> Delivery {
        if let Some(tx) = self.connection_txs.get_mut(to) {
            match tx.events.try_send(event) {
                Ok(()) => Delivery::Sent,
                Err(TrySendError::Full(event)) => {
                    log::warn!("dropped {:?} for {}: queue full", event, to);
                    Delivery::Dropped
                }
                Err(TrySendError::Closed(_)) => Delivery::Closed,
            }
        } else {
            log::debug!("no connection for {}", to);
            Delivery::Closed
        }
    }

    pub fn remove(&mut self, player_id: &PlayerId) -> Option<ConnectionTx> {
        self.connection_txs.remove(player_id)
    }

    pub fn len(&self) -> usize {
        self.connection_txs.len()
    }
}
