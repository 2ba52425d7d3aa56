use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use system::{ClientMessage, Envelope, PlayerId, Whiteboard};

use super::connection::{Closing, ConnectionCommand, ConnectionEvent};
use crate::config::Config;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage, Delivery};
use crate::limiter::ConnectionLimiter;

pub type ServerTx = UnboundedSender<ConnectionCommand>;

/// Sole owner of all whiteboard state. Commands and ticks are handled one
/// at a time on a single task.
struct Server {
    whiteboard: Whiteboard,
    connections: ConnectionTxStorage,
    limiter: ConnectionLimiter,
}

impl Server {
    fn new(config: &Config) -> Self {
        Self {
            whiteboard: Whiteboard::new().keep_empty_sessions(config.keep_empty_sessions),
            connections: ConnectionTxStorage::new(),
            limiter: ConnectionLimiter::new(config.connection_limit),
        }
    }

    fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx, addr } => self.connect(tx, addr),
            ConnectionCommand::Disconnect { from } => self.disconnect(&from),
            ConnectionCommand::ClientMessage { from, message } => {
                self.handle_client_message(&from, message)
            }
        }
    }

    fn connect(&mut self, tx: ConnectionTx, addr: Option<std::net::IpAddr>) {
        let addr = match self.limiter.check(addr) {
            Ok(addr) => addr,
            Err(reason) => {
                log::warn!("refusing connection from {:?}: {}", addr, reason);
                tx.close(reason.into());
                return;
            }
        };
        let (player_id, handshake) = self.whiteboard.connect();
        self.limiter.acquire(player_id, addr);
        self.connections.insert(player_id, tx);
        log::debug!(
            "connection {} from {} ({} open)",
            player_id,
            addr,
            self.connections.len()
        );
        self.connections
            .send(&player_id, ConnectionEvent::Connected { player_id });
        self.deliver(vec![handshake]);
    }

    fn handle_client_message(&mut self, from: &PlayerId, message: ClientMessage) {
        if !self.connections.contains(from) {
            log::debug!("ignoring message from closed connection {}", from);
            return;
        }
        match self.whiteboard.handle(from, message) {
            Ok(envelopes) => self.deliver(envelopes),
            Err(err) => {
                log::warn!("Disconnecting a connection due to fatal error: {}", err);
                self.close(from, Closing::from(&err));
            }
        }
    }

    fn tick(&mut self) {
        let envelopes = self.whiteboard.tick();
        self.deliver(envelopes);
    }

    fn deliver(&mut self, envelopes: Vec<Envelope>) {
        let mut closed = Vec::new();
        for Envelope { to, message } in envelopes {
            if self
                .connections
                .send(&to, ConnectionEvent::ServerMessage(message))
                == Delivery::Closed
                && !closed.contains(&to)
            {
                closed.push(to);
            }
        }
        for player_id in closed {
            log::info!("connection {} went away", player_id);
            self.disconnect(&player_id);
        }
    }

    /// Closes a connection on the server's initiative.
    fn close(&mut self, player_id: &PlayerId, closing: Closing) {
        if let Some(tx) = self.connections.remove(player_id) {
            tx.close(closing);
        }
        self.disconnect(player_id);
    }

    fn disconnect(&mut self, player_id: &PlayerId) {
        self.connections.remove(player_id);
        self.whiteboard.disconnect(player_id);
        self.limiter.release(player_id);
    }
}

pub fn spawn_server(config: &Config) -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ConnectionCommand>();
    let mut server = Box::new(Server::new(config));
    let period = config.tick_period();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                command = srv_rx.recv() => match command {
                    Some(command) => server.handle_connection_command(command),
                    None => break,
                },
                _ = ticker.tick() => server.tick(),
            }
        }
        log::info!("server task terminated");
    });

    srv_tx
}
