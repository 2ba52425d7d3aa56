use std::net::IpAddr;

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::CloseCode;

use system::{ClientMessage, CloseReason, PlayerId, ServerMessage};

use crate::config::Config;
use crate::connection_tx_storage::{connection_channel, ConnectionTx};
use crate::server::ServerTx;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: ConnectionTx,
        addr: Option<IpAddr>,
    },
    Disconnect {
        from: PlayerId,
    },
    ClientMessage {
        from: PlayerId,
        message: ClientMessage,
    },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { player_id: PlayerId },
    ServerMessage(ServerMessage),
    Disconnected(Closing),
}

/// How the server closes a connection: a distinguishing code plus a
/// human-readable description.
#[derive(Debug, Clone, PartialEq)]
pub struct Closing {
    pub reason: CloseReason,
    pub description: String,
}

impl Closing {
    pub fn new(reason: CloseReason, description: impl Into<String>) -> Self {
        Self {
            reason,
            description: description.into(),
        }
    }
}

impl From<CloseReason> for Closing {
    fn from(reason: CloseReason) -> Self {
        Self::new(reason, reason.as_str())
    }
}

impl From<&system::SessionError> for Closing {
    fn from(err: &system::SessionError) -> Self {
        Self::new(err.close_reason(), err.to_string())
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Connected(PlayerId),
    Closed,
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
    addr: Option<IpAddr>,
    outbound_buffer: usize,
}

impl ConnectionActor {
    fn close(&self, ctx: &mut ws::WebsocketContext<Self>, closing: Closing) {
        ctx.close(Some(ws::CloseReason {
            code: CloseCode::Other(closing.reason.code()),
            description: Some(closing.description),
        }));
        ctx.stop();
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx, mut close_rx) = connection_channel(self.outbound_buffer);

        if self
            .srv_tx
            .send(ConnectionCommand::Connect {
                tx,
                addr: self.addr,
            })
            .is_err()
        {
            log::error!("server task is gone, refusing connection");
            ctx.stop();
            return;
        }

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            log::debug!("connection green thread - started");
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(event) => {
                            if addr.do_send(ConnectionActorMessage(event)).is_err() {
                                return;
                            }
                        }
                        None => break,
                    },
                    closing = &mut close_rx => {
                        if let Ok(closing) = closing {
                            let _ = addr.do_send(ConnectionActorMessage(
                                ConnectionEvent::Disconnected(closing),
                            ));
                        }
                        return;
                    }
                }
            }
            // the queue ends when the server forgets us; a close may still be pending
            if let Ok(closing) = close_rx.await {
                let _ = addr.do_send(ConnectionActorMessage(ConnectionEvent::Disconnected(
                    closing,
                )));
            }
            log::debug!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            // the server may already be gone during shutdown
            let _ = self.srv_tx.send(ConnectionCommand::Disconnect { from: id });
        }
        self.state = ConnectionState::Closed;

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => {
                log::debug!("Ingress size: {}", text.len());
                if let ConnectionState::Connected(from) = self.state {
                    match ClientMessage::decode(&text) {
                        Ok(message) => {
                            log::debug!("Ingress {:?}", message);
                            let _ = self
                                .srv_tx
                                .send(ConnectionCommand::ClientMessage { from, message });
                        }
                        Err(err) => {
                            log::warn!("closing {}: {}", from, err);
                            self.close(ctx, CloseReason::MalformedMessage.into());
                        }
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => self.close(ctx, CloseReason::MalformedMessage.into()),
            Ok(ws::Message::Close(_)) => ctx.stop(),
            Err(err) => {
                log::warn!("websocket protocol error: {}", err);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        let connection_event = msg.0;
        log::debug!("Egress {:?}", connection_event);
        match connection_event {
            ConnectionEvent::Connected { player_id } => {
                if let ConnectionState::Idle = self.state {
                    self.state = ConnectionState::Connected(player_id);
                }
            }
            ConnectionEvent::Disconnected(closing) => {
                // the server has already forgotten this connection
                self.state = ConnectionState::Closed;
                self.close(ctx, closing);
            }
            ConnectionEvent::ServerMessage(message) => match message.encode() {
                Ok(text) => ctx.text(text),
                Err(err) => log::error!("failed to encode {:?}: {}", message, err),
            },
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    config: web::Data<Config>,
) -> Result<HttpResponse, Error> {
    let addr = req.peer_addr().map(|addr| addr.ip());
    ws::start(
        ConnectionActor {
            srv_tx: srv_tx.get_ref().clone(),
            state: ConnectionState::Idle,
            addr,
            outbound_buffer: config.outbound_buffer,
        },
        &req,
        stream,
    )
}
