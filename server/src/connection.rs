use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use actix_web_actors::ws::{CloseCode, CloseReason};
use std::sync::atomic::{AtomicU64, Ordering};

use system::{ClientId, ConnectionId, Envelope, MessageKind, ProtocolError};

use crate::server::{ServerCommand, ServerTx};

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        from: ConnectionId,
        tx: crate::connection_tx_storage::ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    Message {
        from: ConnectionId,
        message: Result<Envelope, ProtocolError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Shutdown,
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { client_id: ClientId },
    Text(String),
    Disconnected { reason: DisconnectReason },
}

/// Source of connection handles, shared by every worker.
#[derive(Default)]
pub struct ConnectionCounter(AtomicU64);

impl ConnectionCounter {
    fn next(&self) -> ConnectionId {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

/// Where the actor stands with the server task.
#[derive(Debug, PartialEq)]
enum ConnectionState {
    /// `Connect` was never accepted.
    Idle,
    /// `Connect` is queued, no client id yet.
    Pending,
    Connected(ClientId),
    /// The server already tore this connection down.
    Closed,
}

impl ConnectionState {
    /// Whether the server still holds state that a `Disconnect` has to clean up.
    fn registered(&self) -> bool {
        matches!(self, ConnectionState::Pending | ConnectionState::Connected(_))
    }
}

struct ConnectionActor {
    connection_id: ConnectionId,
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl ConnectionActor {
    fn forward(&self, command: ConnectionCommand) -> bool {
        self.srv_tx.send(ServerCommand::Connection(command)).is_ok()
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<ConnectionEvent>();

        if !self.forward(ConnectionCommand::Connect {
            from: self.connection_id,
            tx,
        }) {
            log::error!("Server task is gone, refusing connection {}", self.connection_id);
            ctx.stop();
            return;
        }
        self.state = ConnectionState::Pending;

        let addr = ctx.address().recipient();
        let connection_id = self.connection_id;

        tokio::spawn(async move {
            log::debug!("connection {} green thread - started", connection_id);
            while let Some(event) = rx.recv().await {
                addr.do_send(ConnectionActorMessage(event));
            }
            log::debug!("connection {} green thread - terminated", connection_id);
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self.state.registered() {
            self.forward(ConnectionCommand::Disconnect {
                from: self.connection_id,
            });
        }
        self.state = ConnectionState::Closed;
        Running::Stop
    }
}

impl ConnectionActor {
    fn ingress(&self, text: &str) {
        let message = Envelope::decode(text);
        match &message {
            Ok(envelope)
                if envelope.kind == MessageKind::Transform
                    || envelope.kind == MessageKind::TransformBatch => {}
            Ok(envelope) => log::debug!("Ingress {} from {}", envelope.kind, self.connection_id),
            Err(error) => log::debug!("Ingress from {}: {}", self.connection_id, error),
        }
        self.forward(ConnectionCommand::Message {
            from: self.connection_id,
            message,
        });
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => (),
            Ok(ws::Message::Text(text)) => self.ingress(&text),
            Ok(ws::Message::Binary(bin)) => match std::str::from_utf8(&bin) {
                Ok(text) => self.ingress(text),
                Err(error) => {
                    self.forward(ConnectionCommand::Message {
                        from: self.connection_id,
                        message: Err(ProtocolError::Malformed(error.to_string())),
                    });
                }
            },
            Ok(ws::Message::Close(reason)) => {
                log::info!("Connection {} closed by peer: {:?}", self.connection_id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => (),
            Err(error) => {
                log::warn!("Transport error on connection {}: {}", self.connection_id, error);
                ctx.stop();
            }
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
        match msg.0 {
            ConnectionEvent::Connected { client_id } => {
                log::info!(
                    "Connection {} registered as client {}",
                    self.connection_id,
                    client_id
                );
                self.state = ConnectionState::Connected(client_id);
            }
            ConnectionEvent::Text(text) => ctx.text(text),
            ConnectionEvent::Disconnected { reason } => {
                if let ConnectionState::Connected(client_id) = &self.state {
                    log::info!("Closing client {}: {:?}", client_id, reason);
                }
                self.state = ConnectionState::Closed;
                ctx.close(Some(CloseReason {
                    code: CloseCode::Away,
                    description: Some("server shutting down".into()),
                }));
                ctx.stop();
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    counter: web::Data<ConnectionCounter>,
) -> Result<HttpResponse, Error> {
    let connection_id = counter.next();
    log::info!(
        "Connection {} opened from {:?}",
        connection_id,
        req.peer_addr()
    );
    ws::start(
        ConnectionActor {
            connection_id,
            state: ConnectionState::Idle,
            srv_tx: srv_tx.get_ref().clone(),
        },
        &req,
        stream,
    )
}
