use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::oneshot;

use system::serde_json::json;
use system::{ConnectionId, Envelope, MessageKind, Payload, SessionId};

use crate::admin::{AdminCommand, HubStatus, SessionStatus};
use crate::connection::{ConnectionCommand, ConnectionEvent, DisconnectReason};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::server_state::{Departure, ServerState};

pub type ServerTx = UnboundedSender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    AdminCommand(AdminCommand),
    Shutdown { tx: oneshot::Sender<()> },
}

/// All hub state. Owned by a single task that handles one command at a time, so nothing in
/// here needs a lock.
#[derive(Default)]
pub struct Server {
    pub(crate) state: ServerState,
    pub(crate) connections: ConnectionTxStorage,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(command) => self.handle_connection_command(command),
            ServerCommand::AdminCommand(AdminCommand::GetStatus { tx }) => {
                let _ = tx.send(self.status());
            }
            ServerCommand::Shutdown { tx } => {
                self.shutdown();
                let _ = tx.send(());
            }
        }
    }

    pub fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { from, tx } => {
                let client_id = self.state.connect(from);
                self.connections.insert(from, tx);
                self.connections
                    .send_event(&from, ConnectionEvent::Connected { client_id });
            }
            ConnectionCommand::Disconnect { from } => self.disconnect(&from),
            ConnectionCommand::Message { from, message } => self.handle_message(&from, message),
        }
    }

    /// Transport closed or errored. Same cleanup as an explicit leave.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) {
        if let Some(departure) = self.state.disconnect(connection_id) {
            self.announce_departure(connection_id, &departure);
        }
        if self.connections.remove(connection_id).is_some() {
            log::info!("Connection {} unregistered", connection_id);
        }
    }

    /// Closes every connection with the shutdown code, tearing each down like a leave.
    pub fn shutdown(&mut self) {
        let connection_ids = self.state.registry.connection_ids();
        log::info!("Shutting down {} connection(s)", connection_ids.len());
        for connection_id in connection_ids {
            self.connections.send_event(
                &connection_id,
                ConnectionEvent::Disconnected {
                    reason: DisconnectReason::Shutdown,
                },
            );
            self.disconnect(&connection_id);
        }
    }

    pub fn status(&self) -> HubStatus {
        HubStatus {
            connections: self.state.registry.len(),
            sessions: self
                .state
                .sessions
                .iter()
                .map(|session| SessionStatus {
                    session_id: session.session_id.clone(),
                    session_info: session.session_info(),
                    object_count: session.snapshot.objects.len(),
                    last_update: session.last_update,
                })
                .collect(),
        }
    }

    pub(crate) fn announce_departure(&self, from: &ConnectionId, departure: &Departure) {
        if let Some(session_info) = departure.remaining {
            let mut payload = Payload::new();
            payload.insert("clientId".into(), json!(departure.client_id));
            payload.insert("clientType".into(), json!(departure.client_type));
            payload.insert("sessionInfo".into(), json!(session_info));
            let envelope = Envelope::new(
                MessageKind::ClientLeft,
                Some(departure.session_id.clone()),
                payload,
            );
            self.broadcast(&departure.session_id, &envelope, Some(from));
        }
    }

    pub(crate) fn send(&self, to: &ConnectionId, envelope: &Envelope) -> bool {
        self.connections.send(to, envelope)
    }

    pub(crate) fn broadcast(
        &self,
        session_id: &SessionId,
        envelope: &Envelope,
        without: Option<&ConnectionId>,
    ) -> usize {
        self.state
            .sessions
            .get(session_id)
            .map(|session| self.connections.broadcast(session, envelope, without))
            .unwrap_or(0)
    }

    pub(crate) fn broadcast_to_roles(
        &self,
        session_id: &SessionId,
        roles: &[system::ClientType],
        envelope: &Envelope,
        without: Option<&ConnectionId>,
    ) -> usize {
        self.state
            .sessions
            .get(session_id)
            .map(|session| {
                self.connections
                    .broadcast_to_roles(session, roles, envelope, without)
            })
            .unwrap_or(0)
    }
}

pub fn spawn_server() -> ServerTx {
    let (srv_tx, mut srv_rx) = unbounded_channel::<ServerCommand>();

    tokio::spawn(async move {
        let mut server = Server::new();

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command);
        }
        log::info!("server task terminated");
    });

    srv_tx
}

/// Asks the server task to close every connection and waits until it has.
pub async fn shutdown_server(srv_tx: &ServerTx) {
    let (tx, rx) = oneshot::channel();
    if srv_tx.send(ServerCommand::Shutdown { tx }).is_ok() {
        let _ = rx.await;
    }
}
