use crate::connection::ConnectionEvent;
use crate::session::Session;
use std::collections::HashMap;
use system::{ClientType, ConnectionId, Envelope};

pub type ConnectionTx = tokio::sync::mpsc::UnboundedSender<ConnectionEvent>;

/// Outbound side of every live connection. All sends are best-effort: a connection whose
/// receiver is gone is skipped and never fails the rest of a broadcast.
#[derive(Default)]
pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }

    pub fn send_event(&self, to: &ConnectionId, event: ConnectionEvent) -> bool {
        match self.connection_txs.get(to) {
            Some(tx) if !tx.is_closed() => tx.send(event).is_ok(),
            Some(_) => {
                log::debug!("Skipping closed connection {}", to);
                false
            }
            None => {
                log::debug!("No sink for connection {}", to);
                false
            }
        }
    }

    pub fn send(&self, to: &ConnectionId, envelope: &Envelope) -> bool {
        self.send_event(to, ConnectionEvent::Text(envelope.encode()))
    }

    /// Delivers to every member of `session` except `without`. Returns how many sends went out.
    pub fn broadcast(
        &self,
        session: &Session,
        envelope: &Envelope,
        without: Option<&ConnectionId>,
    ) -> usize {
        self.deliver(session, |_| true, envelope, without)
    }

    /// Like `broadcast`, restricted to members of the given roles.
    pub fn broadcast_to_roles(
        &self,
        session: &Session,
        roles: &[ClientType],
        envelope: &Envelope,
        without: Option<&ConnectionId>,
    ) -> usize {
        self.deliver(session, |role| roles.contains(role), envelope, without)
    }

    fn deliver<F>(
        &self,
        session: &Session,
        accept: F,
        envelope: &Envelope,
        without: Option<&ConnectionId>,
    ) -> usize
    where
        F: Fn(&ClientType) -> bool,
    {
        let text = envelope.encode();
        session
            .members()
            .filter(|(connection_id, role)| without != Some(*connection_id) && accept(*role))
            .filter(|(connection_id, _)| {
                self.send_event(*connection_id, ConnectionEvent::Text(text.clone()))
            })
            .count()
    }
}
