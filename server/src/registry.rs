use chrono::{DateTime, Utc};
use std::collections::HashMap;
use system::{ClientId, ClientType, ConnectionId, SessionId};

#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub client_id: ClientId,
    /// Unknown until the first successful join.
    pub client_type: Option<ClientType>,
    pub session_id: Option<SessionId>,
    pub joined_at: DateTime<Utc>,
}

/// One record per live transport connection.
#[derive(Default)]
pub struct ConnectionRegistry {
    records: HashMap<ConnectionId, ClientRecord>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId) -> ClientId {
        let client_id = ClientId::new();
        self.records.insert(
            connection_id,
            ClientRecord {
                client_id: client_id.clone(),
                client_type: None,
                session_id: None,
                joined_at: Utc::now(),
            },
        );
        client_id
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<&ClientRecord> {
        self.records.get(connection_id)
    }

    pub fn lookup_mut(&mut self, connection_id: &ConnectionId) -> Option<&mut ClientRecord> {
        self.records.get_mut(connection_id)
    }

    /// Callers must run the leave cleanup first; see `ServerState::disconnect`.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<ClientRecord> {
        self.records.remove(connection_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
