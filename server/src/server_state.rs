use crate::registry::ConnectionRegistry;
use crate::session_store::{Removal, SessionStore};
use system::{ClientId, ClientType, ConnectionId, SessionId, SessionInfo};

/// A connection that just left a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    pub client_id: ClientId,
    pub client_type: ClientType,
    /// Counts of the members still there, `None` when the session was deleted.
    pub remaining: Option<SessionInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub client_id: ClientId,
    /// Set when the connection had to leave another session first.
    pub departure: Option<Departure>,
    pub session_info: SessionInfo,
}

/// Connection registry and session store, kept consistent with each other.
#[derive(Default)]
pub struct ServerState {
    pub registry: ConnectionRegistry,
    pub sessions: SessionStore,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, connection_id: ConnectionId) -> ClientId {
        self.registry.register(connection_id)
    }

    /// Moves the connection into `session_id`, leaving any session it was in before.
    /// Returns `None` for a connection that is not registered.
    pub fn join_session(
        &mut self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        client_type: ClientType,
    ) -> Option<JoinOutcome> {
        self.registry.lookup(connection_id)?;
        let departure = self.leave_session(connection_id);

        let session_info = self
            .sessions
            .add_member(session_id, *connection_id, client_type);
        let record = self.registry.lookup_mut(connection_id)?;
        record.client_type = Some(client_type);
        record.session_id = Some(session_id.clone());
        record.joined_at = chrono::Utc::now();
        log::info!(
            "Client {} ({}) joined session {}",
            record.client_id,
            client_type,
            session_id
        );

        Some(JoinOutcome {
            client_id: record.client_id.clone(),
            departure,
            session_info,
        })
    }

    pub fn leave_session(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let record = self.registry.lookup_mut(connection_id)?;
        let session_id = record.session_id.take()?;
        let client_type = record.client_type?;
        let client_id = record.client_id.clone();

        let remaining = match self.sessions.remove_member(&session_id, connection_id) {
            Removal::Remaining(info) => Some(info),
            Removal::Deleted => None,
            Removal::NotMember => {
                log::warn!(
                    "Client {} claimed session {} but was not a member",
                    client_id,
                    session_id
                );
                None
            }
        };
        log::info!("Client {} ({}) left session {}", client_id, client_type, session_id);

        Some(Departure {
            session_id,
            client_id,
            client_type,
            remaining,
        })
    }

    /// Same cleanup as an explicit leave, then the record goes away.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let departure = self.leave_session(connection_id);
        self.registry.unregister(connection_id);
        departure
    }
}
