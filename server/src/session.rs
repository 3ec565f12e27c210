use std::collections::HashMap;
use system::{now, ClientType, ConnectionId, Payload, SceneSnapshot, SessionId, SessionInfo, Timestamp};

pub struct Session {
    pub session_id: SessionId,
    members: HashMap<ConnectionId, ClientType>,
    pub snapshot: SceneSnapshot,
    pub last_update: Timestamp,
}

impl Session {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            members: HashMap::new(),
            snapshot: SceneSnapshot::default(),
            last_update: now(),
        }
    }

    pub fn add_member(&mut self, connection_id: ConnectionId, client_type: ClientType) {
        self.members.insert(connection_id, client_type);
    }

    pub fn remove_member(&mut self, connection_id: &ConnectionId) -> bool {
        self.members.remove(connection_id).is_some()
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.members.contains_key(connection_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = (&ConnectionId, &ClientType)> + '_ {
        self.members.iter()
    }

    pub fn session_info(&self) -> SessionInfo {
        let mut info = SessionInfo::default();
        for client_type in self.members.values() {
            info.add(*client_type);
        }
        info
    }

    pub fn update_snapshot(&mut self, partial: &Payload) {
        self.snapshot.merge(partial);
        self.last_update = now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_counts_members_by_role() {
        let mut session = Session::new("s1".into());
        session.add_member(1, ClientType::AuthoringTool);
        session.add_member(2, ClientType::WebEditor);
        session.add_member(3, ClientType::WebEditor);
        // re-adding keeps membership a set
        session.add_member(3, ClientType::WebEditor);

        let info = session.session_info();
        assert_eq!(info.authoring_tool, 1);
        assert_eq!(info.web_editor, 2);
        assert_eq!(info.ai_agent, 0);

        assert!(session.remove_member(&2));
        assert!(!session.remove_member(&2));
        assert_eq!(session.session_info().web_editor, 1);
    }
}
