use crate::session::Session;
use std::collections::HashMap;
use system::{ClientType, ConnectionId, Payload, SessionId, SessionInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    NotMember,
    Remaining(SessionInfo),
    /// The last member left and the session is gone.
    Deleted,
}

/// A session exists exactly as long as it has members.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, session_id: &SessionId) -> &mut Session {
        self.sessions.entry(session_id.clone()).or_insert_with(|| {
            log::info!("Session {} created", session_id);
            Session::new(session_id.clone())
        })
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn add_member(
        &mut self,
        session_id: &SessionId,
        connection_id: ConnectionId,
        client_type: ClientType,
    ) -> SessionInfo {
        let session = self.get_or_create(session_id);
        session.add_member(connection_id, client_type);
        session.session_info()
    }

    pub fn remove_member(&mut self, session_id: &SessionId, connection_id: &ConnectionId) -> Removal {
        let session = match self.sessions.get_mut(session_id) {
            Some(session) => session,
            None => return Removal::NotMember,
        };
        if !session.remove_member(connection_id) {
            return Removal::NotMember;
        }
        if session.is_empty() {
            self.sessions.remove(session_id);
            log::info!("Session {} deleted", session_id);
            Removal::Deleted
        } else {
            Removal::Remaining(session.session_info())
        }
    }

    /// Returns false when the session does not exist.
    pub fn update_snapshot(&mut self, session_id: &SessionId, partial: &Payload) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.update_snapshot(partial);
                true
            }
            None => false,
        }
    }

    pub fn member_counts(&self, session_id: &SessionId) -> SessionInfo {
        self.sessions
            .get(session_id)
            .map(Session::session_info)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> + '_ {
        self.sessions.values()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use system::serde_json::json;

    fn id(s: &str) -> SessionId {
        s.to_owned()
    }

    #[test]
    fn it_removes_session_when_last_member_leaves() {
        let mut store = SessionStore::new();
        store.add_member(&id("s1"), 1, ClientType::AuthoringTool);
        let info = store.add_member(&id("s1"), 2, ClientType::WebEditor);
        assert_eq!(info.total(), 2);

        match store.remove_member(&id("s1"), &1) {
            Removal::Remaining(info) => assert_eq!(info.web_editor, 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.remove_member(&id("s1"), &2), Removal::Deleted);
        assert!(!store.contains(&id("s1")));
        assert!(store.is_empty());
    }

    #[test]
    fn removing_a_stranger_changes_nothing() {
        let mut store = SessionStore::new();
        store.add_member(&id("s1"), 1, ClientType::AiAgent);
        assert_eq!(store.remove_member(&id("s1"), &9), Removal::NotMember);
        assert_eq!(store.remove_member(&id("nope"), &1), Removal::NotMember);
        assert_eq!(store.member_counts(&id("s1")).ai_agent, 1);
        assert_eq!(store.member_counts(&id("nope")).total(), 0);
    }

    #[test]
    fn recreated_session_starts_with_empty_snapshot() {
        let mut store = SessionStore::new();
        store.add_member(&id("s1"), 1, ClientType::AuthoringTool);
        let partial = match json!({"objects": [{"id": "Cube"}]}) {
            system::serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert!(store.update_snapshot(&id("s1"), &partial));
        assert!(store.get(&id("s1")).expect("").snapshot.has_objects());

        store.remove_member(&id("s1"), &1);
        store.add_member(&id("s1"), 2, ClientType::WebEditor);
        assert!(!store.get(&id("s1")).expect("").snapshot.has_objects());
        assert!(!store.update_snapshot(&id("s2"), &partial));
    }
}
