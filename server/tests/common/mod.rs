#![allow(dead_code)]

use bridge_server::connection::{ConnectionCommand, ConnectionEvent};
use bridge_server::server::Server;
use std::collections::HashMap;
use system::serde_json::{self, json, Value};
use system::{ClientId, ConnectionId, Envelope, MessageKind};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Drives a `Server` the way the connection actors do, with channels in place of sockets.
pub struct Hub {
    pub server: Server,
    inboxes: HashMap<ConnectionId, UnboundedReceiver<ConnectionEvent>>,
    client_ids: HashMap<ConnectionId, ClientId>,
    next_id: ConnectionId,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            server: Server::new(),
            inboxes: HashMap::new(),
            client_ids: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn connect(&mut self) -> ConnectionId {
        self.next_id += 1;
        let from = self.next_id;
        let (tx, mut rx) = unbounded_channel();
        self.server
            .handle_connection_command(ConnectionCommand::Connect { from, tx });
        match rx.try_recv() {
            Ok(ConnectionEvent::Connected { client_id }) => {
                self.client_ids.insert(from, client_id);
            }
            other => panic!("expected Connected, got {:?}", other),
        }
        self.inboxes.insert(from, rx);
        from
    }

    pub fn client_id(&self, connection_id: ConnectionId) -> String {
        self.client_ids[&connection_id].to_string()
    }

    pub fn send_text(&mut self, from: ConnectionId, text: &str) {
        self.server.handle_connection_command(ConnectionCommand::Message {
            from,
            message: Envelope::decode(text),
        });
    }

    pub fn send(&mut self, from: ConnectionId, kind: &str, payload: Value) {
        let text = json!({"type": kind, "sessionId": null, "timestamp": 1, "payload": payload});
        self.send_text(from, &text.to_string());
    }

    pub fn join(&mut self, from: ConnectionId, session_id: &str, client_type: &str) -> Envelope {
        self.send(
            from,
            "join",
            json!({"sessionId": session_id, "clientType": client_type}),
        );
        let joined = self.take(from);
        assert_eq!(joined.kind, MessageKind::Joined, "{:?}", joined);
        joined
    }

    pub fn disconnect(&mut self, from: ConnectionId) {
        self.server
            .handle_connection_command(ConnectionCommand::Disconnect { from });
    }

    /// Every envelope delivered to `to` since the last drain.
    pub fn drain(&mut self, to: ConnectionId) -> Vec<Envelope> {
        let rx = self.inboxes.get_mut(&to).expect("unknown connection");
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                ConnectionEvent::Text(text) => {
                    out.push(serde_json::from_str(&text).expect("server sent invalid json"))
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        out
    }

    pub fn drain_all(&mut self) {
        let ids: Vec<_> = self.inboxes.keys().copied().collect();
        for id in ids {
            self.drain(id);
        }
    }

    /// Exactly one pending envelope for `to`.
    pub fn take(&mut self, to: ConnectionId) -> Envelope {
        let mut received = self.drain(to);
        assert_eq!(received.len(), 1, "expected one message, got {:?}", received);
        received.remove(0)
    }

    pub fn events(&mut self, to: ConnectionId) -> Vec<ConnectionEvent> {
        let rx = self.inboxes.get_mut(&to).expect("unknown connection");
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    pub fn kinds(&mut self, to: ConnectionId) -> Vec<MessageKind> {
        self.drain(to).into_iter().map(|e| e.kind).collect()
    }
}
