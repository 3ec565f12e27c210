//! Dispatch of decoded envelopes by message kind.
//!
//! Relays always exclude the sender. The role-targeted AI paths (`ai_execute` with a known
//! action, `ai_route`, `ai_specialist_execute`) do not, so a sender whose role matches the
//! target gets its own message back.

use system::routing::{self, Target};
use system::serde_json::{json, Value};
use system::{ClientId, ClientType, ConnectionId, Envelope, MessageKind, Payload, ProtocolError, SessionId};

use crate::server::Server;

/// The sending connection, resolved against the registry.
struct Sender {
    client_id: ClientId,
    client_type: ClientType,
    session_id: SessionId,
}

impl Sender {
    fn tags(&self) -> [(&'static str, Value); 2] {
        [
            ("_sender", json!(self.client_id)),
            ("_senderType", json!(self.client_type)),
        ]
    }

    fn requester_tags(&self) -> [(&'static str, Value); 4] {
        let [sender, sender_type] = self.tags();
        [
            sender,
            sender_type,
            ("requestedBy", json!(self.client_id)),
            ("requestedByType", json!(self.client_type)),
        ]
    }
}

impl Server {
    pub fn handle_message(&mut self, from: &ConnectionId, message: Result<Envelope, ProtocolError>) {
        if self.state.registry.lookup(from).is_none() {
            log::warn!("Dropping message from unregistered connection {}", from);
            return;
        }
        if let Err(error) = message.and_then(|envelope| self.route(from, envelope)) {
            log::warn!("Protocol error from connection {}: {}", from, error);
            let session_id = self
                .state
                .registry
                .lookup(from)
                .and_then(|record| record.session_id.clone());
            self.send(from, &error.to_envelope(session_id));
        }
    }

    fn route(&mut self, from: &ConnectionId, envelope: Envelope) -> Result<(), ProtocolError> {
        match &envelope.kind {
            MessageKind::Join => self.join(from, &envelope),
            MessageKind::Leave => self.leave(from),
            MessageKind::Ping => {
                self.pong(from);
                Ok(())
            }
            MessageKind::SceneState => self.scene_state(from, &envelope),
            MessageKind::SceneRequest => self.scene_request(from, &envelope),
            // Too frequent to log.
            MessageKind::Transform | MessageKind::TransformBatch => {
                self.relay(from, &envelope).map(|_| ())
            }
            MessageKind::ObjectAdd
            | MessageKind::ObjectDelete
            | MessageKind::ObjectSelect
            | MessageKind::ObjectRename
            | MessageKind::MaterialAssign
            | MessageKind::MaterialUpdate
            | MessageKind::MaterialCreate
            | MessageKind::HierarchyUpdate
            | MessageKind::AiCommand
            | MessageKind::SmartEdit
            | MessageKind::AiResponse
            | MessageKind::SmartEditResult
            | MessageKind::AiVisionResponse
            | MessageKind::AiRouteResult
            | MessageKind::AiSpecialistResult
            | MessageKind::AiDebateProposal
            | MessageKind::AiDebateRound
            | MessageKind::AiDebateResult => {
                let delivered = self.relay(from, &envelope)?;
                log::debug!("Relayed {} to {} member(s)", envelope.kind, delivered);
                Ok(())
            }
            MessageKind::AiExecute
            | MessageKind::AiVisionRequest
            | MessageKind::AiRoute
            | MessageKind::AiSpecialistExecute
            | MessageKind::AiDebateStart => self.route_ai(from, &envelope),
            // Server-originated kinds have no inbound handler.
            MessageKind::Joined
            | MessageKind::ClientJoined
            | MessageKind::ClientLeft
            | MessageKind::Pong
            | MessageKind::Error => Err(ProtocolError::UnknownType(envelope.kind.to_string())),
            MessageKind::Unknown(name) => Err(ProtocolError::UnknownType(name.clone())),
        }
    }

    fn sender(&self, from: &ConnectionId, kind: &MessageKind) -> Result<Sender, ProtocolError> {
        self.state
            .registry
            .lookup(from)
            .and_then(|record| {
                Some(Sender {
                    client_id: record.client_id.clone(),
                    client_type: record.client_type?,
                    session_id: record.session_id.clone()?,
                })
            })
            .ok_or_else(|| ProtocolError::NotInSession(kind.clone()))
    }

    fn join(&mut self, from: &ConnectionId, envelope: &Envelope) -> Result<(), ProtocolError> {
        let missing = |field| ProtocolError::MissingField {
            kind: MessageKind::Join,
            field,
        };
        let session_id = envelope
            .str_field("sessionId")
            .ok_or_else(|| missing("sessionId"))?
            .to_owned();
        let client_type = envelope
            .str_field("clientType")
            .ok_or_else(|| missing("clientType"))?
            .parse::<ClientType>()
            .map_err(|system::UnknownClientType(value)| ProtocolError::InvalidField {
                kind: MessageKind::Join,
                field: "clientType",
                value,
            })?;

        let outcome = match self.state.join_session(from, &session_id, client_type) {
            Some(outcome) => outcome,
            None => return Ok(()),
        };
        if let Some(departure) = &outcome.departure {
            self.announce_departure(from, departure);
        }

        let scene_state = self
            .state
            .sessions
            .get(&session_id)
            .map(|session| session.snapshot.to_payload())
            .unwrap_or_default();
        let mut joined = Payload::new();
        joined.insert("clientId".into(), json!(outcome.client_id));
        joined.insert("sessionId".into(), json!(session_id));
        joined.insert("clientType".into(), json!(client_type));
        joined.insert("sessionInfo".into(), json!(outcome.session_info));
        joined.insert("sceneState".into(), Value::Object(scene_state));
        self.send(
            from,
            &Envelope::new(MessageKind::Joined, Some(session_id.clone()), joined),
        );

        let mut client_joined = Payload::new();
        client_joined.insert("clientId".into(), json!(outcome.client_id));
        client_joined.insert("clientType".into(), json!(client_type));
        client_joined.insert("sessionInfo".into(), json!(outcome.session_info));
        self.broadcast(
            &session_id,
            &Envelope::new(MessageKind::ClientJoined, Some(session_id.clone()), client_joined),
            Some(from),
        );

        // Editors and agents need the current scene; ask the authoring tool for a fresh one.
        if client_type != ClientType::AuthoringTool && outcome.session_info.authoring_tool > 0 {
            let mut request = Payload::new();
            request.insert("requestedBy".into(), json!(outcome.client_id));
            request.insert("requestedByType".into(), json!(client_type));
            self.broadcast_to_roles(
                &session_id,
                &[ClientType::AuthoringTool],
                &Envelope::new(MessageKind::SceneRequest, Some(session_id.clone()), request),
                Some(from),
            );
        }
        Ok(())
    }

    fn leave(&mut self, from: &ConnectionId) -> Result<(), ProtocolError> {
        let departure = self
            .state
            .leave_session(from)
            .ok_or(ProtocolError::NotInSession(MessageKind::Leave))?;
        self.announce_departure(from, &departure);
        Ok(())
    }

    fn pong(&self, from: &ConnectionId) {
        let session_id = self
            .state
            .registry
            .lookup(from)
            .and_then(|record| record.session_id.clone());
        let envelope = Envelope::new(MessageKind::Pong, session_id, Payload::new());
        let mut pong = envelope.clone();
        pong.payload
            .insert("serverTime".into(), json!(envelope.timestamp));
        self.send(from, &pong);
    }

    fn scene_state(&mut self, from: &ConnectionId, envelope: &Envelope) -> Result<(), ProtocolError> {
        let sender = self.sender(from, &envelope.kind)?;
        self.state
            .sessions
            .update_snapshot(&sender.session_id, &envelope.payload);
        let delivered = self.broadcast(
            &sender.session_id,
            &envelope.tagged(&sender.session_id, &sender.tags()),
            Some(from),
        );
        log::info!(
            "Scene state from {} cached for session {}, relayed to {} member(s)",
            sender.client_id,
            sender.session_id,
            delivered
        );
        Ok(())
    }

    fn scene_request(&self, from: &ConnectionId, envelope: &Envelope) -> Result<(), ProtocolError> {
        let sender = self.sender(from, &envelope.kind)?;
        let cached = self
            .state
            .sessions
            .get(&sender.session_id)
            .map(|session| &session.snapshot)
            .filter(|snapshot| snapshot.has_objects());

        if let Some(snapshot) = cached {
            log::debug!("Answering scene request of {} from cache", sender.client_id);
            let reply = Envelope::new(
                MessageKind::SceneState,
                Some(sender.session_id.clone()),
                snapshot.to_payload(),
            );
            self.send(from, &reply);
        } else {
            let delivered = self.broadcast_to_roles(
                &sender.session_id,
                &[ClientType::AuthoringTool],
                &envelope.tagged(&sender.session_id, &sender.requester_tags()),
                Some(from),
            );
            log::debug!(
                "Forwarded scene request of {} to {} authoring tool(s)",
                sender.client_id,
                delivered
            );
        }
        Ok(())
    }

    /// Forwards to every other session member, tagged with the sender.
    fn relay(&self, from: &ConnectionId, envelope: &Envelope) -> Result<usize, ProtocolError> {
        let sender = self.sender(from, &envelope.kind)?;
        Ok(self.broadcast(
            &sender.session_id,
            &envelope.tagged(&sender.session_id, &sender.tags()),
            Some(from),
        ))
    }

    fn route_ai(&self, from: &ConnectionId, envelope: &Envelope) -> Result<(), ProtocolError> {
        let sender = self.sender(from, &envelope.kind)?;
        let target = routing::ai_target(envelope).unwrap_or(Ok(Target::Others))?;
        let tagged = if envelope.kind == MessageKind::AiVisionRequest {
            envelope.tagged(&sender.session_id, &sender.requester_tags())
        } else {
            envelope.tagged(&sender.session_id, &sender.tags())
        };

        let delivered = match target {
            Target::Others => self.broadcast(&sender.session_id, &tagged, Some(from)),
            Target::Roles(roles) => self.broadcast_to_roles(&sender.session_id, roles, &tagged, None),
            Target::RoleExceptSender(role) => {
                self.broadcast_to_roles(&sender.session_id, &[role], &tagged, Some(from))
            }
        };
        log::info!(
            "{} from {} ({}) routed to {:?}, {} delivery(ies)",
            envelope.kind,
            sender.client_id,
            sender.client_type,
            target,
            delivered
        );
        Ok(())
    }
}
