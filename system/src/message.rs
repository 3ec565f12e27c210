use crate::error::ProtocolError;
use crate::types::{now, SessionId, Timestamp};
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub type Payload = Map<String, Value>;

macro_rules! message_kinds {
    ($($variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum MessageKind {
            $($variant,)*
            /// Any `type` string the hub has no handler for.
            Unknown(String),
        }

        impl MessageKind {
            pub fn as_str(&self) -> &str {
                match self {
                    $(MessageKind::$variant => $name,)*
                    MessageKind::Unknown(name) => name,
                }
            }
        }

        impl From<&str> for MessageKind {
            fn from(s: &str) -> Self {
                match s {
                    $($name => MessageKind::$variant,)*
                    other => MessageKind::Unknown(other.to_owned()),
                }
            }
        }
    };
}

message_kinds! {
    // connection
    Join => "join",
    Joined => "joined",
    Leave => "leave",
    ClientJoined => "client_joined",
    ClientLeft => "client_left",
    Ping => "ping",
    Pong => "pong",
    // scene sync
    SceneState => "scene_state",
    SceneRequest => "scene_request",
    // object operations
    ObjectAdd => "object_add",
    ObjectDelete => "object_delete",
    ObjectSelect => "object_select",
    ObjectRename => "object_rename",
    Transform => "transform",
    TransformBatch => "transform_batch",
    MaterialAssign => "material_assign",
    MaterialUpdate => "material_update",
    MaterialCreate => "material_create",
    HierarchyUpdate => "hierarchy_update",
    // ai
    AiCommand => "ai_command",
    AiResponse => "ai_response",
    AiExecute => "ai_execute",
    AiVisionRequest => "ai_vision_request",
    AiVisionResponse => "ai_vision_response",
    SmartEdit => "smart_edit",
    SmartEditResult => "smart_edit_result",
    // orchestration
    AiRoute => "ai_route",
    AiRouteResult => "ai_route_result",
    AiSpecialistExecute => "ai_specialist_execute",
    AiSpecialistResult => "ai_specialist_result",
    AiDebateStart => "ai_debate_start",
    AiDebateProposal => "ai_debate_proposal",
    AiDebateRound => "ai_debate_round",
    AiDebateResult => "ai_debate_result",
    Error => "error",
}

impl From<String> for MessageKind {
    fn from(s: String) -> Self {
        MessageKind::from(s.as_str())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Unknown(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The flat message shape every client speaks:
/// `{ "type", "sessionId", "timestamp", "payload" }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default, deserialize_with = "millis")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "object_or_null")]
    pub payload: Payload,
}

fn object_or_null<'de, D>(deserializer: D) -> Result<Payload, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Payload>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON number of milliseconds. Fractions are truncated, null reads as 0.
fn millis<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Number>::deserialize(deserializer)? {
        None => Ok(0),
        Some(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|ms| ms as Timestamp))
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", n))),
    }
}

impl Envelope {
    /// A server-originated envelope stamped with the current time.
    pub fn new(kind: MessageKind, session_id: Option<SessionId>, payload: Payload) -> Self {
        Self {
            kind,
            session_id,
            timestamp: now(),
            payload,
        }
    }

    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    pub fn encode(&self) -> String {
        // Map keys are strings and every value is already a `Value`, so this cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.payload
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Same message re-addressed to `session_id` with extra payload fields. Type and timestamp
    /// are kept as the sender wrote them.
    pub fn tagged(&self, session_id: &SessionId, tags: &[(&str, Value)]) -> Self {
        let mut payload = self.payload.clone();
        for (key, value) in tags {
            payload.insert((*key).to_owned(), value.clone());
        }
        Self {
            kind: self.kind.clone(),
            session_id: Some(session_id.clone()),
            timestamp: self.timestamp,
            payload,
        }
    }
}
