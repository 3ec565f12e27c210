use crate::message::{Envelope, MessageKind};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Errors surfaced only to the connection that caused them. None of them close the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("missing required field `{field}` in `{kind}`")]
    MissingField { kind: MessageKind, field: &'static str },
    #[error("invalid value for `{field}` in `{kind}`: {value}")]
    InvalidField {
        kind: MessageKind,
        field: &'static str,
        value: String,
    },
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("`{0}` requires joining a session first")]
    NotInSession(MessageKind),
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "malformed",
            ProtocolError::MissingField { .. } => "missing_field",
            ProtocolError::InvalidField { .. } => "invalid_field",
            ProtocolError::UnknownType(_) => "unknown_type",
            ProtocolError::NotInSession(_) => "not_in_session",
        }
    }

    /// Name of the message type that caused the error, when known.
    pub fn message_type(&self) -> Option<&str> {
        match self {
            ProtocolError::Malformed(_) => None,
            ProtocolError::MissingField { kind, .. }
            | ProtocolError::InvalidField { kind, .. }
            | ProtocolError::NotInSession(kind) => Some(kind.as_str()),
            ProtocolError::UnknownType(name) => Some(name),
        }
    }

    pub fn to_envelope(&self, session_id: Option<String>) -> Envelope {
        let mut payload = Map::new();
        payload.insert("code".into(), json!(self.code()));
        payload.insert("message".into(), json!(self.to_string()));
        if let Some(message_type) = self.message_type() {
            payload.insert("type".into(), Value::String(message_type.to_owned()));
        }
        Envelope::new(MessageKind::Error, session_id, payload)
    }
}
