//! Who receives AI-originated messages.
//!
//! Simple cases are static tables. Orchestration (`ai_route`) and debates go to the
//! decision-making roles first and let them pick the executor.

use crate::error::ProtocolError;
use crate::message::{Envelope, MessageKind};
use crate::types::ClientType;

/// `ai_execute` actions only the authoring tool can carry out (geometry, scripts).
pub const AUTHORING_TOOL_ACTIONS: &[&str] = &[
    "create_object",
    "delete_object",
    "modify_mesh",
    "add_modifier",
    "apply_modifier",
    "subdivide",
    "extrude",
    "bevel",
    "boolean",
    "run_script",
];

/// `ai_execute` actions the web editor applies (materials, colors, environment).
pub const WEB_EDITOR_ACTIONS: &[&str] = &[
    "apply_material",
    "update_material",
    "set_color",
    "set_roughness",
    "set_metalness",
    "generate_texture",
    "set_environment",
    "set_lighting",
];

/// The specialist that emits authoring-tool scripts. Every other specialist drives the web editor.
pub const SCRIPT_SPECIALIST: &str = "blender";

/// Roles that take part in an orchestration decision.
pub const DECISION_MAKERS: &[ClientType] = &[ClientType::WebEditor, ClientType::AiAgent];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Every other member of the session.
    Others,
    /// Only members of these roles. The sender is not excluded.
    Roles(&'static [ClientType]),
    /// Only members of this role, never the sender.
    RoleExceptSender(ClientType),
}

pub fn execute_target(action: &str) -> Option<ClientType> {
    if AUTHORING_TOOL_ACTIONS.contains(&action) {
        Some(ClientType::AuthoringTool)
    } else if WEB_EDITOR_ACTIONS.contains(&action) {
        Some(ClientType::WebEditor)
    } else {
        None
    }
}

pub fn specialist_target(agent: &str) -> ClientType {
    if agent == SCRIPT_SPECIALIST {
        ClientType::AuthoringTool
    } else {
        ClientType::WebEditor
    }
}

fn single(role: ClientType) -> &'static [ClientType] {
    match role {
        ClientType::AuthoringTool => &[ClientType::AuthoringTool],
        ClientType::WebEditor => &[ClientType::WebEditor],
        ClientType::AiAgent => &[ClientType::AiAgent],
    }
}

/// Delivery target of an AI orchestration message, or the protocol error that stops it.
/// Returns `None` for kinds this table does not govern.
pub fn ai_target(envelope: &Envelope) -> Option<Result<Target, ProtocolError>> {
    let kind = &envelope.kind;
    let required = |field: &'static str| {
        envelope.str_field(field).ok_or(ProtocolError::MissingField {
            kind: kind.clone(),
            field,
        })
    };

    let target = match kind {
        MessageKind::AiExecute => required("action").map(|action| match execute_target(action) {
            Some(role) => Target::Roles(single(role)),
            None => Target::Others,
        }),
        MessageKind::AiSpecialistExecute => {
            required("agent").map(|agent| Target::Roles(single(specialist_target(agent))))
        }
        MessageKind::AiRoute => Ok(Target::Roles(DECISION_MAKERS)),
        MessageKind::AiVisionRequest => Ok(Target::RoleExceptSender(ClientType::WebEditor)),
        MessageKind::AiDebateStart => {
            if envelope.payload.contains_key("participants") {
                Ok(Target::Others)
            } else {
                Err(ProtocolError::MissingField {
                    kind: kind.clone(),
                    field: "participants",
                })
            }
        }
        _ => return None,
    };
    Some(target)
}
