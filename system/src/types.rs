use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport-level handle of a live connection. Only meaningful inside the hub.
pub type ConnectionId = u64;
pub type SessionId = String;
/// Milliseconds since the unix epoch.
pub type Timestamp = i64;

pub fn now() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Opaque identifier handed to a client when its transport connects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    /// The native 3D authoring tool add-on. Authority for scene geometry.
    #[serde(rename = "blender", alias = "authoring_tool")]
    AuthoringTool,
    /// The browser editor. The only role able to render.
    #[serde(rename = "bisect", alias = "web_editor")]
    WebEditor,
    #[serde(rename = "ai", alias = "ai_agent")]
    AiAgent,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [
        ClientType::AuthoringTool,
        ClientType::WebEditor,
        ClientType::AiAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::AuthoringTool => "blender",
            ClientType::WebEditor => "bisect",
            ClientType::AiAgent => "ai",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownClientType(pub String);

impl FromStr for ClientType {
    type Err = UnknownClientType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blender" | "authoring_tool" => Ok(ClientType::AuthoringTool),
            "bisect" | "web_editor" => Ok(ClientType::WebEditor),
            "ai" | "ai_agent" => Ok(ClientType::AiAgent),
            other => Err(UnknownClientType(other.to_owned())),
        }
    }
}

/// Membership counts of a session, by client role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "blender")]
    pub authoring_tool: usize,
    #[serde(rename = "bisect")]
    pub web_editor: usize,
    #[serde(rename = "ai")]
    pub ai_agent: usize,
}

impl SessionInfo {
    pub fn count(&self, client_type: ClientType) -> usize {
        match client_type {
            ClientType::AuthoringTool => self.authoring_tool,
            ClientType::WebEditor => self.web_editor,
            ClientType::AiAgent => self.ai_agent,
        }
    }

    pub fn add(&mut self, client_type: ClientType) {
        match client_type {
            ClientType::AuthoringTool => self.authoring_tool += 1,
            ClientType::WebEditor => self.web_editor += 1,
            ClientType::AiAgent => self.ai_agent += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.authoring_tool + self.web_editor + self.ai_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_long_and_short_role_names() {
        assert_eq!("blender".parse(), Ok(ClientType::AuthoringTool));
        assert_eq!("web_editor".parse(), Ok(ClientType::WebEditor));
        assert_eq!("ai".parse(), Ok(ClientType::AiAgent));
        assert_eq!(
            "painter".parse::<ClientType>(),
            Err(UnknownClientType("painter".into()))
        );
    }

    #[test]
    fn it_serializes_session_info_with_wire_role_names() {
        let mut info = SessionInfo::default();
        info.add(ClientType::WebEditor);
        info.add(ClientType::WebEditor);
        info.add(ClientType::AiAgent);
        let value = serde_json::to_value(info).expect("");
        assert_eq!(value, serde_json::json!({"blender": 0, "bisect": 2, "ai": 1}));
        assert_eq!(info.total(), 3);
    }
}
