use serde::Serialize;
use system::{SessionId, SessionInfo, Timestamp};
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
pub enum AdminCommand {
    GetStatus { tx: Sender<HubStatus> },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub connections: usize,
    pub sessions: Vec<SessionStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub session_info: SessionInfo,
    pub object_count: usize,
    pub last_update: Timestamp,
}
