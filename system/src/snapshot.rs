use crate::message::Payload;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cached scene contents of a session, as last reported by a full `scene_state`.
///
/// Transforms are never folded in here, so object poses may lag behind the live scene until the
/// next full snapshot arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    #[serde(default)]
    pub objects: Vec<Value>,
    #[serde(default)]
    pub materials: Vec<Value>,
    #[serde(default)]
    pub lights: Vec<Value>,
    #[serde(default)]
    pub cameras: Vec<Value>,
    #[serde(default)]
    pub environment: Option<Value>,
    #[serde(default)]
    pub selection: Vec<Value>,
    /// Top-level fields other clients put in their snapshots that the hub does not interpret.
    #[serde(flatten)]
    pub extra: Payload,
}

impl SceneSnapshot {
    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    /// Shallow merge: each top-level field present in `partial` replaces the cached one,
    /// everything else is left untouched. Routing tags (`_sender`, ...) are skipped.
    pub fn merge(&mut self, partial: &Payload) {
        for (key, value) in partial {
            match key.as_str() {
                "objects" => replace_list(&mut self.objects, key, value),
                "materials" => replace_list(&mut self.materials, key, value),
                "lights" => replace_list(&mut self.lights, key, value),
                "cameras" => replace_list(&mut self.cameras, key, value),
                "selection" => replace_list(&mut self.selection, key, value),
                "environment" => {
                    self.environment = match value {
                        Value::Null => None,
                        v => Some(v.clone()),
                    }
                }
                tag if tag.starts_with('_') => {}
                _ => {
                    self.extra.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn to_payload(&self) -> Payload {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Payload::new(),
        }
    }
}

fn replace_list(slot: &mut Vec<Value>, key: &str, value: &Value) {
    match value {
        Value::Array(items) => *slot = items.clone(),
        Value::Null => slot.clear(),
        other => log::warn!("Ignoring snapshot field `{}`: expected a list, got {}", key, other),
    }
}
