//! Normalized entity records.
//!
//! The backend returns several fields as JSON encoded inside strings
//! (`tag_list`, `status`, `configure`, `allowed_devices`, ...). Each
//! entity has a `*FromServer` wire struct mirroring the response and a
//! `normalize` step that decodes those strings. Malformed content never
//! fails a response: the field falls back to its empty value.

pub mod ai_skill;
pub mod camera;
pub mod compute_device;
pub mod deployment;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::tags::Tag;
use crate::types::{EntityId, EntityKind, SymphonyId};

pub use ai_skill::{AiSkill, AiSkillFromServer};
pub use camera::{Camera, CameraFromServer};
pub use compute_device::{ComputeDevice, ComputeDeviceFromServer};
pub use deployment::{
    Deployment, DeploymentConfigureCamera, DeploymentConfigureSkill, DeploymentFromServer,
    DeploymentStatus,
};

/// Common view over the four records, used by the store and list search.
pub trait Entity: Clone {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    fn symphony_id(&self) -> &str;
    fn tags(&self) -> &[Tag];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    #[serde(other)]
    Unknown,
}

/// Per-target connection state, keyed by the target's symphony id.
pub type StatusMap = BTreeMap<SymphonyId, ConnectionStatus>;

/// Decode a JSON-string field, falling back to `T::default()` when the
/// string is blank or malformed.
pub(crate) fn json_field<T: DeserializeOwned + Default>(field: &'static str, raw: &str) -> T {
    if raw.trim().is_empty() {
        return T::default();
    }
    serde_json::from_str(raw).unwrap_or_else(|e| {
        tracing::debug!(field, error = %e, "Unparseable JSON field, using default");
        T::default()
    })
}

/// Accept `null` wherever the backend may send it for a string field.
pub(crate) fn nullable_string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// Text form of a scalar that may arrive as a number or a string.
pub(crate) fn scalar_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_field_falls_back_on_blank_and_garbage() {
        let empty: Vec<String> = json_field("allowed_devices", "");
        assert!(empty.is_empty());
        let bad: Vec<String> = json_field("allowed_devices", "[\"a\",");
        assert!(bad.is_empty());
        let good: Vec<String> = json_field("allowed_devices", r#"["a","b"]"#);
        assert_eq!(good, ["a", "b"]);
    }

    #[test]
    fn unknown_connection_state_is_tolerated() {
        let map: StatusMap = json_field("status", r#"{"d1": "connected", "d2": "rebooting"}"#);
        assert_eq!(map["d1"], ConnectionStatus::Connected);
        assert_eq!(map["d2"], ConnectionStatus::Unknown);
    }

    #[test]
    fn scalars_render_as_text() {
        assert_eq!(scalar_text(&serde_json::json!(4)), "4");
        assert_eq!(scalar_text(&serde_json::json!("4")), "4");
        assert_eq!(scalar_text(&serde_json::Value::Null), "");
    }
}
