use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{json_field, nullable_string, scalar_text, Entity};
use crate::tags::Tag;
use crate::types::{EntityId, EntityKind, SymphonyId};

/// Status code reported when the deployment status blob is unreadable.
pub const STATUS_CODE_UNKNOWN: &str = "400";

const FPS_KEY_MARKER: &str = "fps_skill-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfigureSkill {
    /// Skill symphony id.
    pub id: SymphonyId,
    #[serde(default)]
    pub configured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfigureCamera {
    /// Camera symphony id.
    pub camera: SymphonyId,
    #[serde(default)]
    pub skills: Vec<DeploymentConfigureSkill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
    pub status_code: String,
    pub status_description: String,
    /// Measured frame rate keyed by `skill-<id>`.
    pub fps: BTreeMap<String, String>,
}

impl Default for DeploymentStatus {
    fn default() -> Self {
        Self {
            status_code: STATUS_CODE_UNKNOWN.into(),
            status_description: String::new(),
            fps: BTreeMap::new(),
        }
    }
}

impl DeploymentStatus {
    /// Parse the backend status blob, e.g.
    /// `{"status_code": "0", "status_description": "running", "fps_skill-a1": "9.7"}`.
    pub fn parse(raw: &str) -> Self {
        let object = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(object)) => object,
            _ => {
                tracing::debug!(status = %raw, "Unparseable deployment status");
                return Self::default();
            }
        };
        let field = |key: &str| object.get(key).map(scalar_text).unwrap_or_default();
        let fps = object
            .iter()
            .filter(|(key, _)| key.contains(FPS_KEY_MARKER))
            .map(|(key, value)| (key.replacen("fps_", "", 1), scalar_text(value)))
            .collect();
        Self {
            status_code: field("status_code"),
            status_description: field("status_description"),
            fps,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeploymentFromServer {
    pub id: EntityId,
    #[serde(deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub configure: String,
    #[serde(deserialize_with = "nullable_string")]
    pub tag_list: String,
    #[serde(deserialize_with = "nullable_string")]
    pub symphony_id: SymphonyId,
    /// Device reference; older backends send the row id as a number.
    pub compute_device: Value,
    #[serde(deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(deserialize_with = "nullable_string")]
    pub iothub_insights: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deployment {
    pub id: EntityId,
    pub name: String,
    pub configure: Vec<DeploymentConfigureCamera>,
    pub tag_list: Vec<Tag>,
    pub symphony_id: SymphonyId,
    pub compute_device: String,
    pub status: DeploymentStatus,
    pub iothub_insights: Vec<Value>,
}

impl DeploymentFromServer {
    pub fn normalize(self) -> Deployment {
        Deployment {
            id: self.id,
            name: self.name,
            configure: json_field("configure", &self.configure),
            tag_list: Tag::parse_list(&self.tag_list),
            symphony_id: self.symphony_id,
            compute_device: scalar_text(&self.compute_device),
            status: DeploymentStatus::parse(&self.status),
            iothub_insights: json_field("iothub_insights", &self.iothub_insights),
        }
    }
}

impl Deployment {
    /// Skill symphony ids used by any camera of this deployment.
    pub fn skill_ids(&self) -> impl Iterator<Item = &str> {
        self.configure
            .iter()
            .flat_map(|c| c.skills.iter().map(|s| s.id.as_str()))
    }
}

impl Entity for Deployment {
    const KIND: EntityKind = EntityKind::Deployment;

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn symphony_id(&self) -> &str {
        &self.symphony_id
    }

    fn tags(&self) -> &[Tag] {
        &self.tag_list
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // -- status --

    #[test]
    fn status_collects_fps_keys() {
        let status = DeploymentStatus::parse(
            r#"{"fps_skill-a8e2": "9.7", "status_code": "0", "status_description": "running", "other": 1}"#,
        );
        assert_eq!(status.status_code, "0");
        assert_eq!(status.status_description, "running");
        assert_eq!(status.fps.len(), 1);
        assert_eq!(status.fps["skill-a8e2"], "9.7");
    }

    #[test]
    fn unreadable_status_falls_back() {
        for raw in ["", "oops", "[1, 2]"] {
            assert_eq!(DeploymentStatus::parse(raw), DeploymentStatus::default());
        }
        assert_eq!(DeploymentStatus::default().status_code, "400");
    }

    // -- normalize --

    #[test]
    fn numeric_device_reference_becomes_text() {
        let wire: DeploymentFromServer = serde_json::from_value(json!({
            "id": 9,
            "name": "line-1",
            "configure": "[{\"camera\": \"camera-1\", \"skills\": [{\"id\": \"skill-1\", \"configured\": true}]}]",
            "tag_list": "",
            "symphony_id": "deployment-9",
            "compute_device": 3,
            "status": "{\"status_code\": \"0\"}",
            "iothub_insights": ""
        }))
        .unwrap();
        let deployment = wire.normalize();
        assert_eq!(deployment.compute_device, "3");
        assert_eq!(deployment.skill_ids().collect::<Vec<_>>(), ["skill-1"]);
        assert!(deployment.configure[0].skills[0].configured);
        assert!(deployment.iothub_insights.is_empty());
    }
}
