use serde::{Deserialize, Serialize};

use crate::entities::{json_field, nullable_string, Entity, StatusMap};
use crate::tags::Tag;
use crate::types::{EntityId, EntityKind, SymphonyId};
use crate::wizard::compute_device::{Architecture, ClusterType};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ComputeDeviceFromServer {
    pub id: EntityId,
    #[serde(deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub iothub: String,
    #[serde(deserialize_with = "nullable_string")]
    pub iotedge_device: String,
    #[serde(deserialize_with = "nullable_string")]
    pub architecture: String,
    #[serde(deserialize_with = "nullable_string")]
    pub acceleration: String,
    #[serde(deserialize_with = "nullable_string")]
    pub tag_list: String,
    #[serde(deserialize_with = "nullable_string")]
    pub symphony_id: SymphonyId,
    #[serde(deserialize_with = "nullable_string")]
    pub solution_id: String,
    #[serde(deserialize_with = "nullable_string")]
    pub status: String,
    pub is_k8s: bool,
    #[serde(deserialize_with = "nullable_string")]
    pub cluster_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComputeDevice {
    pub id: EntityId,
    pub name: String,
    pub iothub: String,
    pub iotedge_device: String,
    pub architecture: Architecture,
    pub acceleration: String,
    pub tag_list: Vec<Tag>,
    pub symphony_id: SymphonyId,
    pub solution_id: String,
    pub status: StatusMap,
    pub is_k8s: bool,
    pub cluster_type: ClusterType,
}

impl ComputeDeviceFromServer {
    pub fn normalize(self) -> ComputeDevice {
        let architecture = Architecture::from_str_db(&self.architecture).unwrap_or_else(|| {
            tracing::debug!(architecture = %self.architecture, "Unknown architecture, using X64");
            Architecture::X64
        });
        ComputeDevice {
            id: self.id,
            name: self.name,
            iothub: self.iothub,
            iotedge_device: self.iotedge_device,
            architecture,
            acceleration: self.acceleration,
            tag_list: Tag::parse_list(&self.tag_list),
            symphony_id: self.symphony_id,
            solution_id: self.solution_id,
            status: json_field("status", &self.status),
            is_k8s: self.is_k8s,
            // Devices created before cluster types existed store "".
            cluster_type: ClusterType::from_str_db(&self.cluster_type).unwrap_or_default(),
        }
    }
}

impl Entity for ComputeDevice {
    const KIND: EntityKind = EntityKind::ComputeDevice;

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
