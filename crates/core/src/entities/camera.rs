use serde::{Deserialize, Serialize};

use crate::entities::{json_field, nullable_string, Entity, StatusMap};
use crate::tags::Tag;
use crate::types::{EntityId, EntityKind, SymphonyId};
use crate::wizard::camera::MediaType;

/// Camera row as returned by `/api/cameras`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraFromServer {
    pub id: EntityId,
    #[serde(deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(deserialize_with = "nullable_string")]
    pub rtsp: String,
    #[serde(deserialize_with = "nullable_string")]
    pub media_source: String,
    #[serde(deserialize_with = "nullable_string")]
    pub area: String,
    #[serde(deserialize_with = "nullable_string")]
    pub lines: String,
    #[serde(deserialize_with = "nullable_string")]
    pub danger_zones: String,
    pub is_demo: bool,
    pub location: Option<EntityId>,
    #[serde(deserialize_with = "nullable_string")]
    pub media_type: String,
    #[serde(deserialize_with = "nullable_string")]
    pub tag_list: String,
    #[serde(deserialize_with = "nullable_string")]
    pub username: String,
    #[serde(deserialize_with = "nullable_string")]
    pub password: String,
    #[serde(deserialize_with = "nullable_string")]
    pub allowed_devices: String,
    #[serde(deserialize_with = "nullable_string")]
    pub snapshot: String,
    pub is_live: bool,
    #[serde(deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(deserialize_with = "nullable_string")]
    pub symphony_id: SymphonyId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Camera {
    pub id: EntityId,
    pub name: String,
    pub rtsp: String,
    pub media_source: String,
    pub media_type: MediaType,
    pub use_aoi: bool,
    pub use_counting_line: bool,
    pub use_danger_zone: bool,
    pub is_demo: bool,
    pub location: Option<EntityId>,
    pub tag_list: Vec<Tag>,
    pub username: String,
    pub password: String,
    pub allowed_devices: Vec<SymphonyId>,
    pub snapshot: String,
    pub is_live: bool,
    pub status: StatusMap,
    pub symphony_id: SymphonyId,
}

/// Only the on/off switch of each zone blob is kept; the zones themselves
/// are drawn by the video panel.
#[derive(Debug, Default, Deserialize)]
struct ZoneSwitches {
    #[serde(default, rename = "useAOI")]
    use_aoi: bool,
    #[serde(default, rename = "useCountingLine")]
    use_counting_line: bool,
    #[serde(default, rename = "useDangerZone")]
    use_danger_zone: bool,
}

impl CameraFromServer {
    pub fn normalize(self) -> Camera {
        let area: ZoneSwitches = json_field("area", &self.area);
        let lines: ZoneSwitches = json_field("lines", &self.lines);
        let danger_zones: ZoneSwitches = json_field("danger_zones", &self.danger_zones);
        let media_type = MediaType::from_str_db(&self.media_type).unwrap_or_default();
        Camera {
            id: self.id,
            name: self.name,
            rtsp: self.rtsp,
            media_source: self.media_source,
            media_type,
            use_aoi: area.use_aoi,
            use_counting_line: lines.use_counting_line,
            use_danger_zone: danger_zones.use_danger_zone,
            is_demo: self.is_demo,
            location: self.location,
            tag_list: Tag::parse_list(&self.tag_list),
            username: self.username,
            password: self.password,
            allowed_devices: json_field("allowed_devices", &self.allowed_devices),
            snapshot: self.snapshot,
            is_live: self.is_live,
            status: json_field("status", &self.status),
            symphony_id: self.symphony_id,
        }
    }
}

impl Entity for Camera {
    const KIND: EntityKind = EntityKind::Camera;

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
