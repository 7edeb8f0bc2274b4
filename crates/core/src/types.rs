use serde::{Deserialize, Serialize};

/// Backend row identifier.
pub type EntityId = i64;

/// Opaque orchestration identifier assigned by the backend
/// (`symphony_id` / `kan_id` on the wire).
pub type SymphonyId = String;

/// The four entity families the console manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Camera,
    ComputeDevice,
    Deployment,
    AiSkill,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::ComputeDevice,
        EntityKind::Camera,
        EntityKind::AiSkill,
        EntityKind::Deployment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::ComputeDevice => "compute_device",
            Self::Deployment => "deployment",
            Self::AiSkill => "ai_skill",
        }
    }

    pub fn from_str_db(s: &str) -> Option<Self> {
        match s {
            "camera" => Some(Self::Camera),
            "compute_device" => Some(Self::ComputeDevice),
            "deployment" => Some(Self::Deployment),
            "ai_skill" => Some(Self::AiSkill),
            _ => None,
        }
    }

    /// Human-readable label used in banners ("Camera created").
    pub fn label(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::ComputeDevice => "Compute device",
            Self::Deployment => "Deployment",
            Self::AiSkill => "AI skill",
        }
    }

    /// First path segment of this entity's console routes.
    pub fn route_segment(self) -> &'static str {
        match self {
            Self::Camera => "cameras",
            Self::ComputeDevice => "computeDevice",
            Self::Deployment => "deployment",
            Self::AiSkill => "aiSkill",
        }
    }

    pub fn from_route_segment(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.route_segment() == s)
    }
}

/// Whether a wizard creates a new entity or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FormMode {
    Create,
    Edit { id: EntityId },
}

impl FormMode {
    pub fn is_edit(self) -> bool {
        matches!(self, Self::Edit { .. })
    }
}
