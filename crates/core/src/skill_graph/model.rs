//! Catalog entries that back skill graph nodes.
//!
//! The backend lists every node the editor can place (the source, ML
//! models, transforms and exports) as a training-project record. Each
//! carries the input and output routes used when edges are serialized.

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Source,
    Model,
    Transform,
    Export,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Model => "model",
            Self::Transform => "transform",
            Self::Export => "export",
        }
    }
}

/// A named route on a node, e.g. `{"route": "f", "type": "frame"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub route: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillModel {
    pub id: EntityId,
    pub name: String,
    #[serde(default, rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
    #[serde(default)]
    pub inputs: Vec<Handler>,
    #[serde(default)]
    pub outputs: Vec<Handler>,
    /// Orchestration id of a trained model; empty for built-in nodes.
    #[serde(default)]
    pub kan_id: String,
}

impl SkillModel {
    /// Name shown on the canvas.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }

    /// Stand-in for a flow node whose catalog entry is gone.
    pub(crate) fn placeholder(name: &str, node_type: NodeType) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            display_name: String::new(),
            node_type,
            inputs: Vec::new(),
            outputs: Vec::new(),
            kan_id: String::new(),
        }
    }

    pub fn first_input_route(&self) -> Option<&str> {
        self.inputs.first().map(|h| h.route.as_str())
    }

    pub fn first_output_route(&self) -> Option<&str> {
        self.outputs.first().map(|h| h.route.as_str())
    }
}

/// Model nodes display a fixed title regardless of the model chosen.
pub const MODEL_NODE_TITLE: &str = "Run ML Model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformType {
    Filter,
    Grpc,
}

impl TransformType {
    pub fn from_model_name(name: &str) -> Option<Self> {
        match name {
            "filter_transform" => Some(Self::Filter),
            "grpc_transform" => Some(Self::Grpc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportType {
    #[serde(rename = "snippet")]
    Snippet,
    #[serde(rename = "iotHub")]
    IotHub,
    #[serde(rename = "iotEdge")]
    IotEdge,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "mqtt")]
    Mqtt,
}

impl ExportType {
    pub fn from_model_name(name: &str) -> Option<Self> {
        match name {
            "video_snippet_export" => Some(Self::Snippet),
            "iothub_export" => Some(Self::IotHub),
            "iotedge_export" => Some(Self::IotEdge),
            "http_export" => Some(Self::Http),
            "mqtt_export" => Some(Self::Mqtt),
            _ => None,
        }
    }

    /// Default `delay_buffer` for a new export node.
    pub fn default_delay_buffer(self) -> &'static str {
        match self {
            Self::Snippet => "2",
            Self::IotHub | Self::Mqtt => "30",
            Self::IotEdge => "10",
            Self::Http => "",
        }
    }
}
