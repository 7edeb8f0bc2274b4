//! Conversion between the editor graph and the stored forms.
//!
//! Two representations are saved with every skill:
//!
//! * the **flow**, the pipeline description the backend deploys. Nodes
//!   carry only the configuration their type uses; edges are expressed
//!   as `(node, route)` pairs taken from the catalog model's first output
//!   and input.
//! * the **raw** blob, an opaque JSON string holding everything the editor
//!   needs to restore the canvas as it was (positions, display names,
//!   full configurations, handles).
//!
//! Skills saved without a raw blob are rebuilt from their flow with
//! [`SkillGraph::from_flow`] and then laid out automatically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::skill_graph::config::{
    CaptureData, EnvVar, ExportConfig, FilterConfig, GrpcConfig, GrpcKind, ModelConfig, ModelRef,
    NodeKind, SourceConfig, TransformConfig,
};
use crate::skill_graph::layout::LayoutDirection;
use crate::skill_graph::model::{ExportType, NodeType, SkillModel, TransformType};
use crate::skill_graph::{Edge, Node, NodeId, Position, SkillGraph, ORIGIN, SOURCE_HANDLE, TARGET_HANDLE};

const PARAM_INVALID: &str = "invalid";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowPayload {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
    #[serde(default)]
    pub parameters: FlowParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Catalog name; the orchestration id for trained models.
    pub name: String,
    #[serde(default)]
    pub configurations: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEndpoint {
    pub node: NodeId,
    pub route: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: FlowEndpoint,
    pub target: FlowEndpoint,
}

/// Deployment-time parameters. The editor always sends placeholders;
/// real values are bound when a deployment is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowParameters {
    pub rtsp: String,
    pub fps: String,
    pub instance_displayname: String,
    pub skill_displayname: String,
    pub device_displayname: String,
    pub device_id: String,
}

impl Default for FlowParameters {
    fn default() -> Self {
        Self {
            rtsp: PARAM_INVALID.into(),
            fps: PARAM_INVALID.into(),
            instance_displayname: PARAM_INVALID.into(),
            skill_displayname: PARAM_INVALID.into(),
            device_displayname: PARAM_INVALID.into(),
            device_id: PARAM_INVALID.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RawGraph {
    nodes: Vec<RawNode>,
    edges: Vec<Edge>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNode {
    id: NodeId,
    data: NodeKind,
    display_name: String,
    model: SkillModel,
    position: Position,
    #[serde(default)]
    edit_done: bool,
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

impl SkillGraph {
    pub fn to_flow(&self) -> Result<FlowPayload, CoreError> {
        let nodes = self.nodes().iter().map(flow_node).collect();

        let mut edges = Vec::with_capacity(self.edges().len());
        for edge in self.edges() {
            let route = |id: &str, output: bool| -> Result<String, CoreError> {
                let node = self.node(id).ok_or_else(|| CoreError::NotFound {
                    entity: "node",
                    id: id.to_string(),
                })?;
                let route = if output {
                    node.model.first_output_route()
                } else {
                    node.model.first_input_route()
                };
                route.map(str::to_string).ok_or_else(|| {
                    CoreError::Validation(format!(
                        "{} has no {} route",
                        node.display_name,
                        if output { "output" } else { "input" }
                    ))
                })
            };
            edges.push(FlowEdge {
                source: FlowEndpoint {
                    node: edge.source.clone(),
                    route: route(&edge.source, true)?,
                },
                target: FlowEndpoint {
                    node: edge.target.clone(),
                    route: route(&edge.target, false)?,
                },
            });
        }

        Ok(FlowPayload {
            nodes,
            edges,
            parameters: FlowParameters::default(),
        })
    }

    /// Rebuild an editable graph from a stored flow. Nodes are matched to
    /// `models` by orchestration id (model nodes) or catalog name; nodes
    /// whose catalog entry is gone keep a routeless placeholder.
    pub fn from_flow(flow: &FlowPayload, models: &[SkillModel]) -> Result<Self, CoreError> {
        let mut nodes = Vec::with_capacity(flow.nodes.len());
        for flow_node in &flow.nodes {
            let matched = models.iter().find(|m| match flow_node.node_type {
                NodeType::Model => m.kan_id == flow_node.name,
                _ => m.name == flow_node.name,
            });
            let model = match matched {
                Some(m) => m.clone(),
                None => {
                    tracing::debug!(name = %flow_node.name, "No catalog entry for flow node");
                    SkillModel::placeholder(&flow_node.name, flow_node.node_type)
                }
            };
            let kind = recover_kind(flow_node, &model)?;
            let mut node = Node::new(flow_node.id.clone(), kind, model, ORIGIN);
            if node.node_type() == NodeType::Model && matched.is_some() {
                node.display_name = node.model.label().to_string();
            }
            nodes.push(node);
        }

        let edges = flow
            .edges
            .iter()
            .map(|e| Edge {
                source: e.source.node.clone(),
                source_handle: SOURCE_HANDLE.to_string(),
                target: e.target.node.clone(),
                target_handle: TARGET_HANDLE.to_string(),
            })
            .collect();

        let mut graph = Self::from_parts(nodes, edges)?;
        graph.layout(LayoutDirection::TopToBottom);
        Ok(graph)
    }

    // -----------------------------------------------------------------------
    // Raw
    // -----------------------------------------------------------------------

    pub fn to_raw(&self) -> Result<String, CoreError> {
        let raw = RawGraph {
            nodes: self
                .nodes()
                .iter()
                .map(|n| RawNode {
                    id: n.id.clone(),
                    data: n.kind.clone(),
                    display_name: n.display_name.clone(),
                    model: n.model.clone(),
                    position: n.position,
                    edit_done: n.edit_done,
                })
                .collect(),
            edges: self.edges().to_vec(),
        };
        serde_json::to_string(&raw).map_err(|e| CoreError::Internal(e.to_string()))
    }

    pub fn from_raw(raw: &str) -> Result<Self, CoreError> {
        let raw: RawGraph = serde_json::from_str(raw)
            .map_err(|e| CoreError::Validation(format!("Malformed skill layout: {e}")))?;
        let nodes = raw
            .nodes
            .into_iter()
            .map(|r| {
                let mut node = Node::new(r.id, r.data, r.model, r.position);
                node.display_name = r.display_name;
                node.edit_done = r.edit_done;
                node
            })
            .collect();
        Self::from_parts(nodes, raw.edges)
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

fn flow_node(node: &Node) -> FlowNode {
    let name = match node.node_type() {
        NodeType::Model if !node.model.kan_id.is_empty() => node.model.kan_id.clone(),
        _ => node.model.name.clone(),
    };
    FlowNode {
        id: node.id.clone(),
        node_type: node.node_type(),
        name,
        configurations: project(&node.kind),
    }
}

fn project(kind: &NodeKind) -> Map<String, Value> {
    let mut map = Map::new();
    let mut put = |key: &str, value: Value| {
        map.insert(key.to_string(), value);
    };
    match kind {
        NodeKind::Source(c) => {
            put("ip", c.ip.clone().into());
            put("fps", c.fps.clone().into());
            put("device_name", c.device_name.clone().into());
        }
        NodeKind::Model(c) => {
            // Zeroed bounds mark capture as off.
            let (upper, lower, max_images) = match c.capture_data {
                CaptureData::Yes => (c.confidence_upper, c.confidence_lower, c.max_images),
                _ => (0, 0, 0),
            };
            put("confidence_upper", upper.to_string().into());
            put("confidence_lower", lower.to_string().into());
            put("max_images", max_images.to_string().into());
        }
        NodeKind::Transform(TransformConfig::Filter(c)) => {
            let labels = serde_json::to_string(&c.labels).unwrap_or_else(|_| "[]".into());
            put("labels", labels.into());
            put("confidence_threshold", c.confidence_threshold.to_string().into());
        }
        NodeKind::Transform(TransformConfig::Grpc(c)) => {
            let kind = match c.kind {
                Some(GrpcKind::Endpoint) => "endpoint",
                Some(GrpcKind::Container) => "container",
                None => "",
            };
            put("type", kind.into());
            match c.kind {
                Some(GrpcKind::Container) => {
                    let env: Vec<&EnvVar> = c
                        .env
                        .iter()
                        .filter(|e| !(e.key.is_empty() && e.value.is_empty()))
                        .collect();
                    put("container_name", c.container_name.clone().into());
                    put("container_image", c.container_image.clone().into());
                    put("create_options", c.create_options.clone().into());
                    put("restart_policy", c.restart_policy.clone().into());
                    put("port", c.port.to_string().into());
                    put("route", c.route.clone().into());
                    put("env", serde_json::to_value(env).unwrap_or(Value::Array(Vec::new())));
                    put("architecture", c.architecture.clone().into());
                    put("acceleration", c.acceleration.clone().into());
                }
                _ => put("endpoint_url", c.endpoint_url.clone().into()),
            }
        }
        NodeKind::Export(c) => match c.export_type {
            ExportType::Http => put("url", c.url.clone().into()),
            export_type => {
                put("delay_buffer", c.delay_buffer.clone().into());
                match export_type {
                    ExportType::Mqtt => put("broker_address", c.broker_address.clone().into()),
                    ExportType::Snippet => {
                        put("filename_prefix", c.filename_prefix.clone().into());
                        put("instance_displayname", "$param(instance_displayname)".into());
                        put("device_displayname", "$param(device_displayname)".into());
                        put("skill_displayname", "$param(skill_displayname)".into());
                        put("recording_duration", c.recording_duration.clone().into());
                        put("insights_overlay", c.insights_overlay.clone().into());
                    }
                    ExportType::IotEdge => {
                        put("module_name", c.module_name.clone().into());
                        put("module_input", c.module_input.clone().into());
                    }
                    ExportType::IotHub | ExportType::Http => {}
                }
            }
        },
    }
    map
}

// ---------------------------------------------------------------------------
// Recovery
// ---------------------------------------------------------------------------

/// A configuration value as text. Numbers are accepted for fields the
/// backend may have re-typed.
fn text(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(map: &Map<String, Value>, key: &str, default: i64) -> i64 {
    text(map, key).trim().parse().unwrap_or(default)
}

fn recover_kind(node: &FlowNode, model: &SkillModel) -> Result<NodeKind, CoreError> {
    let c = &node.configurations;
    let kind = match node.node_type {
        NodeType::Source => NodeKind::Source(SourceConfig::default()),
        NodeType::Model => {
            let defaults = ModelConfig::default();
            let capturing = number(c, "max_images", 0) > 0;
            NodeKind::Model(ModelConfig {
                model: (model.id != 0).then(|| ModelRef {
                    id: model.id,
                    name: model.name.clone(),
                }),
                capture_data: if capturing { CaptureData::Yes } else { CaptureData::No },
                confidence_lower: number(c, "confidence_lower", defaults.confidence_lower),
                confidence_upper: number(c, "confidence_upper", defaults.confidence_upper),
                max_images: number(c, "max_images", defaults.max_images),
            })
        }
        NodeType::Transform => match TransformType::from_model_name(&node.name) {
            Some(TransformType::Filter) => {
                let labels: Vec<String> = match c.get("labels") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    Some(Value::String(s)) => serde_json::from_str(s).unwrap_or_else(|_| {
                        tracing::debug!(labels = %s, "Filter labels are not a JSON list");
                        FilterConfig::parse_labels(s)
                    }),
                    _ => Vec::new(),
                };
                NodeKind::Transform(TransformConfig::Filter(FilterConfig {
                    labels,
                    confidence_threshold: number(
                        c,
                        "confidence_threshold",
                        FilterConfig::default().confidence_threshold,
                    ),
                }))
            }
            Some(TransformType::Grpc) => {
                let kind = match text(c, "type").as_str() {
                    "endpoint" => Some(GrpcKind::Endpoint),
                    "container" => Some(GrpcKind::Container),
                    _ => None,
                };
                let mut env: Vec<EnvVar> = c
                    .get("env")
                    .cloned()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or_default();
                env.push(EnvVar::default());
                let defaults = GrpcConfig::default();
                let restart_policy = match text(c, "restart_policy") {
                    p if p.is_empty() => defaults.restart_policy,
                    p => p,
                };
                NodeKind::Transform(TransformConfig::Grpc(GrpcConfig {
                    kind,
                    endpoint_url: text(c, "endpoint_url"),
                    container_name: text(c, "container_name"),
                    container_image: text(c, "container_image"),
                    create_options: text(c, "create_options"),
                    restart_policy,
                    port: text(c, "port").trim().parse().unwrap_or(0),
                    route: text(c, "route"),
                    env,
                    architecture: text(c, "architecture"),
                    acceleration: text(c, "acceleration"),
                }))
            }
            None => {
                return Err(CoreError::Validation(format!(
                    "Unknown transform node {}",
                    node.name
                )))
            }
        },
        NodeType::Export => {
            let export_type = ExportType::from_model_name(&node.name).ok_or_else(|| {
                CoreError::Validation(format!("Unknown export node {}", node.name))
            })?;
            let mut config = ExportConfig::new(export_type);
            config.delay_buffer = text(c, "delay_buffer");
            config.filename_prefix = text(c, "filename_prefix");
            config.recording_duration = text(c, "recording_duration");
            config.insights_overlay = text(c, "insights_overlay");
            config.module_name = text(c, "module_name");
            config.module_input = text(c, "module_input");
            config.url = text(c, "url");
            config.broker_address = text(c, "broker_address");
            NodeKind::Export(config)
        }
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::skill_graph::test_support::*;
    use crate::skill_graph::{HandleRef, MODEL_NODE_TITLE};

    fn flow_fixture() -> FlowPayload {
        serde_json::from_value(serde_json::json!({
            "nodes": [
                {"id": "0", "type": "source", "name": "rtsp_source",
                 "configurations": {"ip": "$param(rtsp)"}},
                {"id": "1", "type": "model", "name": "model-1",
                 "configurations": {"confidence_lower": "40", "confidence_upper": "90", "max_images": "5"}},
                {"id": "2", "type": "export", "name": "iothub_export",
                 "configurations": {"delay_buffer": "15"}},
                {"id": "5", "type": "export", "name": "http_export",
                 "configurations": {"url": "http://sink"}}
            ],
            "edges": [
                {"source": {"node": "0", "route": "out"}, "target": {"node": "1", "route": "in"}},
                {"source": {"node": "1", "route": "out"}, "target": {"node": "2", "route": "in"}},
                {"source": {"node": "1", "route": "out"}, "target": {"node": "5", "route": "in"}}
            ]
        }))
        .unwrap()
    }

    fn catalog_list() -> Vec<SkillModel> {
        vec![source(), trained("model-1"), iothub(), catalog("http_export", NodeType::Export)]
    }

    // -- flow --

    #[test]
    fn flow_uses_kan_id_routes_and_placeholders() {
        let flow = chain().to_flow().unwrap();

        assert_eq!(flow.nodes[1].name, "model-1");
        assert_eq!(flow.nodes[2].name, "iothub_export");
        assert_eq!(flow.nodes[2].configurations["delay_buffer"], "30");
        assert_eq!(
            flow.edges[0],
            FlowEdge {
                source: FlowEndpoint { node: "0".into(), route: "out".into() },
                target: FlowEndpoint { node: "1".into(), route: "in".into() },
            }
        );
        assert_eq!(flow.parameters.device_id, "invalid");

        let json = serde_json::to_value(&flow).unwrap();
        assert_eq!(json["nodes"][0]["type"], "source");
        assert_eq!(json["parameters"]["skill_displayname"], "invalid");
    }

    #[test]
    fn model_always_sends_bounds_as_text() {
        let mut graph = chain();
        let off = &graph.to_flow().unwrap().nodes[1];
        assert_eq!(off.configurations["confidence_upper"], "0");
        assert_eq!(off.configurations["confidence_lower"], "0");
        assert_eq!(off.configurations["max_images"], "0");

        let config = ModelConfig {
            model: Some(ModelRef { id: 7, name: "people-counter".into() }),
            capture_data: CaptureData::Yes,
            confidence_lower: 60,
            confidence_upper: 80,
            max_images: 20,
        };
        graph.configure("1", NodeKind::Model(config)).unwrap();
        let node = &graph.to_flow().unwrap().nodes[1];
        assert_eq!(node.configurations["confidence_upper"], "80");
        assert_eq!(node.configurations["confidence_lower"], "60");
        assert_eq!(node.configurations["max_images"], "20");
    }

    #[test]
    fn zeroed_bounds_recover_as_capture_off() {
        let graph = SkillGraph::from_flow(&chain().to_flow().unwrap(), &catalog_list()).unwrap();
        assert_matches!(
            &graph.node("1").unwrap().kind,
            NodeKind::Model(c) if c.capture_data == CaptureData::No && c.max_images == 0
        );
    }

    #[test]
    fn snippet_export_carries_display_params() {
        let mut graph = chain();
        let id = graph
            .add_node(catalog("video_snippet_export", NodeType::Export), None)
            .unwrap();
        let flow = graph.to_flow().unwrap();
        let node = flow.nodes.iter().find(|n| n.id == id).unwrap();
        assert_eq!(node.configurations["delay_buffer"], "2");
        assert_eq!(node.configurations["skill_displayname"], "$param(skill_displayname)");
        assert!(!node.configurations.contains_key("url"));
    }

    #[test]
    fn routeless_endpoint_cannot_be_serialized() {
        let mut graph = SkillGraph::new(source());
        let mut bare = iothub();
        bare.inputs.clear();
        let id = graph.add_node(bare, None).unwrap();
        graph.connect(&HandleRef::output("0"), &HandleRef::input(id.as_str())).unwrap();
        assert_matches!(graph.to_flow(), Err(CoreError::Validation(_)));
    }

    // -- recovery --

    #[test]
    fn recovers_graph_from_flow() {
        let graph = SkillGraph::from_flow(&flow_fixture(), &catalog_list()).unwrap();

        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.edges()[0].id(), "reactflow__edge-0source-1target");
        assert_eq!(graph.node("1").unwrap().display_name, "people-counter");
        assert_matches!(
            &graph.node("1").unwrap().kind,
            NodeKind::Model(c) if c.capture_data == CaptureData::Yes && c.confidence_lower == 40
        );
        assert_matches!(
            &graph.node("2").unwrap().kind,
            NodeKind::Export(c) if c.delay_buffer == "15"
        );
        assert!(graph.nodes().iter().all(|n| n.edit_done));
        assert_eq!(graph.validate("recovered", &[]), None);

        // laid out: distinct ranks below the origin
        assert_eq!(graph.source().position.y, ORIGIN.y);
        assert!(graph.node("2").unwrap().position.y > graph.node("1").unwrap().position.y);

        // new ids continue after the highest recovered one
        let mut graph = graph;
        assert_eq!(graph.add_node(iothub(), None).unwrap(), "6");
    }

    #[test]
    fn unknown_catalog_entry_gets_placeholder() {
        let graph = SkillGraph::from_flow(&flow_fixture(), &[source(), iothub()]).unwrap();
        let model = graph.node("1").unwrap();
        assert_eq!(model.display_name, MODEL_NODE_TITLE);
        assert!(!model.edit_done);
        assert!(graph.node("5").unwrap().model.inputs.is_empty());
    }

    #[test]
    fn unknown_export_name_is_rejected() {
        let mut flow = flow_fixture();
        flow.nodes[2].name = "fax_export".into();
        assert_matches!(
            SkillGraph::from_flow(&flow, &catalog_list()),
            Err(CoreError::Validation(_))
        );
    }

    // -- raw --

    #[test]
    fn raw_round_trip_keeps_structure() {
        let mut graph = chain();
        let filter_id = graph.add_node(filter(), Some("1")).unwrap();
        let config = FilterConfig {
            labels: vec!["person".into(), "car".into()],
            confidence_threshold: 55,
        };
        graph
            .configure(&filter_id, NodeKind::Transform(TransformConfig::Filter(config)))
            .unwrap();
        graph.move_node("2", Position { x: 10.0, y: 20.0 }).unwrap();

        let restored = SkillGraph::from_raw(&graph.to_raw().unwrap()).unwrap();

        assert_eq!(restored.nodes().len(), graph.nodes().len());
        let mut before = graph.edges().to_vec();
        let mut after = restored.edges().to_vec();
        before.sort();
        after.sort();
        assert_eq!(before, after);
        for (a, b) in graph.nodes().iter().zip(restored.nodes()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.position, b.position);
            assert_eq!(a.display_name, b.display_name);
        }
        assert_eq!(restored.node("1").unwrap().outgoing().len(), 2);
    }

    #[test]
    fn malformed_raw_is_a_validation_error() {
        assert_matches!(SkillGraph::from_raw("{nodes"), Err(CoreError::Validation(_)));
        assert_matches!(
            SkillGraph::from_raw(r#"{"nodes": [], "edges": []}"#),
            Err(CoreError::Validation(_))
        );
    }
}
