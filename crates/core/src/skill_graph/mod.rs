//! In-memory editor model for AI skill pipelines.
//!
//! A skill graph is a directed graph rooted at a single source node
//! (the camera stream). Frames flow through model and transform nodes
//! into one or more export nodes. The editor supports placing nodes from
//! the catalog, connecting handles, deleting, automatic layout,
//! structural validation and conversion to the backend flow format.
//!
//! Node ids are sequential integer strings; the source is always `"0"`.

pub mod config;
pub mod flow;
pub mod layout;
pub mod model;
pub mod validate;

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub use config::{
    CaptureData, ConfigIssue, ExportConfig, FilterConfig, GrpcConfig, GrpcKind, ModelConfig,
    ModelRef, NodeKind, SourceConfig, TransformConfig,
};
pub use flow::{FlowEdge, FlowEndpoint, FlowNode, FlowParameters, FlowPayload};
pub use layout::{GraphLayout, LayeredLayout, LayoutDirection};
pub use model::{ExportType, Handler, NodeType, SkillModel, TransformType, MODEL_NODE_TITLE};
pub use validate::GraphError;

pub type NodeId = String;

pub const SOURCE_NODE_ID: &str = "0";
pub const SOURCE_HANDLE: &str = "source";
pub const TARGET_HANDLE: &str = "target";

/// Canvas anchor added to every laid-out position.
pub const ORIGIN: Position = Position { x: 350.0, y: 50.0 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A connection point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleRef {
    pub node: NodeId,
    pub handle: String,
}

impl HandleRef {
    pub fn output(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            handle: SOURCE_HANDLE.to_string(),
        }
    }

    pub fn input(node: impl Into<NodeId>) -> Self {
        Self {
            node: node.into(),
            handle: TARGET_HANDLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: NodeId,
    pub source_handle: String,
    pub target: NodeId,
    pub target_handle: String,
}

impl Edge {
    /// Canvas element id, e.g. `reactflow__edge-0source-1target`.
    pub fn id(&self) -> String {
        format!(
            "reactflow__edge-{}{}-{}{}",
            self.source, self.source_handle, self.target, self.target_handle
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub display_name: String,
    /// Catalog entry behind the node; supplies edge routes.
    pub model: SkillModel,
    pub position: Position,
    /// Set once the node's configuration passes its panel checks.
    pub edit_done: bool,
    incoming: Vec<NodeId>,
    outgoing: Vec<NodeId>,
}

impl Node {
    fn new(id: NodeId, kind: NodeKind, model: SkillModel, position: Position) -> Self {
        let display_name = match kind.node_type() {
            NodeType::Model => MODEL_NODE_TITLE.to_string(),
            _ => model.label().to_string(),
        };
        let edit_done = kind.issues().is_empty();
        Self {
            id,
            kind,
            display_name,
            model,
            position,
            edit_done,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Ids of nodes with an edge into this one.
    pub fn incoming(&self) -> &[NodeId] {
        &self.incoming
    }

    /// Ids of nodes this one feeds.
    pub fn outgoing(&self) -> &[NodeId] {
        &self.outgoing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("A node cannot connect to itself")]
    SelfLoop,

    #[error("The source node has no input")]
    SourceHasNoInput,

    #[error("Export nodes have no output")]
    ExportHasNoOutput,

    #[error("Handle {handle} on node {node} already has a connection")]
    TargetOccupied { node: NodeId, handle: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    next_id: u64,
}

impl SkillGraph {
    /// A graph holding only the source node at the canvas origin.
    pub fn new(source_model: SkillModel) -> Self {
        let source = Node::new(
            SOURCE_NODE_ID.to_string(),
            NodeKind::Source(SourceConfig::default()),
            source_model,
            ORIGIN,
        );
        Self {
            nodes: vec![source],
            edges: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, CoreError> {
        let sources = nodes
            .iter()
            .filter(|n| n.node_type() == NodeType::Source)
            .count();
        if sources != 1 {
            return Err(CoreError::Validation(format!(
                "A skill graph needs exactly one source node, found {sources}"
            )));
        }
        let next_id = nodes
            .iter()
            .filter_map(|n| n.id.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);
        let mut graph = Self {
            nodes,
            edges: Vec::new(),
            next_id,
        };
        for edge in edges {
            if graph.node(&edge.source).is_none() || graph.node(&edge.target).is_none() {
                tracing::debug!(edge = %edge.id(), "Dropping edge with a missing endpoint");
                continue;
            }
            graph.link(&edge);
            graph.edges.push(edge);
        }
        Ok(graph)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn source(&self) -> &Node {
        // `from_parts` and `new` guarantee the source exists and
        // `delete_node` refuses to remove it.
        self.nodes
            .iter()
            .find(|n| n.node_type() == NodeType::Source)
            .unwrap_or(&self.nodes[0])
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    fn node_or_not_found(&self, id: &str) -> Result<&Node, CoreError> {
        self.node(id).ok_or_else(|| CoreError::NotFound {
            entity: "node",
            id: id.to_string(),
        })
    }

    // -- editing ------------------------------------------------------------

    /// Place a node from the catalog with its default configuration.
    ///
    /// With `after`, the node goes below that node and an edge from it is
    /// added when the connection is allowed.
    pub fn add_node(&mut self, model: SkillModel, after: Option<&str>) -> Result<NodeId, CoreError> {
        let kind = NodeKind::default_for(&model).ok_or_else(|| {
            CoreError::Validation(format!(
                "{} cannot be added as a {} node",
                model.name,
                model.node_type.as_str()
            ))
        })?;

        let position = match after {
            Some(anchor) => {
                let anchor = self.node_or_not_found(anchor)?.position;
                Position {
                    x: anchor.x,
                    y: anchor.y + layout::NODE_HEIGHT + layout::RANK_SEP,
                }
            }
            None => Position {
                x: ORIGIN.x,
                y: ORIGIN.y + self.nodes.len() as f64 * (layout::NODE_HEIGHT + layout::RANK_SEP),
            },
        };

        let id = self.next_id.to_string();
        self.next_id += 1;
        self.nodes.push(Node::new(id.clone(), kind, model, position));

        if let Some(anchor) = after {
            if let Err(e) = self.connect(&HandleRef::output(anchor), &HandleRef::input(id.as_str())) {
                tracing::debug!(error = %e, "Placed node without connecting it");
            }
        }
        Ok(id)
    }

    /// Connect an output handle to an input handle. Each input handle
    /// accepts at most one incoming edge.
    pub fn connect(&mut self, source: &HandleRef, target: &HandleRef) -> Result<Edge, ConnectError> {
        let from = self
            .node(&source.node)
            .ok_or_else(|| ConnectError::UnknownNode(source.node.clone()))?;
        let to = self
            .node(&target.node)
            .ok_or_else(|| ConnectError::UnknownNode(target.node.clone()))?;

        if from.id == to.id {
            return Err(ConnectError::SelfLoop);
        }
        if from.node_type() == NodeType::Export {
            return Err(ConnectError::ExportHasNoOutput);
        }
        if to.node_type() == NodeType::Source {
            return Err(ConnectError::SourceHasNoInput);
        }
        let occupied = self
            .edges
            .iter()
            .any(|e| e.target == target.node && e.target_handle == target.handle);
        if occupied {
            return Err(ConnectError::TargetOccupied {
                node: target.node.clone(),
                handle: target.handle.clone(),
            });
        }

        let edge = Edge {
            source: source.node.clone(),
            source_handle: source.handle.clone(),
            target: target.node.clone(),
            target_handle: target.handle.clone(),
        };
        self.link(&edge);
        self.edges.push(edge.clone());
        Ok(edge)
    }

    /// Remove a node and exactly the edges touching it. The source node
    /// cannot be removed.
    pub fn delete_node(&mut self, id: &str) -> Result<Vec<Edge>, CoreError> {
        if self.node_or_not_found(id)?.node_type() == NodeType::Source {
            return Err(CoreError::Validation(
                "The source node cannot be deleted".into(),
            ));
        }
        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.source == id || e.target == id);
        self.edges = kept;
        for edge in &removed {
            self.unlink(edge);
        }
        self.nodes.retain(|n| n.id != id);
        Ok(removed)
    }

    pub fn delete_edge(&mut self, source: &str, target: &str) -> Option<Edge> {
        let index = self
            .edges
            .iter()
            .position(|e| e.source == source && e.target == target)?;
        let edge = self.edges.remove(index);
        self.unlink(&edge);
        Some(edge)
    }

    /// Replace a node's configuration. The variant must match the node's
    /// type. Returns the remaining panel issues; the node counts as
    /// configured once there are none.
    pub fn configure(&mut self, id: &str, kind: NodeKind) -> Result<Vec<ConfigIssue>, CoreError> {
        let node = self.node_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "node",
            id: id.to_string(),
        })?;
        if node.node_type() != kind.node_type() {
            return Err(CoreError::Validation(format!(
                "Node {id} is a {} node, not {}",
                node.node_type().as_str(),
                kind.node_type().as_str()
            )));
        }
        if let NodeKind::Transform(new) = &kind {
            if let NodeKind::Transform(old) = &node.kind {
                if old.transform_type() != new.transform_type() {
                    return Err(CoreError::Validation(format!(
                        "Node {id} cannot change its transform type"
                    )));
                }
            }
        }
        let issues = kind.issues();
        node.kind = kind;
        node.edit_done = issues.is_empty();
        Ok(issues)
    }

    /// Pick the trained model a model node runs. The node takes the
    /// model's name, and its routes are used when the graph is serialized.
    pub fn assign_model(&mut self, id: &str, model: SkillModel) -> Result<(), CoreError> {
        let node = self.node_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "node",
            id: id.to_string(),
        })?;
        let NodeKind::Model(config) = &mut node.kind else {
            return Err(CoreError::Validation(format!("Node {id} is not a model node")));
        };
        config.model = Some(ModelRef {
            id: model.id,
            name: model.name.clone(),
        });
        node.edit_done = node.kind.issues().is_empty();
        node.display_name = model.label().to_string();
        node.model = model;
        Ok(())
    }

    pub fn rename_node(&mut self, id: &str, display_name: impl Into<String>) -> Result<(), CoreError> {
        let node = self.node_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "node",
            id: id.to_string(),
        })?;
        node.display_name = display_name.into();
        Ok(())
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<(), CoreError> {
        let node = self.node_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "node",
            id: id.to_string(),
        })?;
        node.position = position;
        Ok(())
    }

    // -- adjacency ----------------------------------------------------------

    fn link(&mut self, edge: &Edge) {
        if let Some(n) = self.node_mut(&edge.source) {
            n.outgoing.push(edge.target.clone());
        }
        if let Some(n) = self.node_mut(&edge.target) {
            n.incoming.push(edge.source.clone());
        }
    }

    fn unlink(&mut self, edge: &Edge) {
        if let Some(n) = self.node_mut(&edge.source) {
            if let Some(i) = n.outgoing.iter().position(|t| *t == edge.target) {
                n.outgoing.remove(i);
            }
        }
        if let Some(n) = self.node_mut(&edge.target) {
            if let Some(i) = n.incoming.iter().position(|s| *s == edge.source) {
                n.incoming.remove(i);
            }
        }
    }

    /// The graph as a petgraph `DiGraph` whose weights are indices into
    /// [`Self::nodes`].
    pub(crate) fn to_digraph(&self) -> (DiGraph<usize, ()>, Vec<NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let indices: Vec<NodeIndex> = (0..self.nodes.len()).map(|i| graph.add_node(i)).collect();
        for edge in &self.edges {
            let from = self.nodes.iter().position(|n| n.id == edge.source);
            let to = self.nodes.iter().position(|n| n.id == edge.target);
            if let (Some(from), Some(to)) = (from, to) {
                graph.add_edge(indices[from], indices[to], ());
            }
        }
        (graph, indices)
    }

    pub(crate) fn edge_index_pairs(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter_map(|e| {
                let from = self.nodes.iter().position(|n| n.id == e.source)?;
                let to = self.nodes.iter().position(|n| n.id == e.target)?;
                Some((from, to))
            })
            .collect()
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }
}


#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::test_support::*;
    use super::*;

    // -- construction --

    #[test]
    fn new_graph_has_source_at_origin() {
        let graph = SkillGraph::new(source());
        assert_eq!(graph.nodes().len(), 1);
        assert_eq!(graph.source().id, SOURCE_NODE_ID);
        assert_eq!(graph.source().position, ORIGIN);
        assert_eq!(
            graph.source().kind,
            NodeKind::Source(SourceConfig::default())
        );
    }

    #[test]
    fn added_nodes_get_sequential_ids_and_defaults() {
        let mut graph = SkillGraph::new(source());
        let model = graph.add_node(ml_model(), None).unwrap();
        let export = graph.add_node(iothub(), None).unwrap();
        assert_eq!((model.as_str(), export.as_str()), ("1", "2"));

        let node = graph.node(&export).unwrap();
        assert_matches!(&node.kind, NodeKind::Export(c) if c.delay_buffer == "30");
        assert!(node.edit_done);
        assert_eq!(graph.node(&model).unwrap().display_name, MODEL_NODE_TITLE);
        assert!(!graph.node(&model).unwrap().edit_done);
    }

    #[test]
    fn second_source_is_refused() {
        let mut graph = SkillGraph::new(source());
        assert_matches!(graph.add_node(source(), None), Err(CoreError::Validation(_)));
    }

    #[test]
    fn add_after_connects_from_anchor() {
        let mut graph = SkillGraph::new(source());
        let id = graph.add_node(ml_model(), Some("0")).unwrap();
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].id(), format!("reactflow__edge-0source-{id}target"));
        assert_eq!(graph.node(&id).unwrap().incoming(), ["0".to_string()]);
        assert_eq!(graph.source().outgoing(), [id]);
    }

    // -- connect --

    #[test]
    fn target_handle_accepts_one_edge() {
        let mut graph = SkillGraph::new(source());
        let a = graph.add_node(filter(), None).unwrap();
        let b = graph.add_node(iothub(), None).unwrap();

        graph.connect(&HandleRef::output("0"), &HandleRef::input(b.as_str())).unwrap();
        assert_matches!(
            graph.connect(&HandleRef::output(a.as_str()), &HandleRef::input(b.as_str())),
            Err(ConnectError::TargetOccupied { .. })
        );
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn connect_rejects_bad_endpoints() {
        let mut graph = SkillGraph::new(source());
        let export = graph.add_node(iothub(), None).unwrap();
        assert_matches!(
            graph.connect(&HandleRef::output(export.as_str()), &HandleRef::input("0")),
            Err(ConnectError::ExportHasNoOutput)
        );
        assert_matches!(
            graph.connect(&HandleRef::output("0"), &HandleRef::input("0")),
            Err(ConnectError::SelfLoop)
        );
        assert_matches!(
            graph.connect(&HandleRef::output("0"), &HandleRef::input("9")),
            Err(ConnectError::UnknownNode(id)) if id == "9"
        );
    }

    // -- delete --

    #[test]
    fn delete_node_removes_exactly_incident_edges() {
        let mut graph = SkillGraph::new(source());
        let a = graph.add_node(filter(), Some("0")).unwrap();
        let b = graph.add_node(ml_model(), Some(&a)).unwrap();
        let c = graph.add_node(iothub(), Some(&b)).unwrap();
        let d = graph.add_node(iothub(), None).unwrap();
        graph.connect(&HandleRef::output(a.as_str()), &HandleRef::input(d.as_str())).unwrap();

        let before: Vec<Edge> = graph.edges().to_vec();
        let removed = graph.delete_node(&b).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(removed.iter().all(|e| e.source == b || e.target == b));
        let expected: Vec<Edge> = before
            .into_iter()
            .filter(|e| e.source != b && e.target != b)
            .collect();
        assert_eq!(graph.edges(), expected.as_slice());
        assert_eq!(graph.node(&a).unwrap().outgoing(), [d]);
        assert!(graph.node(&c).unwrap().incoming().is_empty());
    }

    #[test]
    fn source_cannot_be_deleted() {
        let mut graph = SkillGraph::new(source());
        assert_matches!(graph.delete_node("0"), Err(CoreError::Validation(_)));
        assert_matches!(graph.delete_node("4"), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn delete_edge_updates_adjacency() {
        let mut graph = chain();
        assert!(graph.delete_edge("1", "2").is_some());
        assert!(graph.node("2").unwrap().incoming().is_empty());
        assert!(graph.delete_edge("1", "2").is_none());
    }

    // -- configure --

    #[test]
    fn configure_checks_variant_and_tracks_completion() {
        let mut graph = SkillGraph::new(source());
        let id = graph.add_node(filter(), None).unwrap();
        assert_matches!(
            graph.configure(&id, NodeKind::Export(ExportConfig::new(ExportType::Http))),
            Err(CoreError::Validation(_))
        );

        let issues = graph
            .configure(&id, NodeKind::Transform(TransformConfig::Filter(FilterConfig::default())))
            .unwrap();
        assert_eq!(issues.len(), 1);
        assert!(!graph.node(&id).unwrap().edit_done);

        let config = FilterConfig {
            labels: vec!["person".into()],
            confidence_threshold: 50,
        };
        let issues = graph
            .configure(&id, NodeKind::Transform(TransformConfig::Filter(config)))
            .unwrap();
        assert!(issues.is_empty());
        assert!(graph.node(&id).unwrap().edit_done);
    }
}
