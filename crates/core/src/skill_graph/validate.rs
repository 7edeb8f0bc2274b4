//! Structural checks run before a skill graph can be saved.

use petgraph::visit::Bfs;
use serde::{Deserialize, Serialize};

use crate::skill_graph::{NodeType, SkillGraph};

/// Why a graph cannot be saved. Checked in declaration order; the first
/// match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
pub enum GraphError {
    #[error("At least one export node is required.")]
    AtLeastOneExport,

    #[error("Every node needs to be connected to the source.")]
    DiscreteFlow,

    #[error("Node names need to be unique.")]
    NodeDuplication,

    #[error("The skill name is already used.")]
    NameDuplication,
}

impl GraphError {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AtLeastOneExport => "atLeastOneExport",
            Self::DiscreteFlow => "discreteFlow",
            Self::NodeDuplication => "nodeDuplication",
            Self::NameDuplication => "nameDuplication",
        }
    }
}

impl SkillGraph {
    /// Validate the graph saved under `skill_name` against the names of
    /// the other stored skills.
    pub fn validate(&self, skill_name: &str, existing_names: &[String]) -> Option<GraphError> {
        if !self.nodes().iter().any(|n| n.node_type() == NodeType::Export) {
            return Some(GraphError::AtLeastOneExport);
        }
        if self.is_discrete() {
            return Some(GraphError::DiscreteFlow);
        }
        if self.has_duplicate_node_names() {
            return Some(GraphError::NodeDuplication);
        }
        if existing_names.iter().any(|n| n == skill_name) {
            return Some(GraphError::NameDuplication);
        }
        None
    }

    /// True when some node cannot be reached from the source, or a model
    /// or transform node feeds nothing (a dangling branch).
    pub fn is_discrete(&self) -> bool {
        let (graph, indices) = self.to_digraph();
        let Some(source) = self
            .nodes()
            .iter()
            .position(|n| n.node_type() == NodeType::Source)
        else {
            return true;
        };

        let mut reached = vec![false; self.nodes().len()];
        let mut bfs = Bfs::new(&graph, indices[source]);
        while let Some(ix) = bfs.next(&graph) {
            reached[graph[ix]] = true;
        }

        self.nodes().iter().zip(&reached).any(|(node, reached)| {
            let dangling = matches!(node.node_type(), NodeType::Model | NodeType::Transform)
                && node.outgoing().is_empty();
            !reached || dangling
        })
    }

    fn has_duplicate_node_names(&self) -> bool {
        let mut names: Vec<&str> = self.nodes().iter().map(|n| n.display_name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        names.len() != total
    }

    /// Banner text shown above the canvas while editing. Empty when the
    /// graph is ready to save.
    pub fn status_message(&self) -> String {
        if self.nodes().len() == 1 && self.edges().is_empty() {
            return "Drag and drop these nodes to the canvas on the right".into();
        }
        if !self.nodes().iter().any(|n| n.node_type() == NodeType::Model) {
            return "At least one model node".into();
        }
        if !self.nodes().iter().any(|n| n.node_type() == NodeType::Export) {
            return "At least one Export Node needed".into();
        }
        if let Some(node) = self.nodes().iter().find(|n| !n.edit_done) {
            return format!("{} Node cannot be blank", node.display_name);
        }
        if self.is_discrete() {
            return "Graph should be connected".into();
        }
        String::new()
    }
}
