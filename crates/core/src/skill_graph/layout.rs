//! Automatic node placement.
//!
//! [`GraphLayout`] is the seam: anything that maps nodes and edges to
//! non-overlapping centre points will do. [`LayeredLayout`] is the
//! built-in implementation: longest-path ranking, barycenter ordering
//! within each rank, fixed node size and spacing.

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::skill_graph::{Position, SkillGraph, ORIGIN};

pub const NODE_WIDTH: f64 = 300.0;
pub const NODE_HEIGHT: f64 = 60.0;
/// Gap between consecutive ranks.
pub const RANK_SEP: f64 = 50.0;
/// Gap between neighbours within a rank.
pub const NODE_SEP: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    #[serde(rename = "TB")]
    TopToBottom,
    #[serde(rename = "LR")]
    LeftToRight,
}

pub trait GraphLayout {
    /// Centre point of each of `node_count` nodes. `edges` are
    /// `(from, to)` index pairs.
    fn layout(
        &self,
        node_count: usize,
        edges: &[(usize, usize)],
        direction: LayoutDirection,
    ) -> Vec<Position>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout;

impl LayeredLayout {
    fn ranks(graph: &DiGraph<usize, ()>) -> Vec<usize> {
        let mut rank = vec![0usize; graph.node_count()];
        match toposort(graph, None) {
            Ok(order) => {
                for ix in order {
                    let r = rank[ix.index()];
                    for edge in graph.edges_directed(ix, Direction::Outgoing) {
                        let t = edge.target().index();
                        rank[t] = rank[t].max(r + 1);
                    }
                }
            }
            Err(_) => {
                // Cycles: breadth-first depth from the roots instead.
                let mut seen = vec![false; graph.node_count()];
                let mut roots: Vec<_> = graph
                    .node_indices()
                    .filter(|ix| {
                        graph
                            .neighbors_directed(*ix, Direction::Incoming)
                            .next()
                            .is_none()
                    })
                    .collect();
                roots.extend(graph.node_indices());
                for root in roots {
                    if seen[root.index()] {
                        continue;
                    }
                    seen[root.index()] = true;
                    let mut queue = std::collections::VecDeque::from([root]);
                    while let Some(ix) = queue.pop_front() {
                        for next in graph.neighbors_directed(ix, Direction::Outgoing) {
                            if !seen[next.index()] {
                                seen[next.index()] = true;
                                rank[next.index()] = rank[ix.index()] + 1;
                                queue.push_back(next);
                            }
                        }
                    }
                }
            }
        }
        rank
    }
}

impl GraphLayout for LayeredLayout {
    fn layout(
        &self,
        node_count: usize,
        edges: &[(usize, usize)],
        direction: LayoutDirection,
    ) -> Vec<Position> {
        let mut graph = DiGraph::<usize, ()>::with_capacity(node_count, edges.len());
        let indices: Vec<_> = (0..node_count).map(|i| graph.add_node(i)).collect();
        for &(from, to) in edges {
            if from < node_count && to < node_count && from != to {
                graph.add_edge(indices[from], indices[to], ());
            }
        }

        let rank = Self::ranks(&graph);
        let rank_count = rank.iter().max().map_or(0, |r| r + 1);

        // Order each rank by the mean slot of its predecessors, then index.
        let mut slot = vec![0.0f64; node_count];
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for r in 0..rank_count {
            let mut members: Vec<(f64, usize)> = (0..node_count)
                .filter(|i| rank[*i] == r)
                .map(|i| {
                    let preds: Vec<f64> = graph
                        .neighbors_directed(indices[i], Direction::Incoming)
                        .filter(|p| rank[p.index()] < r)
                        .map(|p| slot[p.index()])
                        .collect();
                    let barycenter = if preds.is_empty() {
                        f64::MAX
                    } else {
                        preds.iter().sum::<f64>() / preds.len() as f64
                    };
                    (barycenter, i)
                })
                .collect();
            members.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            for (s, (_, i)) in members.iter().enumerate() {
                slot[*i] = s as f64;
            }
            layers[r] = members.into_iter().map(|(_, i)| i).collect();
        }

        let (rank_size, cross_size) = match direction {
            LayoutDirection::TopToBottom => (NODE_HEIGHT, NODE_WIDTH),
            LayoutDirection::LeftToRight => (NODE_WIDTH, NODE_HEIGHT),
        };
        let rank_step = rank_size + RANK_SEP;
        let cross_step = cross_size + NODE_SEP;
        let widest = layers.iter().map(Vec::len).max().unwrap_or(0);
        let span = |n: usize| n.saturating_sub(1) as f64 * cross_step;

        let mut positions = vec![Position::default(); node_count];
        for (r, layer) in layers.iter().enumerate() {
            // Centre every rank on the widest one.
            let start = (span(widest) - span(layer.len())) / 2.0 + cross_size / 2.0;
            let along = r as f64 * rank_step + rank_size / 2.0;
            for (s, &i) in layer.iter().enumerate() {
                let across = start + s as f64 * cross_step;
                positions[i] = match direction {
                    LayoutDirection::TopToBottom => Position { x: across, y: along },
                    LayoutDirection::LeftToRight => Position { x: along, y: across },
                };
            }
        }
        positions
    }
}

impl SkillGraph {
    /// Re-place every node with the built-in layered layout.
    pub fn layout(&mut self, direction: LayoutDirection) {
        self.layout_with(&LayeredLayout, direction, &mut rand::rng());
    }

    /// Re-place every node with `layout`.
    ///
    /// Centres are converted to top-left anchors and shifted by
    /// [`ORIGIN`]. A sub-pixel jitter from `rng` is added to `x` so a
    /// canvas that compares positions always sees a change.
    pub fn layout_with<L: GraphLayout, R: Rng>(
        &mut self,
        layout: &L,
        direction: LayoutDirection,
        rng: &mut R,
    ) {
        let edges = self.edge_index_pairs();
        let centres = layout.layout(self.nodes().len(), &edges, direction);
        for (node, centre) in self.nodes_mut().iter_mut().zip(centres) {
            let jitter: f64 = rng.random::<f64>() / 1000.0;
            node.position = Position {
                x: centre.x - NODE_WIDTH / 2.0 + jitter + ORIGIN.x,
                y: centre.y - NODE_HEIGHT / 2.0 + ORIGIN.y,
            };
        }
    }
}
