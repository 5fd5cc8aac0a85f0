//! Priority ordering of discovered nodes.

use std::cmp::Reverse;

use super::traversal::Traversal;
use super::NodeId;

/// A discovered node with its ranking inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedNode {
    pub id: NodeId,
    pub distance: usize,
    pub degree: usize,
}

impl RankedNode {
    /// Priority class: seeds are 0, otherwise the BFS distance.
    pub fn class(&self) -> usize {
        self.distance
    }

    pub fn is_seed(&self) -> bool {
        self.distance == 0
    }
}

/// Order discovered nodes for truncation.
///
/// Non-seed nodes below `min_degree` are dropped first. The rest sort by
/// class ascending, degree descending, then id ascending.
pub fn prioritize(traversal: &Traversal, min_degree: usize) -> Vec<RankedNode> {
    let mut ranked: Vec<RankedNode> = traversal
        .visited
        .iter()
        .filter(|(_, visit)| visit.distance == 0 || visit.degree >= min_degree)
        .map(|(id, visit)| RankedNode {
            id: id.clone(),
            distance: visit.distance,
            degree: visit.degree,
        })
        .collect();

    ranked.sort_by(|a, b| {
        (a.class(), Reverse(a.degree), &a.id).cmp(&(b.class(), Reverse(b.degree), &b.id))
    });
    ranked
}
