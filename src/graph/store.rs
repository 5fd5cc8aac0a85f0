//! Read-only capability interface over a graph backend.

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::{Edge, Node, NodeId};
use crate::Result;

/// Per-label predicate handed to indexed stores.
pub type LabelPredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// Everything the extraction pipeline needs from a backend.
///
/// Implementations must tolerate concurrent calls from independent queries;
/// any locking is the implementation's own business.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Every distinct label, sorted ascending.
    async fn list_all_labels(&self) -> Result<Vec<String>>;

    /// Ids of nodes carrying at least one label accepted by `predicate`.
    ///
    /// `None` means the backend has no label index and the caller should
    /// fall back to [`GraphStore::enumerate_all_nodes`].
    async fn find_nodes_by_label(&self, _predicate: LabelPredicate<'_>) -> Result<Option<Vec<NodeId>>> {
        Ok(None)
    }

    /// Every node id with its label set.
    async fn enumerate_all_nodes(&self) -> Result<Vec<(NodeId, BTreeSet<String>)>>;

    /// Distinct neighbors in either edge direction, excluding the node itself, sorted.
    async fn neighbors_of(&self, node_id: &str) -> Result<Vec<NodeId>>;

    async fn degree_of(&self, node_id: &str) -> Result<usize> {
        Ok(self.neighbors_of(node_id).await?.len())
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>>;

    /// The stored edge joining `a` and `b` in either direction.
    async fn edge_between(&self, a: &str, b: &str) -> Result<Option<Edge>>;
}
