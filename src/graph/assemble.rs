//! Truncation to the node budget and edge collection.

use std::collections::BTreeSet;

use super::priority::RankedNode;
use super::store::GraphStore;
use super::traversal::Deadline;
use super::{Edge, Subgraph};
use crate::{KgError, Result};

/// Keep the first `budget` ranked nodes and every stored edge among them.
///
/// Only neighbor pairs can share an edge, so candidate pairs come from each
/// selected node's neighbor list; each unordered pair is checked once.
/// The deadline, if any, is checked before every store call.
pub async fn assemble(
    store: &dyn GraphStore,
    ranked: &[RankedNode],
    budget: usize,
    deadline: Option<&Deadline>,
) -> Result<Subgraph> {
    let check_deadline = || deadline.map_or(Ok(()), Deadline::check);
    let selected = &ranked[..ranked.len().min(budget)];
    let selected_ids: BTreeSet<&str> = selected.iter().map(|n| n.id.as_str()).collect();

    let mut nodes = Vec::with_capacity(selected.len());
    for ranked_node in selected {
        check_deadline()?;
        let node = store.get_node(&ranked_node.id).await?.ok_or_else(|| {
            KgError::StoreUnavailable(format!(
                "node {} disappeared during the query",
                ranked_node.id
            ))
        })?;
        nodes.push(node);
    }

    let mut edges: Vec<Edge> = Vec::new();
    for id in &selected_ids {
        check_deadline()?;
        for neighbor in store.neighbors_of(id).await? {
            if neighbor.as_str() <= *id || !selected_ids.contains(neighbor.as_str()) {
                continue;
            }
            check_deadline()?;
            if let Some(edge) = store.edge_between(id, &neighbor).await? {
                edges.push(edge);
            }
        }
    }
    edges.sort_by(|a, b| (&a.source, &a.target, &a.edge_id).cmp(&(&b.source, &b.target, &b.edge_id)));

    Ok(Subgraph {
        nodes,
        edges,
        is_truncated: ranked.len() > budget,
        degraded: false,
    })
}
