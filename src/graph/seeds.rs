//! Seed selection: every node whose labels answer the query label.

use std::collections::BTreeSet;

use super::matcher::LabelMatcher;
use super::store::GraphStore;
use super::NodeId;
use crate::Result;

/// Select seed ids, deduplicated and sorted ascending.
///
/// Uses the store's label index when it has one, otherwise scans every node.
/// No match is an empty set, not an error.
pub async fn select_seeds(
    store: &dyn GraphStore,
    matcher: &LabelMatcher,
    label: &str,
    inclusive: bool,
) -> Result<BTreeSet<NodeId>> {
    let predicate = |candidate: &str| matcher.matches_label(candidate, label, inclusive);

    if let Some(ids) = store.find_nodes_by_label(&predicate).await? {
        log::debug!("Seed lookup for {:?} via label index: {} nodes", label, ids.len());
        return Ok(ids.into_iter().collect());
    }

    let seeds: BTreeSet<NodeId> = store
        .enumerate_all_nodes()
        .await?
        .into_iter()
        .filter(|(_, labels)| matcher.matches(labels, label, inclusive))
        .map(|(id, _)| id)
        .collect();
    log::debug!("Seed lookup for {:?} via full scan: {} nodes", label, seeds.len());
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;

    fn populate(g: &InMemoryGraph) {
        g.add_node("alice", ["Person", "Author"], None).unwrap();
        g.add_node("bob", ["Person"], None).unwrap();
        g.add_node("acme", ["Organization"], None).unwrap();
    }

    fn ids(items: &[&str]) -> BTreeSet<NodeId> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_exact_seeds_indexed_and_scanned_agree() {
        let indexed = InMemoryGraph::new();
        let scanned = InMemoryGraph::without_label_index();
        populate(&indexed);
        populate(&scanned);
        let m = LabelMatcher::default();

        let a = select_seeds(&indexed, &m, "Person", false).await.unwrap();
        let b = select_seeds(&scanned, &m, "Person", false).await.unwrap();
        assert_eq!(a, ids(&["alice", "bob"]));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_inclusive_seeds() {
        let g = InMemoryGraph::without_label_index();
        populate(&g);
        let m = LabelMatcher::default();
        let seeds = select_seeds(&g, &m, "an", true).await.unwrap();
        assert_eq!(seeds, ids(&["acme"]));
    }

    #[tokio::test]
    async fn test_no_match_is_empty() {
        let g = InMemoryGraph::new();
        populate(&g);
        let seeds = select_seeds(&g, &LabelMatcher::default(), "Z", false).await.unwrap();
        assert!(seeds.is_empty());
    }

    #[tokio::test]
    async fn test_node_matching_two_labels_appears_once() {
        let g = InMemoryGraph::new();
        populate(&g);
        let seeds = select_seeds(&g, &LabelMatcher::default(), "o", true).await.unwrap();
        // alice matches "Person" and "Author"
        assert_eq!(seeds, ids(&["acme", "alice", "bob"]));
    }
}
