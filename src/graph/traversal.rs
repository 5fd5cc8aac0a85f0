//! Multi-source BFS expansion with a node budget and a visited-node safety valve.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use tokio::time::Instant;

use super::store::GraphStore;
use super::NodeId;
use crate::{KgError, Result};

/// Where and how a node was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Minimum hop count from any seed.
    pub distance: usize,
    /// Full-graph degree.
    pub degree: usize,
}

/// Everything one expansion discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traversal {
    pub visited: BTreeMap<NodeId, Visit>,
    /// The safety valve stopped expansion mid-layer.
    pub degraded: bool,
    /// Expansion stopped because the budget was already met by eligible
    /// nodes while the frontier still had unvisited neighbors.
    pub stopped_early: bool,
}

/// Per-query wall-clock limit, checked between node expansions.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn after_ms(ms: u64) -> Self {
        Self::after(Duration::from_millis(ms))
    }

    pub fn check(&self) -> Result<()> {
        if self.started.elapsed() >= self.limit {
            return Err(KgError::DeadlineExceeded(self.limit.as_millis() as u64));
        }
        Ok(())
    }
}

/// Bounds applied to one expansion.
#[derive(Debug, Clone, Copy)]
pub struct TraversalLimits {
    /// Node budget of the final result.
    pub budget: usize,
    /// Degree floor for non-seed nodes to count toward the budget.
    pub min_degree: usize,
    /// Hard cap on visited nodes.
    pub max_visited: usize,
    pub deadline: Option<Deadline>,
}

impl TraversalLimits {
    pub(crate) fn check_deadline(&self) -> Result<()> {
        match &self.deadline {
            Some(deadline) => deadline.check(),
            None => Ok(()),
        }
    }
}

/// Expand from `seeds` layer by layer up to `max_depth` hops.
///
/// A layer is always finished before the next begins, so each recorded
/// distance is the minimum over all seeds. Once a finished layer leaves at
/// least `budget` eligible nodes, deeper layers cannot reach the result and
/// expansion stops. Only the visited cap interrupts a layer.
pub async fn expand(
    store: &dyn GraphStore,
    seeds: &BTreeSet<NodeId>,
    max_depth: usize,
    limits: &TraversalLimits,
) -> Result<Traversal> {
    let mut traversal = Traversal::default();

    for seed in seeds {
        limits.check_deadline()?;
        let degree = store.degree_of(seed).await?;
        traversal
            .visited
            .insert(seed.clone(), Visit { distance: 0, degree });
    }

    let mut eligible = seeds.len();
    let mut frontier: Vec<NodeId> = seeds.iter().cloned().collect();

    for depth in 0..max_depth {
        if frontier.is_empty() {
            break;
        }
        if eligible >= limits.budget {
            traversal.stopped_early = has_unvisited_neighbor(store, &frontier, &traversal, limits).await?;
            log::debug!(
                "Budget of {} met by {} eligible nodes at depth {}; not expanding further (frontier open: {})",
                limits.budget,
                eligible,
                depth,
                traversal.stopped_early
            );
            break;
        }

        let mut next = Vec::new();
        'layer: for node in &frontier {
            limits.check_deadline()?;
            for neighbor in store.neighbors_of(node).await? {
                if traversal.visited.contains_key(&neighbor) {
                    continue;
                }
                if traversal.visited.len() >= limits.max_visited {
                    log::warn!(
                        "Visited-node cap of {} reached at depth {}; subgraph may be structurally incomplete",
                        limits.max_visited,
                        depth + 1
                    );
                    traversal.degraded = true;
                    break 'layer;
                }

                limits.check_deadline()?;
                let degree = store.degree_of(&neighbor).await?;
                if degree >= limits.min_degree {
                    eligible += 1;
                }
                traversal.visited.insert(
                    neighbor.clone(),
                    Visit {
                        distance: depth + 1,
                        degree,
                    },
                );
                next.push(neighbor);
            }
        }

        log::debug!(
            "Layer {} discovered {} nodes ({} visited total)",
            depth + 1,
            next.len(),
            traversal.visited.len()
        );

        if traversal.degraded {
            break;
        }
        next.sort();
        frontier = next;
    }

    Ok(traversal)
}

/// Whether any node of `frontier` still leads somewhere not yet visited.
async fn has_unvisited_neighbor(
    store: &dyn GraphStore,
    frontier: &[NodeId],
    traversal: &Traversal,
    limits: &TraversalLimits,
) -> Result<bool> {
    for node in frontier {
        limits.check_deadline()?;
        let neighbors = store.neighbors_of(node).await?;
        if neighbors.iter().any(|n| !traversal.visited.contains_key(n)) {
            return Ok(true);
        }
    }
    Ok(false)
}
