//! Knowledge graph module: store adapters and bounded subgraph extraction.
//!
//! A query flows seed selection → BFS expansion → prioritization →
//! truncation → assembly. Every stage reads the graph only through the
//! [`GraphStore`] trait.

mod assemble;
mod matcher;
mod memory;
mod priority;
mod seeds;
mod service;
mod sqlite;
mod store;
mod traversal;

pub use assemble::assemble;
pub use matcher::{LabelMatcher, WILDCARD_LABEL};
pub use memory::{EdgeEntry, GraphDocument, InMemoryGraph, NodeEntry};
pub use priority::{prioritize, RankedNode};
pub use seeds::select_seeds;
pub use service::KnowledgeGraphService;
pub use sqlite::SqliteGraphStore;
pub use store::{GraphStore, LabelPredicate};
pub use traversal::{expand, Deadline, Traversal, TraversalLimits, Visit};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{KgError, Result};

/// Opaque, totally ordered node identifier.
pub type NodeId = String;

/// A node as stored in the full graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub labels: BTreeSet<String>,
    /// Distinct neighbors in the full graph, not the extracted subgraph.
    pub degree: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// A stored edge. Direction is kept as written; traversal treats it as
/// connecting both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub edge_id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

impl Edge {
    /// Endpoints ordered ascending, for undirected comparison.
    pub fn key(&self) -> (&str, &str) {
        if self.source <= self.target {
            (self.source.as_str(), self.target.as_str())
        } else {
            (self.target.as_str(), self.source.as_str())
        }
    }
}

/// Result of a knowledge-graph query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    /// Selected nodes in priority order.
    pub nodes: Vec<Node>,
    /// Edges between selected nodes, sorted by (source, target).
    pub edges: Vec<Edge>,
    /// The node budget cut eligible nodes from the result.
    pub is_truncated: bool,
    /// The visited-node safety valve stopped traversal mid-layer.
    pub degraded: bool,
}

impl Subgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Raw request parameters, as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQuery {
    pub label: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default)]
    pub inclusive: bool,
    #[serde(default)]
    pub min_degree: i64,
}

fn default_max_depth() -> i64 {
    3
}

impl GraphQuery {
    /// Query with the default depth (3), exact matching, and no degree floor.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            max_depth: default_max_depth(),
            inclusive: false,
            min_degree: 0,
        }
    }

    pub fn max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    pub fn min_degree(mut self, min_degree: i64) -> Self {
        self.min_degree = min_degree;
        self
    }

    /// Reject malformed parameters before the store is touched.
    pub fn validate(&self) -> Result<ValidQuery> {
        if self.label.is_empty() {
            return Err(KgError::InvalidArgument("label must not be empty".to_string()));
        }
        let max_depth = usize::try_from(self.max_depth).map_err(|_| {
            KgError::InvalidArgument(format!("max_depth must be >= 0, got {}", self.max_depth))
        })?;
        let min_degree = usize::try_from(self.min_degree).map_err(|_| {
            KgError::InvalidArgument(format!("min_degree must be >= 0, got {}", self.min_degree))
        })?;

        Ok(ValidQuery {
            label: self.label.clone(),
            max_depth,
            inclusive: self.inclusive,
            min_degree,
        })
    }
}

/// A query whose numeric parameters are known to be non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidQuery {
    pub label: String,
    pub max_depth: usize,
    pub inclusive: bool,
    pub min_degree: usize,
}

/// Deployment-level extraction settings, fixed for the lifetime of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSettings {
    /// Maximum nodes in one result.
    pub node_budget: usize,
    /// Hard cap on nodes visited by one traversal.
    pub max_visited_nodes: usize,
    pub case_sensitive: bool,
    /// Per-query deadline in milliseconds.
    pub max_latency_ms: Option<u64>,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            node_budget: 1000,
            max_visited_nodes: 10_000,
            case_sensitive: true,
            max_latency_ms: None,
        }
    }
}

impl GraphSettings {
    /// Default settings with a different node budget (visited cap scales with it).
    pub fn with_budget(node_budget: usize) -> Self {
        Self {
            node_budget,
            max_visited_nodes: node_budget.saturating_mul(10),
            ..Self::default()
        }
    }
}
