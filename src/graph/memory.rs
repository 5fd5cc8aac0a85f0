//! In-memory graph backend, loadable from a JSON graph document.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::store::{GraphStore, LabelPredicate};
use super::{Edge, Node, NodeId};
use crate::{KgError, Result};

/// Serialized graph: `{"nodes": [...], "edges": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub edges: Vec<EdgeEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEntry {
    /// Generated when absent.
    #[serde(default)]
    pub edge_id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub properties: Option<Value>,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    labels: BTreeSet<String>,
    properties: Option<Value>,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<NodeId, NodeRecord>,
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
    /// Keyed by (min id, max id); one edge per unordered pair.
    edges: BTreeMap<(NodeId, NodeId), Edge>,
    label_index: BTreeMap<String, BTreeSet<NodeId>>,
}

/// Thread-safe in-memory graph.
#[derive(Debug)]
pub struct InMemoryGraph {
    inner: RwLock<Inner>,
    indexed: bool,
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGraph {
    /// Empty graph that answers label lookups from its label index.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            indexed: true,
        }
    }

    /// Empty graph that reports no label index, forcing seed selection
    /// onto the full-scan path.
    pub fn without_label_index() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            indexed: false,
        }
    }

    pub fn from_document(doc: GraphDocument) -> Result<Self> {
        let graph = Self::new();
        graph.load_document(doc)?;
        Ok(graph)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let doc: GraphDocument = serde_json::from_str(&raw)?;
        Self::from_document(doc)
    }

    /// Insert every node, then every edge, of `doc`.
    pub fn load_document(&self, doc: GraphDocument) -> Result<()> {
        for node in doc.nodes {
            self.add_node(node.id, node.labels, node.properties)?;
        }
        for edge in doc.edges {
            self.add_edge(Edge {
                edge_id: edge.edge_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                source: edge.source,
                target: edge.target,
                edge_type: edge.edge_type,
                weight: edge.weight,
                properties: edge.properties,
            })?;
        }
        Ok(())
    }

    /// Insert or replace a node. A node must carry at least one label.
    pub fn add_node<I, S>(&self, id: impl Into<NodeId>, labels: I, properties: Option<Value>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = id.into();
        let labels: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(KgError::InvalidInput(format!("node {} has no labels", id)));
        }

        let mut inner = self.write()?;
        if let Some(old) = inner.nodes.remove(&id) {
            for label in &old.labels {
                if let Some(ids) = inner.label_index.get_mut(label) {
                    ids.remove(&id);
                    if ids.is_empty() {
                        inner.label_index.remove(label);
                    }
                }
            }
        }
        for label in &labels {
            inner
                .label_index
                .entry(label.clone())
                .or_default()
                .insert(id.clone());
        }
        inner.adjacency.entry(id.clone()).or_default();
        inner.nodes.insert(id, NodeRecord { labels, properties });
        Ok(())
    }

    /// Insert an edge between two existing, distinct nodes. A later edge for
    /// the same unordered pair replaces the earlier one.
    pub fn add_edge(&self, edge: Edge) -> Result<()> {
        if edge.source == edge.target {
            return Err(KgError::InvalidInput(format!(
                "self-loop on {} is not supported",
                edge.source
            )));
        }

        let mut inner = self.write()?;
        for endpoint in [&edge.source, &edge.target] {
            if !inner.nodes.contains_key(endpoint) {
                return Err(KgError::InvalidInput(format!(
                    "edge {} references unknown node {}",
                    edge.edge_id, endpoint
                )));
            }
        }

        inner
            .adjacency
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        inner
            .adjacency
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        let (a, b) = edge.key();
        let key = (a.to_string(), b.to_string());
        inner.edges.insert(key, edge);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.read().map(|inner| inner.nodes.len()).unwrap_or(0)
    }

    pub fn edge_count(&self) -> usize {
        self.read().map(|inner| inner.edges.len()).unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| KgError::StoreUnavailable("in-memory graph lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| KgError::StoreUnavailable("in-memory graph lock poisoned".to_string()))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraph {
    async fn list_all_labels(&self) -> Result<Vec<String>> {
        Ok(self.read()?.label_index.keys().cloned().collect())
    }

    async fn find_nodes_by_label(&self, predicate: LabelPredicate<'_>) -> Result<Option<Vec<NodeId>>> {
        if !self.indexed {
            return Ok(None);
        }
        let inner = self.read()?;
        let ids: BTreeSet<NodeId> = inner
            .label_index
            .iter()
            .filter(|(label, _)| predicate(label.as_str()))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect();
        Ok(Some(ids.into_iter().collect()))
    }

    async fn enumerate_all_nodes(&self) -> Result<Vec<(NodeId, BTreeSet<String>)>> {
        Ok(self
            .read()?
            .nodes
            .iter()
            .map(|(id, record)| (id.clone(), record.labels.clone()))
            .collect())
    }

    async fn neighbors_of(&self, node_id: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .read()?
            .adjacency
            .get(node_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn degree_of(&self, node_id: &str) -> Result<usize> {
        Ok(self.read()?.adjacency.get(node_id).map_or(0, BTreeSet::len))
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        let inner = self.read()?;
        Ok(inner.nodes.get(node_id).map(|record| Node {
            id: node_id.to_string(),
            labels: record.labels.clone(),
            degree: inner.adjacency.get(node_id).map_or(0, BTreeSet::len),
            properties: record.properties.clone(),
        }))
    }

    async fn edge_between(&self, a: &str, b: &str) -> Result<Option<Edge>> {
        let key = if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        };
        Ok(self.read()?.edges.get(&key).cloned())
    }
}
