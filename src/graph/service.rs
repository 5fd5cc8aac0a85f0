//! Request-facing query service.

use std::sync::Arc;

use super::assemble::assemble;
use super::matcher::LabelMatcher;
use super::priority::prioritize;
use super::seeds::select_seeds;
use super::store::GraphStore;
use super::traversal::{expand, Deadline, TraversalLimits};
use super::{GraphQuery, GraphSettings, Subgraph, ValidQuery};
use crate::{KgError, Result};

/// Answers label listing and bounded subgraph queries against one store.
///
/// Holds no per-query state; clone freely and share across tasks.
#[derive(Clone)]
pub struct KnowledgeGraphService {
    store: Arc<dyn GraphStore>,
    settings: GraphSettings,
    matcher: LabelMatcher,
}

impl KnowledgeGraphService {
    pub fn new(store: Arc<dyn GraphStore>, settings: GraphSettings) -> Self {
        let matcher = LabelMatcher::new(settings.case_sensitive);
        Self {
            store,
            settings,
            matcher,
        }
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Every distinct label in the store, sorted.
    pub async fn get_graph_labels(&self) -> Result<Vec<String>> {
        self.store
            .list_all_labels()
            .await
            .map_err(KgError::into_store_error)
    }

    /// Extract the bounded, priority-ordered subgraph around `query.label`.
    ///
    /// All-or-nothing: any store failure fails the whole query.
    pub async fn get_knowledge_graph(&self, query: &GraphQuery) -> Result<Subgraph> {
        let query = query.validate()?;
        self.run_pipeline(&query)
            .await
            .map_err(KgError::into_store_error)
    }

    async fn run_pipeline(&self, query: &ValidQuery) -> Result<Subgraph> {
        let store = self.store.as_ref();
        let budget = self.settings.node_budget;
        let limits = TraversalLimits {
            budget,
            min_degree: query.min_degree,
            max_visited: self.settings.max_visited_nodes.max(budget),
            deadline: self.settings.max_latency_ms.map(Deadline::after_ms),
        };

        let seeds = select_seeds(store, &self.matcher, &query.label, query.inclusive).await?;
        if seeds.is_empty() {
            log::debug!("No nodes match label {:?}", query.label);
            return Ok(Subgraph::default());
        }

        let traversal = expand(store, &seeds, query.max_depth, &limits).await?;
        let ranked = prioritize(&traversal, query.min_degree);
        let mut subgraph = assemble(store, &ranked, budget, limits.deadline.as_ref()).await?;

        subgraph.is_truncated |= traversal.stopped_early;
        subgraph.degraded = traversal.degraded;

        log::debug!(
            "Subgraph for {:?}: {} seeds, {} visited, {} nodes, {} edges (truncated: {}, degraded: {})",
            query.label,
            seeds.len(),
            traversal.visited.len(),
            subgraph.nodes.len(),
            subgraph.edges.len(),
            subgraph.is_truncated,
            subgraph.degraded
        );
        Ok(subgraph)
    }
}
