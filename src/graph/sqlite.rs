//! SQLite-backed graph store over the `graph_nodes`, `node_labels`, and
//! `graph_edges` tables.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use super::store::{GraphStore, LabelPredicate};
use super::{Edge, Node, NodeId};
use crate::db::Db;
use crate::Result;

/// Labels per `IN (...)` lookup, well under SQLite's bound-parameter limit.
const LABEL_CHUNK: usize = 500;

const NEIGHBORS_SQL: &str = "SELECT target_id FROM graph_edges WHERE source_id = ?1 AND target_id <> ?1 \
     UNION \
     SELECT source_id FROM graph_edges WHERE target_id = ?1 AND source_id <> ?1";

/// Read-only graph store on a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    db: Db,
}

impl SqliteGraphStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn parse_properties(raw: Option<String>) -> Result<Option<Value>> {
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

fn count_neighbors(conn: &Connection, node_id: &str) -> Result<usize> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM ({})", NEIGHBORS_SQL),
        [node_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn list_all_labels(&self) -> Result<Vec<String>> {
        self.db
            .with_read_connection(|conn| {
                let mut stmt = conn.prepare("SELECT DISTINCT label FROM node_labels ORDER BY label")?;
                let labels = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(labels)
            })
            .await
    }

    async fn find_nodes_by_label(&self, predicate: LabelPredicate<'_>) -> Result<Option<Vec<NodeId>>> {
        let matched: Vec<String> = self
            .list_all_labels()
            .await?
            .into_iter()
            .filter(|label| predicate(label.as_str()))
            .collect();
        if matched.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let ids = self
            .db
            .with_read_connection(move |conn| {
                let mut ids = BTreeSet::new();
                for chunk in matched.chunks(LABEL_CHUNK) {
                    let placeholders = chunk.iter().map(|_| "?").collect::<Vec<_>>().join(",");
                    let query = format!(
                        "SELECT DISTINCT node_id FROM node_labels WHERE label IN ({})",
                        placeholders
                    );
                    let mut stmt = conn.prepare(&query)?;
                    let rows = stmt.query_map(rusqlite::params_from_iter(chunk.iter()), |row| {
                        row.get::<_, String>(0)
                    })?;
                    for row in rows {
                        ids.insert(row?);
                    }
                }
                Ok(ids)
            })
            .await?;

        Ok(Some(ids.into_iter().collect()))
    }

    async fn enumerate_all_nodes(&self) -> Result<Vec<(NodeId, BTreeSet<String>)>> {
        self.db
            .with_read_connection(|conn| {
                let mut stmt = conn.prepare("SELECT node_id, label FROM node_labels ORDER BY node_id, label")?;
                let rows = stmt.query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?;
                let mut nodes: BTreeMap<NodeId, BTreeSet<String>> = BTreeMap::new();
                for row in rows {
                    let (id, label) = row?;
                    nodes.entry(id).or_default().insert(label);
                }
                Ok(nodes.into_iter().collect())
            })
            .await
    }

    async fn neighbors_of(&self, node_id: &str) -> Result<Vec<NodeId>> {
        let node_id = node_id.to_string();
        self.db
            .with_read_connection(move |conn| {
                let mut stmt = conn.prepare(&format!("{} ORDER BY 1", NEIGHBORS_SQL))?;
                let neighbors = stmt
                    .query_map([&node_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
                Ok(neighbors)
            })
            .await
    }

    async fn degree_of(&self, node_id: &str) -> Result<usize> {
        let node_id = node_id.to_string();
        self.db
            .with_read_connection(move |conn| count_neighbors(conn, &node_id))
            .await
    }

    async fn get_node(&self, node_id: &str) -> Result<Option<Node>> {
        let node_id = node_id.to_string();
        self.db
            .with_read_connection(move |conn| {
                let properties: Option<Option<String>> = conn
                    .query_row(
                        "SELECT properties_json FROM graph_nodes WHERE node_id = ?1",
                        [&node_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                let Some(properties) = properties else {
                    return Ok(None);
                };

                let mut stmt = conn.prepare("SELECT label FROM node_labels WHERE node_id = ?1 ORDER BY label")?;
                let labels = stmt
                    .query_map([&node_id], |row| row.get::<_, String>(0))?
                    .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;
                let degree = count_neighbors(conn, &node_id)?;

                Ok(Some(Node {
                    id: node_id,
                    labels,
                    degree,
                    properties: parse_properties(properties)?,
                }))
            })
            .await
    }

    async fn edge_between(&self, a: &str, b: &str) -> Result<Option<Edge>> {
        let (a, b) = (a.to_string(), b.to_string());
        self.db
            .with_read_connection(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT edge_id, source_id, target_id, edge_type, weight, properties_json \
                         FROM graph_edges \
                         WHERE (source_id = ?1 AND target_id = ?2) OR (source_id = ?2 AND target_id = ?1) \
                         ORDER BY edge_id LIMIT 1",
                        [&a, &b],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, Option<String>>(3)?,
                                row.get::<_, Option<f64>>(4)?,
                                row.get::<_, Option<String>>(5)?,
                            ))
                        },
                    )
                    .optional()?;

                match row {
                    Some((edge_id, source, target, edge_type, weight, properties)) => Ok(Some(Edge {
                        edge_id,
                        source,
                        target,
                        edge_type,
                        weight,
                        properties: parse_properties(properties)?,
                    })),
                    None => Ok(None),
                }
            })
            .await
    }
}
