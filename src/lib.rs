pub mod config;
pub mod error;
pub mod db;
pub mod graph;

pub use config::Config;
pub use error::{KgError, Result};
pub use graph::{
    Edge, GraphQuery, GraphSettings, GraphStore, InMemoryGraph, KnowledgeGraphService, Node,
    SqliteGraphStore, Subgraph,
};
