use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kgquery::db::{migrate, Db};
use kgquery::error::KgError;
use kgquery::{Config, GraphQuery, GraphStore, InMemoryGraph, KnowledgeGraphService, SqliteGraphStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "kgquery")]
#[command(about = "Query labels and bounded subgraphs of a knowledge graph")]
struct Args {
    /// Load the graph from a JSON document instead of the configured database
    #[arg(long, global = true)]
    graph: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every label in the graph
    Labels,
    /// Extract the subgraph around a label
    Graph {
        /// Label to match
        label: String,
        /// Maximum hops from a matching node
        #[arg(long)]
        max_depth: Option<i64>,
        /// Match labels by substring instead of equality
        #[arg(long)]
        inclusive: bool,
        /// Drop non-matching nodes with fewer neighbors than this
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        min_degree: i64,
    },
    /// Apply pending migrations to the configured database
    Migrate,
    /// Check that the configured database has the graph schema
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A JSON graph needs no database, so its config file is optional
    let config = match (&args.graph, &args.command) {
        (Some(_), Command::Labels | Command::Graph { .. }) => Config::load_or_default()?,
        _ => Config::load()?,
    };

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.log_level())
    ).init();

    match args.command {
        Command::Labels => {
            let service = build_service(args.graph.as_deref(), &config)?;
            let labels = service.get_graph_labels().await?;
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
        Command::Graph { label, max_depth, inclusive, min_degree } => {
            let service = build_service(args.graph.as_deref(), &config)?;
            let query = GraphQuery::new(label)
                .max_depth(max_depth.unwrap_or(config.graph.default_max_depth))
                .inclusive(inclusive)
                .min_degree(min_degree);
            log::info!(
                "Inclusive search: {}, Min degree: {}, Max depth: {}, Label: {}",
                query.inclusive,
                query.min_degree,
                query.max_depth,
                query.label
            );

            let subgraph = service.get_knowledge_graph(&query).await?;
            if subgraph.degraded {
                log::warn!("Traversal hit the visited-node cap; result may be structurally incomplete");
            }
            log::info!(
                "Returning {} nodes and {} edges (truncated: {})",
                subgraph.nodes.len(),
                subgraph.edges.len(),
                subgraph.is_truncated
            );
            println!("{}", serde_json::to_string_pretty(&subgraph)?);
        }
        Command::Migrate => {
            let db = Db::new(config.db_path());
            let migrations_dir = Path::new("migrations");
            db.with_connection(|conn| migrate::run_migrations(conn, migrations_dir)).await?;
            log::info!("Database initialized at {}", config.db_path().display());
        }
        Command::Verify => {
            verify_database_schema(&Db::new(config.db_path())).await?;
        }
    }

    Ok(())
}

/// Build the query service over the selected backend.
fn build_service(graph_file: Option<&Path>, config: &Config) -> Result<KnowledgeGraphService> {
    let store: Arc<dyn GraphStore> = match graph_file {
        Some(path) => {
            let graph = InMemoryGraph::from_json_file(path)
                .with_context(|| format!("Failed to load graph document: {}", path.display()))?;
            log::info!(
                "Loaded {} nodes and {} edges from {}",
                graph.node_count(),
                graph.edge_count(),
                path.display()
            );
            Arc::new(graph)
        }
        None => {
            log::info!("Database path: {}", config.db_path().display());
            Arc::new(SqliteGraphStore::new(Db::new(config.db_path())))
        }
    };

    let settings = config.graph_settings();
    log::debug!("Graph settings: {:?}", settings);

    Ok(KnowledgeGraphService::new(store, settings))
}

/// Verify that the graph tables, indexes, and pragmas are in place
async fn verify_database_schema(db: &Db) -> Result<()> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        for table in ["graph_nodes", "node_labels", "graph_edges", "schema_migrations"] {
            if !tables.iter().any(|t| t == table) {
                return Err(KgError::Config(format!("Missing table: {} (run `kgquery migrate`)", table)));
            }
            log::debug!("✓ Table exists: {}", table);
        }

        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name")?;
        let indexes: Vec<String> = stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for index_name in ["idx_node_labels_label", "idx_graph_edges_source", "idx_graph_edges_target"] {
            if indexes.iter().any(|i| i == index_name) {
                log::debug!("✓ Index exists: {}", index_name);
            } else {
                log::warn!("Index not found: {}; neighbor and label lookups will scan", index_name);
            }
        }

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(KgError::Config(format!("Journal mode is not WAL: {}", journal_mode)));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(KgError::Config(format!("Database integrity check failed: {}", integrity)));
        }
        log::info!("✓ Database integrity: OK");

        Ok(())
    }).await?;

    log::info!("✓ Database schema verification complete");
    Ok(())
}
