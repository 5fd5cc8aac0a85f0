use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tokio::task;
use crate::error::{Result, KgError};

/// WAL for concurrent readers, NORMAL sync, FK enforcement,
/// in-memory temp storage, 64MB page cache, 256MB mmap.
const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL; \
     PRAGMA synchronous = NORMAL; \
     PRAGMA foreign_keys = ON; \
     PRAGMA temp_store = MEMORY; \
     PRAGMA cache_size = -65536; \
     PRAGMA mmap_size = 268435456;";

/// Read path: no journal-mode switch (that is a write), writes refused.
const READ_PRAGMAS: &str = "PRAGMA query_only = ON; \
     PRAGMA temp_store = MEMORY; \
     PRAGMA cache_size = -65536; \
     PRAGMA mmap_size = 268435456;";

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct Db {
    path: std::path::PathBuf,
}

impl Db {
    /// Create a new database connection manager
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a new database connection with the standard pragmas
    pub fn open_connection(&self) -> Result<Connection> {
        open(&self.path)
    }

    /// Execute a closure with a fresh connection in a blocking task
    pub async fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let mut conn = open(&path)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| KgError::StoreUnavailable(format!("database task failed: {}", e)))?
    }

    /// Like `with_connection`, but on a query-only connection to an existing
    /// database. A missing database file is an error rather than created.
    pub async fn with_read_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        task::spawn_blocking(move || {
            let conn = open_read(&path)?;
            f(&conn)
        })
        .await
        .map_err(|e| KgError::StoreUnavailable(format!("database task failed: {}", e)))?
    }
}

fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(CONNECTION_PRAGMAS)?;
    Ok(conn)
}

fn open_read(path: &Path) -> Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags)?;
    conn.execute_batch(READ_PRAGMAS)?;
    Ok(conn)
}

pub mod migrate;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_db_connection() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Db::new(&db_path);

        let result = db.with_connection(|conn| {
            conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", [])?;
            Ok(())
        }).await;

        assert!(result.is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_pragmas_set() {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));

        db.with_connection(|conn| {
            let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
            assert_eq!(journal_mode.to_uppercase(), "WAL");

            let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
            assert_eq!(foreign_keys, 1);

            Ok::<(), KgError>(())
        }).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_connection_leaves_database_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("plain.db");
        {
            let conn = Connection::open(&db_path).unwrap();
            conn.execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1);").unwrap();
        }
        let db = Db::new(&db_path);

        let (journal_mode, count) = db
            .with_read_connection(|conn| {
                let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))?;
                Ok((journal_mode, count))
            })
            .await
            .unwrap();
        assert_eq!(journal_mode.to_uppercase(), "DELETE");
        assert_eq!(count, 1);

        let write = db
            .with_read_connection(|conn| {
                conn.execute("INSERT INTO t VALUES (2)", [])?;
                Ok(())
            })
            .await;
        assert!(matches!(write, Err(KgError::Database(_))));
    }

    #[tokio::test]
    async fn test_read_connection_does_not_create_file() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("absent.db");
        let result = Db::new(&db_path).with_read_connection(|_| Ok(())).await;
        assert!(matches!(result, Err(KgError::Database(_))));
        assert!(!db_path.exists());
    }

    #[tokio::test]
    async fn test_open_connection_sync() {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("sync.db"));
        let conn = db.open_connection().unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
}
