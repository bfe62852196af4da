//! SQLite backend for per-tenant document storage.
//!
//! Every tenant index is one SQLite database with two tables that are always
//! written together inside a single transaction:
//! - `documents`: raw text and timestamps per document id (the document store)
//! - `vectors`: embedding and write sequence per document id (the vector index)
//!
//! Submodules:
//! - `embedding`: BLOB conversion and cosine similarity
//! - `vectors`: vector index operations and exact-scan search

pub mod embedding;
pub mod vectors;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::path::Path;

pub use self::vectors::{validate_limit, ScoredDocument, MAX_SEARCH_LIMIT};

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// What a `put` did to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Replaced,
    /// Same content was already stored; nothing was written.
    Unchanged,
}

/// Error types for SQLite operations.
#[derive(Debug)]
pub enum Error {
    Sqlite(String),
    InvalidBlobSize { expected: usize, actual: usize },
    MismatchedDimensions { expected: usize, actual: usize },
    EmptyVector,
    InvalidEmbedding(String),
    InvalidLimit(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Sqlite(msg) => write!(f, "Database error: {}", msg),
            Error::InvalidBlobSize { expected, actual } => {
                write!(
                    f,
                    "Invalid BLOB size: expected {} bytes, got {} bytes",
                    expected, actual
                )
            }
            Error::MismatchedDimensions { expected, actual } => {
                write!(
                    f,
                    "Mismatched dimensions: expected {} dimensions, got {} dimensions",
                    expected, actual
                )
            }
            Error::EmptyVector => write!(f, "Cannot compute similarity with empty vector"),
            Error::InvalidEmbedding(msg) => write!(f, "Invalid embedding: {}", msg),
            Error::InvalidLimit(msg) => write!(f, "Invalid limit: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Sqlite(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One tenant's document store and vector index.
pub struct Database {
    conn: Connection,
    dims: usize,
}

/// Initialize database schema and create necessary tables.
fn create_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
            document_id TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vectors (
            document_id TEXT PRIMARY KEY,
            embedding BLOB NOT NULL,
            write_seq INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_updated ON documents(updated_at);
        "#,
    )?;
    Ok(())
}

/// Record the embedding dimensionality on first open; reject a different one later.
///
/// Safe when two connections open a fresh file at once: the first insert wins
/// and both compare against it.
fn check_dimensions(conn: &Connection, dims: usize) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('dimensions', ?1)",
        [dims.to_string()],
    )?;
    let value: String = conn.query_row(
        "SELECT value FROM index_meta WHERE key = 'dimensions'",
        [],
        |row| row.get(0),
    )?;

    let existing: usize = value
        .parse()
        .map_err(|_| Error::Sqlite(format!("Corrupt index metadata: dimensions = {value}")))?;
    if existing != dims {
        return Err(Error::MismatchedDimensions {
            expected: existing,
            actual: dims,
        });
    }
    Ok(())
}

fn row_to_document(row: &rusqlite::Row<'_>) -> SqliteResult<Document> {
    Ok(Document {
        id: row.get(0)?,
        content: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

impl Database {
    /// Open or create a tenant database at the given path.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened, schema initialization fails,
    /// or the file was built with a different embedding dimensionality.
    pub fn open(path: &Path, dims: usize) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn, dims)
    }

    /// Create a private in-memory tenant database.
    pub fn open_in_memory(dims: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, dims)
    }

    fn init(mut conn: Connection, dims: usize) -> Result<Self> {
        if dims == 0 {
            return Err(Error::EmptyVector);
        }
        create_schema(&mut conn)?;
        check_dimensions(&conn, dims)?;
        Ok(Self { conn, dims })
    }

    /// Insert or fully replace a document and its vector in one transaction.
    ///
    /// Writing content identical to what is stored is a no-op, so the
    /// document keeps its timestamp and its position in recency tie-breaks.
    ///
    /// # Errors
    ///
    /// Returns error if the embedding is malformed or the write fails. On error
    /// nothing is committed.
    pub fn put(&mut self, id: &str, content: &str, embedding: &[f32]) -> Result<WriteOutcome> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT content FROM documents WHERE document_id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        if existing.as_deref() == Some(content) && vectors::contains(&tx, id)? {
            return Ok(WriteOutcome::Unchanged);
        }

        tx.execute(
            r#"
            INSERT INTO documents (document_id, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(document_id) DO UPDATE
                SET content = excluded.content, updated_at = excluded.updated_at
            "#,
            params![id, content, &now],
        )?;
        vectors::upsert(&tx, self.dims, id, embedding)?;
        tx.commit()?;

        Ok(if existing.is_some() {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Inserted
        })
    }

    /// Retrieve a single document by ID.
    ///
    /// Returns None if the document does not exist.
    pub fn get(&self, id: &str) -> Result<Option<Document>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT document_id, content, created_at, updated_at
                FROM documents
                WHERE document_id = ?1
                "#,
                [id],
                row_to_document,
            )
            .optional()?;
        Ok(result)
    }

    /// Whether a document with this ID exists.
    pub fn contains(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM documents WHERE document_id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// List documents, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns error if the limit is invalid or the query fails.
    pub fn list(&self, limit: usize) -> Result<Vec<Document>> {
        validate_limit(limit)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT document_id, content, created_at, updated_at
            FROM documents
            ORDER BY updated_at DESC, document_id ASC
            LIMIT ?1
            "#,
        )?;

        let documents: SqliteResult<Vec<Document>> = stmt
            .query_map([limit as i64], row_to_document)?
            .collect();

        Ok(documents?)
    }

    /// Number of documents in this index.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Remove a document and its vector in one transaction.
    ///
    /// Returns true if a document was removed, false if it didn't exist.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let rows = tx.execute("DELETE FROM documents WHERE document_id = ?1", [id])?;
        if rows == 0 {
            return Ok(false);
        }
        vectors::remove(&tx, id)?;
        tx.commit()?;
        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
