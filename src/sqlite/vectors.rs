//! Vector index: per-document embeddings and exact-scan similarity search.

use rusqlite::{params, Connection, OptionalExtension};

use super::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use super::{Database, Error};

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum allowed limit for search and list operations.
pub const MAX_SEARCH_LIMIT: usize = 10_000;

/// Validate search limit is within acceptable bounds.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(Error::InvalidLimit(
            "Limit must be greater than 0".to_string(),
        ));
    }
    if limit > MAX_SEARCH_LIMIT {
        return Err(Error::InvalidLimit(format!(
            "Limit {} exceeds maximum allowed ({})",
            limit, MAX_SEARCH_LIMIT
        )));
    }
    Ok(())
}

/// A document id ranked against a query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document_id: String,
    /// Cosine similarity, higher = more similar.
    pub score: f64,
    /// Per-index write counter of the vector; larger = written more recently.
    pub write_seq: i64,
}

/// Insert or replace the vector for `id`, stamping it with the next write sequence.
pub(super) fn upsert(conn: &Connection, dims: usize, id: &str, vector: &[f32]) -> Result<()> {
    let blob = vec_to_blob(vector, dims)?;
    let next_seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(write_seq), 0) + 1 FROM vectors",
        [],
        |row| row.get(0),
    )?;

    conn.execute(
        r#"
        INSERT INTO vectors (document_id, embedding, write_seq)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(document_id) DO UPDATE
            SET embedding = excluded.embedding, write_seq = excluded.write_seq
        "#,
        params![id, &blob, next_seq],
    )?;
    Ok(())
}

/// Remove the vector for `id`. Absent ids are a no-op.
pub(super) fn remove(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM vectors WHERE document_id = ?1", [id])?;
    Ok(rows > 0)
}

/// Whether `id` has a stored vector.
pub(crate) fn contains(conn: &Connection, id: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM vectors WHERE document_id = ?1",
            [id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

impl Database {
    /// Rank every stored vector against `query` and return the top `k`.
    ///
    /// Results are sorted by score (highest first); equal scores put the most
    /// recently written document first.
    ///
    /// # Errors
    ///
    /// Returns error if `k` is out of range, the query has the wrong
    /// dimensionality, or the database query fails.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        validate_limit(k)?;
        if query.len() != self.dims {
            return Err(Error::MismatchedDimensions {
                expected: self.dims,
                actual: query.len(),
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT document_id, embedding, write_seq FROM vectors")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut scored = Vec::new();
        for row_result in rows {
            let (document_id, blob, write_seq) = row_result?;
            let stored = blob_to_vec(&blob, self.dims)?;
            scored.push(ScoredDocument {
                document_id,
                score: cosine_similarity(query, &stored)?,
                write_seq,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.write_seq.cmp(&a.write_seq))
        });

        scored.truncate(k);
        Ok(scored)
    }

    /// Similarity of `query` against exactly one document's vector.
    ///
    /// Only the named row is read, so no other document takes part.
    /// Returns None if the document has no vector.
    pub fn score(&self, id: &str, query: &[f32]) -> Result<Option<f64>> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT embedding FROM vectors WHERE document_id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(blob) => {
                let stored = blob_to_vec(&blob, self.dims)?;
                Ok(Some(cosine_similarity(query, &stored)?))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_db() -> Database {
        Database::open_in_memory(3).unwrap()
    }

    /// Reference oracle: plain scan without tie-breaking.
    fn oracle(db: &Database, query: &[f32]) -> Vec<(String, f64)> {
        let mut stmt = db
            .conn()
            .prepare("SELECT document_id, embedding FROM vectors")
            .unwrap();
        let mut all: Vec<(String, f64)> = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .unwrap()
            .map(|r| {
                let (id, blob) = r.unwrap();
                let v = blob_to_vec(&blob, 3).unwrap();
                (id, cosine_similarity(query, &v).unwrap())
            })
            .collect();
        all.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        all
    }

    #[test]
    fn test_validate_limit_zero() {
        assert!(validate_limit(0).is_err());
    }

    #[test]
    fn test_validate_limit_too_large() {
        assert!(validate_limit(MAX_SEARCH_LIMIT + 1).is_err());
    }

    #[test]
    fn test_validate_limit_valid() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(MAX_SEARCH_LIMIT).is_ok());
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let mut db = create_test_db();
        db.put("x", "x axis", &[1.0, 0.0, 0.0]).unwrap();
        db.put("y", "y axis", &[0.0, 1.0, 0.0]).unwrap();
        db.put("xy", "diagonal", &[1.0, 1.0, 0.0]).unwrap();

        let results = db.search(&[1.0, 0.2, 0.0], 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_matches_oracle_scores() {
        let mut db = create_test_db();
        db.put("a", "a", &[0.3, 0.9, 0.1]).unwrap();
        db.put("b", "b", &[0.8, -0.2, 0.5]).unwrap();
        db.put("c", "c", &[-0.4, 0.4, 0.9]).unwrap();
        let query = [0.5, 0.5, 0.1];

        let results = db.search(&query, 3).unwrap();
        let expected = oracle(&db, &query);
        assert_eq!(results.len(), expected.len());
        for (got, (id, score)) in results.iter().zip(expected.iter()) {
            assert_eq!(&got.document_id, id);
            assert!((got.score - score).abs() < 1e-9);
        }
    }

    #[test]
    fn test_search_truncates_to_k() {
        let mut db = create_test_db();
        for i in 0..5 {
            db.put(&format!("d{i}"), &format!("doc {i}"), &[1.0, i as f32, 0.0])
                .unwrap();
        }
        assert_eq!(db.search(&[1.0, 0.0, 0.0], 2).unwrap().len(), 2);
    }

    #[test]
    fn test_search_ties_most_recent_write_first() {
        let mut db = create_test_db();
        db.put("older", "one", &[1.0, 0.0, 0.0]).unwrap();
        db.put("newer", "two", &[2.0, 0.0, 0.0]).unwrap();

        let results = db.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].document_id, "newer");
        assert_eq!(results[1].document_id, "older");

        // Rewriting the older one moves it ahead.
        db.put("older", "one again", &[3.0, 0.0, 0.0]).unwrap();
        let results = db.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results[0].document_id, "older");
    }

    #[test]
    fn test_search_empty_index() {
        let db = create_test_db();
        assert!(db.search(&[1.0, 0.0, 0.0], 1).unwrap().is_empty());
    }

    #[test]
    fn test_search_wrong_query_dimensions() {
        let db = create_test_db();
        assert!(matches!(
            db.search(&[1.0, 0.0], 1),
            Err(Error::MismatchedDimensions { .. })
        ));
    }

    #[test]
    fn test_search_zero_k_rejected() {
        let db = create_test_db();
        assert!(matches!(
            db.search(&[1.0, 0.0, 0.0], 0),
            Err(Error::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_score_single_document() {
        let mut db = create_test_db();
        db.put("x", "x", &[1.0, 0.0, 0.0]).unwrap();
        db.put("y", "y", &[0.0, 1.0, 0.0]).unwrap();

        let score = db.score("x", &[1.0, 0.0, 0.0]).unwrap().unwrap();
        assert!((score - 1.0).abs() < 1e-9);
        assert!(db.score("missing", &[1.0, 0.0, 0.0]).unwrap().is_none());
    }

    #[test]
    fn test_remove_absent_vector_is_noop() {
        let db = create_test_db();
        assert!(!remove(db.conn(), "missing").unwrap());
    }
}
