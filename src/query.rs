//! Query Executor
//!
//! Takes free text chosen by the user (directly or through the agent), trims
//! it, and submits it to the session's database handle.
//!
//! No validation or sanitisation happens here beyond trimming: the statement
//! reaches the database verbatim, so whatever the connected role may do, the
//! chat can do. Restrict the role in the settings file if that matters.

use crate::engine::{QueryResult, QueryRunner};
use crate::error::{ChatError, Result};

/// Statement terminator stripped from the end of a query
const TERMINATOR: char = ';';

/// Trim surrounding whitespace and trailing statement terminators
///
/// `"SELECT 1;  "` becomes `"SELECT 1"`. Terminators and whitespace are
/// stripped together, so the result never ends in either and normalizing it
/// again changes nothing.
#[must_use]
pub fn normalize_query(raw: &str) -> &str {
    raw.trim().trim_end_matches(|c: char| c == TERMINATOR || c.is_whitespace())
}

/// Normalize `raw` and run it on `runner`
///
/// # Errors
/// `QueryExecutionFailed` if nothing is left after normalization or the
/// database rejects the statement. The failure only concerns this query.
pub async fn execute<R: QueryRunner>(runner: &R, raw: &str) -> Result<QueryResult> {
    let sql = normalize_query(raw);

    if sql.is_empty() {
        return Err(ChatError::query_failed("Query cannot be empty"));
    }

    tracing::info!(%sql, "executing query");

    match runner.run(sql).await {
        Ok(result) => {
            tracing::debug!(
                rows = result.rows.len(),
                rows_affected = ?result.rows_affected,
                execution_ms = result.execution_ms,
                "query finished"
            );
            Ok(result)
        }
        Err(e) => {
            tracing::warn!(error = %e, "query failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn test_normalize_trailing_terminator_and_whitespace() {
        assert_eq!(normalize_query("SELECT 1;  "), "SELECT 1");
        assert_eq!(normalize_query("  SELECT 1  "), "SELECT 1");
        assert_eq!(normalize_query("SELECT 1;"), "SELECT 1");
        assert_eq!(normalize_query("SELECT 1 ;\n"), "SELECT 1");
        assert_eq!(normalize_query("\tSELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_normalize_keeps_inner_terminators() {
        assert_eq!(normalize_query("SELECT ';' AS semi;"), "SELECT ';' AS semi");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "SELECT 1;  ",
            "SELECT 1;;",
            " ; ",
            "",
            "SELECT 1 ; ; ",
            "UPDATE t SET a = 1",
        ];
        for input in inputs {
            let once = normalize_query(input);
            assert_eq!(normalize_query(once), once, "input: {input:?}");
            assert!(!once.ends_with(';'));
            assert!(!once.ends_with(char::is_whitespace));
        }
    }

    /// Records what reaches the database
    struct Recorder {
        seen: RefCell<Vec<String>>,
        fail: bool,
    }

    impl QueryRunner for Recorder {
        async fn run(&self, sql: &str) -> Result<QueryResult> {
            self.seen.borrow_mut().push(sql.to_string());
            if self.fail {
                Err(ChatError::query_failed("relation \"nope\" does not exist"))
            } else {
                Ok(QueryResult {
                    rows_affected: Some(0),
                    ..QueryResult::default()
                })
            }
        }
    }

    #[tokio::test]
    async fn test_execute_submits_normalized_text() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
            fail: false,
        };
        execute(&recorder, "SELECT 1;  ").await.unwrap();
        assert_eq!(*recorder.seen.borrow(), vec!["SELECT 1".to_string()]);
    }

    #[tokio::test]
    async fn test_execute_empty_query_never_reaches_database() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
            fail: false,
        };
        let err = execute(&recorder, "  ;  ").await.unwrap_err();
        assert!(matches!(err, ChatError::QueryExecutionFailed(_)));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_execute_propagates_database_error() {
        let recorder = Recorder {
            seen: RefCell::new(Vec::new()),
            fail: true,
        };
        let err = execute(&recorder, "SELECT * FROM nope").await.unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.message().contains("does not exist"));
    }
}
