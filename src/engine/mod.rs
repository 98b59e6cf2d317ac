//! Database Engine Traits and Core Types
//!
//! This module defines the core abstractions between the chat session and the
//! database. The `PostgreSQL` implementation lives in [`postgres`].
//!
//! # Handle Lifetime
//! Unlike a stateless per-call design, a single [`postgres::Database`] handle
//! is opened at startup and reused for every query of the session.
//! Anything that can run SQL implements [`QueryRunner`], which keeps the
//! query executor and the agent tool testable without a live server.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::Result;

pub mod postgres;

/// Connection configuration for `PostgreSQL`
///
/// Built from the settings file by [`crate::config::resolve_connection`].
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Hostname or IP address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Username
    pub user: String,

    /// Password
    /// WARNING: Sensitive data, do not log or include in error messages
    pub password: String,

    /// Database name
    pub database: String,
}

impl ConnectionConfig {
    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            host,
            port,
            user,
            password,
            database,
        }
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// Connection information reported by a live server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Database server version string
    pub database_version: String,

    /// Full server version banner
    pub server_info: String,

    /// Name of the connected database
    pub connected_database: String,

    /// Connected user name
    pub user: String,
}

/// Query execution result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names in result set
    pub columns: Vec<String>,

    /// Result rows (each row is a list of values in column order)
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows affected (for INSERT/UPDATE/DELETE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,

    /// Execution time in milliseconds
    #[serde(default)]
    pub execution_ms: u64,
}

impl QueryResult {
    /// Render the result as compact text for the reasoning loop
    ///
    /// Row-returning statements render as a list of tuples, e.g.
    /// `[(1, 'Alice'), (2, 'Bob')]`. An empty result renders as an empty
    /// string, and other statements report the affected row count.
    #[must_use]
    pub fn to_text(&self) -> String {
        if self.columns.is_empty() {
            return match self.rows_affected {
                Some(n) => format!("{n} row(s) affected"),
                None => String::new(),
            };
        }

        if self.rows.is_empty() {
            return String::new();
        }

        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let values: Vec<String> = row.iter().map(render_value).collect();
                if values.len() == 1 {
                    format!("({},)", values[0])
                } else {
                    format!("({})", values.join(", "))
                }
            })
            .collect();

        format!("[{}]", rows.join(", "))
    }
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "None".to_string(),
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
        other => other.to_string(),
    }
}

/// Anything that can execute a normalized SQL string
///
/// Implemented by [`postgres::Database`] and by in-memory fakes in tests.
pub trait QueryRunner {
    /// Execute `sql` and collect its result
    ///
    /// The statement is submitted as-is; normalization happens in
    /// [`crate::query::execute`].
    fn run(&self, sql: &str) -> impl Future<Output = Result<QueryResult>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_connection_config_debug_redacts_password() {
        let config = ConnectionConfig::postgres(
            "localhost".to_string(),
            5432,
            "user".to_string(),
            "hunter2".to_string(),
            "db".to_string(),
        );
        let debug = format!("{config:?}");
        assert!(debug.contains("localhost"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_to_text_rows() {
        let result = QueryResult {
            columns: vec!["id".to_string(), "name".to_string(), "active".to_string()],
            rows: vec![
                vec![json!(1), json!("Alice"), json!(true)],
                vec![json!(2), json!("O'Brien"), json!(null)],
            ],
            rows_affected: None,
            execution_ms: 3,
        };
        assert_eq!(result.to_text(), "[(1, 'Alice', True), (2, 'O\\'Brien', None)]");
    }

    #[test]
    fn test_to_text_single_column() {
        let result = QueryResult {
            columns: vec!["count".to_string()],
            rows: vec![vec![json!(42)]],
            ..QueryResult::default()
        };
        assert_eq!(result.to_text(), "[(42,)]");
    }

    #[test]
    fn test_to_text_empty_and_affected() {
        let empty = QueryResult {
            columns: vec!["id".to_string()],
            ..QueryResult::default()
        };
        assert_eq!(empty.to_text(), "");

        let update = QueryResult {
            rows_affected: Some(3),
            ..QueryResult::default()
        };
        assert_eq!(update.to_text(), "3 row(s) affected");
    }

    #[test]
    fn test_query_result_serialization_omits_missing_rows_affected() {
        let result = QueryResult {
            columns: vec!["a".to_string()],
            ..QueryResult::default()
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("rows_affected"));
        assert!(json.contains(r#""execution_ms":0"#));
    }
}
