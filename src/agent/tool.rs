//! The agent's single tool: run SQL against the session database
//!
//! A failed query does not abort the turn. The error is kept for the shell
//! to display and the model sees `None` as the observation, the same as a
//! query that produced nothing.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::engine::QueryRunner;
use crate::error::ChatError;
use crate::query;

/// Name the model uses to call the tool
pub const TOOL_NAME: &str = "sql_db_query";

/// Description shown to the model
pub const TOOL_DESCRIPTION: &str = "Use this to query the database. \
    Input is a single PostgreSQL statement; the output is the result rows, \
    or None if the statement failed or returned nothing.";

/// Observation returned to the model for a failed query
pub const NO_RESULT: &str = "None";

/// Arguments of a tool call
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SqlQueryArgs {
    /// A single PostgreSQL statement to execute
    pub query: String,
}

/// Function-style tool definition (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Definition of the SQL query tool
    #[must_use]
    pub fn sql_query() -> Self {
        let mut parameters = serde_json::to_value(schemars::schema_for!(SqlQueryArgs))
            .unwrap_or_else(|_| {
                serde_json::json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                })
            });

        // Model APIs want a bare object schema
        if let Some(object) = parameters.as_object_mut() {
            object.remove("$schema");
            object.remove("title");
        }

        Self {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            parameters,
        }
    }
}

/// SQL tool bound to one session's database handle
pub struct SqlQueryTool<'a, R> {
    runner: &'a R,
    failures: RefCell<Vec<ChatError>>,
}

impl<'a, R: QueryRunner> SqlQueryTool<'a, R> {
    /// Bind the tool to `runner`
    pub fn new(runner: &'a R) -> Self {
        Self {
            runner,
            failures: RefCell::new(Vec::new()),
        }
    }

    /// Run a tool call and return the observation for the model
    ///
    /// `arguments` is the JSON arguments object sent by the model. Models
    /// occasionally send the bare statement instead, which is accepted as is.
    pub async fn call(&self, arguments: &str) -> String {
        let sql = match serde_json::from_str::<SqlQueryArgs>(arguments) {
            Ok(args) => args.query,
            Err(_) => arguments.to_string(),
        };

        match query::execute(self.runner, &sql).await {
            Ok(result) => result.to_text(),
            Err(e) => {
                self.failures.borrow_mut().push(e);
                NO_RESULT.to_string()
            }
        }
    }

    /// Drain the query failures recorded since the last call
    pub fn take_failures(&self) -> Vec<ChatError> {
        self.failures.take()
    }
}
