//! Reasoning Loop
//!
//! The agent turns one user message into zero or more SQL tool calls and a
//! final answer. The session only sees the [`Agent`] trait, so the hosted
//! model can be swapped for a scripted one in tests.
//!
//! - [`tool`] - The single SQL tool handed to the agent
//! - [`groq`] - Tool-calling loop over Groq's chat-completions API

use std::future::Future;

use crate::engine::QueryRunner;
use crate::error::Result;
use crate::session::Message;

pub mod groq;
pub mod tool;

pub use groq::GroqAgent;
pub use tool::{SqlQueryTool, ToolDefinition};

/// System prompt shared by model-backed agents
pub const SYSTEM_PROMPT: &str = "You are an agent designed to interact with a PostgreSQL database. \
Given an input question, create a syntactically correct PostgreSQL query, run it with the \
sql_db_query tool, look at the results and answer the question. \
Unless the user asks for a specific number of rows, limit queries to at most 10 results. \
Only ask for the columns relevant to the question. \
If the tool returns None, the query failed or returned nothing: rewrite it and try again, \
or explain that the data is not available. \
If the question does not concern the database, answer it directly without calling the tool.";

/// A reasoning loop that answers one user turn
pub trait Agent {
    /// Produce the assistant's answer to `user_text`
    ///
    /// `transcript` holds the earlier messages of the session (without
    /// `user_text`). The agent may call `tool` any number of times.
    ///
    /// # Errors
    /// `AgentTurnFailed` when no answer could be produced.
    fn respond<R: QueryRunner>(
        &self,
        transcript: &[Message],
        user_text: &str,
        tool: &SqlQueryTool<'_, R>,
    ) -> impl Future<Output = Result<String>>;
}
