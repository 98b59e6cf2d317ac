//! pgchat - Natural-Language Questions Against PostgreSQL
//!
//! pgchat reads connection settings from an INI file, opens one `PostgreSQL`
//! session, and runs a chat in which a hosted language model answers
//! questions by issuing SQL through a single tool.
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - Settings file loading and validation
//! - [`engine`] - Database handle, connection factory and result types
//! - [`query`] - Query normalization and execution
//! - [`agent`] - Reasoning loop trait, SQL tool and the Groq-backed agent
//! - [`session`] - Transcript and turn handling
//! - [`shell`] - Interactive terminal front end
//! - [`output`] - JSON output envelopes for the non-interactive commands

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod query;
pub mod session;
pub mod shell;

// Re-export commonly used types for convenience
pub use agent::{Agent, GroqAgent, SqlQueryTool, ToolDefinition};
pub use config::{load, resolve_connection, SettingsMap, DEFAULT_CONFIG_FILE, DEFAULT_SECTION};
pub use engine::postgres::{connection_descriptor, open_handle, open_raw_connection, Database};
pub use engine::{ConnectionConfig, ConnectionInfo, QueryResult, QueryRunner};
pub use error::{ChatError, Result};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use query::{execute, normalize_query};
pub use session::{ChatSession, Message, Role, TurnOutcome, GREETING};
