//! Chat Session
//!
//! A [`ChatSession`] owns everything one conversation needs: the database
//! handle, the agent, and the ordered message transcript. It is created once
//! the handle is open, so a session never exists without a database.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, SqlQueryTool};
use crate::engine::QueryRunner;
use crate::error::ChatError;

/// First message of every transcript
pub const GREETING: &str = "How can I help you?";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// What one turn produced
#[derive(Debug, Default)]
pub struct TurnOutcome {
    /// The assistant's answer, absent if the agent failed
    pub reply: Option<String>,

    /// Non-fatal errors to show inline, in the order they happened
    pub errors: Vec<ChatError>,
}

/// One interactive conversation over one database handle
pub struct ChatSession<R, A> {
    runner: R,
    agent: A,
    messages: Vec<Message>,
}

impl<R: QueryRunner, A: Agent> ChatSession<R, A> {
    /// Start a session with the greeting as its only message
    pub fn new(runner: R, agent: A) -> Self {
        Self {
            runner,
            agent,
            messages: vec![Message::assistant(GREETING)],
        }
    }

    /// Transcript in order
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Database handle of this session
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Discard the transcript and start over from the greeting
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(Message::assistant(GREETING));
        tracing::info!("message history cleared");
    }

    /// Process one user message
    ///
    /// The user message is always recorded. The answer is recorded only when
    /// the agent produced one; query and agent failures come back in
    /// [`TurnOutcome::errors`] and leave the session usable.
    pub async fn submit(&mut self, text: &str) -> TurnOutcome {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutcome::default();
        }

        self.messages.push(Message::user(text));

        let tool = SqlQueryTool::new(&self.runner);
        let history = &self.messages[..self.messages.len() - 1];
        let answer = self.agent.respond(history, text, &tool).await;
        let mut errors = tool.take_failures();

        match answer {
            Ok(reply) => {
                self.messages.push(Message::assistant(reply.clone()));
                TurnOutcome {
                    reply: Some(reply),
                    errors,
                }
            }
            Err(e) => {
                let e = match e {
                    ChatError::AgentTurnFailed(_) => e,
                    other => ChatError::agent_failed(other.to_string()),
                };
                tracing::warn!(error = %e, "turn failed");
                errors.push(e);
                TurnOutcome {
                    reply: None,
                    errors,
                }
            }
        }
    }
}
