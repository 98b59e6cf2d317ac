//! Groq-hosted agent
//!
//! Talks to Groq's OpenAI-compatible `/chat/completions` endpoint with
//! function calling. Each round trip either asks for tool calls, which are
//! executed and fed back as `tool` messages, or returns the final answer.

use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};

use super::tool::{SqlQueryTool, ToolDefinition, TOOL_NAME};
use super::{Agent, SYSTEM_PROMPT};
use crate::engine::QueryRunner;
use crate::error::{ChatError, Result};
use crate::session::{Message, Role};

/// Groq's OpenAI-compatible API root
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Round trips allowed per turn before giving up
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// Chat message on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: &str, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self::text(role, &message.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDefinition,
}

/// Some OpenAI-compatible servers send `"tool_calls": null`
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    tools: &'a [WireTool<'a>],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

/// Agent backed by a Groq-hosted model
pub struct GroqAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_iterations: usize,
}

impl GroqAgent {
    /// Create an agent for `model` authenticated with `api_key`
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GROQ_BASE_URL.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Point at another OpenAI-compatible endpoint
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Change the round-trip limit per turn
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn complete(
        &self,
        messages: &[WireMessage],
        tools: &[WireTool<'_>],
    ) -> Result<WireMessage> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::agent_failed(format!("Request to model service failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::agent_failed(format!("Model service returned {status}: {body}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ChatError::agent_failed(format!("Unexpected model service response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ChatError::agent_failed("Model service returned no choices"))
    }
}

impl Agent for GroqAgent {
    async fn respond<R: QueryRunner>(
        &self,
        transcript: &[Message],
        user_text: &str,
        tool: &SqlQueryTool<'_, R>,
    ) -> Result<String> {
        let definition = ToolDefinition::sql_query();
        let tools = [WireTool {
            kind: "function",
            function: &definition,
        }];

        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(WireMessage::text("system", SYSTEM_PROMPT));
        messages.extend(transcript.iter().map(WireMessage::from));
        messages.push(WireMessage::text("user", user_text));

        for iteration in 0..self.max_iterations {
            let reply = self.complete(&messages, &tools).await?;

            if reply.tool_calls.is_empty() {
                let answer = reply.content.unwrap_or_default().trim().to_string();
                tracing::debug!(iteration, "agent answered");
                return Ok(answer);
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in &calls {
                tracing::debug!(
                    iteration,
                    tool = %call.function.name,
                    arguments = %call.function.arguments,
                    "tool call"
                );

                let output = if call.function.name == TOOL_NAME {
                    tool.call(&call.function.arguments).await
                } else {
                    format!("{} is not a valid tool, try {TOOL_NAME}.", call.function.name)
                };

                messages.push(WireMessage::tool_result(&call.id, output));
            }
        }

        Err(ChatError::agent_failed(format!(
            "Agent stopped after {} steps without an answer",
            self.max_iterations
        )))
    }
}
