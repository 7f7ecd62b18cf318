//! Tool-hop Loop
//!
//! One conversational turn: ask the model, and when it requests an action,
//! run the handler, splice the result into history and ask again for the
//! final answer.
//!
//! ```text
//! Start → AwaitingCompletion ──message──→ Done
//!               ↑      │
//!               │      └──action──→ ExecutingHandler
//!               └──────────────────────────┘
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{
    CompletionRequest, CompletionResult, GenerationOptions, LlmProvider, ParamOverrides,
};
use crate::tool::{Action, ActionRegistry};

/// Prompt sent with the follow-up completion after an action ran
pub const FOLLOW_UP_PROMPT: &str = "format the tool call response";

/// Reply returned when the model asks for an action nobody registered
pub const ACTION_NOT_FOUND: &str = "Action not found";

const DEFAULT_PERSONALITY: &str = "You are a helpful AI assistant.";

/// Agent configuration
#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    /// System-role instructions
    pub personality: String,

    /// Generation options
    pub generation: GenerationOptions,

    /// Provider parameters applied last to every request
    pub overrides: ParamOverrides,

    /// Actions a single turn may run before giving up
    pub max_tool_hops: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            personality: DEFAULT_PERSONALITY.into(),
            generation: GenerationOptions::default(),
            overrides: ParamOverrides::default(),
            max_tool_hops: 5,
        }
    }
}

/// The main Agent struct
///
/// `run` borrows the agent shared, the setters borrow it exclusively, so a
/// configuration change can never race an in-flight turn. Wrap the agent in
/// a lock if it must be reconfigured while other tasks use it.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    actions: Arc<ActionRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create an agent with default sampling parameters
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        personality: impl Into<String>,
        actions: ActionRegistry,
    ) -> Self {
        Self::with_config(
            provider,
            Arc::new(actions),
            AgentConfig {
                personality: personality.into(),
                ..AgentConfig::default()
            },
        )
    }

    pub fn with_config(
        provider: Arc<dyn LlmProvider>,
        actions: Arc<ActionRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            actions,
            config,
        }
    }

    pub fn set_personality(&mut self, personality: impl Into<String>) -> &mut Self {
        self.config.personality = personality.into();
        self
    }

    pub fn set_temperature(&mut self, temperature: f32) -> &mut Self {
        self.config.generation.temperature = temperature;
        self
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> &mut Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    /// Replace the provider parameters applied after every structured field
    pub fn set_additional_params(&mut self, overrides: ParamOverrides) -> &mut Self {
        self.config.overrides = overrides;
        self
    }

    pub fn set_max_tool_hops(&mut self, max_tool_hops: usize) -> &mut Self {
        self.config.max_tool_hops = max_tool_hops;
        self
    }

    /// Run one turn and return the model's final text
    ///
    /// `history` is left untouched; a tool hop extends a private copy.
    /// Any failure is returned as [`AgentError::GenerationFailed`] wrapping
    /// the original error.
    pub async fn run(&self, prompt: &str, history: &[Message]) -> Result<String> {
        self.run_turn(prompt, history).await.map_err(|e| {
            tracing::error!(error = %e, "Turn failed");
            AgentError::generation_failed(e)
        })
    }

    /// Run with an empty history
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        self.run(prompt, &[]).await
    }

    async fn run_turn(&self, prompt: &str, history: &[Message]) -> Result<String> {
        if prompt.is_empty() {
            return Err(AgentError::InvalidRequest("prompt must not be empty".into()));
        }

        let mut history = history.to_vec();
        let mut prompt = prompt.to_string();
        let mut hops = 0;

        loop {
            let request = self.build_request(&prompt, &history);
            tracing::debug!(
                provider = self.provider.name(),
                hop = hops,
                messages = request.history.len() + 2,
                "Requesting completion"
            );

            let call = match self.provider.complete(&request).await? {
                CompletionResult::Message { content, .. } => return Ok(content),
                CompletionResult::Action(call) => call,
            };

            let Some(action) = self.actions.get(&call.name) else {
                tracing::warn!(action = %call.name, "Model requested an unregistered action");
                return Ok(ACTION_NOT_FOUND.into());
            };

            if hops >= self.config.max_tool_hops {
                return Err(AgentError::TooManyToolHops(self.config.max_tool_hops));
            }
            hops += 1;

            tracing::debug!(action = %call.name, id = %call.id, "Executing action");
            let output = action.invoke(call.arguments).await?;

            history.push(call.assistant_message);
            history.push(Message::tool(output, call.id));
            FOLLOW_UP_PROMPT.clone_into(&mut prompt);
        }
    }

    fn build_request(&self, prompt: &str, history: &[Message]) -> CompletionRequest {
        CompletionRequest::new(prompt, self.config.personality.as_str())
            .with_history(history.to_vec())
            .with_actions(self.actions.schemas())
            .with_options(self.config.generation.clone())
            .with_overrides(self.config.overrides.clone())
    }

    /// Get the action registry
    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    actions: ActionRegistry,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn action<A: Action + 'static>(mut self, action: A) -> Self {
        self.actions.register(action);
        self
    }

    pub fn actions(mut self, actions: ActionRegistry) -> Self {
        self.actions = actions;
        self
    }

    pub fn personality(mut self, personality: impl Into<String>) -> Self {
        self.config.personality = personality.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.generation.max_tokens = max_tokens;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.overrides = self.config.overrides.set(key, value);
        self
    }

    pub fn max_tool_hops(mut self, max: usize) -> Self {
        self.config.max_tool_hops = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::with_config(provider, Arc::new(self.actions), self.config))
    }
}
