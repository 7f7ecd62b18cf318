//! LLM Provider Strategy Pattern
//!
//! Defines the single call every completion backend implements, together with
//! the request and result types that cross it. The agent works exclusively
//! through this interface.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::provider::{CompletionRequest, CompletionResult, LlmProvider};
//!
//! let provider = DeepSeekProvider::new(config)?;
//!
//! match provider.complete(&request).await? {
//!     CompletionResult::Message { content, .. } => println!("{content}"),
//!     CompletionResult::Action(call) => println!("model wants {}", call.name),
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::message::Message;
use crate::tool::ActionSchema;

/// Sampling parameters for one completion
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.5
}
const fn default_max_tokens() -> u32 {
    150
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Provider-specific request fields applied after every structured field
///
/// Each entry is written as a top-level key of the outbound request body, so a
/// key such as `temperature` or `model` overrides the value the provider would
/// otherwise send.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamOverrides(Map<String, Value>);

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an override
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge into a JSON object body. Colliding keys are overwritten.
    pub fn apply(&self, body: &mut Map<String, Value>) {
        for (key, value) in &self.0 {
            body.insert(key.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for ParamOverrides {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParamOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Everything a provider needs for one completion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User prompt, appended as the final message
    pub prompt: String,

    /// System-role instructions, sent as the first message
    pub personality: String,

    /// Prior messages, inserted verbatim between personality and prompt
    #[serde(default)]
    pub history: Vec<Message>,

    /// Actions offered to the model. Empty means no tools are sent.
    #[serde(default)]
    pub actions: Vec<ActionSchema>,

    #[serde(default)]
    pub options: GenerationOptions,

    #[serde(default)]
    pub overrides: ParamOverrides,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, personality: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            personality: personality.into(),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionSchema>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_overrides(mut self, overrides: ParamOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// `[system(personality), ...history, user(prompt)]`
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(Message::system(self.personality.as_str()));
        messages.extend(self.history.iter().cloned());
        messages.push(Message::user(self.prompt.as_str()));
        messages
    }
}

/// Token usage statistics
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A model request to run one action
#[derive(Clone, Debug, PartialEq)]
pub struct ActionRequest {
    /// Correlation ID to put on the tool result message
    pub id: String,

    /// Action name as the model spelled it
    pub name: String,

    /// Parsed arguments
    pub arguments: Value,

    /// The assistant message that carried the request, to be replayed in history
    pub assistant_message: Message,

    pub usage: Option<TokenUsage>,
}

/// Normalized provider reply
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionResult {
    /// Plain text answer (empty when the provider sent no content)
    Message {
        content: String,
        usage: Option<TokenUsage>,
    },

    /// The model asked to run an action
    Action(ActionRequest),
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new completion backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Perform exactly one completion call. No retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use serde_json::json;

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 150);
    }

    #[test]
    fn test_messages_order() {
        let request = CompletionRequest::new("What now?", "You are terse.").with_history(vec![
            Message::user("Hi"),
            Message::assistant("Hello"),
        ]);

        let messages = request.messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[0].content, "You are terse.");
        assert_eq!(messages[3].content, "What now?");
    }

    #[test]
    fn test_overrides_win_on_collision() {
        let mut body = Map::new();
        body.insert("temperature".into(), json!(0.5));
        body.insert("model".into(), json!("deepseek-chat"));

        let overrides = ParamOverrides::new()
            .set("temperature", 0.9)
            .set("top_p", 0.1);
        overrides.apply(&mut body);

        assert_eq!(body["temperature"], json!(0.9));
        assert_eq!(body["top_p"], json!(0.1));
        assert_eq!(body["model"], json!("deepseek-chat"));
    }
}
