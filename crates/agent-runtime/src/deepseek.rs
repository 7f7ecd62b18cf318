//! DeepSeek LLM Provider
//!
//! Implementation of `LlmProvider` for the DeepSeek chat-completions API.
//! The wire format is OpenAI-compatible, so any such endpoint works by
//! pointing `base_url` at it.

use agent_core::{
    error::{AgentError, Result},
    message::{FunctionCall, Message, MessageToolCall},
    provider::{ActionRequest, CompletionRequest, CompletionResult, LlmProvider, TokenUsage},
    tool::ActionSchema,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// DeepSeek provider configuration
#[derive(Clone)]
pub struct DeepSeekConfig {
    /// Bearer token
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API root, without the `/chat/completions` suffix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DeepSeekConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Read `DEEPSEEK_API_KEY` (required), `DEEPSEEK_MODEL`,
    /// `DEEPSEEK_BASE_URL` and `DEEPSEEK_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("DEEPSEEK_API_KEY")
            .map_err(|_| AgentError::Config("DEEPSEEK_API_KEY is not set".into()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("DEEPSEEK_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(raw) = std::env::var("DEEPSEEK_TIMEOUT_SECS") {
            config.timeout_secs = parse_timeout_secs(&raw)?;
        }
        Ok(config)
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| {
        AgentError::Config(format!(
            "DEEPSEEK_TIMEOUT_SECS must be a whole number of seconds, got '{raw}'"
        ))
    })
}

impl std::fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

// Outbound wire types

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ActionSchema,
}

// Inbound wire types

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ReplyToolCall>>,
}

#[derive(Deserialize)]
struct ReplyToolCall {
    #[serde(default)]
    id: Option<String>,
    function: FunctionCall,
}

/// DeepSeek LLM provider
pub struct DeepSeekProvider {
    client: Client,
    config: DeepSeekConfig,
}

impl DeepSeekProvider {
    pub fn new(config: DeepSeekConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(DeepSeekConfig::from_env()?)
    }

    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Outbound JSON body. Overrides are merged after every structured field.
    pub fn build_body(&self, request: &CompletionRequest) -> Result<Value> {
        let tools: Vec<WireTool<'_>> = request
            .actions
            .iter()
            .map(|function| WireTool {
                kind: "function",
                function,
            })
            .collect();
        let offer_tools = !tools.is_empty();

        let wire = ChatRequest {
            model: &self.config.model,
            messages: request.messages(),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream: false,
            tools: offer_tools.then_some(tools),
            tool_choice: offer_tools.then_some("auto"),
        };

        let Value::Object(mut body) = serde_json::to_value(&wire)? else {
            return Err(AgentError::Other("request body is not a JSON object".into()));
        };
        request.overrides.apply(&mut body);
        Ok(Value::Object(body))
    }

    fn classify_status(status: StatusCode, message: String) -> AgentError {
        match status {
            StatusCode::UNAUTHORIZED => AgentError::Auth(message),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(message),
            other => AgentError::Api {
                status: other.as_u16(),
                message,
            },
        }
    }
}

/// Normalize the first choice of a reply
fn parse_reply(reply: ChatResponse) -> Result<CompletionResult> {
    let usage = reply.usage;
    let message = reply
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| AgentError::Provider("No choices in response".into()))?;

    let content = message.content.unwrap_or_default();
    let Some(call) = message.tool_calls.and_then(|calls| calls.into_iter().next()) else {
        return Ok(CompletionResult::Message { content, usage });
    };

    let FunctionCall { name, arguments: raw } = call.function;
    let arguments: Value =
        serde_json::from_str(&raw).map_err(|source| AgentError::ArgumentParse {
            action: name.clone(),
            source,
        })?;
    let id = call
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Only the call that will be answered is replayed, so every tool_call in
    // history has a matching tool message.
    let assistant_message = Message::assistant_tool_calls(
        content,
        vec![MessageToolCall::new(id.as_str(), name.as_str(), raw)],
    );

    Ok(CompletionResult::Action(ActionRequest {
        id,
        name,
        arguments,
        assistant_message,
        usage,
    }))
}

#[async_trait]
impl LlmProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult> {
        let body = self.build_body(request)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Error calling DeepSeek API");
                AgentError::Provider(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %message, "DeepSeek API returned an error");
            return Err(Self::classify_status(status, message));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("invalid response body: {e}")))?;

        if let Some(usage) = &reply.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "DeepSeek token usage"
            );
        }

        let result = parse_reply(reply)?;
        tracing::debug!(?result, "DeepSeek completion response");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::provider::{GenerationOptions, ParamOverrides};
    use serde_json::json;

    fn provider() -> DeepSeekProvider {
        DeepSeekProvider::new(DeepSeekConfig::new("sk-test")).unwrap()
    }

    fn reply(value: Value) -> ChatResponse {
        serde_json::from_value(value).unwrap()
    }

    fn weather_schema() -> ActionSchema {
        ActionSchema::new(
            "getWeather",
            "Current weather for a city",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        )
    }

    #[test]
    fn test_config_defaults() {
        let config = DeepSeekConfig::new("sk-test");
        assert_eq!(config.base_url, "https://api.deepseek.com/v1");
        assert_eq!(config.model, "deepseek-chat");
        assert_eq!(config.timeout_secs, 120);
        assert!(!format!("{config:?}").contains("sk-test"));
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout_secs("30").unwrap(), 30);
        assert_eq!(parse_timeout_secs(" 45 ").unwrap(), 45);

        let err = parse_timeout_secs("soon").unwrap_err();
        assert!(matches!(err, AgentError::Config(msg) if msg.contains("soon")));
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let provider = DeepSeekProvider::new(
            DeepSeekConfig::new("k").with_base_url("http://localhost:8080/v1/"),
        )
        .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_body_without_tools() {
        let request = CompletionRequest::new("Hello", "You are kind.")
            .with_history(vec![Message::user("Hi"), Message::assistant("Hey")]);

        let body = provider().build_body(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "You are kind."},
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hey"},
                    {"role": "user", "content": "Hello"}
                ],
                "temperature": 0.5,
                "max_tokens": 150,
                "stream": false
            })
        );
    }

    #[test]
    fn test_body_with_tools() {
        let request = CompletionRequest::new("Weather?", "p").with_actions(vec![weather_schema()]);

        let body = provider().build_body(&request).unwrap();
        assert_eq!(body["tool_choice"], json!("auto"));
        assert_eq!(
            body["tools"],
            json!([{
                "type": "function",
                "function": {
                    "name": "getWeather",
                    "description": "Current weather for a city",
                    "parameters": {"type": "object", "properties": {"city": {"type": "string"}}}
                }
            }])
        );
    }

    #[test]
    fn test_overrides_are_applied_last() {
        let request = CompletionRequest::new("Hi", "p")
            .with_options(GenerationOptions {
                temperature: 0.25,
                max_tokens: 10,
            })
            .with_overrides(
                ParamOverrides::new()
                    .set("temperature", 1.0)
                    .set("model", "deepseek-reasoner")
                    .set("top_p", 0.5),
            );

        let body = provider().build_body(&request).unwrap();
        assert_eq!(body["temperature"], json!(1.0));
        assert_eq!(body["model"], json!("deepseek-reasoner"));
        assert_eq!(body["top_p"], json!(0.5));
        assert_eq!(body["max_tokens"], json!(10));
    }

    #[test]
    fn test_parse_text_reply() {
        let result = parse_reply(reply(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7}
        })))
        .unwrap();

        assert_eq!(
            result,
            CompletionResult::Message {
                content: "Hello!".into(),
                usage: Some(TokenUsage {
                    prompt_tokens: 5,
                    completion_tokens: 2,
                    total_tokens: 7,
                }),
            }
        );
    }

    #[test]
    fn test_parse_null_content() {
        let result = parse_reply(reply(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .unwrap();

        assert!(matches!(result, CompletionResult::Message { content, .. } if content.is_empty()));
    }

    #[test]
    fn test_parse_tool_call() {
        let result = parse_reply(reply(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "call_abc",
                    "type": "function",
                    "function": {"name": "getWeather", "arguments": "{\"city\":\"Boston\"}"}
                }]
            }}]
        })))
        .unwrap();

        let CompletionResult::Action(call) = result else {
            panic!("expected an action");
        };
        assert_eq!(call.id, "call_abc");
        assert_eq!(call.name, "getWeather");
        assert_eq!(call.arguments, json!({"city": "Boston"}));
        assert_eq!(
            call.assistant_message,
            Message::assistant_tool_calls(
                "",
                vec![MessageToolCall::new("call_abc", "getWeather", "{\"city\":\"Boston\"}")],
            )
        );
    }

    #[test]
    fn test_parse_multiple_tool_calls() {
        let result = parse_reply(reply(json!({
            "choices": [{"message": {
                "content": "",
                "tool_calls": [
                    {"id": "a", "function": {"name": "getWeather", "arguments": "{\"city\":\"Boston\"}"}},
                    {"id": "b", "function": {"name": "getWeather", "arguments": "{\"city\":\"Austin\"}"}}
                ]
            }}]
        })))
        .unwrap();

        let CompletionResult::Action(call) = result else {
            panic!("expected an action");
        };
        assert_eq!(call.id, "a");
        assert_eq!(call.arguments, json!({"city": "Boston"}));
        assert_eq!(call.assistant_message.tool_calls.len(), 1);
        assert_eq!(call.assistant_message.tool_calls[0].id, "a");
    }

    #[test]
    fn test_parse_tool_call_without_id() {
        let result = parse_reply(reply(json!({
            "choices": [{"message": {
                "tool_calls": [{"function": {"name": "ping", "arguments": "{}"}}]
            }}]
        })))
        .unwrap();

        let CompletionResult::Action(call) = result else {
            panic!("expected an action");
        };
        assert!(!call.id.is_empty());
        assert_eq!(call.assistant_message.tool_calls[0].id, call.id);
    }

    #[test]
    fn test_malformed_arguments() {
        let err = parse_reply(reply(json!({
            "choices": [{"message": {
                "tool_calls": [{"id": "c1", "function": {"name": "getWeather", "arguments": "{city:"}}]
            }}]
        })))
        .unwrap_err();

        assert!(matches!(err, AgentError::ArgumentParse { action, .. } if action == "getWeather"));
    }

    #[test]
    fn test_no_choices() {
        let err = parse_reply(reply(json!({"choices": []}))).unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            DeepSeekProvider::classify_status(StatusCode::UNAUTHORIZED, "bad key".into()),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            DeepSeekProvider::classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AgentError::RateLimited(_)
        ));
        assert!(matches!(
            DeepSeekProvider::classify_status(StatusCode::BAD_GATEWAY, String::new()),
            AgentError::Api { status: 502, .. }
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_a_provider_error() {
        let provider = DeepSeekProvider::new(
            DeepSeekConfig::new("k")
                .with_base_url("http://127.0.0.1:9")
                .with_timeout_secs(5),
        )
        .unwrap();

        let err = provider
            .complete(&CompletionRequest::new("Hi", "p"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }
}
