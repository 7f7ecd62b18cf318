//! # agent-runtime
//!
//! Runtime providers for the deepseek-agent system.
//!
//! ## Providers
//!
//! - **DeepSeek** (default): DeepSeek chat completions, or any other
//!   OpenAI-compatible endpoint via `base_url`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{create_agent, DeepSeekConfig};
//!
//! let agent = create_agent(DeepSeekConfig::from_env()?, "You are terse.", actions)?;
//! let answer = agent.run("What's the weather in Boston?", &history).await?;
//! ```

#[cfg(feature = "deepseek")]
pub mod deepseek;

#[cfg(feature = "deepseek")]
pub use deepseek::{DeepSeekConfig, DeepSeekProvider};

// Re-export core types for convenience
pub use agent_core::{
    Action, ActionRegistry, ActionSchema, Agent, AgentBuilder, AgentError, ErrorKind, FnAction,
    LlmProvider, Message, ParamOverrides, ParameterSchema, Result, Role,
};

/// Build a DeepSeek-backed agent in one call
#[cfg(feature = "deepseek")]
pub fn create_agent(
    config: DeepSeekConfig,
    personality: impl Into<String>,
    actions: ActionRegistry,
) -> Result<Agent> {
    let provider = DeepSeekProvider::new(config)?;
    Ok(Agent::new(std::sync::Arc::new(provider), personality, actions))
}

#[cfg(all(test, feature = "deepseek"))]
mod tests {
    use super::*;

    #[test]
    fn test_create_agent() {
        let agent = create_agent(
            DeepSeekConfig::new("sk-test"),
            "You are terse.",
            ActionRegistry::new(),
        )
        .unwrap();

        assert_eq!(agent.config().personality, "You are terse.");
        assert!(agent.actions().is_empty());
    }
}
