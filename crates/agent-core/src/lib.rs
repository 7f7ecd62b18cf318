//! # agent-core
//!
//! Core agent logic with a provider-agnostic completion abstraction and a
//! registry of caller-supplied actions the model may invoke.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Tool-hop   │  │   Action    │  │   LlmProvider       │  │
//! │  │    Loop     │──│   Registry  │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A turn issues one completion. When the model asks for an action, the
//! handler runs, its result is spliced into the history and the model is
//! queried again for the final answer.

pub mod error;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use error::{AgentError, ErrorKind, Result};
pub use message::{FunctionCall, Message, MessageToolCall, Role};
pub use provider::{
    ActionRequest, CompletionRequest, CompletionResult, GenerationOptions, LlmProvider,
    ParamOverrides, TokenUsage,
};
pub use reasoning::{ACTION_NOT_FOUND, Agent, AgentBuilder, AgentConfig, FOLLOW_UP_PROMPT};
pub use tool::{Action, ActionRegistry, ActionSchema, FnAction, ParameterSchema};
