//! Action System
//!
//! Caller-supplied capabilities the model may invoke through function calling.
//! Actions are registered once when the agent is built and looked up by name
//! when a completion requests one.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Parameter definition, rendered into a JSON schema property
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl ParameterSchema {
    /// A required parameter
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
            enum_values: None,
        }
    }

    /// An optional parameter
    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    fn to_property(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".into(), Value::String(self.param_type.clone()));
        property.insert("description".into(), Value::String(self.description.clone()));
        if let Some(default) = &self.default {
            property.insert("default".into(), default.clone());
        }
        if let Some(values) = &self.enum_values {
            property.insert("enum".into(), Value::Array(values.clone()));
        }
        Value::Object(property)
    }
}

/// What the model is told about an action
///
/// `parameters` is forwarded to the provider as-is and never checked
/// against the arguments the handler receives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSchema {
    /// Unique action identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// JSON schema describing the arguments
    pub parameters: Value,
}

impl ActionSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Build an object schema from a list of parameter definitions
    pub fn from_parameters(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: &[ParameterSchema],
    ) -> Self {
        let properties: Map<String, Value> = parameters
            .iter()
            .map(|p| (p.name.clone(), p.to_property()))
            .collect();
        let required: Vec<&str> = parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        Self::new(
            name,
            description,
            json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        )
    }
}

/// Action trait - implement to expose a capability to the model
#[async_trait]
pub trait Action: Send + Sync {
    /// Schema advertised to the model
    fn schema(&self) -> ActionSchema;

    /// Run the action with the arguments the model supplied
    async fn invoke(&self, arguments: Value) -> Result<String>;
}

type Handler = dyn Fn(Value) -> BoxFuture<'static, Result<String>> + Send + Sync;

/// Action backed by an async closure
pub struct FnAction {
    schema: ActionSchema,
    handler: Box<Handler>,
}

impl FnAction {
    pub fn new<F, Fut>(schema: ActionSchema, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self {
            schema,
            handler: Box::new(move |arguments| handler(arguments).boxed()),
        }
    }
}

impl std::fmt::Debug for FnAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAction")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Action for FnAction {
    fn schema(&self) -> ActionSchema {
        self.schema.clone()
    }

    async fn invoke(&self, arguments: Value) -> Result<String> {
        (self.handler)(arguments).await
    }
}

/// Registry for available actions
#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new action. A later action with the same name replaces the earlier one.
    pub fn register<A: Action + 'static>(&mut self, action: A) {
        self.register_arc(Arc::new(action));
    }

    /// Register a shared action
    pub fn register_arc(&mut self, action: Arc<dyn Action>) {
        let schema = action.schema();
        self.actions.insert(schema.name, action);
    }

    /// Get an action by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.get(name).cloned()
    }

    /// Invoke an action by name
    pub async fn invoke(&self, name: &str, arguments: Value) -> Result<String> {
        let action = self
            .get(name)
            .ok_or_else(|| AgentError::ActionNotFound(name.to_string()))?;
        action.invoke(arguments).await
    }

    /// All action schemas, ordered by name
    pub fn schemas(&self) -> Vec<ActionSchema> {
        let mut schemas: Vec<ActionSchema> = self.actions.values().map(|a| a.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Action names
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
