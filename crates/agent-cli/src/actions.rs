//! Built-in actions offered by the terminal chat

use agent_runtime::{ActionRegistry, ActionSchema, FnAction, ParameterSchema};
use serde_json::{Value, json};

fn datetime_schema() -> ActionSchema {
    ActionSchema::from_parameters(
        "datetime",
        "Get the current date and time",
        &[
            ParameterSchema::optional("format", "string", "Output format: 'iso', 'human', or 'unix'")
                .with_default(json!("human"))
                .with_enum(vec![json!("iso"), json!("human"), json!("unix")]),
        ],
    )
}

fn datetime(args: &Value) -> String {
    let format = args.get("format").and_then(Value::as_str).unwrap_or("human");
    let now = chrono::Utc::now();

    match format {
        "iso" => now.to_rfc3339(),
        "unix" => now.timestamp().to_string(),
        _ => now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string(),
    }
}

/// Everything the CLI registers
pub fn registry() -> ActionRegistry {
    let mut actions = ActionRegistry::new();
    actions.register(FnAction::new(datetime_schema(), |args: Value| async move {
        Ok(datetime(&args))
    }));
    actions
}
