//! deepseek-agent terminal chat
//!
//! Reads prompts from stdin, keeps the rolling history in memory for the
//! lifetime of the process and prints the agent's answers.

mod actions;

use std::io::Write;

use agent_runtime::{DeepSeekConfig, Message, ParamOverrides, create_agent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PERSONALITY: &str = "You are a concise, friendly assistant. \
Use the available tools when they help answer the question.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = DeepSeekConfig::from_env()?;
    let personality =
        std::env::var("AGENT_PERSONALITY").unwrap_or_else(|_| DEFAULT_PERSONALITY.into());

    let mut agent = create_agent(config, personality, actions::registry())?;
    if let Some(temperature) = env_parse::<f32>("AGENT_TEMPERATURE") {
        agent.set_temperature(temperature);
    }
    if let Some(max_tokens) = env_parse::<u32>("AGENT_MAX_TOKENS") {
        agent.set_max_tokens(max_tokens);
    }
    if let Ok(raw) = std::env::var("AGENT_EXTRA_PARAMS") {
        let overrides: ParamOverrides = serde_json::from_str(&raw)?;
        agent.set_additional_params(overrides);
    }

    tracing::info!("Registered {} actions:", agent.actions().len());
    for name in agent.actions().names() {
        tracing::info!("  • {}", name);
    }
    tracing::info!("Type a message, /reset to clear history, /exit to quit");

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let prompt = line.trim();

        match prompt {
            "" => continue,
            "/exit" => break,
            "/reset" => {
                history.clear();
                continue;
            }
            _ => {}
        }

        match agent.run(prompt, &history).await {
            Ok(answer) => {
                println!("{answer}");
                history.push(Message::user(prompt));
                history.push(Message::assistant(answer));
            }
            Err(e) => {
                tracing::warn!(error = %e, cause = %e.root_cause(), kind = ?e.kind(), "Turn failed");
                eprintln!("{}", e.user_message());
            }
        }
    }

    Ok(())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
