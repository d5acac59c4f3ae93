//! Creating, fetching and compiling managed prompts.
//!
//! ```bash
//! cargo run --example prompt_management
//! ```

use anyhow::Result;
use langfuse::client::DEFAULT_PROMPT_CACHE_TTL;
use langfuse::prelude::*;
use langfuse::prompt::ChatMessage;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let client = Client::new(ClientOptions::default().auto_flush(false))?;

    let created = client
        .create_prompt(
            &CreatePromptRequest::text("greeting", "Hello {{name}}, welcome to {{product}}!")
                .labels(["production"])
                .config(json!({"temperature": 0.7})),
        )
        .await?;
    println!("Created '{}' version {:?}", created.name, created.version);

    client
        .create_prompt(&CreatePromptRequest::chat(
            "support-agent",
            vec![
                ChatMessage::new("system", "You support {{product}} customers."),
                ChatMessage::new("user", "{{question}}"),
            ],
        ))
        .await?;

    let greeting = client
        .get_prompt("greeting", None, Some("production"), DEFAULT_PROMPT_CACHE_TTL)
        .await?;
    println!("Variables: {:?}", greeting.variables());

    let compiled = greeting.compile([("name", "Ada"), ("product", "Langfuse")]);
    println!("Compiled: {}", compiled.as_text().unwrap_or_default());

    // Served from the cache this time.
    let again = client
        .get_prompt("greeting", None, Some("production"), DEFAULT_PROMPT_CACHE_TTL)
        .await?;
    println!("Cached version: {:?}", again.version);

    let agent = client
        .get_prompt("support-agent", None, None, DEFAULT_PROMPT_CACHE_TTL)
        .await?;
    let messages = agent.compile([("product", "Langfuse"), ("question", "Where are my traces?")]);
    for message in messages.as_messages().unwrap_or_default() {
        println!("[{}] {}", message.role, message.content);
    }
    println!("LangChain form: {}", agent.to_langchain());

    client.shutdown().await?;
    Ok(())
}
