//! crypto-assistant: interactive chat against the briefing MCP server.
//!
//! Each turn offers the server's tools to Gemini; when the model asks for
//! one, it runs remotely and the report is handed back for the final
//! answer. A failed turn resets the conversation and the loop carries on.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{AgentBuilder, ChatSession, TurnOutcome, provider::DEFAULT_MODEL};
use agent_runtime::{GeminiProvider, McpClient};

const SYSTEM_PROMPT: &str = "You are a friendly, professional crypto market analyst. \
Use the available tools to answer the user's questions about the market, individual coins and recent news.";

#[derive(Parser)]
#[command(name = "crypto-assistant", about = "Chat client for the crypto briefing MCP server")]
struct Args {
    /// Hostname or IP address of the MCP server.
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port of the MCP server.
    #[arg(long, default_value_t = 8123)]
    port: u16,

    /// Gemini model used for the conversation.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,
}

fn print_outcome(outcome: &TurnOutcome) {
    if let Some(call) = &outcome.tool_call {
        let status = if outcome.tool_failed { "failed" } else { "ok" };
        println!("🛠️  {} ({})", call.name, status);
    }
    println!("\n🤖 Assistant:\n{}", outcome.answer);
}

fn prompt() -> std::io::Result<()> {
    print!("\n👤 You: ");
    std::io::stdout().flush()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let provider = GeminiProvider::from_env().context("Gemini is not configured")?;
    let tools = Arc::new(McpClient::for_host(&args.host, args.port)?);

    println!("...connecting to {}", tools.endpoint());
    let init = tools
        .connect()
        .await
        .with_context(|| format!("could not connect to {}", tools.endpoint()))?;
    println!("✅ Connected to {} {}", init.server_info.name, init.server_info.version);

    let agent = AgentBuilder::new()
        .provider(Arc::new(provider))
        .tools(tools.clone())
        .system_prompt(SYSTEM_PROMPT)
        .model(args.model)
        .build()?;
    let mut session = ChatSession::new(agent);

    println!("\n🤖 Crypto assistant ready. Type 'quit' or 'exit' to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }
        if query.is_empty() {
            continue;
        }

        match session.send(query).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => {
                tracing::debug!(error = %e, "Turn failed");
                println!("\n💥 {}", e.user_message());
                println!("   Starting a fresh conversation.");
            }
        }
    }

    tools.close().await;
    println!("\n👋 Bye.");
    Ok(())
}
