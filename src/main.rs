//! Rituo CLI entry point.
//!
//! Provides `chat`, `ask`, `explain` and `tools` subcommands for an
//! interactive session, a single turn, a dry-run of intent resolution, or a
//! listing of the tools the MCP server exposes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rituo::agent::{CallerContext, EngineContext, Orchestrator, Turn, ZoneProbe};
use rituo::config::RituoConfig;
use rituo::logging;
use rituo::mcp::client::McpHttpClient;
use rituo::mcp::ToolService;
use rituo::providers::openai::OpenAiCompatProvider;
use rituo::providers::{ApiCredential, Message, Role};

/// Env vars checked, in order, for the model API key.
const API_KEY_VARS: [&str; 2] = ["RITUO_LLM_API_KEY", "GROQ_API_KEY"];

/// Rituo, a chat front end for Google Calendar, Gmail and Tasks.
#[derive(Parser)]
#[command(name = "rituo", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session.
    Chat {
        /// Google account the session acts for.
        #[arg(long, env = "RITUO_USER_EMAIL")]
        user: String,
        /// Display name used in the prompt.
        #[arg(long)]
        name: Option<String>,
        /// IANA timezone overriding detection.
        #[arg(long)]
        timezone: Option<String>,
    },
    /// Run a single turn and print the reply.
    Ask {
        /// Google account the turn acts for.
        #[arg(long, env = "RITUO_USER_EMAIL")]
        user: String,
        /// IANA timezone overriding detection.
        #[arg(long)]
        timezone: Option<String>,
        /// The message.
        message: String,
    },
    /// Show how a message would be classified and dispatched, without
    /// contacting any service.
    Explain {
        /// Account placed on the planned call.
        #[arg(long, default_value = "me@example.com")]
        user: String,
        /// IANA timezone overriding detection.
        #[arg(long)]
        timezone: Option<String>,
        /// The message.
        message: String,
    },
    /// List tools exposed by the MCP server.
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: ignoring unreadable .env file: {e}");
        }
    }

    let cli = Cli::parse();
    let config = RituoConfig::load().context("failed to load configuration")?;

    match cli.command {
        Command::Chat {
            user,
            name,
            timezone,
        } => handle_chat(config, user, name, timezone).await,
        Command::Ask {
            user,
            timezone,
            message,
        } => handle_ask(config, user, timezone, &message).await,
        Command::Explain {
            user,
            timezone,
            message,
        } => handle_explain(config, user, timezone, &message),
        Command::Tools => handle_tools(config).await,
    }
}

/// Build the orchestrator from configuration.
fn build_orchestrator(config: RituoConfig) -> anyhow::Result<Orchestrator> {
    let tools = McpHttpClient::new(&config.mcp.url)
        .with_context(|| format!("invalid MCP endpoint {}", config.mcp.url))?;
    let llm = OpenAiCompatProvider::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.max_tokens,
    );
    Ok(Orchestrator::new(EngineContext {
        tools: Arc::new(tools),
        llm: Arc::new(llm),
        config: Arc::new(config),
        zone_probe: ZoneProbe::System,
    }))
}

fn caller(user: String, name: Option<String>, timezone: Option<String>) -> CallerContext {
    let credential = API_KEY_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .and_then(ApiCredential::new);
    if credential.is_none() {
        warn!("no model API key in environment; conversational replies are disabled");
    }
    CallerContext {
        identity: user,
        name,
        credential,
        timezone,
    }
}

/// Interactive session; history lives for the session only.
async fn handle_chat(
    config: RituoConfig,
    user: String,
    name: Option<String>,
    timezone: Option<String>,
) -> anyhow::Result<()> {
    let _logging_guard = logging::init_production(&config.logging)?;
    let assistant = config.conversation.assistant_name.clone();
    let orchestrator = build_orchestrator(config)?;
    let caller = caller(user, name, timezone);
    info!(user = %caller.identity, "chat session started");

    let mut history: Vec<Message> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("failed to read stdin")? else {
            break;
        };
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }
        if matches!(utterance, "exit" | "quit") {
            break;
        }

        let reply = orchestrator
            .handle_turn(Turn {
                utterance,
                history: &history,
                caller: &caller,
                now: chrono::Utc::now(),
            })
            .await;
        println!("{assistant}: {}\n", reply.text);

        history.push(Message::new(Role::User, utterance));
        history.push(Message::new(Role::Assistant, reply.text));
    }

    info!("chat session ended");
    Ok(())
}

/// Single turn with no history.
async fn handle_ask(
    config: RituoConfig,
    user: String,
    timezone: Option<String>,
    message: &str,
) -> anyhow::Result<()> {
    logging::init_cli(&config.logging.level);
    let orchestrator = build_orchestrator(config)?;
    let caller = caller(user, None, timezone);

    let reply = orchestrator
        .handle_turn(Turn {
            utterance: message,
            history: &[],
            caller: &caller,
            now: chrono::Utc::now(),
        })
        .await;
    println!("{}", reply.text);
    Ok(())
}

/// Print the resolution as JSON.
fn handle_explain(
    config: RituoConfig,
    user: String,
    timezone: Option<String>,
    message: &str,
) -> anyhow::Result<()> {
    logging::init_cli("warn");
    let orchestrator = build_orchestrator(config)?;
    let caller = CallerContext {
        timezone,
        ..CallerContext::new(user)
    };

    let resolution = orchestrator.resolve(message, &caller, chrono::Utc::now());
    let json = serde_json::to_string_pretty(&resolution).context("failed to render resolution")?;
    println!("{json}");
    Ok(())
}

/// List the server's tools.
async fn handle_tools(config: RituoConfig) -> anyhow::Result<()> {
    logging::init_cli(&config.logging.level);
    let client = McpHttpClient::new(&config.mcp.url)
        .with_context(|| format!("invalid MCP endpoint {}", config.mcp.url))?;

    let tools = client
        .list_tools()
        .await
        .with_context(|| format!("failed to list tools at {}", config.mcp.url))?;
    for tool in tools {
        match tool.description {
            Some(desc) => println!("{:<28} {}", tool.name, desc.lines().next().unwrap_or("")),
            None => println!("{}", tool.name),
        }
    }
    Ok(())
}
