//! relay - conversational turn router CLI

mod config;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relay_ai::OpenAiProvider;
use relay_router::{
    BoxedTool, ConversationState, DefaultPrompts, FileStore, TurnRequest, TurnRouter,
};

use tools::{CalculatorTool, DocSearchTool};

/// relay - route a conversational turn through intent classification,
/// a task handler, and memory consolidation
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The user message to route
    input: Vec<String>,

    /// Session to continue (a new one is created if omitted)
    #[arg(short, long)]
    session: Option<String>,

    /// User id the session belongs to
    #[arg(short, long, default_value = "local")]
    user: String,

    /// Resume an interrupted turn instead of starting a new one
    #[arg(long)]
    resume: bool,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Directory for session checkpoints
    #[arg(long)]
    store: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print an example config file and exit
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("relay=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    if args.example_config {
        println!("{}", config::example_config());
        return Ok(());
    }

    let cfg = config::Config::load();

    let api_key = cfg
        .api_key()
        .context("no API key found; set RELAY_API_KEY or add api_key to config.toml")?;
    let model = args
        .model
        .or(cfg.model.clone())
        .unwrap_or_else(|| "gpt-4o-mini".to_string());
    let base_url = cfg
        .base_url
        .clone()
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
    let provider = OpenAiProvider::new(api_key, base_url, model);

    let store_dir = args.store.unwrap_or_else(|| cfg.store_dir());
    let store = FileStore::new(&store_dir)
        .with_context(|| format!("cannot open checkpoint store at {}", store_dir.display()))?;

    let mut tools: Vec<BoxedTool> = vec![Arc::new(CalculatorTool)];
    if let Some(docs_dir) = &cfg.docs_dir {
        tools.push(Arc::new(DocSearchTool::new(docs_dir)));
    }

    let router = TurnRouter::new(
        Arc::new(provider),
        Arc::new(DefaultPrompts),
        tools,
        Arc::new(store),
    )?;

    let session_id = args
        .session
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::debug!(session = %session_id, resume = args.resume, "routing turn");
    let state = if args.resume {
        router.resume(&session_id).await?
    } else {
        let input = args.input.join(" ");
        if input.trim().is_empty() {
            anyhow::bail!("no input given; pass a message or use --resume");
        }
        router
            .run_turn(TurnRequest {
                session_id: session_id.clone(),
                user_id: args.user,
                user_input: input,
            })
            .await?
    };

    print_turn(&session_id, &state);
    Ok(())
}

fn print_turn(session_id: &str, state: &ConversationState) {
    if let Some(response) = &state.current_response {
        match serde_json::to_string_pretty(response) {
            Ok(json) => println!("{}", json),
            Err(_) => println!("{}", response),
        }
    } else {
        println!("(no handler ran for this turn)");
    }

    if !state.conversation_summary.is_empty() {
        println!("\nsummary: {}", state.conversation_summary);
    }
    if !state.tools_used.is_empty() {
        println!("tools: {}", state.tools_used.join(", "));
    }
    println!("steps: {}", state.actions_taken.join(" -> "));
    println!("session: {}", session_id);
}
