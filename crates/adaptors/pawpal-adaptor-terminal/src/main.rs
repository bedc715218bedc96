//! PawPal terminal front end
//!
//! ## Usage
//! ```bash
//! pawpal --personality clingy
//! pawpal --no-scheduler
//! RUST_LOG=debug pawpal --tick-secs 5
//! ```
//!
//! Plain lines are sent to the companion. Lines starting with `/` are
//! commands; `/help` lists them. Proactive messages are printed as they
//! arrive.

mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{Command, HELP};
use pawpal_core::{
    get_env_or, load_env, Companion, MessageSink, PawpalConfig, Personality, ProactiveMessage,
    ResponseGenerator, Role, TemplateGenerator,
};
use pawpal_provider_openai::OpenAiCompatibleGenerator;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Desktop companion pet in your terminal
#[derive(Parser, Debug)]
#[command(name = "pawpal")]
#[command(about = "Chat with a companion pet that also talks to you on its own")]
struct Args {
    /// cold, clingy, playful or quiet (default: $PAWPAL_PERSONALITY or quiet)
    #[arg(short, long)]
    personality: Option<String>,

    /// Do not start the proactive scheduler
    #[arg(long)]
    no_scheduler: bool,

    /// Scheduler tick period in seconds
    #[arg(long)]
    tick_secs: Option<u64>,
}

/// `RUST_LOG` if set, else info with debug for the core
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,pawpal_core=debug".into())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();
}

fn pick_generator() -> Arc<dyn ResponseGenerator> {
    let remote = OpenAiCompatibleGenerator::from_env();
    if remote.is_available() {
        Arc::new(remote)
    } else {
        info!("Using offline template replies");
        Arc::new(TemplateGenerator::default())
    }
}

fn print_proactive(message: &ProactiveMessage) {
    println!(
        "\n[{}] 🐾 {} ({})",
        message.at.format("%H:%M"),
        message.text,
        message.event_type
    );
}

async fn run_command(companion: &Companion, command: Command) -> bool {
    match command {
        Command::Chat(text) => {
            for message in companion.chat(&text).await {
                if message.role == Role::Assistant {
                    println!("🐾 {}", message.content);
                }
            }
        }
        Command::Status => {
            let status = companion.status().await;
            println!(
                "personality={} mood={} energy={} last_interaction={}",
                status.personality,
                status.mood,
                status.energy,
                status.last_interaction.as_deref().unwrap_or("-")
            );
        }
        Command::Tools => {
            for (name, description) in companion.registry().describe() {
                println!("  {:<18} {}", name, description);
            }
        }
        Command::Tool { name, args } => {
            let result = companion.execute_capability(&name, &args);
            let mark = if result.success { "ok" } else { "failed" };
            println!("[{}] {}", mark, result.message);
            if !result.data.is_empty() {
                match serde_json::to_string_pretty(&result.data) {
                    Ok(json) => println!("{}", json),
                    Err(e) => warn!(error = %e, "Could not render capability data"),
                }
            }
        }
        Command::Trigger(event) => match companion.trigger_proactive_event(&event) {
            Some(text) => println!("🐾 {}", text),
            None => println!("(nothing to say for '{}')", event),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG may come from .env
    let loaded = load_env();
    init_logging();
    loaded.context("loading .env")?;

    let args = Args::parse();
    let personality: Personality = args
        .personality
        .unwrap_or_else(|| get_env_or("PAWPAL_PERSONALITY", "quiet"))
        .parse()
        .context("choosing a personality")?;

    let mut config = PawpalConfig::from_env();
    if let Some(secs) = args.tick_secs {
        config.scheduler.tick_interval_secs = secs;
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ProactiveMessage>();
    let sink: Arc<dyn MessageSink> = Arc::new(tx);

    let companion = Companion::builder(personality)
        .with_config(config)
        .with_generator(pick_generator())
        .with_sink(sink)
        .build()
        .context("building the companion")?;

    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            print_proactive(&message);
        }
    });

    if !args.no_scheduler {
        companion
            .start_scheduler()
            .context("starting the proactive scheduler")?;
    }

    println!("PawPal ({}) is here. Type /help for commands.", personality);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match commands::parse(&line) {
            Ok(command) => {
                if !run_command(&companion, command).await {
                    break;
                }
            }
            Err(message) => println!("{}", message),
        }
    }

    if companion.scheduler_running() {
        companion.stop_scheduler().await?;
    }
    drop(companion);
    printer.abort();
    println!("再见~");
    Ok(())
}
