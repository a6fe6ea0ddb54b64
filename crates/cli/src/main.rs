//! CtxBot CLI — the main entry point.
//!
//! Commands:
//! - `onboard`   — Write a default config and a sample template catalog
//! - `chat`      — Interactive terminal chat
//! - `bot`       — Start the Telegram bot (long polling)
//! - `templates` — List or run prompt templates

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ctxbot",
    about = "CtxBot — conversational LLM assistant with rolling context",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and sample template catalog
    Onboard,

    /// Chat with the assistant in the terminal
    Chat,

    /// Start the Telegram bot
    Bot,

    /// Work with prompt templates
    Templates {
        #[command(subcommand)]
        command: TemplatesCommand,
    },
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List the template catalog
    List,

    /// Run one template and print the result
    Run {
        /// Template id from the catalog
        id: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Bot => commands::bot::run().await?,
        Commands::Templates { command } => match command {
            TemplatesCommand::List => commands::templates_cmd::list()?,
            TemplatesCommand::Run { id } => commands::templates_cmd::run(id).await?,
        },
    }

    Ok(())
}
