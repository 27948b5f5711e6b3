use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "studio")]
#[command(about = "Mobile Studio - AI-generated mobile app mockups from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage stored chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Export a session as a project JSON document
    Export {
        /// Session ID; omit to export the current state wrapper
        id: Option<String>,
        /// Output directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Send a prompt and stream the generated response
    Send {
        prompt: String,
        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session: Option<String>,
        /// Attach a file to the prompt (repeatable)
        #[arg(long = "attach")]
        attachments: Vec<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List stored sessions, most recently modified first
    List,
    /// Delete a session
    Delete { id: String },
    /// Rename a session
    Rename { id: String, title: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sessions { action } => match action {
            SessionAction::List => commands::sessions::list()?,
            SessionAction::Delete { id } => commands::sessions::delete(&id)?,
            SessionAction::Rename { id, title } => commands::sessions::rename(&id, &title)?,
        },
        Commands::Export { id, out } => commands::export::run(id.as_deref(), &out)?,
        Commands::Send {
            prompt,
            session,
            attachments,
        } => commands::send::run(&prompt, session.as_deref(), &attachments).await?,
    }

    Ok(())
}
