//! CLI entry point for the NCUACG chat assistant

mod app;
mod repl;

use anyhow::Result;
use app::App;
use clap::{Parser, Subcommand};
use console::style;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use ncuacg_chat_backend::ChatBackend;
use ncuacg_chat_core::logging::init_logging;
use ncuacg_chat_core::persona::Persona;
use ncuacg_chat_core::session::Role;
use ncuacg_chat_session::{ChatSession, SendOptions, SendOutcome};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "ncuacg-chat")]
#[command(about = "Chat with the NCUACG club assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one message and print the reply
    Send {
        /// Message to send
        message: String,
        /// Persona for this message only
        #[arg(short, long)]
        persona: Option<String>,
        /// Continue this backend conversation instead of the saved one
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Start an interactive chat
    Chat {
        /// Persona to select before the first message
        #[arg(short, long)]
        persona: Option<String>,
    },
    /// List personas
    Personas {
        /// Ask the assistant backend instead of the local catalog
        #[arg(short, long)]
        remote: bool,
    },
    /// Show or select the active persona
    Persona {
        /// Persona id; omit to pick from a list
        id: Option<String>,
    },
    /// Print the conversation log
    History {
        /// Only the most recent N messages
        #[arg(short, long)]
        last: Option<usize>,
    },
    /// Clear the conversation, keeping the persona
    Reset,
    /// Show configuration and session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let app = App::load(cli.config_dir)?;
    let _log_guard = init_logging(&app.config.logging);

    match cli.command {
        Commands::Send {
            message,
            persona,
            conversation,
        } => {
            info!("Sending one-shot message");
            let options = SendOptions::default()
                .with_persona(persona)
                .with_conversation(conversation);
            run_send(&app, &message, options).await?;
        }
        Commands::Chat { persona } => {
            if let Some(id) = persona {
                app.session.set_persona_id(id);
            }
            repl::run_chat(&app).await?;
        }
        Commands::Personas { remote } => {
            if remote {
                run_remote_personas(&app).await?;
            } else {
                print_personas(&app, &app.session.persona_id());
            }
        }
        Commands::Persona { id } => run_persona(&app, id)?,
        Commands::History { last } => print_history(&app.session, last),
        Commands::Reset => {
            app.session.reset();
            println!("Conversation cleared.");
        }
        Commands::Status => run_status(&app),
    }

    Ok(())
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    progress.set_message(message.to_string());
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Print whatever the last send added to the log
pub(crate) fn print_outcome(session: &ChatSession, outcome: SendOutcome) {
    match outcome {
        SendOutcome::Replied => {
            if let Some(reply) = session.messages().last() {
                println!("{} {}", style("assistant:").bold().cyan(), reply.text);
            }
        }
        SendOutcome::Rejected => {
            let detail = session.last_error().unwrap_or_default();
            println!("{} {}", style("rejected:").bold().yellow(), detail);
            println!("Persona is now {}. Send again to retry.", session.persona_id());
        }
        SendOutcome::Failed => {
            if let Some(message) = session.messages().last() {
                println!("{}", style(&message.text).red());
            }
        }
        SendOutcome::Ignored | SendOutcome::Superseded => {}
    }
}

/// Print the log, or only its last `last` messages
pub(crate) fn print_history(session: &ChatSession, last: Option<usize>) {
    let state = session.snapshot();
    if state.messages.is_empty() {
        println!("{}", style("No messages yet.").dim());
        return;
    }
    for message in state.get_history(last.unwrap_or(usize::MAX)) {
        let who = match message.role {
            Role::User => style("you:").bold().green(),
            Role::Assistant => style("assistant:").bold().cyan(),
            Role::System => style("system:").bold().red(),
        };
        println!(
            "{} {} {}",
            style(message.timestamp.format("%H:%M")).dim(),
            who,
            message.text
        );
    }
}

fn print_persona_line(persona: &Persona, current: &str) {
    let marker = if persona.id == current { "*" } else { " " };
    println!(
        "{} {} {}",
        marker,
        style(&persona.display_name).bold(),
        style(format!("({})", persona.id)).dim()
    );
    if !persona.description.is_empty() {
        println!("    {}", persona.description);
    }
}

pub(crate) fn print_personas(app: &App, current: &str) {
    let selected = app.catalog.selection_id(current);
    for persona in app.catalog.visible() {
        print_persona_line(persona, &selected);
    }
    if app.catalog.is_hidden_active(current) {
        if let Some(persona) = app.catalog.get(current) {
            println!("{}", style("Active hidden persona:").dim());
            print_persona_line(persona, current);
        }
    }
}

async fn run_send(app: &App, message: &str, options: SendOptions) -> Result<()> {
    let progress = spinner("Waiting for the assistant...");
    let outcome = app.session.send_message(message, options).await;
    progress.finish_and_clear();

    if outcome == SendOutcome::Ignored {
        println!("Nothing to send.");
    }
    print_outcome(&app.session, outcome);
    Ok(())
}

async fn run_remote_personas(app: &App) -> Result<()> {
    let progress = spinner("Fetching personas...");
    let remote = app.backend.list_personas().await;
    progress.finish_and_clear();

    let personas: Vec<Persona> = remote?.into_iter().map(Persona::from).collect();
    if personas.is_empty() {
        println!("The assistant did not list any personas.");
        return Ok(());
    }
    let current = app.session.persona_id();
    for persona in &personas {
        print_persona_line(persona, &current);
    }
    Ok(())
}

fn run_persona(app: &App, id: Option<String>) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => {
            let choices = app.catalog.visible();
            if choices.is_empty() {
                println!("The persona catalog is empty.");
                return Ok(());
            }
            let labels: Vec<String> = choices
                .iter()
                .map(|p| format!("{} ({})", p.display_name, p.id))
                .collect();
            let selected = app.catalog.selection_id(&app.session.persona_id());
            let default = choices.iter().position(|p| p.id == selected).unwrap_or(0);
            let index = Select::new()
                .with_prompt("Select a persona")
                .items(&labels)
                .default(default)
                .interact()?;
            choices[index].id.clone()
        }
    };

    if !app.catalog.contains(&id) {
        println!(
            "{}",
            style(format!("'{}' is not in the catalog; the server will check it", id)).yellow()
        );
    }
    app.session.set_persona_id(id.as_str());
    println!("Persona set to {}", app.persona_label(&id));
    Ok(())
}

fn run_status(app: &App) {
    let session = app.session.snapshot();

    println!("{}", style("NCUACG Chat Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", app.loader.config_dir().display());
    println!("  Chat endpoint: {}", app.backend.chat_url());
    println!("  Personas endpoint: {}", app.backend.personas_url());
    println!("  Timeout: {}s", app.config.assistant.timeout_secs);
    println!(
        "  Storage: {:?} ({})",
        app.config.storage.backend, app.config.storage.dir
    );
    println!();

    println!("{}", style("Session:").bold());
    println!("  Persona: {}", app.persona_label(&session.persona_id));
    println!(
        "  Conversation: {}",
        session.conversation_id.as_deref().unwrap_or("none")
    );
    println!("  Messages: {}", session.messages.len());
    if let Some(error) = &session.last_error {
        println!("  Last error: {}", style(error).red());
    }
}
