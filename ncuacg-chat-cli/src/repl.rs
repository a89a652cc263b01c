//! Interactive chat loop

use anyhow::Result;
use console::style;
use dialoguer::Input;
use ncuacg_chat_core::bus::{ChangeSource, SessionEvent};
use ncuacg_chat_session::{ChatSession, SendOptions};

use crate::app::App;
use crate::{print_history, print_outcome, print_personas, spinner};

/// A line typed at the chat prompt
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    ShowPersona,
    SetPersona(String),
    ListPersonas,
    History(Option<usize>),
    Reset,
    Quit,
    Unknown(String),
    Empty,
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ChatInput::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return ChatInput::Message(line.to_string());
        };

        let mut parts = command.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();
        match name {
            "persona" if arg.is_empty() => ChatInput::ShowPersona,
            "persona" => ChatInput::SetPersona(arg.to_string()),
            "personas" => ChatInput::ListPersonas,
            "history" if arg.is_empty() => ChatInput::History(None),
            "history" => match arg.parse() {
                Ok(count) => ChatInput::History(Some(count)),
                Err(_) => ChatInput::Unknown(format!("history {}", arg)),
            },
            "reset" | "clear" => ChatInput::Reset,
            "quit" | "exit" | "q" => ChatInput::Quit,
            other => ChatInput::Unknown(other.to_string()),
        }
    }
}

/// Print persona switches that did not come from this prompt.
///
/// Stands in for a second surface attached to the same session.
fn spawn_widget_observer(session: &ChatSession) -> tokio::task::JoinHandle<()> {
    let mut observer = session.subscribe();
    tokio::spawn(async move {
        while let Some(event) = observer.recv().await {
            if let SessionEvent::PersonaChanged { id, source } = event {
                let origin = match source {
                    ChangeSource::User => continue,
                    ChangeSource::Server => "assistant",
                    ChangeSource::Fallback => "fallback",
                    ChangeSource::Storage => "another window",
                };
                println!(
                    "{}",
                    style(format!("persona is now {} ({})", id, origin)).dim()
                );
            }
        }
    })
}

async fn read_line() -> Result<String> {
    let line = tokio::task::spawn_blocking(|| {
        Input::<String>::new()
            .with_prompt(format!("{}", style("you").bold().green()))
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(line)
}

pub async fn run_chat(app: &App) -> Result<()> {
    let session = &app.session;
    println!("{}", style("NCUACG assistant").bold().cyan());
    println!(
        "Persona: {}. Type /quit to leave, /personas to list personas.\n",
        app.persona_label(&session.persona_id())
    );

    let widget = spawn_widget_observer(session);

    loop {
        let line = read_line().await?;
        session.sync_from_store();

        match ChatInput::parse(&line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Message(text) => {
                let progress = spinner("Thinking...");
                let outcome = session.send_message(&text, SendOptions::default()).await;
                progress.finish_and_clear();
                print_outcome(session, outcome);
            }
            ChatInput::ShowPersona => {
                println!("Persona: {}", app.persona_label(&session.persona_id()));
            }
            ChatInput::SetPersona(id) => {
                if !app.catalog.contains(&id) {
                    println!(
                        "{}",
                        style(format!("'{}' is not in the catalog; the server will check it", id))
                            .yellow()
                    );
                }
                session.set_persona_id(id.as_str());
                println!("Persona: {}", app.persona_label(&id));
            }
            ChatInput::ListPersonas => print_personas(app, &session.persona_id()),
            ChatInput::History(last) => print_history(session, last),
            ChatInput::Reset => {
                session.reset();
                println!("{}", style("Conversation cleared.").dim());
            }
            ChatInput::Unknown(name) => {
                println!("{}", style(format!("Unknown command /{}", name)).red());
            }
        }
    }

    widget.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_message() {
        assert_eq!(
            ChatInput::parse("  hello there "),
            ChatInput::Message("hello there".to_string())
        );
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ChatInput::parse("/persona"), ChatInput::ShowPersona);
        assert_eq!(
            ChatInput::parse("/persona  storyboard_coach "),
            ChatInput::SetPersona("storyboard_coach".to_string())
        );
        assert_eq!(ChatInput::parse("/personas"), ChatInput::ListPersonas);
        assert_eq!(ChatInput::parse("/history"), ChatInput::History(None));
        assert_eq!(ChatInput::parse("/history 5"), ChatInput::History(Some(5)));
        assert_eq!(
            ChatInput::parse("/history lots"),
            ChatInput::Unknown("history lots".to_string())
        );
        assert_eq!(ChatInput::parse("/reset"), ChatInput::Reset);
        assert_eq!(ChatInput::parse("/quit"), ChatInput::Quit);
        assert_eq!(
            ChatInput::parse("/dance"),
            ChatInput::Unknown("dance".to_string())
        );
    }
}
