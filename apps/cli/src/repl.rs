//! Interactive chat REPL with streaming output and persistent history.
//!
//! Plain lines are sent as chat messages; lines starting with `/` are
//! commands (see [`HELP`]).

use crate::surface::{Surface, stream_turn};
use anyhow::Result;
use client::SendOutcome;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use types::{LoginCredentials, Role};

/// REPL command summary.
pub const HELP: &str = "\
/new                      start a new conversation
/login <email> <password> log in
/logout                   log out and continue as a guest
/history                  list saved conversations
/open <chat-id>           open a saved conversation
/rename <chat-id> <title> rename a saved conversation
/delete <chat-id>         delete a saved conversation
/help                     show this help
/quit                     exit";

/// One parsed REPL input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    /// A chat message.
    Message(&'a str),
    /// Start a new conversation.
    New,
    /// Log in.
    Login {
        /// Login email.
        email: &'a str,
        /// Password.
        password: &'a str,
    },
    /// Log out.
    Logout,
    /// List saved conversations.
    History,
    /// Open a saved conversation.
    Open(&'a str),
    /// Rename a saved conversation.
    Rename {
        /// Conversation to rename.
        chat_id: &'a str,
        /// New title.
        title: &'a str,
    },
    /// Delete a saved conversation.
    Delete(&'a str),
    /// Show help.
    Help,
    /// Exit the REPL.
    Quit,
    /// A command with missing arguments or an unknown name.
    Invalid(&'a str),
}

/// Parse one input line.
pub fn parse_line(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Message(line);
    };
    let (name, args) = command
        .split_once(char::is_whitespace)
        .map(|(name, args)| (name, args.trim()))
        .unwrap_or((command, ""));
    let mut words = args.split_whitespace();
    match (name, words.next(), words.next()) {
        ("new", None, _) => ReplCommand::New,
        ("login", Some(email), Some(password)) => ReplCommand::Login { email, password },
        ("logout", None, _) => ReplCommand::Logout,
        ("history", None, _) => ReplCommand::History,
        ("open", Some(chat_id), None) => ReplCommand::Open(chat_id),
        ("rename", Some(chat_id), Some(_)) => ReplCommand::Rename {
            chat_id,
            title: args[chat_id.len()..].trim(),
        },
        ("delete", Some(chat_id), None) => ReplCommand::Delete(chat_id),
        ("help", _, _) => ReplCommand::Help,
        ("quit" | "exit", _, _) => ReplCommand::Quit,
        _ => ReplCommand::Invalid(line),
    }
}

/// Interactive chat REPL over one chat surface.
pub struct ChatRepl {
    surface: Surface,
    editor: rustyline::DefaultEditor,
    history_path: Option<PathBuf>,
}

impl ChatRepl {
    /// Create a new REPL over `surface`.
    pub fn new(surface: Surface) -> Result<Self> {
        let mut editor = rustyline::DefaultEditor::new()?;
        let history_path = history_file_path();
        if let Some(ref path) = history_path {
            if let Err(err) = editor.load_history(path) {
                tracing::debug!("no readline history loaded from {}: {err}", path.display());
            }
        }
        Ok(Self {
            surface,
            editor,
            history_path,
        })
    }

    /// Run the interactive REPL loop.
    pub async fn run(&mut self) -> Result<()> {
        println!(
            "Parley chat with {} (/help for commands, Ctrl+D to exit)",
            self.surface.client.tenant()
        );
        println!("---");

        loop {
            match self.editor.readline("> ") {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line.trim());
                    match parse_line(&line) {
                        ReplCommand::Quit => break,
                        command => {
                            if let Err(e) = self.execute(command).await {
                                eprintln!("Error: {e}");
                            }
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.save_history();
        Ok(())
    }

    async fn execute(&mut self, command: ReplCommand<'_>) -> Result<()> {
        let Surface {
            identity,
            client,
            history,
        } = &mut self.surface;
        match command {
            ReplCommand::Message(text) => match client.send(text).await? {
                SendOutcome::Started => stream_turn(client).await?,
                SendOutcome::Busy => println!("(still answering)"),
                SendOutcome::Empty => {}
            },
            ReplCommand::New => {
                client.new_conversation();
                println!("(new conversation)");
            }
            ReplCommand::Login { email, password } => {
                let mut identity = identity.lock().await;
                identity
                    .authenticate(&LoginCredentials::new(email, password))
                    .await?;
                println!("(logged in as {email})");
            }
            ReplCommand::Logout => {
                identity.lock().await.release().await?;
                println!("(logged out)");
            }
            ReplCommand::History => {
                let sessions = history.list().await?;
                if sessions.is_empty() {
                    println!("(no saved conversations)");
                }
                for session in sessions {
                    println!("{}  {}", session.chat_id, session.title);
                }
            }
            ReplCommand::Open(chat_id) => {
                history.hydrate(chat_id, client).await?;
                for message in client.messages() {
                    let who = match message.role {
                        Role::Human => "you",
                        Role::Ai => "bot",
                    };
                    println!("{who}: {}", message.content);
                }
            }
            ReplCommand::Rename { chat_id, title } => {
                history.rename(chat_id, title).await?;
                println!("(renamed {chat_id})");
            }
            ReplCommand::Delete(chat_id) => {
                history.delete(chat_id, client).await?;
                println!("(deleted {chat_id})");
            }
            ReplCommand::Help | ReplCommand::Quit => println!("{HELP}"),
            ReplCommand::Invalid(line) => println!("unrecognised command: {line}\n{HELP}"),
        }
        if let Some(notice) = client.notice() {
            println!("({notice})");
        }
        Ok(())
    }

    /// Save readline history to disk.
    fn save_history(&mut self) {
        let Some(ref path) = self.history_path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::debug!("cannot create {}: {err}", parent.display());
            }
        }
        if let Err(err) = self.editor.save_history(path) {
            tracing::debug!("readline history not saved to {}: {err}", path.display());
        }
    }
}

/// Resolve the history file path at `~/.config/parley/history`.
fn history_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("parley").join("history"))
}
