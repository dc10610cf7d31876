//! Interactive chat loop with session management commands

use anyhow::Result;
use chat_memory_core::utils::{capitalize, format_timestamp, truncate};
use chat_memory_core::{ChatMessage, ChatModel, Conversation};
use console::style;
use std::io::{BufRead, Write};
use tracing::{info, warn};

const HELP: &str = "\
Commands:
  /new <id>      create a session and switch to it
  /switch <id>   switch to an existing session
  /sessions      list sessions
  /history       show the full history of the current session
  /window        show the context the model receives
  /evict <id>    delete a session and its history
  /help          show this help
  /quit          exit
Anything else is sent to the model.";

/// A parsed input line
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
    Prompt(&'a str),
    New(&'a str),
    Switch(&'a str),
    Sessions,
    History,
    Window,
    Evict(&'a str),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Input::Prompt(line);
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "new" => Input::New(arg),
            "switch" => Input::Switch(arg),
            "sessions" => Input::Sessions,
            "history" => Input::History,
            "window" => Input::Window,
            "evict" => Input::Evict(arg),
            "help" => Input::Help,
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(name),
        }
    }
}

/// Whether the loop should keep reading
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Repl<M: ChatModel> {
    conversation: Conversation<M>,
    current: String,
    default_session: String,
}

impl<M: ChatModel> Repl<M> {
    pub fn new(conversation: Conversation<M>, session: &str, default_session: &str) -> Result<Self> {
        conversation.store().get_or_create(session)?;
        Ok(Self {
            conversation,
            current: session.to_string(),
            default_session: default_session.to_string(),
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Read lines until EOF or `/quit`
    pub async fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "Session {} (window: {} exchanges). Type /help for commands.",
            style(&self.current).cyan(),
            self.conversation.window()
        )?;

        for line in input.lines() {
            let line = line?;
            if self.handle_line(&line, out).await? == Flow::Quit {
                break;
            }
        }
        Ok(())
    }

    pub async fn handle_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let store = self.conversation.store().clone();

        match Input::parse(line) {
            Input::Empty => {}
            Input::Prompt(prompt) => match self.conversation.send(&self.current, prompt).await {
                Ok(_) => {
                    // Echo both turns exactly as they were recorded
                    let history = store.history(&self.current);
                    for message in history.iter().rev().take(2).rev() {
                        print_message(out, message)?;
                    }
                }
                Err(e) => {
                    warn!(session = %self.current, error = %e, "Prompt failed");
                    writeln!(out, "{} {}", style("error:").red(), e)?;
                }
            },
            Input::New(id) | Input::Switch(id) | Input::Evict(id) if id.is_empty() => {
                writeln!(out, "{} a session id is required", style("error:").red())?;
            }
            Input::New(id) => {
                if store.contains(id) {
                    writeln!(out, "Session {} already exists, switching to it", id)?;
                } else {
                    store.get_or_create(id)?;
                    info!(session = id, "Created session");
                    writeln!(out, "Created session {}", style(id).cyan())?;
                }
                self.current = id.to_string();
            }
            Input::Switch(id) => {
                if store.contains(id) {
                    self.current = id.to_string();
                    writeln!(out, "Switched to session {}", style(id).cyan())?;
                } else {
                    writeln!(out, "{} unknown session {}", style("error:").red(), id)?;
                }
            }
            Input::Sessions => {
                for info in store.sessions() {
                    let marker = if info.key == self.current { "*" } else { " " };
                    writeln!(
                        out,
                        "{} {:<16} {:>4} messages {:>4} exchanges  updated {}",
                        marker,
                        truncate(&info.key, 16),
                        info.message_count,
                        info.exchange_count,
                        format_timestamp(info.updated_at)
                    )?;
                }
            }
            Input::History => {
                let history = store.history(&self.current);
                if history.is_empty() {
                    writeln!(out, "(no messages yet)")?;
                }
                for message in &history {
                    print_message(out, message)?;
                }
            }
            Input::Window => {
                let view = store.windowed_view(&self.current, self.conversation.window());
                if view.is_empty() {
                    writeln!(out, "(empty context)")?;
                }
                for message in &view {
                    print_message(out, message)?;
                }
            }
            Input::Evict(id) => {
                if store.evict(id) {
                    info!(session = id, "Evicted session");
                    writeln!(out, "Evicted session {}", id)?;
                } else {
                    writeln!(out, "No session {}", id)?;
                }
                if id == self.current {
                    store.get_or_create(&self.default_session)?;
                    self.current = self.default_session.clone();
                    writeln!(out, "Switched to session {}", style(&self.current).cyan())?;
                }
            }
            Input::Help => writeln!(out, "{}", HELP)?,
            Input::Quit => return Ok(Flow::Quit),
            Input::Unknown(name) => {
                writeln!(out, "{} unknown command /{} (try /help)", style("error:").red(), name)?;
            }
        }

        Ok(Flow::Continue)
    }
}

fn print_message<W: Write>(out: &mut W, message: &ChatMessage) -> Result<()> {
    writeln!(
        out,
        "{}: {}  {}",
        style(capitalize(message.role().as_str())).bold(),
        message.content(),
        style(format_timestamp(message.timestamp())).dim()
    )?;
    Ok(())
}
