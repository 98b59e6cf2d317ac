//! Terminal Chat Shell
//!
//! Renders the transcript and reads one line per turn. The only control is
//! `/reset`, which clears the history back to the greeting. The session ends
//! at end of input (Ctrl-D) or on interrupt.

use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use crate::agent::Agent;
use crate::engine::QueryRunner;
use crate::error::ChatError;
use crate::session::{ChatSession, Message};

/// Command that clears the message history
pub const RESET_COMMAND: &str = "/reset";

/// One line of user input, classified
#[derive(Debug, PartialEq, Eq)]
pub enum ShellInput<'a> {
    Empty,
    Reset,
    Message(&'a str),
}

impl<'a> ShellInput<'a> {
    #[must_use]
    pub fn parse(line: &'a str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Empty
        } else if trimmed.eq_ignore_ascii_case(RESET_COMMAND) {
            Self::Reset
        } else {
            Self::Message(trimmed)
        }
    }
}

/// Format one transcript entry
#[must_use]
pub fn render_message(message: &Message) -> String {
    format!("{}> {}", message.role, message.content)
}

/// Format an inline (non-fatal) error
#[must_use]
pub fn render_error(error: &ChatError) -> String {
    format!("error> {error}")
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        println!("{}", render_message(message));
    }
}

/// Read one line, `None` when input has ended
fn read_line(theme: &ColorfulTheme) -> Option<String> {
    match Input::<String>::with_theme(theme)
        .with_prompt("Ask anything from the database")
        .allow_empty(true)
        .interact_text()
    {
        Ok(line) => Some(line),
        Err(e) => {
            tracing::debug!(error = %e, "input closed");
            None
        }
    }
}

/// Run the interactive loop until input ends
pub async fn run<R: QueryRunner, A: Agent>(session: &mut ChatSession<R, A>) {
    let theme = ColorfulTheme::default();

    println!("(type {RESET_COMMAND} to clear the message history, Ctrl-D to quit)");
    print_transcript(session.messages());

    while let Some(line) = read_line(&theme) {
        match ShellInput::parse(&line) {
            ShellInput::Empty => {}
            ShellInput::Reset => {
                session.reset();
                println!();
                print_transcript(session.messages());
            }
            ShellInput::Message(text) => {
                let outcome = session.submit(text).await;
                for error in &outcome.errors {
                    println!("{}", render_error(error));
                }
                if let Some(reply) = outcome.reply {
                    println!("{}", render_message(&Message::assistant(reply)));
                }
            }
        }
    }
}
