//! `docsight chat`: send one question and print the formatted answer.

use anyhow::{Context, Result};

use docsight_config::DocsightConfig;
use docsight_core::{Message, Role, StreamEvent};
use docsight_logging::{EventLogger, SessionEvent};
use docsight_markdown::{render_blocks, ContentBlock, FormatOptions, Renderer};
use docsight_stream::{ChatClient, ChatSession};

use crate::terminal_output::{
    clear_progress, note_error, render_sources, show_progress, stream_write, supports_color, BOLD, RESET,
};

pub async fn run(
    config: &DocsightConfig,
    message: &str,
    session: Option<String>,
    raw: bool,
    no_stream: bool,
) -> Result<()> {
    let client = ChatClient::new(config.base_url(), config.timeout())?;
    let mut session = match session {
        Some(id) => ChatSession::with_id(id),
        None => ChatSession::new(),
    };
    let session_id = session.id().to_string();

    EventLogger::log_event(
        &session_id,
        SessionEvent::RequestSent {
            message: message.to_string(),
            history_len: session.store().history().len(),
        },
    );

    let id = if no_stream {
        session.ask(&client, message).await?
    } else {
        let id = session
            .send_message(&client, message, |event| match event {
                StreamEvent::Progress { message } => {
                    if !raw {
                        show_progress(message);
                    }
                    EventLogger::log_event(&session_id, SessionEvent::Progress { message: message.clone() });
                }
                StreamEvent::Token { text } if raw => {
                    let _ = stream_write(&mut std::io::stdout(), text);
                }
                _ => {}
            })
            .await?;
        if !raw {
            clear_progress();
        }
        id
    };

    let answer = session
        .store()
        .get(id)
        .context("assistant message missing from session")?;

    if raw {
        println!();
    } else {
        let opts = config.format_options();
        let color = supports_color();
        for message in session.messages() {
            print!("{}", render_message(message, &opts, color));
        }
    }

    if let Some(error) = session.error() {
        EventLogger::log_event(&session_id, SessionEvent::StreamError { message: error.to_string() });
        note_error(error);
        anyhow::bail!("chat request failed");
    }

    EventLogger::log_event(
        &session_id,
        SessionEvent::Completed {
            chars: answer.content.chars().count(),
            sources: answer.sources.len(),
        },
    );
    if !answer.sources.is_empty() {
        println!("{}", render_sources(&answer.sources));
    }
    Ok(())
}

/// Blocks shown for one message. Only assistant output goes through the
/// formatting pipeline; user text is shown verbatim.
pub fn message_blocks(message: &Message, opts: &FormatOptions) -> Vec<ContentBlock> {
    match message.role {
        Role::User => vec![ContentBlock::text(message.content.clone())],
        Role::Assistant | Role::System => render_blocks(message.content.as_str(), opts),
    }
}

fn render_message(message: &Message, opts: &FormatOptions, color: bool) -> String {
    let blocks = message_blocks(message, opts);
    let body = if color {
        Renderer::to_ansi(&blocks)
    } else {
        Renderer::to_markdown(&blocks)
    };
    let label = match message.role {
        Role::User => "You",
        Role::Assistant => "Answer",
        Role::System => "System",
    };
    if color {
        format!("{BOLD}{label}{RESET}\n{body}\n\n")
    } else {
        format!("{label}:\n{body}\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsight_core::MessageStore;

    fn message(role: Role, content: &str) -> Message {
        let mut store = MessageStore::new();
        let id = store.push(role, content, Vec::new());
        store.get(id).unwrap().clone()
    }

    #[test]
    fn test_user_text_is_not_formatted() {
        let text = "int main() {\n  return 0;\n}\n***really***";
        let blocks = message_blocks(&message(Role::User, text), &FormatOptions::default());
        assert_eq!(blocks, vec![ContentBlock::text(text)]);
    }

    #[test]
    fn test_assistant_text_is_segmented() {
        let text = "Try this:\n\n```python\nprint('hi')\n```";
        let blocks = message_blocks(&message(Role::Assistant, text), &FormatOptions::default());
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].is_code());
        assert_eq!(blocks[1].language(), Some("python"));
    }

    #[test]
    fn test_plain_rendering_labels_roles() {
        let out = render_message(&message(Role::User, "hello"), &FormatOptions::default(), false);
        assert_eq!(out, "You:\nhello\n\n");
    }
}
