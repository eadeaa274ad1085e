//! Streaming message accumulator.
//!
//! Owns the message list. Streamed answers move through
//! `Streaming -> Finalized` exactly once; finalized messages are never
//! mutated again.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::DocsightError;
use crate::event::StreamEvent;
use crate::message::{ConversationTurn, Message, Role, Source};

/// Ordered store of every message in a conversation.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a complete, non-streaming message.
    pub fn push(&mut self, role: Role, content: impl Into<String>, sources: Vec<Source>) -> Uuid {
        let mut message = Message::new(role, content.into(), false);
        message.sources = sources;
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Start a streaming message with empty content.
    pub fn begin(&mut self, role: Role) -> Uuid {
        let message = Message::new(role, String::new(), true);
        let id = message.id;
        debug!(message_id = %id, role = %role, "Streaming message started");
        self.messages.push(message);
        id
    }

    /// Append a token to a streaming message.
    ///
    /// Fails without touching any state when `id` is unknown or already finalized.
    pub fn append(&mut self, id: Uuid, text: &str) -> Result<(), DocsightError> {
        let message = self.get_mut(id)?;
        if !message.streaming {
            return Err(DocsightError::NotStreaming(id));
        }
        message.content.push_str(text);
        Ok(())
    }

    /// Finalize a streaming message and attach its sources.
    ///
    /// Returns `Ok(false)` when the message was already finalized.
    pub fn finalize(&mut self, id: Uuid, sources: Vec<Source>) -> Result<bool, DocsightError> {
        let message = self.get_mut(id)?;
        if !message.streaming {
            return Ok(false);
        }
        message.streaming = false;
        message.sources = sources;
        debug!(
            message_id = %id,
            chars = message.content.len(),
            sources = message.sources.len(),
            "Streaming message finalized"
        );
        Ok(true)
    }

    /// Apply a decoded stream event to the message `id`.
    ///
    /// `Progress` events carry no message state and are ignored here.
    pub fn apply(&mut self, id: Uuid, event: &StreamEvent) -> Result<(), DocsightError> {
        match event {
            StreamEvent::Progress { .. } => Ok(()),
            StreamEvent::Token { text } => self.append(id, text),
            StreamEvent::Complete { sources } => self.finalize(id, sources.clone()).map(|_| ()),
            StreamEvent::Error { message } => {
                warn!(message_id = %id, error = %message, "Stream ended with error");
                self.finalize(id, Vec::new()).map(|_| ())
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Result<&mut Message, DocsightError> {
        self.messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(DocsightError::UnknownMessage(id))
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Conversation history in the shape the server expects.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.messages.iter().map(Message::as_turn).collect()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
