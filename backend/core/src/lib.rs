pub mod accumulator;
pub mod error;
pub mod event;
pub mod message;

pub use accumulator::MessageStore;
pub use error::DocsightError;
pub use event::StreamEvent;
pub use message::{ConversationTurn, Message, Role, Source};
