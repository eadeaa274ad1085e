//! Response stream handling: frame decoding, the HTTP transport, and the
//! chat session that feeds decoded events into the message store.

pub mod decoder;
pub mod pump;
pub mod session;
pub mod transport;

pub use decoder::FrameDecoder;
pub use pump::{pump, PumpSummary};
pub use session::ChatSession;
pub use transport::{ChatClient, ChatReply, ChatRequest, ChatTransport, UploadFile, UploadReport};
