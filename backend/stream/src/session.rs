//! Chat session: one conversation with the analysis service.
//!
//! Sending a message records the user turn, opens an assistant message in the
//! store and applies the decoded events to it until the stream ends. The
//! session also tracks the progress line and the dismissible error banner.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use docsight_core::{DocsightError, Message, MessageStore, Role, StreamEvent};

use crate::pump::PumpSummary;
use crate::transport::{ChatRequest, ChatTransport, UploadFile, UploadReport};

pub struct ChatSession {
    id: String,
    store: MessageStore,
    progress: Option<String>,
    error: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: new_session_id(),
            store: MessageStore::new(),
            progress: None,
            error: None,
        }
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Latest progress line of the stream in flight.
    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    /// Error banner from the last failed stream, until dismissed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Drops every message. The session id is kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.progress = None;
        self.error = None;
    }

    /// Sends `text` and streams the answer into a new assistant message.
    ///
    /// `observer` sees every event before it is applied. Returns the id of
    /// the assistant message, which is always finalized on return.
    pub async fn send_message<T>(
        &mut self,
        transport: &T,
        text: &str,
        mut observer: impl FnMut(&StreamEvent) + Send,
    ) -> Result<Uuid, DocsightError>
    where
        T: ChatTransport + ?Sized,
    {
        let request = self.open_request(text)?;
        let id = self.store.begin(Role::Assistant);

        let store = &mut self.store;
        let progress = &mut self.progress;
        let error = &mut self.error;
        let mut on_event = |event: StreamEvent| {
            observer(&event);
            match &event {
                StreamEvent::Progress { message } => *progress = Some(message.clone()),
                StreamEvent::Token { .. } => {}
                StreamEvent::Complete { .. } => *progress = None,
                StreamEvent::Error { message } => {
                    *progress = None;
                    *error = Some(message.clone());
                }
            }
            if let Err(err) = store.apply(id, &event) {
                debug!(message_id = %id, error = %err, "Event after message was finalized");
            }
        };
        let summary: PumpSummary = transport.stream_chat(&request, &mut on_event).await;

        if self.store.finalize(id, Vec::new())? {
            debug!(message_id = %id, "Stream ended without a terminal event");
            self.progress = None;
        }
        info!(
            session_id = %self.id,
            message_id = %id,
            events = summary.events,
            failed = summary.transport_failed,
            "Response stream finished"
        );
        Ok(id)
    }

    /// Sends `text` and waits for the whole answer in one response.
    ///
    /// A failed request sets the error banner and is recorded as an
    /// `Error: ...` assistant message. Returns the id of the assistant message.
    pub async fn ask<T>(&mut self, transport: &T, text: &str) -> Result<Uuid, DocsightError>
    where
        T: ChatTransport + ?Sized,
    {
        let request = self.open_request(text)?;
        match transport.chat(&request).await {
            Ok(reply) => {
                info!(
                    session_id = %self.id,
                    sources = reply.sources.len(),
                    route = reply.route_taken.as_deref().unwrap_or("-"),
                    "Answer received"
                );
                Ok(self.store.push(Role::Assistant, reply.answer, reply.sources))
            }
            Err(err) => {
                let message = err.to_string();
                warn!(session_id = %self.id, error = %message, "Chat request failed");
                self.error = Some(message.clone());
                Ok(self.store.push(Role::Assistant, format!("Error: {message}"), Vec::new()))
            }
        }
    }

    /// Uploads documents into this session and records a system note.
    ///
    /// A report for a different session is rejected and leaves the
    /// conversation untouched.
    pub async fn upload<T>(&mut self, transport: &T, files: Vec<UploadFile>) -> Result<UploadReport, DocsightError>
    where
        T: ChatTransport + ?Sized,
    {
        if files.is_empty() {
            return Err(anyhow::anyhow!("no files to upload").into());
        }
        let report = transport.upload(&self.id, files).await?;
        if report.session_id != self.id {
            warn!(sent = %self.id, got = %report.session_id, "Upload answered for another session");
            return Err(DocsightError::transport(
                None,
                format!("session id mismatch: sent {}, got {}", self.id, report.session_id),
            ));
        }
        self.store.push(
            Role::System,
            format!(
                "✓ Successfully uploaded {} file(s), created {} chunks",
                report.files_processed, report.chunks_created
            ),
            Vec::new(),
        );
        info!(
            session_id = %self.id,
            files = report.files_processed,
            chunks = report.chunks_created,
            "Documents uploaded"
        );
        Ok(report)
    }

    /// Drops the server-side session, then clears the local conversation.
    pub async fn reset<T>(&mut self, transport: &T) -> Result<(), DocsightError>
    where
        T: ChatTransport + ?Sized,
    {
        transport.delete_session(&self.id).await?;
        self.clear();
        Ok(())
    }

    /// Records the user turn and builds the request for it. History covers
    /// the turns before this one.
    fn open_request(&mut self, text: &str) -> Result<ChatRequest, DocsightError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow::anyhow!("cannot send an empty message").into());
        }
        let request = ChatRequest {
            message: text.to_string(),
            conversation_history: self.store.history(),
            session_id: self.id.clone(),
        };
        self.store.push(Role::User, text, Vec::new());
        self.error = None;
        self.progress = None;
        Ok(request)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::sync::Mutex;

    use crate::decoder::FrameDecoder;
    use crate::pump::pump;
    use crate::transport::ChatReply;
    use docsight_core::Source;

    /// Replays canned chunks and records the requests it receives.
    struct ScriptedTransport {
        chunks: Vec<Result<&'static str, String>>,
        reply: Option<ChatReply>,
        upload_session: Option<String>,
        requests: Mutex<Vec<ChatRequest>>,
        uploads: Mutex<Vec<(String, Vec<String>)>>,
        deleted: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(chunks: Vec<Result<&'static str, String>>) -> Self {
            Self {
                chunks,
                reply: None,
                upload_session: None,
                requests: Mutex::new(Vec::new()),
                uploads: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn replying(reply: ChatReply) -> Self {
            Self {
                reply: Some(reply),
                ..Self::new(Vec::new())
            }
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn stream_chat(
            &self,
            request: &ChatRequest,
            on_event: &mut (dyn FnMut(StreamEvent) + Send),
        ) -> PumpSummary {
            self.requests.lock().unwrap().push(request.clone());
            pump(FrameDecoder::new(), stream::iter(self.chunks.clone()), on_event).await
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, DocsightError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply
                .clone()
                .ok_or_else(|| DocsightError::transport(Some(400), "No documents uploaded"))
        }

        async fn upload(&self, session_id: &str, files: Vec<UploadFile>) -> Result<UploadReport, DocsightError> {
            let names = files.into_iter().map(|f| f.name).collect::<Vec<_>>();
            let count = names.len() as u64;
            self.uploads.lock().unwrap().push((session_id.to_string(), names));
            Ok(UploadReport {
                session_id: self.upload_session.clone().unwrap_or_else(|| session_id.to_string()),
                files_processed: count,
                chunks_created: 7,
            })
        }

        async fn delete_session(&self, session_id: &str) -> Result<(), DocsightError> {
            self.deleted.lock().unwrap().push(session_id.to_string());
            Ok(())
        }
    }

    fn file(name: &str) -> UploadFile {
        UploadFile {
            name: name.to_string(),
            bytes: b"%PDF-1.4".to_vec(),
        }
    }

    const ANSWER: &[Result<&str, String>] = &[
        Ok("event: progress\ndata: {\"message\":\"Searching\"}\n\n"),
        Ok("event: token\ndata: {\"token\":\"Hello\"}\n\nevent: token\ndata: {\"tok"),
        Ok("en\":\" world\"}\n\n"),
        Ok("event: complete\ndata: {\"sources\":[{\"title\":\"Doc\",\"url\":\"https://x.org\"}]}\n\n"),
    ];

    #[tokio::test]
    async fn test_full_exchange() {
        let transport = ScriptedTransport::new(ANSWER.to_vec());
        let mut session = ChatSession::with_id("sess-1");
        let mut seen = Vec::new();

        let id = session
            .send_message(&transport, "  Hi there ", |e| seen.push(e.name()))
            .await
            .unwrap();

        assert_eq!(seen, vec!["progress", "token", "token", "complete"]);
        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hi there");

        let answer = session.store().get(id).unwrap();
        assert_eq!(answer.content, "Hello world");
        assert!(!answer.streaming);
        assert_eq!(answer.sources.len(), 1);
        assert!(answer.sources[0].is_web());
        assert_eq!(session.progress(), None);
        assert_eq!(session.error(), None);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].message, "Hi there");
        assert_eq!(requests[0].session_id, "sess-1");
        assert!(requests[0].conversation_history.is_empty());
    }

    #[tokio::test]
    async fn test_history_excludes_current_turn() {
        let transport = ScriptedTransport::new(ANSWER.to_vec());
        let mut session = ChatSession::new();
        session.send_message(&transport, "first", |_| {}).await.unwrap();
        session.send_message(&transport, "second", |_| {}).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        let history = &requests[1].conversation_history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "Hello world");
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_error_event_sets_banner_and_keeps_partial_content() {
        let transport = ScriptedTransport::new(vec![
            Ok("event: token\ndata: {\"token\":\"Partial\"}\n\n"),
            Ok("event: error\ndata: {\"message\":\"LLM timeout\"}\n\n"),
            Ok("event: token\ndata: {\"token\":\" ignored\"}\n\n"),
        ]);
        let mut session = ChatSession::new();
        let id = session.send_message(&transport, "q", |_| {}).await.unwrap();

        let answer = session.store().get(id).unwrap();
        assert_eq!(answer.content, "Partial");
        assert!(answer.sources.is_empty());
        assert!(!answer.streaming);
        assert_eq!(session.error(), Some("LLM timeout"));

        session.dismiss_error();
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_finalizes_message() {
        let transport = ScriptedTransport::new(vec![
            Ok("event: token\ndata: {\"token\":\"Par\"}\n\n"),
            Err("connection reset".to_string()),
        ]);
        let mut session = ChatSession::new();
        let id = session.send_message(&transport, "q", |_| {}).await.unwrap();

        assert_eq!(session.error(), Some("connection reset"));
        let answer = session.store().get(id).unwrap();
        assert_eq!(answer.content, "Par");
        assert!(!answer.streaming);
    }

    #[tokio::test]
    async fn test_stream_without_terminal_event_is_finalized() {
        let transport = ScriptedTransport::new(vec![
            Ok("event: progress\ndata: {\"message\":\"Thinking\"}\n\n"),
            Ok("event: token\ndata: {\"token\":\"Cut\"}\n\nevent: tok"),
        ]);
        let mut session = ChatSession::new();
        let id = session.send_message(&transport, "q", |_| {}).await.unwrap();

        let answer = session.store().get(id).unwrap();
        assert_eq!(answer.content, "Cut");
        assert!(!answer.streaming);
        assert_eq!(session.progress(), None);
        assert_eq!(session.error(), None);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = ChatSession::new();
        assert!(session.send_message(&transport, "   ", |_| {}).await.is_err());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_ask_records_whole_answer() {
        let transport = ScriptedTransport::replying(ChatReply {
            answer: "It is **fast**.".into(),
            sources: vec![Source {
                filename: Some("spec.pdf".into()),
                ..Default::default()
            }],
            route_taken: None,
        });
        let mut session = ChatSession::with_id("sess-2");
        session.send_message(&transport, "warm up", |_| {}).await.unwrap();
        let id = session.ask(&transport, " Is it fast? ").await.unwrap();

        let answer = session.store().get(id).unwrap();
        assert_eq!(answer.role, Role::Assistant);
        assert_eq!(answer.content, "It is **fast**.");
        assert_eq!(answer.sources.len(), 1);
        assert!(!answer.streaming);
        assert_eq!(session.messages().len(), 4);

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[1].message, "Is it fast?");
        assert_eq!(requests[1].conversation_history.len(), 2);
    }

    #[tokio::test]
    async fn test_ask_failure_becomes_error_message() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = ChatSession::new();
        let id = session.ask(&transport, "q").await.unwrap();

        assert_eq!(session.store().get(id).unwrap().content, "Error: No documents uploaded");
        assert_eq!(session.error(), Some("No documents uploaded"));
        assert!(session.ask(&transport, "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_upload_adds_system_note() {
        let transport = ScriptedTransport::new(vec![]);
        let mut session = ChatSession::with_id("sess-3");
        let report = session
            .upload(&transport, vec![file("a.pdf"), file("b.txt")])
            .await
            .unwrap();

        assert_eq!(report.files_processed, 2);
        let note = session.store().last().unwrap();
        assert_eq!(note.role, Role::System);
        assert_eq!(note.content, "✓ Successfully uploaded 2 file(s), created 7 chunks");

        let uploads = transport.uploads.lock().unwrap();
        assert_eq!(uploads[0], ("sess-3".to_string(), vec!["a.pdf".to_string(), "b.txt".to_string()]));
    }

    #[tokio::test]
    async fn test_upload_for_other_session_is_rejected() {
        let transport = ScriptedTransport {
            upload_session: Some("someone-else".into()),
            ..ScriptedTransport::new(vec![])
        };
        let mut session = ChatSession::with_id("sess-4");
        let err = session.upload(&transport, vec![file("a.pdf")]).await.unwrap_err();
        assert!(err.to_string().contains("session id mismatch"));
        assert!(session.messages().is_empty());
        assert!(session.upload(&transport, Vec::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_deletes_server_session() {
        let transport = ScriptedTransport::new(ANSWER.to_vec());
        let mut session = ChatSession::with_id("sess-5");
        session.send_message(&transport, "q", |_| {}).await.unwrap();
        session.reset(&transport).await.unwrap();

        assert!(session.messages().is_empty());
        assert_eq!(session.id(), "sess-5");
        assert_eq!(*transport.deleted.lock().unwrap(), vec!["sess-5".to_string()]);
    }

    #[test]
    fn test_session_id_shape_and_clear() {
        let mut session = ChatSession::new();
        let (millis, rest) = session.id().split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 32);

        let id = session.id().to_string();
        session.clear();
        assert_eq!(session.id(), id);
        assert!(session.messages().is_empty());
    }
}
