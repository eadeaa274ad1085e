use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use docsight_core::{ConversationTurn, DocsightError, Source, StreamEvent};

use crate::decoder::FrameDecoder;
use crate::pump::{pump, PumpSummary};

/// Body of a streaming chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Vec<ConversationTurn>,
    pub session_id: String,
}

/// Answer of the non-streaming `POST /chat` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default, deserialize_with = "sources_or_empty")]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub route_taken: Option<String>,
}

/// Result of `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReport {
    pub session_id: String,
    #[serde(default)]
    pub files_processed: u64,
    #[serde(default)]
    pub chunks_created: u64,
}

/// A document to upload, already read into memory.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The analysis service as seen by a chat session.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Streams the answer to `request` as decoded events.
    ///
    /// Failures are reported through `on_event` as a single `Error` event,
    /// never as a returned error.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> PumpSummary;

    /// Asks for the whole answer in one response.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, DocsightError>;

    /// Indexes documents into the server-side session `session_id`.
    async fn upload(&self, session_id: &str, files: Vec<UploadFile>) -> Result<UploadReport, DocsightError>;

    /// Drops the server-side state of `session_id`.
    async fn delete_session(&self, session_id: &str) -> Result<(), DocsightError>;
}

/// HTTP client for the analysis service.
pub struct ChatClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; returns the service's status document.
    pub async fn health_check(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(self.timeout)
            .send()
            .await
            .context("Health check request failed")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Health check returned {}", status);
        }
        response.json().await.context("Failed to parse health response")
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        on_event: &mut (dyn FnMut(StreamEvent) + Send),
    ) -> PumpSummary {
        info!(
            session_id = %request.session_id,
            history = request.conversation_history.len(),
            "Opening response stream"
        );
        let response = match self
            .client
            .post(format!("{}/chat/stream", self.base_url))
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return transport_failure(on_event, err.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return transport_failure(on_event, error_detail(status.as_u16(), &body));
        }

        pump(FrameDecoder::new(), response.bytes_stream(), on_event).await
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, DocsightError> {
        info!(
            session_id = %request.session_id,
            history = request.conversation_history.len(),
            "Sending chat request"
        );
        let response = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(request_failed)?;
        checked(response).await?.json().await.map_err(request_failed)
    }

    async fn upload(&self, session_id: &str, files: Vec<UploadFile>) -> Result<UploadReport, DocsightError> {
        let count = files.len();
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Part::bytes(file.bytes).file_name(file.name));
        }
        info!(session_id, files = count, "Uploading documents");
        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .query(&[("session_id", session_id)])
            .multipart(form)
            .send()
            .await
            .map_err(request_failed)?;
        checked(response).await?.json().await.map_err(request_failed)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), DocsightError> {
        let response = self
            .client
            .delete(format!("{}/session/{}", self.base_url, session_id))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(request_failed)?;
        checked(response).await?;
        debug!(session_id, "Session deleted");
        Ok(())
    }
}

/// Passes a success response through; anything else becomes a transport
/// error carrying the status and the server's `detail`.
async fn checked(response: Response) -> Result<Response, DocsightError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_detail(status.as_u16(), &body);
    warn!(status = status.as_u16(), error = %message, "Request rejected");
    Err(DocsightError::transport(Some(status.as_u16()), message))
}

fn request_failed(err: reqwest::Error) -> DocsightError {
    warn!(error = %err, "Request failed");
    DocsightError::transport(err.status().map(|s| s.as_u16()), err.to_string())
}

fn sources_or_empty<'de, D>(deserializer: D) -> Result<Vec<Source>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Source>>::deserialize(deserializer)?.unwrap_or_default())
}

fn transport_failure(on_event: &mut (dyn FnMut(StreamEvent) + Send), message: String) -> PumpSummary {
    warn!(error = %message, "Chat request failed");
    on_event(StreamEvent::Error { message });
    PumpSummary::failed()
}

/// Error text for a non-success response: the JSON `detail` field when the
/// body has one, otherwise the status code.
pub fn error_detail(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(Value::String(text)) if !text.is_empty() => text,
        Some(Value::Null) | Some(Value::String(_)) | None => format!("HTTP error! status: {status}"),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_detail() {
        assert_eq!(error_detail(400, r#"{"detail":"No documents uploaded"}"#), "No documents uploaded");
        assert_eq!(error_detail(502, "<html>Bad Gateway</html>"), "HTTP error! status: 502");
        assert_eq!(error_detail(500, r#"{"error":"x"}"#), "HTTP error! status: 500");
        assert_eq!(
            error_detail(422, r#"{"detail":[{"msg":"field required"}]}"#),
            r#"[{"msg":"field required"}]"#
        );
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ChatRequest {
            message: "Summarize".into(),
            conversation_history: vec![],
            session_id: "1-abc".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"message": "Summarize", "conversation_history": [], "session_id": "1-abc"})
        );
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ChatClient::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_chat_reply_shape() {
        let reply: ChatReply = serde_json::from_value(json!({
            "answer": "Short answer.",
            "sources": [{"filename": "a.pdf"}, "note"],
            "route_taken": "rag"
        }))
        .unwrap();
        assert_eq!(reply.answer, "Short answer.");
        assert_eq!(reply.sources.len(), 2);
        assert_eq!(reply.sources[0].display_title(), "a.pdf");
        assert_eq!(reply.route_taken.as_deref(), Some("rag"));

        let bare: ChatReply = serde_json::from_value(json!({"answer": "x", "sources": null})).unwrap();
        assert!(bare.sources.is_empty());
        assert!(serde_json::from_value::<ChatReply>(json!({"sources": []})).is_err());
    }

    #[test]
    fn test_upload_report_shape() {
        let report: UploadReport = serde_json::from_value(json!({
            "session_id": "1-abc",
            "files_processed": 2,
            "chunks_created": 41,
            "message": "ok"
        }))
        .unwrap();
        assert_eq!(report.session_id, "1-abc");
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.chunks_created, 41);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let client = ChatClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = ChatRequest {
            message: "hi".into(),
            conversation_history: vec![],
            session_id: "s".into(),
        };

        let err = client.chat(&request).await.unwrap_err();
        assert!(matches!(err, DocsightError::Transport { status: None, .. }));

        let files = vec![UploadFile {
            name: "notes.txt".into(),
            bytes: b"hello".to_vec(),
        }];
        let err = client.upload("s", files).await.unwrap_err();
        assert!(matches!(err, DocsightError::Transport { status: None, .. }));

        let err = client.delete_session("s").await.unwrap_err();
        assert!(matches!(err, DocsightError::Transport { status: None, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_reports_error_event() {
        let client = ChatClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let request = ChatRequest {
            message: "hi".into(),
            conversation_history: vec![],
            session_id: "s".into(),
        };
        let mut events = Vec::new();
        let summary = client.stream_chat(&request, &mut |e: StreamEvent| events.push(e)).await;
        assert!(summary.transport_failed);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error { .. }));
    }
}
