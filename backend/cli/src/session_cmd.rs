//! `docsight upload` and `docsight reset`: manage the server-side session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use docsight_config::DocsightConfig;
use docsight_stream::{ChatClient, ChatSession, UploadFile};

use crate::terminal_output::{note_error, note_info, note_success};

pub async fn upload(config: &DocsightConfig, files: &[PathBuf], session: Option<String>) -> Result<()> {
    let client = ChatClient::new(config.base_url(), config.timeout())?;
    let mut session = match session {
        Some(id) => ChatSession::with_id(id),
        None => ChatSession::new(),
    };
    let files = read_files(files).await?;

    match session.upload(&client, files).await {
        Ok(report) => {
            if let Some(note) = session.store().last() {
                note_success(note.content.trim_start_matches("✓ "));
            }
            note_info(&format!("Ask with: docsight chat --session {} <question>", report.session_id));
            Ok(())
        }
        Err(err) => {
            note_error(&err.to_string());
            Err(err.into())
        }
    }
}

pub async fn reset(config: &DocsightConfig, session: String) -> Result<()> {
    let client = ChatClient::new(config.base_url(), config.timeout())?;
    let mut session = ChatSession::with_id(session);
    session.reset(&client).await?;
    note_success(&format!("Session {} deleted", session.id()));
    Ok(())
}

/// Reads every path into memory, named by its file name.
pub async fn read_files(paths: &[PathBuf]) -> Result<Vec<UploadFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read upload file");
        files.push(UploadFile {
            name: file_name(path),
            bytes,
        });
    }
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_files_uses_file_names() {
        let dir = std::env::temp_dir().join(format!("docsight-upload-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("notes.md");
        tokio::fs::write(&path, "# Notes").await.unwrap();

        let files = read_files(&[path]).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "notes.md");
        assert_eq!(files[0].bytes, b"# Notes");

        assert!(read_files(&[dir.join("missing.pdf")]).await.is_err());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_file_name_falls_back_to_path() {
        assert_eq!(file_name(Path::new("/tmp/report.pdf")), "report.pdf");
        assert_eq!(file_name(Path::new("/")), "/");
    }
}
