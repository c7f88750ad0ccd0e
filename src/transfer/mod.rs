//! Multipart upload to the text-extraction endpoint
//!
//! The file body is streamed in fixed-size chunks; every chunk handed to the
//! transport is reported as progress. Once the last chunk is out the server is
//! considered to be processing.

use bytes::Bytes;
use futures_util::{stream, Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::widget::state::SelectedFile;

pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Progress { sent: u64, total: u64 },
    BodySent,
}

pub type ProgressSink = Arc<dyn Fn(TransferEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    endpoint: String,
    field_name: String,
}

impl Uploader {
    pub fn new(
        endpoint: impl Into<String>,
        field_name: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UploadError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            field_name: field_name.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `file` and return the raw response body on a 2xx status
    pub async fn upload(&self, file: &SelectedFile, sink: ProgressSink) -> Result<String, UploadError> {
        let start = Instant::now();
        let data = tokio::fs::read(&file.path)
            .await
            .map_err(|source| UploadError::Read {
                path: file.path.clone(),
                source,
            })?;
        let total = data.len() as u64;

        info!(
            endpoint = %self.endpoint,
            file_name = %file.name,
            media_type = %file.media_type,
            file_size = total,
            "Starting upload"
        );

        if total == 0 {
            sink(TransferEvent::BodySent);
        }

        let body = reqwest::Body::wrap_stream(progress_stream(Bytes::from(data), sink));
        let part = Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| UploadError::Request(e.to_string()))?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = match self.client.post(&self.endpoint).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Upload transport failure");
                return Err(UploadError::Transport(e));
            }
        };

        let status = response.status();
        let body = response.text().await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if status.is_success() {
            info!(status = status.as_u16(), text_length = body.len(), elapsed_ms, "Upload completed");
            Ok(body)
        } else {
            warn!(status = status.as_u16(), elapsed_ms, "Server rejected upload");
            Err(UploadError::Server {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Chunked body stream that reports bytes as the transport pulls them
pub fn progress_stream(
    data: Bytes,
    sink: ProgressSink,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + UPLOAD_CHUNK_SIZE).min(data.len())))
        .collect();
    debug!(chunks = chunks.len(), total, "Prepared upload body");

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        sink(TransferEvent::Progress { sent, total });
        if sent == total {
            sink(TransferEvent::BodySent);
        }
        Ok(chunk)
    })
}
