//! HTTP transport for probe and upload calls.
//!
//! `ServerTransport` is a trait so the orchestrator stays decoupled from
//! the network and testable with mocks; `HttpTransport` is the `reqwest`
//! implementation speaking the actual wire protocol.

use std::future::Future;
use std::pin::Pin;

use chunkpush_protocol::probe::{MissingStatus, ProbeClass, classify};
use chunkpush_protocol::{ChunkPlan, params};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::debug;

use crate::TransferError;

/// Outcome of probing the server for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server already has this chunk.
    Exists,
    /// The server does not have this chunk; upload it.
    Missing,
    /// Any other response. Carries the server's diagnostic body.
    Fatal { status: u16, body: String },
}

/// Abstract server endpoint for one transfer.
///
/// Implementations carry the base URL and credential; the orchestrator
/// only supplies per-chunk data.
pub trait ServerTransport: Send + Sync {
    /// Asks the server whether chunk `chunk` is already present.
    ///
    /// Read-only: no chunk bytes are sent.
    fn probe<'a>(
        &'a self,
        plan: &'a ChunkPlan,
        chunk: u64,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ProbeOutcome, TransferError>> + Send + 'a>>;

    /// Uploads chunk `chunk`'s bytes. Returns the server's response body.
    fn upload<'a>(
        &'a self,
        plan: &'a ChunkPlan,
        chunk: u64,
        token: &'a str,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransferError>> + Send + 'a>>;
}

/// `reqwest`-backed transport.
#[derive(Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    missing: MissingStatus,
}

impl HttpTransport {
    /// Creates a transport for `base_url`.
    ///
    /// The credential is sent verbatim in the `Authorization` header of
    /// every request. `missing` selects which probe status the target
    /// server uses for "chunk absent".
    pub fn new(
        base_url: &str,
        api_key: &str,
        missing: MissingStatus,
    ) -> Result<Self, TransferError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(api_key).map_err(|_| TransferError::InvalidApiKey)?,
        );

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            missing,
        })
    }

    async fn probe_impl(
        &self,
        plan: &ChunkPlan,
        chunk: u64,
        token: &str,
    ) -> Result<ProbeOutcome, TransferError> {
        let resp = self
            .http
            .get(&self.base_url)
            .query(&params::probe_params(plan, chunk, token))
            .send()
            .await?;
        let status = resp.status().as_u16();
        debug!(chunk, status, "probe response");

        match classify(status, self.missing) {
            ProbeClass::Exists => Ok(ProbeOutcome::Exists),
            ProbeClass::Missing => Ok(ProbeOutcome::Missing),
            ProbeClass::Fatal => {
                let body = resp.text().await.unwrap_or_default();
                Ok(ProbeOutcome::Fatal { status, body })
            }
        }
    }

    async fn upload_impl(
        &self,
        plan: &ChunkPlan,
        chunk: u64,
        token: &str,
        payload: Vec<u8>,
    ) -> Result<String, TransferError> {
        let part = reqwest::multipart::Part::bytes(payload)
            .file_name(plan.file_name.clone())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(&self.base_url)
            .query(&params::upload_params(plan, chunk, token))
            .multipart(form)
            .send()
            .await?;
        let status = resp.status().as_u16();
        debug!(chunk, status, "upload response");

        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransferError::UploadFailed { status, body });
        }
        // The 200 body is the transfer result, not a diagnostic; a failure
        // reading it must fail the run.
        Ok(resp.text().await?)
    }
}

impl ServerTransport for HttpTransport {
    fn probe<'a>(
        &'a self,
        plan: &'a ChunkPlan,
        chunk: u64,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ProbeOutcome, TransferError>> + Send + 'a>> {
        Box::pin(self.probe_impl(plan, chunk, token))
    }

    fn upload<'a>(
        &'a self,
        plan: &'a ChunkPlan,
        chunk: u64,
        token: &'a str,
        payload: Vec<u8>,
    ) -> Pin<Box<dyn Future<Output = Result<String, TransferError>> + Send + 'a>> {
        Box::pin(self.upload_impl(plan, chunk, token, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn builds_with_a_plain_credential() {
        assert!(HttpTransport::new("http://localhost:8080", "key-123", MissingStatus::NotFound).is_ok());
    }

    #[test]
    fn rejects_credentials_that_cannot_be_a_header() {
        let err = HttpTransport::new("http://localhost:8080", "bad\nkey", MissingStatus::NotFound)
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidApiKey));
    }

    /// Serves exactly one connection: reads the full request, writes
    /// `response` verbatim, and closes. Returns the base URL.
    async fn serve_once(response: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = response.to_string();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 16 * 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    /// True once `request` holds the full head and, per its framing
    /// headers, the full body.
    fn request_complete(request: &[u8]) -> bool {
        let Some(head_end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..head_end]);
        let body = &request[head_end + 4..];
        for line in head.lines() {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(len) = value.trim().parse::<usize>() {
                    return body.len() >= len;
                }
            }
            if name.eq_ignore_ascii_case("transfer-encoding")
                && value.trim().eq_ignore_ascii_case("chunked")
            {
                return body.ends_with(b"0\r\n\r\n");
            }
        }
        true
    }

    fn sample_plan() -> ChunkPlan {
        ChunkPlan::derive("a.bin", 4)
    }

    #[tokio::test]
    async fn upload_returns_the_success_body() {
        let base = serve_once("HTTP/1.1 200 OK\r\ncontent-length: 7\r\n\r\nfile-42").await;
        let transport = HttpTransport::new(&base, "k", MissingStatus::NotFound).unwrap();

        let body = transport
            .upload(&sample_plan(), 1, "tok", b"data".to_vec())
            .await
            .unwrap();
        assert_eq!(body, "file-42");
    }

    #[tokio::test]
    async fn upload_failure_carries_status_and_body() {
        let base =
            serve_once("HTTP/1.1 500 Internal Server Error\r\ncontent-length: 4\r\n\r\nboom")
                .await;
        let transport = HttpTransport::new(&base, "k", MissingStatus::NotFound).unwrap();

        let err = transport
            .upload(&sample_plan(), 1, "tok", b"data".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::UploadFailed { status: 500, ref body } if body == "boom"
        ));
    }

    #[tokio::test]
    async fn truncated_success_body_fails_the_upload() {
        // 200 status, but the connection closes before the promised body
        // arrives. The result body is part of the contract, so this must
        // surface as an error, not as an empty success.
        let base = serve_once("HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\npartial").await;
        let transport = HttpTransport::new(&base, "k", MissingStatus::NotFound).unwrap();

        let err = transport
            .upload(&sample_plan(), 1, "tok", b"data".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Transport(_)));
    }

    #[tokio::test]
    async fn probe_classifies_over_http() {
        let base = serve_once("HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n").await;
        let transport = HttpTransport::new(&base, "k", MissingStatus::NotFound).unwrap();

        let outcome = transport.probe(&sample_plan(), 1, "tok").await.unwrap();
        assert_eq!(outcome, ProbeOutcome::Missing);
    }
}
