//! Resumable chunked upload core.
//!
//! Splits a local file into fixed-size chunks, probes the server for each
//! chunk's existence, and uploads only the chunks the server is missing.
//! Resumption is re-running the client: the plan is recomputed and probing
//! restarts from chunk 1, with the server's own per-chunk bookkeeping
//! short-circuiting everything already delivered.
//!
//! The core performs no printing and no process exits; callers get a
//! [`TransferReport`] or a [`TransferError`] and progress events over a
//! channel.

mod orchestrator;
mod source;
mod transport;

pub use orchestrator::{TransferEvent, TransferOrchestrator, TransferReport};
pub use source::ChunkSource;
pub use transport::{HttpTransport, ProbeOutcome, ServerTransport};

/// Errors produced by the transfer crate.
///
/// Every variant is terminal for the run: nothing is retried and nothing
/// is downgraded to a warning.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("file doesn't exist: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid api key")]
    InvalidApiKey,

    #[error("probe failed with status {status}: {body}")]
    ProbeFailed { status: u16, body: String },

    #[error("upload failed with status {status}: {body}")]
    UploadFailed { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
