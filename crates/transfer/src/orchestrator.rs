//! Per-chunk transfer state machine.
//!
//! Drives the probe → (skip | read + upload) loop in strictly ascending
//! chunk order, one chunk outcome at a time. Chunk `i + 1` is never
//! probed before chunk `i` is either confirmed on the server or uploaded,
//! since server-side assembly may be order-sensitive.

use std::path::Path;

use chunkpush_protocol::{CHUNK_SIZE, ChunkPlan};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::TransferError;
use crate::source::ChunkSource;
use crate::transport::{ProbeOutcome, ServerTransport};

/// Progress events emitted while a transfer runs.
///
/// Presentation is the caller's job; the orchestrator only reports what
/// happened to each chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// The server already had this chunk; it was skipped without reading.
    ChunkExists { chunk: u64, total: u64 },
    /// This chunk is about to be uploaded with `bytes` bytes of payload.
    ChunkUploading { chunk: u64, total: u64, bytes: u64 },
}

/// Result of a completed transfer.
#[derive(Debug)]
pub struct TransferReport {
    /// Response body of the final chunk's upload. `None` when the final
    /// chunk was already on the server and nothing was uploaded for it.
    pub final_body: Option<String>,
    /// Chunks uploaded during this run.
    pub uploaded_chunks: u64,
    /// Chunks the server already had.
    pub skipped_chunks: u64,
}

/// Loop state. Aborts are represented by the error return of
/// [`TransferOrchestrator::run`], not by a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Probing { chunk: u64 },
    Done,
}

impl State {
    /// State after `chunk`'s outcome (exists, or uploaded) is known.
    fn advance(chunk: u64, total_chunks: u64) -> State {
        if chunk >= total_chunks {
            State::Done
        } else {
            State::Probing { chunk: chunk + 1 }
        }
    }
}

/// Orchestrates one resumable transfer against a [`ServerTransport`].
pub struct TransferOrchestrator<'a> {
    transport: &'a dyn ServerTransport,
    events_tx: mpsc::Sender<TransferEvent>,
    events_rx: Option<mpsc::Receiver<TransferEvent>>,
}

impl<'a> TransferOrchestrator<'a> {
    /// Creates an orchestrator for the given transport.
    pub fn new(transport: &'a dyn ServerTransport) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            transport,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<TransferEvent>> {
        self.events_rx.take()
    }

    /// Runs the transfer for `file_path` to completion.
    ///
    /// Computes the chunk plan, generates a fresh upload token, then
    /// probes and conditionally uploads every chunk in order. The first
    /// failure of any kind ends the run; re-invoking the client is the
    /// only resume mechanism.
    pub async fn run(&self, file_path: &Path) -> Result<TransferReport, TransferError> {
        let path = file_path.to_path_buf();
        let mut source = tokio::task::spawn_blocking(move || ChunkSource::open(&path, CHUNK_SIZE))
            .await
            .map_err(join_error)??;

        let plan = ChunkPlan::derive(source.file_name(), source.total_size());
        let token = Uuid::new_v4().to_string();
        info!(
            file = %plan.file_name,
            total_size = plan.total_size,
            total_chunks = plan.total_chunks,
            identifier = %plan.identifier,
            "starting transfer"
        );

        let mut uploaded_chunks = 0u64;
        let mut skipped_chunks = 0u64;
        let mut final_body = None;
        let mut state = State::Probing { chunk: 1 };

        while let State::Probing { chunk } = state {
            match self.transport.probe(&plan, chunk, &token).await? {
                ProbeOutcome::Exists => {
                    debug!(chunk, "chunk already on server");
                    skipped_chunks += 1;
                    let _ = self
                        .events_tx
                        .send(TransferEvent::ChunkExists {
                            chunk,
                            total: plan.total_chunks,
                        })
                        .await;
                }
                ProbeOutcome::Missing => {
                    let (returned, payload) = tokio::task::spawn_blocking(move || {
                        let mut src = source;
                        let payload = src.read_chunk(chunk);
                        (src, payload)
                    })
                    .await
                    .map_err(join_error)?;
                    source = returned;
                    let payload = payload?;

                    debug!(chunk, bytes = payload.len(), "uploading chunk");
                    let _ = self
                        .events_tx
                        .send(TransferEvent::ChunkUploading {
                            chunk,
                            total: plan.total_chunks,
                            bytes: payload.len() as u64,
                        })
                        .await;

                    let body = self.transport.upload(&plan, chunk, &token, payload).await?;
                    uploaded_chunks += 1;
                    if chunk == plan.total_chunks {
                        final_body = Some(body);
                    }
                }
                ProbeOutcome::Fatal { status, body } => {
                    return Err(TransferError::ProbeFailed { status, body });
                }
            }
            state = State::advance(chunk, plan.total_chunks);
        }

        info!(uploaded_chunks, skipped_chunks, "transfer complete");
        Ok(TransferReport {
            final_body,
            uploaded_chunks,
            skipped_chunks,
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> TransferError {
    TransferError::Io(std::io::Error::other(e))
}
