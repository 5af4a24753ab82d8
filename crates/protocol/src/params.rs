//! Query parameter construction for probe and upload requests.
//!
//! Both request kinds address the same endpoint; they differ only in
//! method and in how much of the chunk metadata travels in the query
//! string. Parameter names follow the resumable.js convention the server
//! speaks.

use crate::plan::ChunkPlan;

pub const CHUNK_NUMBER: &str = "resumableChunkNumber";
pub const FILENAME: &str = "resumableFilename";
pub const CHUNK_SIZE_PARAM: &str = "resumableChunkSize";
pub const TOTAL_SIZE: &str = "resumableTotalSize";
pub const IDENTIFIER: &str = "resumableIdentifier";
pub const TOTAL_CHUNKS: &str = "resumableTotalChunks";
pub const UPLOAD_TOKEN: &str = "uploadToken";

/// Parameters for the existence probe of chunk `chunk`.
///
/// Everything but the chunk count — the probe is a read-only lookup and
/// the server never materializes a record from it.
pub fn probe_params(plan: &ChunkPlan, chunk: u64, token: &str) -> Vec<(&'static str, String)> {
    vec![
        (CHUNK_NUMBER, chunk.to_string()),
        (FILENAME, plan.file_name.clone()),
        (CHUNK_SIZE_PARAM, plan.chunk_size.to_string()),
        (TOTAL_SIZE, plan.total_size.to_string()),
        (IDENTIFIER, plan.identifier.clone()),
        (UPLOAD_TOKEN, token.to_string()),
    ]
}

/// Parameters for the upload of chunk `chunk`.
///
/// The full metadata set, including the chunk count, so the server can
/// create the chunk record and detect transfer completion.
pub fn upload_params(plan: &ChunkPlan, chunk: u64, token: &str) -> Vec<(&'static str, String)> {
    let mut params = probe_params(plan, chunk, token);
    params.insert(5, (TOTAL_CHUNKS, plan.total_chunks.to_string()));
    params
}
