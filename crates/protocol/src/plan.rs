//! Chunk plan derivation.

/// Fixed chunk size: 5 MiB.
///
/// Part of the wire contract — the server sizes its per-chunk records
/// around this value, so it is not configurable.
pub const CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Immutable description of how a file splits into chunks.
///
/// Derived once per run from the file's size and base name; every probe
/// and upload request is built from the same plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Base file name, no directory component.
    pub file_name: String,
    /// Total file size in bytes.
    pub total_size: u64,
    /// Size of every chunk except possibly the last, in bytes.
    pub chunk_size: u64,
    /// Number of chunks, always at least 1.
    pub total_chunks: u64,
    /// Transfer identifier: `{total_size}-{file_name}`.
    pub identifier: String,
}

impl ChunkPlan {
    /// Derives the plan for a file of `total_size` bytes.
    ///
    /// The chunk count is floor division plus one, not ceiling division:
    /// a size that is an exact multiple of [`CHUNK_SIZE`] gets a trailing
    /// zero-byte chunk. Existing servers count chunks this way, so the
    /// formula must not be "fixed".
    pub fn derive(file_name: &str, total_size: u64) -> Self {
        let total_chunks = total_size / CHUNK_SIZE + 1;
        Self {
            file_name: file_name.to_string(),
            total_size,
            chunk_size: CHUNK_SIZE,
            total_chunks,
            identifier: format!("{total_size}-{file_name}"),
        }
    }
}
