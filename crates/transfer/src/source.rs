//! Chunk-oriented file reader.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::TransferError;

/// Reads one chunk of a file at a time, by 1-based chunk index.
///
/// The file is opened once and kept for the whole run. Each read seeks to
/// the chunk's byte offset explicitly, so chunks the server already has
/// can be skipped without desynchronizing a cursor. The handle is
/// released on drop, whichever way the run ends.
#[derive(Debug)]
pub struct ChunkSource {
    file: std::fs::File,
    chunk_size: u64,
    file_name: String,
    total_size: u64,
}

impl ChunkSource {
    /// Opens `path` for chunked reading.
    ///
    /// Fails with [`TransferError::FileNotFound`] if the path does not
    /// resolve to an existing regular file.
    pub fn open(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let not_found = || TransferError::FileNotFound(path.display().to_string());

        let metadata = std::fs::metadata(path).map_err(|_| not_found())?;
        if !metadata.is_file() {
            return Err(not_found());
        }
        let file_name = path
            .file_name()
            .ok_or_else(not_found)?
            .to_string_lossy()
            .into_owned();
        let file = std::fs::File::open(path)?;

        Ok(Self {
            file,
            chunk_size,
            file_name,
            total_size: metadata.len(),
        })
    }

    /// Reads chunk `chunk` (1-based): up to `chunk_size` bytes starting at
    /// byte offset `(chunk - 1) * chunk_size`.
    ///
    /// Short only for the final chunk; zero-length when the offset sits at
    /// or past end of file (the trailing chunk of an exact-multiple size).
    ///
    /// # Panics
    ///
    /// Chunk indexes are 1-based; debug builds panic on `chunk == 0`.
    pub fn read_chunk(&mut self, chunk: u64) -> Result<Vec<u8>, TransferError> {
        debug_assert!(chunk >= 1, "chunk indexes are 1-based");
        let offset = (chunk - 1) * self.chunk_size;
        self.file.seek(SeekFrom::Start(offset))?;

        let mut data = Vec::with_capacity(self.chunk_size as usize);
        (&mut self.file)
            .take(self.chunk_size)
            .read_to_end(&mut data)?;
        Ok(data)
    }

    /// Base file name, no directory component.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Total file size in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}
