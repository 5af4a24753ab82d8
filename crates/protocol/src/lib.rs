//! Wire protocol vocabulary for the resumable chunk upload endpoint.
//!
//! Everything here is pure data: the chunk plan derivation, the query
//! parameter names both request kinds use, and the mapping from probe
//! response statuses to outcomes. No I/O and no async.

pub mod params;
pub mod plan;
pub mod probe;

pub use plan::{CHUNK_SIZE, ChunkPlan};
pub use probe::{MissingStatus, ProbeClass};
