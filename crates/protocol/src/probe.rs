//! Probe status classification.

/// Which HTTP status the server uses to signal "chunk absent, upload it".
///
/// Deployed servers disagree: some answer the probe with 404 for an
/// unknown chunk, others with 400. The convention is part of the target
/// server's contract, so it is a configuration option rather than a
/// hard-coded guess. 404 is the more common convention and the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingStatus {
    /// HTTP 404 means the chunk is absent.
    #[default]
    NotFound,
    /// HTTP 400 means the chunk is absent.
    BadRequest,
}

impl MissingStatus {
    /// The status code this convention treats as "chunk absent".
    pub fn code(self) -> u16 {
        match self {
            MissingStatus::NotFound => 404,
            MissingStatus::BadRequest => 400,
        }
    }

    /// Parses a status code into a convention, if it is one of the two.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            404 => Some(MissingStatus::NotFound),
            400 => Some(MissingStatus::BadRequest),
            _ => None,
        }
    }
}

/// Three-way classification of a probe response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeClass {
    /// The server already has this chunk.
    Exists,
    /// The server does not have this chunk; upload it.
    Missing,
    /// Anything else. The whole transfer aborts.
    Fatal,
}

/// Classifies a probe response status under the given convention.
pub fn classify(status: u16, missing: MissingStatus) -> ProbeClass {
    if status == 200 {
        ProbeClass::Exists
    } else if status == missing.code() {
        ProbeClass::Missing
    } else {
        ProbeClass::Fatal
    }
}
