//! Types used by the upload pipeline

use cairn_core::{UploadFolder, UploadRecord};
use cairn_storage::ByteStream;
use std::fmt;

/// A file as it arrives from the client. `data` is consumed exactly once.
pub struct IncomingFile<'a> {
    /// Client-supplied filename, kept verbatim as the record name
    pub file_name: String,
    /// Declared content type, possibly with MIME parameters
    pub content_type: String,
    /// Folder requested by the caller; inferred from the content type when absent
    pub folder: Option<UploadFolder>,
    pub data: ByteStream<'a>,
}

/// Result of a completed ingest. The record is already persisted.
#[derive(Debug, Clone)]
pub struct IngestedUpload {
    pub record: UploadRecord,
    pub folder: UploadFolder,
    pub size_bytes: u64,
}

impl IngestedUpload {
    pub fn key(&self) -> &str {
        &self.record.remote_key
    }

    pub fn url(&self) -> &str {
        &self.record.remote_url
    }
}

/// Where an ingest call is, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Validating,
    Streaming,
    Persisting,
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Validating => "validating",
            IngestStage::Streaming => "streaming",
            IngestStage::Persisting => "persisting",
            IngestStage::Done => "done",
        };
        f.write_str(name)
    }
}
