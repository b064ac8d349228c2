//! Upload ingestion
//!
//! One incoming file goes through the stages in [`IngestStage`]: the declared
//! content type picks a folder, the stream is written to storage under a
//! freshly derived key with a byte ceiling, and a record is persisted only
//! after the write completed.

mod limit;
mod pipeline;
mod types;

pub use limit::{LimitProbe, SizeLimitedStream};
pub use pipeline::UploadPipeline;
pub use types::{IncomingFile, IngestStage, IngestedUpload};
