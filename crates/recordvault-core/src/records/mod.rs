//! Protected records: request types and the record pipeline.

pub mod pipeline;
pub mod request;

pub use pipeline::{DecryptedRecord, PayloadOutcome, RecordPipeline, RecordView};
pub use request::{LoginRequest, RecordRequest};
