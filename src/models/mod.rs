pub mod document;
pub mod export_row;
pub mod loaders;
pub mod outcome;
pub mod submission;

pub use document::Document;
pub use export_row::ExportRow;
pub use loaders::load_documents;
pub use outcome::{
    FlatRecord, JobOutcome, PollOutcome, CANCELLED_MESSAGE, TIMEOUT_MESSAGE, UPLOAD_FAILED_MESSAGE,
};
pub use submission::{JobRef, SubmissionRecord};
