pub mod extraction_client;

pub use extraction_client::{classify_result_response, ExtractionClient};
