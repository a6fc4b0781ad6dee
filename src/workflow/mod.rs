pub mod document_ctx;

pub use document_ctx::DocumentCtx;
