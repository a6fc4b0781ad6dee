//! 上传阶段产生的提交记录

use crate::models::Document;
use std::fmt::Display;

/// 上传失败时写入任务 ID 列的标记
pub const UPLOAD_FAILURE_MARKER: &str = "[FAILURE]";
/// 因取消而未上传时写入任务 ID 列的标记
pub const CANCELLED_MARKER: &str = "[CANCELLED]";

/// 任务引用：服务分配的任务 ID，或者没有任务 ID 的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRef {
    /// 上传成功，服务分配的任务 ID
    Assigned(String),
    /// 上传失败，保留底层原因用于排查
    UploadFailed { cause: String },
    /// 运行被取消，文档未上传
    Cancelled,
}

impl Display for JobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRef::Assigned(id) => write!(f, "{}", id),
            JobRef::UploadFailed { .. } => write!(f, "{}", UPLOAD_FAILURE_MARKER),
            JobRef::Cancelled => write!(f, "{}", CANCELLED_MARKER),
        }
    }
}

/// 单个文档的提交记录，每个文档一条
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub document: Document,
    pub job: JobRef,
}

impl SubmissionRecord {
    pub fn new(document: Document, job: JobRef) -> Self {
        Self { document, job }
    }

    /// 需要轮询的任务 ID
    pub fn job_id(&self) -> Option<&str> {
        match &self.job {
            JobRef::Assigned(id) => Some(id),
            _ => None,
        }
    }
}
