//! 导出行

use crate::models::{FlatRecord, JobOutcome, SubmissionRecord};

/// 成功行的状态信息
pub const SUCCESS_STATUS: &str = "[SUCCESS]";

/// 一行导出数据，由提交记录和最终结果组合而成
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub file_path: String,
    pub job_ref: String,
    pub status_message: String,
    pub fields: FlatRecord,
}

impl ExportRow {
    /// 根据提交记录和任务结果构建导出行
    pub fn from_outcome(record: &SubmissionRecord, outcome: JobOutcome) -> Self {
        let (status_message, fields) = match outcome {
            JobOutcome::Succeeded(fields) => (SUCCESS_STATUS.to_string(), fields),
            JobOutcome::Failed(message) => (
                format!("[FAILURE] Err. Msg.: {}", message),
                FlatRecord::new(),
            ),
        };

        Self {
            file_path: record.document.display_name().to_string(),
            job_ref: record.job.to_string(),
            status_message,
            fields,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_message == SUCCESS_STATUS
    }
}
