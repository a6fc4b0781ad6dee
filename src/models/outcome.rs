//! 轮询结果

use serde_json::{Map, Value as JsonValue};

/// 展平后的结果：点号路径 -> 叶子值
pub type FlatRecord = Map<String, JsonValue>;

/// 单次查询的结果
///
/// `Pending` 只在轮询循环内部出现。
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// 识别完成，携带 `Data.Result` 原始结构
    Success(JsonValue),
    /// 服务明确返回失败
    Failure(String),
    /// 仍在处理中
    Pending,
}

/// 单个任务的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// 成功，携带展平后的字段
    Succeeded(FlatRecord),
    /// 失败，携带错误信息
    Failed(String),
}

impl JobOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        JobOutcome::Failed(message.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded(_))
    }
}

/// 超过最大轮询次数时的失败信息
pub const TIMEOUT_MESSAGE: &str = "timeout";
/// 上传失败时的失败信息
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload file";
/// 运行被取消时的失败信息
pub const CANCELLED_MESSAGE: &str = "cancelled";
