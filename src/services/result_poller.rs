//! 结果轮询服务 - 业务能力层
//!
//! 只负责"等一个任务结束"，不关心批次
//!
//! 状态机：`Waiting -> {Succeeded, Failed}`
//! - 每次查询返回 Pending 时等待固定间隔后重试
//! - 达到最大次数仍为 Pending 时以 "timeout" 失败
//! - 等待期间收到取消信号时以 "cancelled" 失败

use crate::clients::ExtractionClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{JobOutcome, PollOutcome, CANCELLED_MESSAGE, TIMEOUT_MESSAGE};
use crate::services::flattener;
use crate::workflow::DocumentCtx;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 结果轮询服务
pub struct ResultPoller {
    client: Arc<ExtractionClient>,
    interval: Duration,
    max_attempts: usize,
    cancel: CancellationToken,
}

impl ResultPoller {
    /// 创建新的轮询服务
    pub fn new(client: Arc<ExtractionClient>, config: &Config, cancel: CancellationToken) -> Self {
        Self {
            client,
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts.max(1),
            cancel,
        }
    }

    /// 轮询单个任务直到结束
    ///
    /// 只有致命错误（认证失败）会返回 Err，其余情况都收敛为 `JobOutcome`。
    pub async fn poll(&self, job_id: &str, ctx: &DocumentCtx) -> AppResult<JobOutcome> {
        for attempt in 1..=self.max_attempts {
            let outcome = match self.client.fetch_result(job_id).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("{} ⚠️ 查询任务 {} 失败: {}", ctx, job_id, e);
                    return Ok(JobOutcome::Failed(e.to_string()));
                }
            };

            match outcome {
                PollOutcome::Success(result) => {
                    return Ok(JobOutcome::Succeeded(flattener::flatten_value(result)));
                }
                PollOutcome::Failure(message) => return Ok(JobOutcome::Failed(message)),
                PollOutcome::Pending => {}
            }

            if attempt == self.max_attempts {
                break;
            }

            debug!(
                "{} 任务 {} 处理中 (尝试 {}/{})，{} 秒后重试",
                ctx,
                job_id,
                attempt,
                self.max_attempts,
                self.interval.as_secs()
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!("{} 运行已取消，停止轮询任务 {}", ctx, job_id);
                    return Ok(JobOutcome::failed(CANCELLED_MESSAGE));
                }
                _ = sleep(self.interval) => {}
            }
        }

        warn!(
            "{} ⚠️ 任务 {} 在 {} 次查询后仍未完成",
            ctx, job_id, self.max_attempts
        );
        Ok(JobOutcome::failed(TIMEOUT_MESSAGE))
    }
}
