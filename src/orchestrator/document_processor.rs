//! 单个文档处理器 - 编排层
//!
//! 一个文档在批次中经历两步：上传拿到任务 ID，然后等待结果。
//! 两步之间由 batch_processor 统一调度，这里只处理单个文档。

use crate::clients::ExtractionClient;
use crate::error::AppResult;
use crate::models::{
    Document, JobOutcome, JobRef, SubmissionRecord, CANCELLED_MESSAGE, UPLOAD_FAILED_MESSAGE,
};
use crate::services::ResultPoller;
use crate::workflow::DocumentCtx;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 上传单个文档
///
/// 上传失败被记录为失败标记，只有致命错误会返回 Err。
pub async fn submit_document(
    client: &ExtractionClient,
    document: Document,
    ctx: DocumentCtx,
    cancel: &CancellationToken,
) -> AppResult<SubmissionRecord> {
    if cancel.is_cancelled() {
        warn!("{} 运行已取消，跳过上传: {}", ctx, document.display_name());
        return Ok(SubmissionRecord::new(document, JobRef::Cancelled));
    }

    info!("{} 📤 正在上传: {}", ctx, document.path().display());

    match client.upload(&document).await {
        Ok(job_id) => {
            info!("{} ✓ 上传成功 (ID: {})", ctx, job_id);
            Ok(SubmissionRecord::new(document, JobRef::Assigned(job_id)))
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            error!("{} ❌ 上传失败 {}: {}", ctx, document.display_name(), e);
            Ok(SubmissionRecord::new(
                document,
                JobRef::UploadFailed {
                    cause: e.to_string(),
                },
            ))
        }
    }
}

/// 获取单个文档的最终结果
///
/// 没有任务 ID 的记录不会发起查询。
pub async fn resolve_document(
    poller: &ResultPoller,
    record: &SubmissionRecord,
    ctx: DocumentCtx,
    cancel: &CancellationToken,
) -> AppResult<JobOutcome> {
    let job_id = match &record.job {
        JobRef::Assigned(job_id) => job_id,
        JobRef::UploadFailed { cause } => {
            info!("{} 跳过查询，上传失败原因: {}", ctx, cause);
            return Ok(JobOutcome::failed(UPLOAD_FAILED_MESSAGE));
        }
        JobRef::Cancelled => return Ok(JobOutcome::failed(CANCELLED_MESSAGE)),
    };

    if cancel.is_cancelled() {
        warn!("{} 运行已取消，跳过查询任务 {}", ctx, job_id);
        return Ok(JobOutcome::failed(CANCELLED_MESSAGE));
    }

    info!(
        "{} 🔍 正在获取结果: {} (ID: {})",
        ctx,
        record.document.display_name(),
        job_id
    );

    let outcome = poller.poll(job_id, &ctx).await?;
    match &outcome {
        JobOutcome::Succeeded(fields) => {
            info!("{} ✓ 识别完成，共 {} 个字段", ctx, fields.len())
        }
        JobOutcome::Failed(message) => warn!("{} ⚠️ 识别失败: {}", ctx, message),
    }

    Ok(outcome)
}
