//! 批量文档处理器 - 编排层
//!
//! ## 职责
//!
//! 把文档列表按固定大小切分成批次，逐批完成"上传 → 等待结果 → 导出"。
//!
//! ## 核心流程（每批）
//!
//! 1. **上传**：批内文档并发上传（Semaphore 限流），单个失败只记录失败标记
//! 2. **等待结果**：全部上传结束后并发轮询，失败标记直接生成失败结果
//! 3. **组装**：按原始顺序生成导出行
//! 4. **导出**：写出本批 CSV，并累积到汇总结果
//!
//! 批次之间严格串行；全部结束（或被取消）后写出汇总 CSV。
//! 只有认证错误和导出错误会中断运行。

use crate::clients::ExtractionClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Document, ExportRow, JobOutcome, JobRef, SubmissionRecord};
use crate::orchestrator::document_processor;
use crate::services::tabular_exporter::FULL_LABEL;
use crate::services::{ResultPoller, TabularExporter};
use crate::utils::logging;
use crate::workflow::DocumentCtx;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// 把列表切分为批次：除最后一批外每批恰好 `batch_size` 个，保持原顺序
pub fn partition<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    items.chunks(batch_size.max(1)).collect()
}

/// 批次数量：`ceil(count / batch_size)`
pub fn batch_count(count: usize, batch_size: usize) -> usize {
    count.div_ceil(batch_size.max(1))
}

/// 一次运行的结果汇总
#[derive(Debug, Default)]
pub struct RunReport {
    /// 输入文档总数
    pub total: usize,
    /// 已完成导出的批次数
    pub batches_processed: usize,
    /// 所有已处理文档的导出行（原始顺序）
    pub rows: Vec<ExportRow>,
    /// 运行是否被取消
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.rows.iter().filter(|row| row.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.rows.len() - self.succeeded()
    }
}

/// 批量编排器
pub struct BatchOrchestrator {
    client: Arc<ExtractionClient>,
    poller: Arc<ResultPoller>,
    exporter: TabularExporter,
    batch_size: usize,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    /// 创建批量编排器
    pub fn new(
        client: Arc<ExtractionClient>,
        poller: Arc<ResultPoller>,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            poller,
            exporter: TabularExporter::new(config.output_dir.clone()),
            batch_size: config.batch_size,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            cancel,
        }
    }

    /// 处理全部文档
    pub async fn run(&self, documents: Vec<Document>) -> AppResult<RunReport> {
        let total = documents.len();
        let batches = partition(&documents, self.batch_size);
        let total_batches = batches.len();

        logging::log_documents_loaded(total, self.batch_size, total_batches);

        let mut report = RunReport {
            total,
            ..Default::default()
        };

        for (batch_index, batch) in batches.into_iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("⚠️ 运行已取消，跳过剩余 {} 个批次", total_batches - batch_index);
                break;
            }

            let start = batch_index * self.batch_size;
            logging::log_batch_start(batch_index, total_batches, start + 1, start + batch.len(), total);

            let rows = self.process_batch(batch_index, batch).await?;
            self.exporter.export_batch(&rows, &batch_index.to_string())?;

            let success = rows.iter().filter(|row| row.is_success()).count();
            logging::log_batch_complete(batch_index, success, rows.len());

            report.batches_processed += 1;
            report.rows.extend(rows);
        }

        report.cancelled = self.cancel.is_cancelled();
        self.exporter.export_batch(&report.rows, FULL_LABEL)?;

        Ok(report)
    }

    /// 处理单个批次，返回按原顺序排列的导出行
    async fn process_batch(
        &self,
        batch_index: usize,
        batch: &[Document],
    ) -> AppResult<Vec<ExportRow>> {
        let records = self.submit_batch(batch_index, batch).await?;
        let outcomes = self.resolve_batch(batch_index, &records).await?;

        Ok(records
            .iter()
            .zip(outcomes)
            .map(|(record, outcome)| ExportRow::from_outcome(record, outcome))
            .collect())
    }

    /// 阶段 1：并发上传本批文档
    async fn submit_batch(
        &self,
        batch_index: usize,
        batch: &[Document],
    ) -> AppResult<Vec<SubmissionRecord>> {
        let mut handles = Vec::with_capacity(batch.len());

        for (idx, document) in batch.iter().enumerate() {
            let ctx = DocumentCtx::new(batch_index, idx + 1);
            let semaphore = self.semaphore.clone();
            let client = self.client.clone();
            let cancel = self.cancel.clone();
            let document = document.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                document_processor::submit_document(&client, document, ctx, &cancel).await
            });
            handles.push((ctx, handle));
        }

        join_in_order(handles, |idx, e| {
            SubmissionRecord::new(
                batch[idx].clone(),
                JobRef::UploadFailed {
                    cause: e.to_string(),
                },
            )
        })
        .await
    }

    /// 阶段 2：并发等待本批任务结果
    async fn resolve_batch(
        &self,
        batch_index: usize,
        records: &[SubmissionRecord],
    ) -> AppResult<Vec<JobOutcome>> {
        let mut handles = Vec::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            let ctx = DocumentCtx::new(batch_index, idx + 1);
            let semaphore = self.semaphore.clone();
            let poller = self.poller.clone();
            let cancel = self.cancel.clone();
            let record = record.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                document_processor::resolve_document(&poller, &record, ctx, &cancel).await
            });
            handles.push((ctx, handle));
        }

        join_in_order(handles, |_, e| JobOutcome::Failed(e.to_string())).await
    }
}

/// 按原顺序等待任务结果
///
/// 遇到致命错误或任务 panic 时中止其余任务；panic 原样向上抛出。
/// 被中止的任务交给 `on_aborted` 生成占位结果。
async fn join_in_order<T>(
    handles: Vec<(DocumentCtx, JoinHandle<AppResult<T>>)>,
    on_aborted: impl Fn(usize, JoinError) -> T,
) -> AppResult<Vec<T>> {
    let mut results = Vec::with_capacity(handles.len());
    let mut pending = handles.into_iter().enumerate();

    while let Some((idx, (ctx, handle))) = pending.next() {
        match handle.await {
            Ok(Ok(value)) => results.push(value),
            Ok(Err(e)) => {
                abort_all(pending.by_ref().map(|(_, (_, handle))| handle));
                return Err(e);
            }
            Err(e) if e.is_panic() => {
                error!("{} 任务 panic，中止本批剩余任务", ctx);
                abort_all(pending.by_ref().map(|(_, (_, handle))| handle));
                std::panic::resume_unwind(e.into_panic());
            }
            Err(e) => {
                error!("{} 任务被中止: {}", ctx, e);
                results.push(on_aborted(idx, e));
            }
        }
    }

    Ok(results)
}

fn abort_all<T>(handles: impl Iterator<Item = JoinHandle<T>>) {
    for handle in handles {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AuthError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    fn auth_error() -> AppError {
        AuthError::Rejected {
            endpoint: "/token".to_string(),
            status: 401,
            body: "denied".to_string(),
        }
        .into()
    }

    #[test]
    fn test_partition_sizes_and_order() {
        let items: Vec<usize> = (0..7).collect();

        let batches = partition(&items, 3);

        assert_eq!(batches.len(), batch_count(items.len(), 3));
        assert_eq!(batches, vec![&[0, 1, 2][..], &[3, 4, 5][..], &[6][..]]);
        let rejoined: Vec<usize> = batches.concat();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn test_partition_exact_multiple() {
        let items: Vec<usize> = (0..6).collect();
        let batches = partition(&items, 2);
        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|b| b.len() == 2));
    }

    #[test]
    fn test_batch_count_is_ceiling() {
        for n in 0..20 {
            for b in 1..6 {
                let expected = (n + b - 1) / b;
                assert_eq!(batch_count(n, b), expected);
                let items: Vec<usize> = (0..n).collect();
                let batches = partition(&items, b);
                assert_eq!(batches.len(), expected);
                if let Some((last, full)) = batches.split_last() {
                    assert!(full.iter().all(|batch| batch.len() == b));
                    assert!(!last.is_empty() && last.len() <= b);
                }
            }
        }
    }

    #[test]
    fn test_empty_input_has_no_batches() {
        let items: Vec<usize> = Vec::new();
        assert!(partition(&items, 4).is_empty());
        assert_eq!(batch_count(0, 4), 0);
    }

    #[tokio::test]
    async fn test_join_in_order_keeps_input_order() {
        let handles = (0..4u64)
            .map(|i| {
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(20 - i * 5)).await;
                    Ok::<_, AppError>(i)
                });
                (DocumentCtx::new(0, i as usize + 1), handle)
            })
            .collect();

        let results = join_in_order(handles, |idx, _| idx as u64).await.unwrap();
        assert_eq!(results, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_join_in_order_aborts_remaining_on_fatal_error() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = finished.clone();

        let failing = tokio::spawn(async { Err::<(), _>(auth_error()) });
        let slow = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, AppError>(())
        });
        let handles = vec![
            (DocumentCtx::new(0, 1), failing),
            (DocumentCtx::new(0, 2), slow),
        ];

        let err = join_in_order(handles, |_, _| ()).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    #[should_panic(expected = "token state corrupted")]
    async fn test_join_in_order_propagates_task_panic() {
        let handle = tokio::spawn(async {
            if true {
                panic!("token state corrupted");
            }
            Ok::<_, AppError>(())
        });

        let _ = join_in_order(vec![(DocumentCtx::new(0, 1), handle)], |_, _| ()).await;
    }

    #[tokio::test]
    async fn test_join_in_order_fills_aborted_tasks() {
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>("done")
        });
        handle.abort();

        let results = join_in_order(vec![(DocumentCtx::new(0, 1), handle)], |_, _| "aborted")
            .await
            .unwrap();
        assert_eq!(results, vec!["aborted"]);
    }
}
