use crate::clients::ExtractionClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{SystemClock, TokenManager};
use crate::models::{self, Document};
use crate::orchestrator::{BatchOrchestrator, RunReport};
use crate::services::ResultPoller;
use crate::utils::logging;
use reqwest::Client;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: BatchOrchestrator,
    cancel: CancellationToken,
}

impl App {
    /// 初始化应用
    ///
    /// 组装 TokenManager、识别服务客户端、轮询服务和批量编排器。
    pub fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(&config.base_url, config.max_concurrent_requests);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(AppError::HttpClient)?;

        let cancel = CancellationToken::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            &config,
            Arc::new(SystemClock),
        ));
        let client = Arc::new(ExtractionClient::new(http, &config, tokens));
        let poller = Arc::new(ResultPoller::new(client.clone(), &config, cancel.clone()));
        let orchestrator = BatchOrchestrator::new(client, poller, &config, cancel.clone());

        Ok(Self {
            config,
            orchestrator,
            cancel,
        })
    }

    /// 取消令牌，触发后不再发起新的上传 / 查询
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// 运行应用主逻辑：加载输入目录中的文档并逐批处理
    pub async fn run(&self) -> AppResult<RunReport> {
        info!("\n📁 正在扫描待处理的文档...");
        let documents = models::load_documents(&self.config.invoices_path).await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的文档");
        }

        self.run_documents(documents).await
    }

    /// 处理给定的文档列表
    pub async fn run_documents(&self, documents: Vec<Document>) -> AppResult<RunReport> {
        let report = self.orchestrator.run(documents).await?;

        logging::print_final_stats(
            report.succeeded(),
            report.failed(),
            report.total,
            report.cancelled,
        );
        info!("\n结果已保存至: {}", self.config.output_dir.display());

        Ok(report)
    }
}
