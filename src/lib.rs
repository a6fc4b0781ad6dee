//! # Fatura Batch Runner
//!
//! 批量把文档提交到远程异步识别服务，等待结果并导出为 CSV
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有共享资源，只暴露能力
//! - `TokenManager` - 唯一的凭证 owner，提供 current_access_token() 能力
//!
//! ### ② 客户端层（Clients）
//! - `ExtractionClient` - 上传文档、查询结果、响应分类
//!
//! ### ③ 业务能力层（Services）
//! - `flattener` - 嵌套结果展平
//! - `ResultPoller` - 单个任务的轮询等待
//! - `TabularExporter` - CSV 导出
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批次切分、批内并发、逐批导出
//! - `orchestrator/document_processor` - 单个文档的上传与结果获取
//!
//! ## 输出
//! - 每批一个 `responses_{批次索引}.csv`
//! - 汇总 `responses_full.csv`

pub mod app;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Document, ExportRow};
pub use orchestrator::{BatchOrchestrator, RunReport};
