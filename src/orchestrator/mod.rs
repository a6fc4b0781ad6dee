//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量编排器
//! - 切分批次，批次之间严格串行
//! - 控制批内并发数量（Semaphore）
//! - 写出每批 CSV 和汇总 CSV
//!
//! ### `document_processor` - 单个文档处理器
//! - 上传单个文档，失败时记录失败标记
//! - 等待单个任务的最终结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Document>)
//!     ↓
//! document_processor (处理单个 Document)
//!     ↓
//! services (能力层：poll / flatten / export)
//!     ↓
//! clients (识别服务 API)
//!     ↓
//! infrastructure (基础设施：TokenManager)
//! ```

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::{batch_count, partition, BatchOrchestrator, RunReport};
