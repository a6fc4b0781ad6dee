//! 日志工具模块
//!
//! 提供日志初始化以及批次、统计信息的输出辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 info / debug。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 重复初始化（例如测试中）时忽略错误
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `base_url`: 服务地址
/// - `max_concurrent`: 批内最大并发数
pub fn log_startup(base_url: &str, max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量文档识别模式");
    info!("🌐 服务地址: {}", base_url);
    info!("📊 批内最大并发数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
pub fn log_documents_loaded(total: usize, batch_size: usize, total_batches: usize) {
    info!("✓ 找到 {} 个待处理的文档", total);
    info!("📋 将以每批 {} 个的方式处理，共 {} 批", batch_size, total_batches);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_index`: 批次索引（从 0 开始）
/// - `total_batches`: 批次总数
/// - `start`: 起始文档编号
/// - `end`: 结束文档编号
/// - `total`: 文档总数
pub fn log_batch_start(
    batch_index: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理批次 {} (第 {}/{} 批)", batch_index, batch_index + 1, total_batches);
    info!("📄 本批文档: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_index: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 批次 {} 完成: 成功 {}/{}", batch_index, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(success: usize, failed: usize, total: usize, cancelled: bool) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    if cancelled {
        info!("⏹️ 运行被取消，未处理的批次已跳过");
    }
    info!("{}", "=".repeat(60));
}
