use anyhow::Result;
use fatura_batch_runner::utils::logging;
use fatura_batch_runner::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置（含 .env）
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.as_ref().map(|c| c.verbose_logging).unwrap_or(false));

    let app = App::initialize(config?)?;

    // Ctrl-C 触发取消：当前批次收尾并导出，后续批次跳过
    let cancel = app.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹️ 收到中断信号，正在收尾当前批次...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}
