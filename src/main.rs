use anyhow::Result;
use auto_answer::utils::logging::init_tracing;
use auto_answer::{App, Config, RunOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    init_tracing(config.verbose_logging);

    // 初始化应用
    let app = App::initialize(config).await?;

    // Ctrl-C 只请求停止，当前题目处理完后退出
    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("收到停止请求，当前题目完成后结束");
            stopper.cancel();
        }
    });

    let summary = app.run(&cancel).await?;
    if summary.outcome == RunOutcome::Stalled {
        warn!("⚠️ 当前页面没有可识别的题目，请确认已打开作业页面");
    }
    info!("{}", summary.message());

    Ok(())
}
