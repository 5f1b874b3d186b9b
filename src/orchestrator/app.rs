//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：日志文件、连接浏览器、创建 JsExecutor
//! 2. **组装依赖**：题库客户端、AI 客户端、答题流程
//! 3. **资源管理**：持有 Browser，保证页面在运行期间有效
//! 4. **运行报告**：输出统计并写入日志文件

use chromiumoxide::Browser;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::browser;
use crate::clients::{AnswerTransport, CompletionSource, LlmClient, TikuClient};
use crate::config::{AnswerStrategy, Config};
use crate::error::AppResult;
use crate::infrastructure::{BrowserSurface, HostSurface, JsExecutor};
use crate::models::source::default_sources;
use crate::models::{load_source_descriptors, RunSummary};
use crate::orchestrator::sequential_runner::{Progress, SequentialRunner};
use crate::services::{
    ActionApplier, AnswerSourceClient, CompletionSettings, CompletionStreamer, SourceStrategy,
};
use crate::utils::logging::{init_log_file, log_startup, print_final_stats, write_run_report};
use crate::workflow::QuestionFlow;

/// 按配置确定答案来源策略
///
/// 模板化策略优先读取 `SOURCES_FILE`，未配置时使用内置题库源。
pub async fn source_strategy(config: &Config) -> AppResult<SourceStrategy> {
    let token = config.answer_token.clone();
    match config.answer_strategy {
        AnswerStrategy::Fixed => Ok(SourceStrategy::Fixed {
            url: config.answer_api_url.clone(),
            token,
        }),
        AnswerStrategy::Templated => {
            let sources = match &config.sources_file {
                Some(path) => load_source_descriptors(Path::new(path)).await?,
                None => {
                    info!("未配置题库源文件，使用内置题库源");
                    default_sources(&token)
                }
            };
            Ok(SourceStrategy::Templated { sources, token })
        }
    }
}

/// 组装顺序答题器
pub fn build_runner<S, T, C>(
    config: &Config,
    surface: S,
    strategy: SourceStrategy,
    transport: T,
    completion: C,
) -> SequentialRunner<S, T, C>
where
    S: HostSurface,
    T: AnswerTransport,
    C: CompletionSource,
{
    let timings = config.timings;
    let flow = QuestionFlow::new(
        AnswerSourceClient::new(transport, strategy, timings.between_sources),
        CompletionStreamer::new(completion, CompletionSettings::from_config(config)),
        ActionApplier::new(&timings),
    );
    SequentialRunner::new(surface, flow, timings)
}

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    runner: SequentialRunner<BrowserSurface, TikuClient, LlmClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> AppResult<Self> {
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let (browser, page) = browser::connect_to_browser_and_page(
            config.browser_debug_port,
            Some(&config.target_url),
            config.target_title.as_deref(),
        )
        .await?;

        let surface = BrowserSurface::new(JsExecutor::new(page));
        let strategy = source_strategy(&config).await?;
        let runner = build_runner(&config, surface, strategy, TikuClient::new(), LlmClient::new());

        Ok(Self {
            config,
            _browser: browser,
            runner,
        })
    }

    /// 订阅答题进度
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Progress> {
        self.runner.subscribe()
    }

    /// 运行一次顺序答题，`cancel` 被取消后在下一个检查点停止
    pub async fn run(&self, cancel: &CancellationToken) -> AppResult<RunSummary> {
        let summary = self.runner.run(cancel).await;
        report_run(&self.config.output_log_file, summary)
    }
}

/// 输出统计并把运行报告追加到日志文件
pub fn report_run(log_file_path: &str, summary: RunSummary) -> AppResult<RunSummary> {
    print_final_stats(&summary, log_file_path);
    write_run_report(log_file_path, &summary)?;
    Ok(summary)
}
