/// 日志工具模块
///
/// 提供日志初始化、运行报告输出的辅助函数
use std::fs::{self, OpenOptions};
use std::io::Write;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::RunSummary;

/// 初始化 tracing 输出
///
/// `RUST_LOG` 优先；否则 `verbose` 为 true 时输出 debug 级别
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> AppResult<()> {
    let log_header = format!(
        "{}\n自动答题日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header).map_err(|e| AppError::file(log_file_path, e))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序答题模式");
    info!("🔌 浏览器调试端口: {}", config.browser_debug_port);
    info!("📚 题库策略: {:?}", config.answer_strategy);
    info!("🤖 AI 模型: {}", config.llm_model_name);
    info!("{}", "=".repeat(60));
}

/// 把运行汇总写成报告文本
pub fn format_run_report(summary: &RunSummary) -> String {
    let mut report = String::new();
    report.push_str(&format!(
        "完成时间: {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    report.push_str(&summary.message());
    report.push('\n');
    report.push_str(&format!("跳过: {} 题\n", summary.skipped_count()));
    report.push_str(&"─".repeat(60));
    report.push('\n');
    for entry in summary.log.entries() {
        report.push_str(&entry.to_string());
        if let Some(source) = &entry.source_name {
            report.push_str(&format!(" <{}>", source));
        }
        if let Some(text) = &entry.filled_text {
            report.push_str(&format!("\n    {}", truncate_text(text, 80)));
        }
        report.push('\n');
    }
    report
}

/// 追加运行报告到日志文件
pub fn write_run_report(log_file_path: &str, summary: &RunSummary) -> AppResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| AppError::file(log_file_path, e))?;
    file.write_all(format_run_report(summary).as_bytes())
        .map_err(|e| AppError::file(log_file_path, e))?;
    Ok(())
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {}", summary.message());
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for entry in summary.log.entries() {
        info!("{}", entry);
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineFailure;
    use crate::models::{IterationResult, QuestionKind, RunLog, RunOutcome};

    fn sample_summary() -> RunSummary {
        let mut log = RunLog::default();
        log.push(
            IterationResult::answered(1, QuestionKind::Single, "已选择答案")
                .with_selections(vec![1])
                .with_source("言溪题库"),
        );
        log.push(IterationResult::skipped(2, QuestionKind::Completion, "已有答案"));
        log.push(IterationResult::failed(
            3,
            QuestionKind::Multiple,
            PipelineFailure::SourceUnavailable("未找到".to_string()),
        ));
        RunSummary {
            outcome: RunOutcome::Completed,
            question_count: 3,
            success_count: 1,
            log,
        }
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("这是一段很长的文本", 4), "这是一段...");
    }

    #[test]
    fn test_format_run_report() {
        let report = format_run_report(&sample_summary());
        assert!(report.contains("答题已完成: 成功 1/3 题"));
        assert!(report.contains("跳过: 1 题"));
        assert!(report.contains("第 1 题 [单选题] 已选择答案 (选项: B) <言溪题库>"));
        assert!(report.contains("未获取到答案: 未找到"));
    }

    #[test]
    fn test_write_run_report_appends() {
        let path = std::env::temp_dir().join(format!("auto_answer_report_{}.txt", std::process::id()));
        let path = path.to_string_lossy().to_string();

        init_log_file(&path).unwrap();
        write_run_report(&path, &sample_summary()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("自动答题日志"));
        assert!(content.contains("答题已完成"));
        let _ = std::fs::remove_file(&path);
    }
}
