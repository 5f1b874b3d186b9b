use crate::error::{AppError, AppResult, ConfigError};
use crate::models::source::SourceDescriptor;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Debug, Deserialize)]
struct SourcesFile {
    #[serde(default)]
    sources: Vec<SourceDescriptor>,
}

/// 从 TOML 文本解析题库源列表
///
/// ```toml
/// [[sources]]
/// name = "示例题库"
/// url = "https://example.com/query"
/// method = "get"
/// data = { title = "${title}", options = "${options}", type = "${type}" }
/// handler = { answer = "data.answer", question = "data.question", success = { path = "code", equals = 1 } }
/// ```
pub fn parse_source_descriptors(content: &str, origin: &str) -> AppResult<Vec<SourceDescriptor>> {
    let file: SourcesFile = toml::from_str(content).map_err(|source| AppError::Toml {
        path: origin.to_string(),
        source,
    })?;

    for source in &file.sources {
        validate(source)?;
    }

    Ok(file.sources)
}

/// 从文件加载题库源列表
pub async fn load_source_descriptors(path: &Path) -> AppResult<Vec<SourceDescriptor>> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    let sources = parse_source_descriptors(&content, &path.display().to_string())?;
    tracing::info!(
        "从 {} 加载了 {} 个题库源",
        path.file_name().unwrap_or_default().to_string_lossy(),
        sources.len()
    );

    Ok(sources)
}

fn validate(source: &SourceDescriptor) -> AppResult<()> {
    let invalid = |reason: &str| {
        AppError::Config(ConfigError::InvalidSource {
            name: source.name.clone(),
            reason: reason.to_string(),
        })
    };

    if source.name.trim().is_empty() {
        return Err(invalid("名称为空"));
    }
    if !(source.url.starts_with("http://") || source.url.starts_with("https://")) {
        return Err(invalid("URL 必须以 http:// 或 https:// 开头"));
    }
    if source.handler.answer.trim().is_empty() {
        return Err(invalid("未指定答案字段路径"));
    }
    Ok(())
}
