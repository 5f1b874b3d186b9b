//! 错误类型
//!
//! - `AppError`：进程级错误（浏览器连接、配置、文件、TOML）
//! - `PipelineFailure`：单道题目处理流程中的失败分类，只记录不中断

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {source}")]
    ConnectionFailed {
        port: u16,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {0}")]
    PageCreationFailed(#[source] chromiumoxide::error::CdpError),
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 题库源配置无效
    #[error("题库源 '{name}' 配置无效: {reason}")]
    InvalidSource { name: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(BrowserError::PageCreationFailed(err))
    }
}

impl AppError {
    /// 创建文件读写错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 单题处理失败分类
///
/// 每个阶段都返回此类型而不是向上抛出；编排器把它写进本题的
/// `IterationResult` 后继续下一题。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineFailure {
    /// 没有可识别的题目
    #[error("无法检测到题目类型")]
    Detection,
    /// 题型已识别，但题干或选项缺失
    #[error("无法提取题目内容: {0}")]
    Extraction(String),
    /// 所有题库 / AI 源都失败或没有可用答案
    #[error("未获取到答案: {0}")]
    SourceUnavailable(String),
    /// 答案文本无法映射为具体操作
    #[error("无法解析答案: {0}")]
    Resolution(String),
    /// 无法把答案写入页面
    #[error("答案应用失败: {0}")]
    Application(String),
    /// 缺少凭证或端点配置无效
    #[error("配置错误: {0}")]
    Configuration(String),
}
