//! # Auto Answer
//!
//! 在浏览器作业页面上逐题自动作答的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `JsExecutor` - 唯一的 page owner，提供 eval() 能力
//! - `HostSurface` - 页面读写原语；`BrowserSurface` 基于 DOM 脚本，`MemorySurface` 用于测试
//! - `clients/` - 题库 HTTP 客户端、AI 流式客户端
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理当前这一道题
//! - `QuestionReader` - 识别题型、读取题干和选项
//! - `AnswerSourceClient` - 固定接口 / 模板化多题库查询
//! - `answer_resolver` - 答案文本 → 选项下标或填空内容
//! - `ActionApplier` - 点击选项、填写输入框
//! - `CompletionStreamer` - 主观题 AI 流式作答
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（题号 + 循环计数）
//! - `QuestionFlow` - 流程编排（query → resolve → apply，或 stream）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/sequential_runner` - 顺序答题循环、停止检查点、进度发布
//! - `orchestrator/app` - 应用初始化和依赖组装
//!
//! ## 模块结构

pub mod browser;
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
pub use browser::connect_to_browser_and_page;
pub use config::{Config, Timings};
pub use error::{AppError, AppResult, PipelineFailure};
pub use infrastructure::{BrowserSurface, HostSurface, JsExecutor, MemorySurface};
pub use models::{QuestionKind, QuestionSnapshot, RunOutcome, RunSummary};
pub use orchestrator::{App, SequentialRunner};
pub use workflow::{QuestionCtx, QuestionFlow};
