//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责答题循环和资源管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 连接浏览器、创建 JsExecutor
//! - 按配置组装题库客户端、AI 客户端和答题流程
//! - 输出统计并写入运行报告
//!
//! ### `sequential_runner` - 顺序答题器
//! - 逐题循环：识别 → 作答 → 等待 → 下一题
//! - 在固定检查点响应停止请求
//! - 持有本次运行的日志和计数，通过 watch 通道发布进度
//!
//! ## 层次关系
//!
//! ```text
//! app (组装依赖、持有 Browser)
//!     ↓
//! sequential_runner (循环所有题目)
//!     ↓
//! workflow::QuestionFlow (处理单道题)
//!     ↓
//! services (能力层：读取 / 查询 / 解析 / 写入 / 流式作答)
//!     ↓
//! infrastructure (基础设施：HostSurface、JsExecutor)
//! ```

pub mod app;
pub mod sequential_runner;

// 重新导出主要类型
pub use app::{build_runner, report_run, source_strategy, App};
pub use sequential_runner::{Progress, RunPhase, SequentialRunner};
