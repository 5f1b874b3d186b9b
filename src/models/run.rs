//! 单次运行的结果模型

use std::fmt;

use crate::error::PipelineFailure;

use super::question::{option_label, QuestionKind};

/// 单题处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationStatus {
    /// 答案已写入页面
    Answered,
    /// 已有答案，未改动
    Skipped,
    /// 处理失败
    Failed,
}

/// 一道题的处理记录，写入运行日志后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    /// 题号（从 1 开始），页面没有题号时使用循环计数
    pub question_number: u32,
    pub kind: QuestionKind,
    pub status: IterationStatus,
    pub applied: bool,
    pub message: String,
    pub failure: Option<PipelineFailure>,
    pub selected_options: Option<Vec<usize>>,
    pub filled_text: Option<String>,
    pub source_name: Option<String>,
}

impl IterationResult {
    pub fn answered(question_number: u32, kind: QuestionKind, message: impl Into<String>) -> Self {
        Self {
            question_number,
            kind,
            status: IterationStatus::Answered,
            applied: true,
            message: message.into(),
            failure: None,
            selected_options: None,
            filled_text: None,
            source_name: None,
        }
    }

    pub fn skipped(question_number: u32, kind: QuestionKind, message: impl Into<String>) -> Self {
        Self {
            status: IterationStatus::Skipped,
            applied: false,
            ..Self::answered(question_number, kind, message)
        }
    }

    pub fn failed(question_number: u32, kind: QuestionKind, failure: PipelineFailure) -> Self {
        Self {
            status: IterationStatus::Failed,
            applied: false,
            message: failure.to_string(),
            failure: Some(failure),
            ..Self::answered(question_number, kind, String::new())
        }
    }

    pub fn with_selections(mut self, indices: Vec<usize>) -> Self {
        self.selected_options = Some(indices);
        self
    }

    pub fn with_filled_text(mut self, text: impl Into<String>) -> Self {
        self.filled_text = Some(text.into());
        self
    }

    pub fn with_source(mut self, source_name: impl Into<String>) -> Self {
        let name = source_name.into();
        if !name.is_empty() {
            self.source_name = Some(name);
        }
        self
    }
}

impl fmt::Display for IterationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            IterationStatus::Answered => "✓",
            IterationStatus::Skipped => "↷",
            IterationStatus::Failed => "✗",
        };
        write!(
            f,
            "{} 第 {} 题 [{}] {}",
            mark, self.question_number, self.kind, self.message
        )?;
        if let Some(indices) = &self.selected_options {
            let labels: String = indices.iter().map(|&i| option_label(i)).collect();
            write!(f, " (选项: {})", labels)?;
        }
        Ok(())
    }
}

/// 只追加的运行日志
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunLog {
    entries: Vec<IterationResult>,
}

impl RunLog {
    pub fn push(&mut self, result: IterationResult) {
        self.entries.push(result);
    }

    pub fn entries(&self) -> &[IterationResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 运行结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 没有下一题或已离开答题页面
    Completed,
    /// 收到停止请求
    Cancelled,
    /// 当前页面没有可识别的题目
    Stalled,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunOutcome::Completed => "已完成",
            RunOutcome::Cancelled => "已终止",
            RunOutcome::Stalled => "未找到题目",
        })
    }
}

/// 运行结束后的汇总，任何结束方式都返回同样结构
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub question_count: usize,
    pub success_count: usize,
    pub log: RunLog,
}

impl RunSummary {
    pub fn message(&self) -> String {
        format!(
            "答题{}: 成功 {}/{} 题",
            self.outcome, self.success_count, self.question_count
        )
    }

    pub fn skipped_count(&self) -> usize {
        self.log
            .entries()
            .iter()
            .filter(|r| r.status == IterationStatus::Skipped)
            .count()
    }
}
