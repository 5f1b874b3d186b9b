use serde_json::Value as JsonValue;

use super::question::option_label;

/// 题库查询结果，只在本轮内使用
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnswer {
    pub found: bool,
    /// 答案文本，可能为空
    pub text: String,
    /// 题库返回的修正后题干
    pub corrected_title: Option<String>,
    /// 给出结果的题库名称
    pub source_name: String,
    /// 实际请求过的题库数量
    pub attempts_tried: usize,
    /// 题库返回的剩余次数等计数
    pub remaining_times: Option<i64>,
    /// 题库附带的其他信息
    pub extra: Option<JsonValue>,
    /// 可读的诊断信息
    pub message: String,
}

impl RawAnswer {
    pub fn not_found(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            found: false,
            text: String::new(),
            corrected_title: None,
            source_name: source_name.into(),
            attempts_tried: 0,
            remaining_times: None,
            extra: None,
            message: message.into(),
        }
    }
}

/// 答案解析结果
///
/// 构造函数保证：`Selections` 非空、`Text` 非空，否则为 `Unresolved`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAnswer {
    /// 选项下标，按匹配顺序、无重复
    Selections(Vec<usize>),
    /// 填空内容
    Text(String),
    /// 解析失败
    Unresolved,
}

impl ResolvedAnswer {
    pub fn selections(indices: Vec<usize>) -> Self {
        let mut unique = Vec::with_capacity(indices.len());
        for index in indices {
            if !unique.contains(&index) {
                unique.push(index);
            }
        }
        if unique.is_empty() {
            ResolvedAnswer::Unresolved
        } else {
            ResolvedAnswer::Selections(unique)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            ResolvedAnswer::Unresolved
        } else {
            ResolvedAnswer::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ResolvedAnswer::Unresolved)
    }

    /// 选项字母，如 `["A", "C"]`
    pub fn labels(&self) -> Vec<char> {
        match self {
            ResolvedAnswer::Selections(indices) => {
                indices.iter().map(|&i| option_label(i)).collect()
            }
            _ => Vec::new(),
        }
    }
}
