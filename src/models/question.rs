use serde::{Deserialize, Serialize};
use std::fmt;

/// 页面题型标签 → 题型
static TAG_LABELS: phf::Map<&'static str, QuestionKind> = phf::phf_map! {
    "单选题" => QuestionKind::Single,
    "多选题" => QuestionKind::Multiple,
    "判断题" => QuestionKind::Judgement,
    "填空题" => QuestionKind::Completion,
    "主观题" => QuestionKind::OpenEnded,
};

/// 判断题页面未给出选项文字时使用的默认选项
pub const JUDGEMENT_OPTIONS: [&str; 2] = ["正确", "错误"];

/// 题型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    /// 单选题
    Single,
    /// 多选题
    Multiple,
    /// 判断题
    Judgement,
    /// 填空题
    Completion,
    /// 主观题
    OpenEnded,
    /// 无法识别
    Unrecognized,
}

impl QuestionKind {
    /// 从页面题型标签解析题型，未知标签返回 `Unrecognized`
    pub fn from_tag(tag: &str) -> Self {
        TAG_LABELS
            .get(tag.trim())
            .copied()
            .unwrap_or(QuestionKind::Unrecognized)
    }

    /// 题库接口使用的题型代码
    pub fn api_code(self) -> &'static str {
        match self {
            QuestionKind::Single => "single",
            QuestionKind::Multiple => "multiple",
            QuestionKind::Judgement => "judgement",
            QuestionKind::Completion => "completion",
            QuestionKind::OpenEnded => "subjective",
            QuestionKind::Unrecognized => "unknown",
        }
    }

    /// 标准中文名称
    pub fn name(self) -> &'static str {
        match self {
            QuestionKind::Single => "单选题",
            QuestionKind::Multiple => "多选题",
            QuestionKind::Judgement => "判断题",
            QuestionKind::Completion => "填空题",
            QuestionKind::OpenEnded => "主观题",
            QuestionKind::Unrecognized => "未知题型",
        }
    }

    /// 答案为若干选项
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            QuestionKind::Single | QuestionKind::Multiple | QuestionKind::Judgement
        )
    }

    pub fn is_recognized(self) -> bool {
        self != QuestionKind::Unrecognized
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 选项下标对应的字母，0 → 'A'
pub fn option_label(index: usize) -> char {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'A' + i),
        _ => '?',
    }
}

/// 当前题目的只读快照，每轮重新读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSnapshot {
    pub kind: QuestionKind,
    pub prompt_text: String,
    /// 按页面顺序排列，仅选择类题型有值
    pub option_texts: Vec<String>,
    /// 本题是否已经有人作答
    pub has_prior_answer: bool,
    /// 页面显示的题号
    pub number: Option<u32>,
}

impl QuestionSnapshot {
    /// 页面上没有题目时的快照
    pub fn unrecognized() -> Self {
        Self {
            kind: QuestionKind::Unrecognized,
            prompt_text: String::new(),
            option_texts: Vec::new(),
            has_prior_answer: false,
            number: None,
        }
    }

    /// 派生题库查询参数
    pub fn to_query(&self) -> AnswerQuery {
        AnswerQuery {
            title: collapse_whitespace(&self.prompt_text),
            options: self
                .option_texts
                .iter()
                .map(|o| collapse_whitespace(o))
                .filter(|o| !o.is_empty())
                .collect(),
            type_code: self.kind.api_code().to_string(),
        }
    }
}

/// 题库查询参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerQuery {
    pub title: String,
    pub options: Vec<String>,
    #[serde(rename = "type")]
    pub type_code: String,
}

impl AnswerQuery {
    /// 选项按行拼接，题库接口的 `options` 参数格式
    pub fn joined_options(&self) -> String {
        self.options.join("\n")
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
