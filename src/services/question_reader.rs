/// 题目读取服务
///
/// 只读取页面，不做任何写入。页面节点缺失属于正常情况（例如已到最后一题），
/// 对应字段取空值，不返回错误。
use regex::Regex;
use std::fmt::Debug;
use tracing::{debug, warn};

use crate::infrastructure::HostSurface;
use crate::models::question::JUDGEMENT_OPTIONS;
use crate::models::{QuestionKind, QuestionSnapshot};

/// 从 "3.（10 分）" 形式的标签中取出题号，题号从 1 开始
pub fn parse_question_number(label: &str) -> Option<u32> {
    let re = Regex::new(r"^\s*(\d+)\s*\.").ok()?;
    re.captures(label)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .filter(|n: &u32| *n > 0)
}

/// 读取失败时记录警告并返回默认值
fn or_default<T: Default, E: Debug>(result: Result<T, E>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        warn!("读取{}失败: {:?}", what, e);
        T::default()
    })
}

/// 题目读取服务
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionReader;

impl QuestionReader {
    pub fn new() -> Self {
        Self
    }

    /// 只识别题型，不读取其他内容
    pub async fn detect_kind<S: HostSurface>(&self, surface: &S) -> QuestionKind {
        match or_default(surface.query_tag().await, "题型标签") {
            Some(tag) => QuestionKind::from_tag(&tag),
            None => QuestionKind::Unrecognized,
        }
    }

    /// 读取当前题目的完整快照
    pub async fn read<S: HostSurface>(&self, surface: &S) -> QuestionSnapshot {
        let kind = self.detect_kind(surface).await;
        if !kind.is_recognized() {
            debug!("页面上没有可识别的题型标签");
            return QuestionSnapshot::unrecognized();
        }

        let number = or_default(surface.query_number_label().await, "题号")
            .as_deref()
            .and_then(parse_question_number);
        let prompt_text = or_default(surface.query_prompt_text(kind).await, "题干");

        let (option_texts, has_prior_answer) = if kind.is_choice() {
            let mut options = or_default(surface.query_option_texts(kind).await, "选项");
            let control_count = if options.is_empty() {
                JUDGEMENT_OPTIONS.len()
            } else {
                options.len()
            };
            if options.is_empty() && kind == QuestionKind::Judgement {
                options = JUDGEMENT_OPTIONS.iter().map(|s| s.to_string()).collect();
            }
            let answered = self.any_choice_selected(surface, kind, control_count).await;
            (options, answered)
        } else {
            (Vec::new(), self.fill_target_has_text(surface, kind).await)
        };

        debug!(
            "读取题目: 题型={}, 题号={:?}, 选项数={}, 已作答={}",
            kind,
            number,
            option_texts.len(),
            has_prior_answer
        );

        QuestionSnapshot {
            kind,
            prompt_text,
            option_texts,
            has_prior_answer,
            number,
        }
    }

    async fn any_choice_selected<S: HostSurface>(
        &self,
        surface: &S,
        kind: QuestionKind,
        count: usize,
    ) -> bool {
        for index in 0..count {
            if or_default(surface.query_choice_state(kind, index).await, "选项状态") == Some(true)
            {
                return true;
            }
        }
        false
    }

    async fn fill_target_has_text<S: HostSurface>(&self, surface: &S, kind: QuestionKind) -> bool {
        let Some(handle) = or_default(surface.query_fill_target(kind).await, "输入区域") else {
            return false;
        };
        !or_default(surface.read_fill_value(&handle).await, "输入内容")
            .trim()
            .is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MemoryOption, MemoryQuestion, MemorySurface, SurfaceActivity};

    #[test]
    fn test_parse_question_number() {
        assert_eq!(parse_question_number("3.（10 分）"), Some(3));
        assert_eq!(parse_question_number("12. 单选题"), Some(12));
        assert_eq!(parse_question_number("第3题"), None);
        assert_eq!(parse_question_number(""), None);
        assert_eq!(parse_question_number("0.（10 分）"), None);
    }

    #[tokio::test]
    async fn test_read_single_choice() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("单选题", "中国的首都是？")
            .with_options(&["北京", "上海", "广州"])
            .numbered("1.（5 分）")]);

        let snapshot = QuestionReader::new().read(&surface).await;
        assert_eq!(snapshot.kind, QuestionKind::Single);
        assert_eq!(snapshot.prompt_text, "中国的首都是？");
        assert_eq!(snapshot.option_texts, vec!["北京", "上海", "广州"]);
        assert!(!snapshot.has_prior_answer);
        assert_eq!(snapshot.number, Some(1));
    }

    #[tokio::test]
    async fn test_read_detects_prior_choice() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("多选题", "选出偶数")
            .with_option(MemoryOption::new("1"))
            .with_option(MemoryOption::new("2").checked())]);

        let snapshot = QuestionReader::new().read(&surface).await;
        assert!(snapshot.has_prior_answer);
    }

    #[tokio::test]
    async fn test_read_judgement_default_options() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("判断题", "地球是圆的")]);

        let snapshot = QuestionReader::new().read(&surface).await;
        assert_eq!(snapshot.kind, QuestionKind::Judgement);
        assert_eq!(snapshot.option_texts, vec!["正确", "错误"]);
        assert!(!snapshot.has_prior_answer);
    }

    #[tokio::test]
    async fn test_read_fill_prior_answer() {
        let blank = MemorySurface::new(vec![
            MemoryQuestion::new("填空题", "1+1=____").with_fill("   ")
        ]);
        let filled = MemorySurface::new(vec![
            MemoryQuestion::new("填空题", "1+1=____").with_fill("existing")
        ]);

        let reader = QuestionReader::new();
        assert!(!reader.read(&blank).await.has_prior_answer);
        assert!(reader.read(&filled).await.has_prior_answer);
        assert!(reader.read(&filled).await.option_texts.is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_nodes_default_to_empty() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("主观题", "")]);

        let snapshot = QuestionReader::new().read(&surface).await;
        assert_eq!(snapshot.kind, QuestionKind::OpenEnded);
        assert_eq!(snapshot.prompt_text, "");
        assert!(!snapshot.has_prior_answer);
        assert_eq!(snapshot.number, None);
    }

    #[tokio::test]
    async fn test_read_unrecognized() {
        let unknown = MemorySurface::new(vec![MemoryQuestion::new("阅读题", "……")]);
        let empty = MemorySurface::new(Vec::new());

        let reader = QuestionReader::new();
        assert_eq!(reader.read(&unknown).await, QuestionSnapshot::unrecognized());
        assert_eq!(reader.read(&empty).await, QuestionSnapshot::unrecognized());
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("多选题", "选出质数")
            .with_options(&["2", "3", "4"])
            .numbered("7.（2 分）")]);

        let reader = QuestionReader::new();
        let first = reader.read(&surface).await;
        let second = reader.read(&surface).await;
        assert_eq!(first, second);
        assert_eq!(surface.activity(), SurfaceActivity::default());
    }
}
