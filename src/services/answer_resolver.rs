/// 答案解析
///
/// 把题库返回的答案文本映射为选项下标或填空内容。纯函数，不会失败：
/// 无法解析时返回 `ResolvedAnswer::Unresolved`。
use regex::Regex;

use crate::models::{QuestionKind, ResolvedAnswer};

/// 明确否定，优先于肯定关键字判断
const EXPLICIT_NEGATIONS: &[&str] = &["不正确", "不对", "不是"];
const AFFIRMATIVES: &[&str] = &["正确", "对", "是", "√", "✓", "✔", "true", "yes", "right"];
const NEGATIVES: &[&str] = &["错误", "错", "否", "×", "✗", "✘", "false", "wrong"];

/// 多选题选项内的关键词分隔符
const ENUMERATION_DELIMITER: char = '、';

/// 去掉空白和标点（Unicode）
pub fn normalize(text: &str) -> String {
    match Regex::new(r"[\s\p{P}]+") {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.chars().filter(|c| !c.is_whitespace()).collect(),
    }
}

/// 答案中的选项字母（A-D，不区分大小写），按出现顺序
///
/// 只认独立的字母串：`"答案是B"`、`"A、C"`、`"ABD"` 都能识别，
/// `"Beijing"` 这样的单词不会被当成选项。
fn letter_tokens(text: &str) -> Vec<usize> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|run| !run.is_empty())
        .filter(|run| run.chars().all(|c| matches!(c.to_ascii_uppercase(), 'A'..='D')))
        .flat_map(|run| run.chars())
        .map(|c| (c.to_ascii_uppercase() as u8 - b'A') as usize)
        .collect()
}

/// 判断题关键字：肯定 → 0，否定 → 1
fn keyword_index(normalized: &str) -> Option<usize> {
    let lowered = normalized.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    if has_any(EXPLICIT_NEGATIONS) {
        Some(1)
    } else if has_any(AFFIRMATIVES) {
        Some(0)
    } else if has_any(NEGATIVES) {
        Some(1)
    } else {
        None
    }
}

/// 正反向包含匹配，返回第一个匹配的选项
fn containment_index(normalized: &str, option_texts: &[String]) -> Option<usize> {
    option_texts.iter().position(|option| {
        let option = normalize(option);
        !option.is_empty() && (normalized.contains(&option) || option.contains(normalized))
    })
}

/// 多选题按选项关键词匹配
fn fragment_indices(normalized: &str, option_texts: &[String]) -> Vec<usize> {
    option_texts
        .iter()
        .enumerate()
        .filter(|(_, option)| {
            option
                .split(ENUMERATION_DELIMITER)
                .map(normalize)
                .filter(|fragment| !fragment.is_empty())
                .any(|fragment| normalized.contains(&fragment) || fragment.contains(normalized))
        })
        .map(|(index, _)| index)
        .collect()
}

/// 解析答案文本
///
/// - 单选 / 判断：先找选项字母，再做选项文字包含匹配（仅单选），最后用关键字
/// - 多选：收集全部选项字母，没有则按选项关键词匹配
/// - 填空：原样使用去掉首尾空白的答案
/// - 主观题和未知题型没有可解析的答案
///
/// 肯定关键字总是映射到 A，对多于两个选项的单选题也是如此。
pub fn resolve(answer_text: &str, kind: QuestionKind, option_texts: &[String]) -> ResolvedAnswer {
    let normalized = normalize(answer_text);
    if normalized.is_empty() {
        return ResolvedAnswer::Unresolved;
    }

    match kind {
        QuestionKind::Single | QuestionKind::Judgement => {
            if let Some(&index) = letter_tokens(answer_text).first() {
                return ResolvedAnswer::selections(vec![index]);
            }
            if kind == QuestionKind::Single {
                if let Some(index) = containment_index(&normalized, option_texts) {
                    return ResolvedAnswer::selections(vec![index]);
                }
            }
            keyword_index(&normalized)
                .map(|index| ResolvedAnswer::selections(vec![index]))
                .unwrap_or(ResolvedAnswer::Unresolved)
        }
        QuestionKind::Multiple => {
            let letters = letter_tokens(answer_text);
            if letters.is_empty() {
                ResolvedAnswer::selections(fragment_indices(&normalized, option_texts))
            } else {
                ResolvedAnswer::selections(letters)
            }
        }
        QuestionKind::Completion => ResolvedAnswer::text(answer_text.trim()),
        QuestionKind::OpenEnded | QuestionKind::Unrecognized => ResolvedAnswer::Unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(" 答案：B。 "), "答案B");
        assert_eq!(normalize("A, C\n"), "AC");
        assert_eq!(normalize("√"), "√");
    }

    #[test]
    fn test_single_letter_precedence() {
        let opts = options(&["北京", "上海", "广州"]);
        assert_eq!(
            resolve("答案是B", QuestionKind::Single, &opts),
            ResolvedAnswer::Selections(vec![1])
        );
        // 字母优先于选项文字
        assert_eq!(
            resolve("北京 C", QuestionKind::Single, &opts),
            ResolvedAnswer::Selections(vec![2])
        );
        assert_eq!(
            resolve("c", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![2])
        );
    }

    #[test]
    fn test_single_letter_ignores_option_text() {
        let opts = options(&["A 选项", "含有 D 的文字", "C"]);
        for (answer, expected) in [("A", 0), ("b", 1), ("答案：C", 2), ("(D)", 3)] {
            assert_eq!(
                resolve(answer, QuestionKind::Single, &opts),
                ResolvedAnswer::Selections(vec![expected]),
                "answer: {}",
                answer
            );
        }
    }

    #[test]
    fn test_single_conflicting_letters_take_first() {
        assert_eq!(
            resolve("A 或 C", QuestionKind::Single, &[]),
            ResolvedAnswer::Selections(vec![0])
        );
    }

    #[test]
    fn test_single_containment() {
        let opts = options(&["北京", "上海", "广州"]);
        assert_eq!(
            resolve("上海市", QuestionKind::Single, &opts),
            ResolvedAnswer::Selections(vec![1])
        );
        assert_eq!(
            resolve("广", QuestionKind::Single, &opts),
            ResolvedAnswer::Selections(vec![2])
        );
        // 英文单词中的字母不算选项
        assert_eq!(
            resolve("Beijing", QuestionKind::Single, &options(&["Shanghai", "Beijing"])),
            ResolvedAnswer::Selections(vec![1])
        );
    }

    #[test]
    fn test_judgement_keywords() {
        assert_eq!(
            resolve("正确的", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![0])
        );
        assert_eq!(
            resolve("√", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![0])
        );
        assert_eq!(
            resolve("错误", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![1])
        );
        assert_eq!(
            resolve("不正确", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![1])
        );
        assert_eq!(
            resolve("×", QuestionKind::Judgement, &[]),
            ResolvedAnswer::Selections(vec![1])
        );
        assert!(resolve("无法判断", QuestionKind::Judgement, &[]).is_empty());
    }

    #[test]
    fn test_multiple_letters_dedup_in_order() {
        assert_eq!(
            resolve("B, D, B", QuestionKind::Multiple, &[]),
            ResolvedAnswer::Selections(vec![1, 3])
        );
        assert_eq!(
            resolve("ACD", QuestionKind::Multiple, &[]),
            ResolvedAnswer::Selections(vec![0, 2, 3])
        );
        assert_eq!(
            resolve("D#A", QuestionKind::Multiple, &[]),
            ResolvedAnswer::Selections(vec![3, 0])
        );
    }

    #[test]
    fn test_multiple_fragment_fallback() {
        let opts = options(&["氢、氦", "铁", "氧、氮", "金"]);
        assert_eq!(
            resolve("氦和氮", QuestionKind::Multiple, &opts),
            ResolvedAnswer::Selections(vec![0, 2])
        );
        assert!(resolve("铜", QuestionKind::Multiple, &opts).is_empty());
    }

    #[test]
    fn test_completion_literal() {
        assert_eq!(
            resolve("  光合作用 ", QuestionKind::Completion, &[]),
            ResolvedAnswer::Text("光合作用".to_string())
        );
        assert_eq!(
            resolve("A", QuestionKind::Completion, &[]),
            ResolvedAnswer::Text("A".to_string())
        );
    }

    #[test]
    fn test_empty_answer_is_unresolved_for_every_kind() {
        let opts = options(&["甲", "乙"]);
        for kind in [
            QuestionKind::Single,
            QuestionKind::Multiple,
            QuestionKind::Judgement,
            QuestionKind::Completion,
            QuestionKind::OpenEnded,
            QuestionKind::Unrecognized,
        ] {
            assert!(resolve("", kind, &opts).is_empty());
            assert!(resolve(" 。，", kind, &opts).is_empty());
        }
    }

    #[test]
    fn test_open_ended_never_resolves() {
        assert!(resolve("一段论述", QuestionKind::OpenEnded, &[]).is_empty());
    }
}
