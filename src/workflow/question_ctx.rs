//! 题目处理上下文
//!
//! 封装"我正在处理第几题"这一信息

use std::fmt::Display;

/// 题目处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionCtx {
    /// 显示用题号：页面题号，没有时为循环计数
    pub question_number: u32,

    /// 本次运行中的循环计数（从1开始）
    pub iteration: u32,
}

impl QuestionCtx {
    /// 创建新的题目上下文
    pub fn new(page_number: Option<u32>, iteration: u32) -> Self {
        Self {
            question_number: page_number.filter(|n| *n > 0).unwrap_or(iteration),
            iteration,
        }
    }
}

impl Display for QuestionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[第 {} 题]", self.question_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_falls_back_to_iteration() {
        assert_eq!(QuestionCtx::new(Some(12), 3).question_number, 12);
        assert_eq!(QuestionCtx::new(None, 3).question_number, 3);
        assert_eq!(QuestionCtx::new(None, 3).to_string(), "[第 3 题]");
    }

    #[test]
    fn test_zero_page_number_uses_iteration() {
        assert_eq!(QuestionCtx::new(Some(0), 4).question_number, 4);
    }
}
