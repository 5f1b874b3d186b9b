//! 宿主页面能力
//!
//! 核心流程只通过这组读写原语接触页面。读取方法不修改页面；
//! 写入方法只由 `ActionApplier` 和 `CompletionStreamer` 调用。

use anyhow::Result;
use std::fmt::Debug;

use crate::models::QuestionKind;

#[allow(async_fn_in_trait)]
pub trait HostSurface {
    /// 输入框 / 可编辑区域的句柄
    type Handle: Clone + Debug;

    /// 当前题目的题型标签
    async fn query_tag(&self) -> Result<Option<String>>;

    /// 题号标签原文，如 `"3.（10 分）"`
    async fn query_number_label(&self) -> Result<Option<String>>;

    async fn query_prompt_text(&self, kind: QuestionKind) -> Result<String>;

    /// 选项文字，按页面顺序
    async fn query_option_texts(&self, kind: QuestionKind) -> Result<Vec<String>>;

    /// 选项是否已选中；找不到该选项控件时返回 `None`
    async fn query_choice_state(&self, kind: QuestionKind, index: usize) -> Result<Option<bool>>;

    /// 点击选项；找不到控件时返回 `false`
    async fn activate_choice(&self, kind: QuestionKind, index: usize) -> Result<bool>;

    async fn query_fill_target(&self, kind: QuestionKind) -> Result<Option<Self::Handle>>;

    async fn read_fill_value(&self, handle: &Self::Handle) -> Result<String>;

    async fn focus_fill_target(&self, handle: &Self::Handle) -> Result<()>;

    /// 覆盖写入
    async fn write_fill_value(&self, handle: &Self::Handle, value: &str) -> Result<()>;

    /// 追加写入
    async fn append_fill_value(&self, handle: &Self::Handle, chunk: &str) -> Result<()> {
        let mut current = self.read_fill_value(handle).await?;
        current.push_str(chunk);
        self.write_fill_value(handle, &current).await
    }

    /// 触发 input / change 事件，让页面框架识别程序写入
    async fn notify_changed(&self, handle: &Self::Handle) -> Result<()>;

    /// "下一题"按钮是否可用
    async fn next_enabled(&self) -> Result<bool>;

    /// 点击"下一题"；按钮不可用时返回 `false`
    async fn activate_next(&self) -> Result<bool>;
}
