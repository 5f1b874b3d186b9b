//! 浏览器宿主页面
//!
//! 通过 `JsExecutor` 在作业页面执行 DOM 脚本，实现 `HostSurface`。
//! 输入区域句柄是一个 CSS 选择器，定位时给目标元素打上 `data-auto-answer` 标记。

use anyhow::Result;
use serde_json::json;

use super::host_surface::HostSurface;
use super::js_executor::JsExecutor;
use crate::models::QuestionKind;

const TAG_SELECTOR: &str = "span.tag.el-tooltip__trigger";
const NUMBER_XPATH: &str =
    r#"//*[@id="LayoutTeaching"]/main/div/div/div/div[2]/div[2]/div[2]/div/div/div[1]/span"#;
const NEXT_BUTTON_SELECTOR: &str = "#LayoutTeaching > main > div > div > div > div.content-area > div.content > div.toggle-box > button:nth-child(2)";
const MARK_ATTRIBUTE: &str = "data-auto-answer";

/// 浏览器中的作业页面
pub struct BrowserSurface {
    executor: JsExecutor,
}

impl BrowserSurface {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 选择类题型对应的选项组选择器和控件类名前缀
    fn choice_group(kind: QuestionKind) -> Option<(&'static str, &'static str)> {
        match kind {
            QuestionKind::Single | QuestionKind::Judgement => Some((".el-radio-group", "el-radio")),
            QuestionKind::Multiple => Some((".el-checkbox-group", "el-checkbox")),
            _ => None,
        }
    }

    fn prompt_selectors(kind: QuestionKind) -> &'static [&'static str] {
        match kind {
            QuestionKind::Single | QuestionKind::Multiple => &[".question .topic-title"],
            QuestionKind::Judgement | QuestionKind::Completion => &[".topic-title"],
            QuestionKind::OpenEnded => &[
                ".homework-question-editor .content span",
                "#LayoutTeaching .homework-question-editor .content p",
            ],
            QuestionKind::Unrecognized => &[],
        }
    }

    /// 清除上一题留下的标记，避免句柄指向旧元素
    fn clear_marks_script() -> Result<String> {
        let selector = serde_json::to_string(&format!("[{}]", MARK_ATTRIBUTE))?;
        let attr = serde_json::to_string(MARK_ATTRIBUTE)?;
        Ok(format!(
            "document.querySelectorAll({selector}).forEach(el => el.removeAttribute({attr}));"
        ))
    }

    /// 在属于填空题的题目容器中查找输入框
    fn completion_target_script(mark: &str) -> Result<String> {
        Ok(format!(
            r#"
            (() => {{
                {clear}
                const selectors = ['input[type="text"]', 'input[placeholder*="填空"]', 'input[placeholder*="答案"]', '.el-input__inner', '.el-input input', 'textarea'];
                for (const selector of selectors) {{
                    for (const el of document.querySelectorAll(selector)) {{
                        const container = el.closest("div[class*='homework-']");
                        if (!container) continue;
                        const tag = container.querySelector({tag});
                        if (tag && tag.textContent.trim() === '填空题') {{
                            el.setAttribute({attr}, {mark});
                            return true;
                        }}
                    }}
                }}
                return false;
            }})()
            "#,
            clear = Self::clear_marks_script()?,
            tag = serde_json::to_string(TAG_SELECTOR)?,
            attr = serde_json::to_string(MARK_ATTRIBUTE)?,
            mark = serde_json::to_string(mark)?,
        ))
    }

    /// 主观题富文本编辑器
    fn open_ended_target_script(mark: &str) -> Result<String> {
        Ok(format!(
            r#"
            (() => {{
                {clear}
                const selectors = ["[id^='w-e-textarea-']", '.w-e-textarea', '.w-e-text', '[contenteditable="true"]'];
                for (const selector of selectors) {{
                    const el = document.querySelector(selector);
                    if (el) {{
                        el.setAttribute({attr}, {mark});
                        return true;
                    }}
                }}
                return false;
            }})()
            "#,
            clear = Self::clear_marks_script()?,
            attr = serde_json::to_string(MARK_ATTRIBUTE)?,
            mark = serde_json::to_string(mark)?,
        ))
    }

    /// 在句柄指向的元素上执行一段脚本，`el` 为目标元素
    async fn with_target<T: serde::de::DeserializeOwned>(
        &self,
        handle: &str,
        body: &str,
        args: serde_json::Value,
    ) -> Result<T> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                const args = {args};
                if (!el) throw new Error('输入区域已不存在');
                const isField = el.tagName === 'INPUT' || el.tagName === 'TEXTAREA';
                {body}
            }})()
            "#,
            selector = serde_json::to_string(handle)?,
            args = serde_json::to_string(&args)?,
            body = body,
        );
        self.executor.eval_as(js_code).await
    }
}

impl HostSurface for BrowserSurface {
    type Handle = String;

    async fn query_tag(&self) -> Result<Option<String>> {
        let js_code = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.textContent.trim() : ''; }})()",
            serde_json::to_string(TAG_SELECTOR)?
        );
        let tag: String = self.executor.eval_as(js_code).await?;
        Ok(Some(tag).filter(|t| !t.is_empty()))
    }

    async fn query_number_label(&self) -> Result<Option<String>> {
        let js_code = format!(
            r#"
            (() => {{
                const node = document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
                return node && node.textContent ? node.textContent.trim() : '';
            }})()
            "#,
            serde_json::to_string(NUMBER_XPATH)?
        );
        let label: String = self.executor.eval_as(js_code).await?;
        Ok(Some(label).filter(|l| !l.is_empty()))
    }

    async fn query_prompt_text(&self, kind: QuestionKind) -> Result<String> {
        let js_code = format!(
            r#"
            (() => {{
                for (const selector of {}) {{
                    const el = document.querySelector(selector);
                    if (el) return el.textContent.trim();
                }}
                return '';
            }})()
            "#,
            serde_json::to_string(Self::prompt_selectors(kind))?
        );
        self.executor.eval_as(js_code).await
    }

    async fn query_option_texts(&self, kind: QuestionKind) -> Result<Vec<String>> {
        let Some((group, control)) = Self::choice_group(kind) else {
            return Ok(Vec::new());
        };
        let js_code = format!(
            r#"
            (() => {{
                const group = document.querySelector({group});
                if (!group) return [];
                return Array.from(group.querySelectorAll('label.' + {control}))
                    .map(label => {{
                        const text = label.querySelector('.label') || label.querySelector('.' + {control} + '__label');
                        return (text ? text.textContent : label.textContent).trim();
                    }});
            }})()
            "#,
            group = serde_json::to_string(group)?,
            control = serde_json::to_string(control)?,
        );
        self.executor.eval_as(js_code).await
    }

    async fn query_choice_state(&self, kind: QuestionKind, index: usize) -> Result<Option<bool>> {
        let Some((group, control)) = Self::choice_group(kind) else {
            return Ok(None);
        };
        let js_code = format!(
            r#"
            (() => {{
                const group = document.querySelector({group});
                if (!group) return null;
                const label = group.querySelectorAll('label.' + {control})[{index}];
                if (!label) return null;
                const input = label.querySelector('.' + {control} + '__input input');
                return input ? input.checked : null;
            }})()
            "#,
            group = serde_json::to_string(group)?,
            control = serde_json::to_string(control)?,
            index = index,
        );
        let state: serde_json::Value = self.executor.eval(js_code).await?;
        Ok(state.as_bool())
    }

    async fn activate_choice(&self, kind: QuestionKind, index: usize) -> Result<bool> {
        let Some((group, control)) = Self::choice_group(kind) else {
            return Ok(false);
        };
        let js_code = format!(
            r#"
            (() => {{
                const group = document.querySelector({group});
                if (!group) return false;
                const label = group.querySelectorAll('label.' + {control})[{index}];
                if (!label) return false;
                const target = label.querySelector('.' + {control} + '__input span');
                if (!target) return false;
                target.click();
                return true;
            }})()
            "#,
            group = serde_json::to_string(group)?,
            control = serde_json::to_string(control)?,
            index = index,
        );
        self.executor.eval_as(js_code).await
    }

    async fn query_fill_target(&self, kind: QuestionKind) -> Result<Option<String>> {
        let (mark, script) = match kind {
            QuestionKind::Completion => ("completion", Self::completion_target_script("completion")?),
            QuestionKind::OpenEnded => ("open-ended", Self::open_ended_target_script("open-ended")?),
            _ => return Ok(None),
        };
        let found: bool = self.executor.eval_as(script).await?;
        Ok(found.then(|| format!("[{}=\"{}\"]", MARK_ATTRIBUTE, mark)))
    }

    async fn read_fill_value(&self, handle: &String) -> Result<String> {
        self.with_target(
            handle,
            "return isField ? el.value : el.textContent;",
            json!(null),
        )
        .await
    }

    async fn focus_fill_target(&self, handle: &String) -> Result<()> {
        let _: bool = self
            .with_target(handle, "el.focus(); return true;", json!(null))
            .await?;
        Ok(())
    }

    async fn write_fill_value(&self, handle: &String, value: &str) -> Result<()> {
        let body = r#"
            if (isField) {
                el.value = args.value;
            } else {
                el.focus();
                document.execCommand('selectAll', false, null);
                document.execCommand('delete', false, null);
                if (args.value && !document.execCommand('insertText', false, args.value)) {
                    el.textContent = args.value;
                }
            }
            return true;
        "#;
        let _: bool = self
            .with_target(handle, body, json!({ "value": value }))
            .await?;
        Ok(())
    }

    async fn append_fill_value(&self, handle: &String, chunk: &str) -> Result<()> {
        let body = r#"
            if (isField) {
                el.value += args.chunk;
                el.dispatchEvent(new Event('input', { bubbles: true }));
            } else {
                el.focus();
                const selection = window.getSelection();
                selection.selectAllChildren(el);
                selection.collapseToEnd();
                if (!document.execCommand('insertText', false, args.chunk)) {
                    el.textContent += args.chunk;
                }
            }
            return true;
        "#;
        let _: bool = self
            .with_target(handle, body, json!({ "chunk": chunk }))
            .await?;
        Ok(())
    }

    async fn notify_changed(&self, handle: &String) -> Result<()> {
        let body = r#"
            el.dispatchEvent(new Event('input', { bubbles: true }));
            el.dispatchEvent(new Event('change', { bubbles: true }));
            return true;
        "#;
        let _: bool = self.with_target(handle, body, json!(null)).await?;
        Ok(())
    }

    async fn next_enabled(&self) -> Result<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const button = document.querySelector({});
                return !!button && !button.disabled && !button.classList.contains('is-disabled');
            }})()
            "#,
            serde_json::to_string(NEXT_BUTTON_SELECTOR)?
        );
        self.executor.eval_as(js_code).await
    }

    async fn activate_next(&self) -> Result<bool> {
        let js_code = format!(
            r#"
            (() => {{
                const button = document.querySelector({});
                if (!button || button.disabled || button.classList.contains('is-disabled')) return false;
                button.click();
                return true;
            }})()
            "#,
            serde_json::to_string(NEXT_BUTTON_SELECTOR)?
        );
        self.executor.eval_as(js_code).await
    }
}
