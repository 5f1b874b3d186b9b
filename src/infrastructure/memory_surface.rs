//! 内存宿主页面
//!
//! 用一组预设题目模拟作业页面，用于离线演练和测试。
//! 记录每次写入和点击，便于核对流程确实没有改动已作答的题目。

use anyhow::{bail, Result};
use std::sync::{Mutex, MutexGuard};

use super::host_surface::HostSurface;
use crate::models::QuestionKind;

/// 一个选项控件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryOption {
    pub label: String,
    pub checked: bool,
    /// 前几次点击不生效，模拟页面响应迟缓
    pub ignored_clicks: u32,
}

impl MemoryOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            checked: false,
            ignored_clicks: 0,
        }
    }

    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    pub fn sluggish(mut self, ignored_clicks: u32) -> Self {
        self.ignored_clicks = ignored_clicks;
        self
    }
}

/// 一道预设题目
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryQuestion {
    pub tag: Option<String>,
    pub number_label: Option<String>,
    pub prompt: String,
    pub options: Vec<MemoryOption>,
    /// 输入区域内容；`None` 表示页面上没有输入区域
    pub fill_value: Option<String>,
}

impl MemoryQuestion {
    pub fn new(tag: &str, prompt: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            prompt: prompt.to_string(),
            ..Default::default()
        }
    }

    pub fn with_options(mut self, labels: &[&str]) -> Self {
        self.options = labels.iter().map(|l| MemoryOption::new(*l)).collect();
        self
    }

    pub fn with_option(mut self, option: MemoryOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_fill(mut self, value: &str) -> Self {
        self.fill_value = Some(value.to_string());
        self
    }

    pub fn numbered(mut self, label: &str) -> Self {
        self.number_label = Some(label.to_string());
        self
    }
}

/// 写入和点击计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceActivity {
    pub writes: usize,
    pub activations: usize,
    pub notifications: usize,
    pub advances: usize,
}

#[derive(Debug, Default)]
struct State {
    questions: Vec<MemoryQuestion>,
    current: usize,
    activity: SurfaceActivity,
}

/// 内存中的作业页面
#[derive(Debug, Default)]
pub struct MemorySurface {
    state: Mutex<State>,
}

impl MemorySurface {
    pub fn new(questions: Vec<MemoryQuestion>) -> Self {
        Self {
            state: Mutex::new(State {
                questions,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn activity(&self) -> SurfaceActivity {
        self.lock().activity
    }

    pub fn current_index(&self) -> usize {
        self.lock().current
    }

    /// 第 `index` 道题当前的状态
    pub fn question(&self, index: usize) -> Option<MemoryQuestion> {
        self.lock().questions.get(index).cloned()
    }

    fn with_current<T>(&self, f: impl FnOnce(&mut MemoryQuestion) -> T) -> Option<T> {
        let mut state = self.lock();
        let current = state.current;
        state.questions.get_mut(current).map(f)
    }
}

impl HostSurface for MemorySurface {
    /// 题目下标
    type Handle = usize;

    async fn query_tag(&self) -> Result<Option<String>> {
        Ok(self.with_current(|q| q.tag.clone()).flatten())
    }

    async fn query_number_label(&self) -> Result<Option<String>> {
        Ok(self.with_current(|q| q.number_label.clone()).flatten())
    }

    async fn query_prompt_text(&self, _kind: QuestionKind) -> Result<String> {
        Ok(self.with_current(|q| q.prompt.clone()).unwrap_or_default())
    }

    async fn query_option_texts(&self, kind: QuestionKind) -> Result<Vec<String>> {
        if !kind.is_choice() {
            return Ok(Vec::new());
        }
        Ok(self
            .with_current(|q| q.options.iter().map(|o| o.label.clone()).collect())
            .unwrap_or_default())
    }

    async fn query_choice_state(&self, _kind: QuestionKind, index: usize) -> Result<Option<bool>> {
        Ok(self
            .with_current(|q| q.options.get(index).map(|o| o.checked))
            .flatten())
    }

    async fn activate_choice(&self, kind: QuestionKind, index: usize) -> Result<bool> {
        let mut state = self.lock();
        state.activity.activations += 1;
        let current = state.current;
        let Some(question) = state.questions.get_mut(current) else {
            return Ok(false);
        };
        if index >= question.options.len() {
            return Ok(false);
        }

        let option = &mut question.options[index];
        if option.ignored_clicks > 0 {
            option.ignored_clicks -= 1;
            return Ok(true);
        }

        match kind {
            QuestionKind::Multiple => option.checked = !option.checked,
            _ => {
                for (i, o) in question.options.iter_mut().enumerate() {
                    o.checked = i == index;
                }
            }
        }
        Ok(true)
    }

    async fn query_fill_target(&self, kind: QuestionKind) -> Result<Option<usize>> {
        if !matches!(kind, QuestionKind::Completion | QuestionKind::OpenEnded) {
            return Ok(None);
        }
        let state = self.lock();
        let current = state.current;
        Ok(state
            .questions
            .get(current)
            .and_then(|q| q.fill_value.as_ref())
            .map(|_| current))
    }

    async fn read_fill_value(&self, handle: &usize) -> Result<String> {
        let state = self.lock();
        match state.questions.get(*handle).and_then(|q| q.fill_value.clone()) {
            Some(value) => Ok(value),
            None => bail!("输入区域已不存在"),
        }
    }

    async fn focus_fill_target(&self, handle: &usize) -> Result<()> {
        if self.lock().questions.get(*handle).is_none() {
            bail!("输入区域已不存在");
        }
        Ok(())
    }

    async fn write_fill_value(&self, handle: &usize, value: &str) -> Result<()> {
        let mut state = self.lock();
        state.activity.writes += 1;
        match state.questions.get_mut(*handle).and_then(|q| q.fill_value.as_mut()) {
            Some(slot) => {
                *slot = value.to_string();
                Ok(())
            }
            None => bail!("输入区域已不存在"),
        }
    }

    async fn notify_changed(&self, _handle: &usize) -> Result<()> {
        self.lock().activity.notifications += 1;
        Ok(())
    }

    async fn next_enabled(&self) -> Result<bool> {
        let state = self.lock();
        Ok(state.current + 1 < state.questions.len())
    }

    async fn activate_next(&self) -> Result<bool> {
        let mut state = self.lock();
        if state.current + 1 < state.questions.len() {
            state.current += 1;
            state.activity.advances += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
