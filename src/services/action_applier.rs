/// 答案应用服务
///
/// 把解析后的答案写到页面：点击选项或填写输入框。
/// 找不到某个控件只影响该选项，其余选项继续处理。
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Timings;
use crate::infrastructure::HostSurface;
use crate::models::{option_label, QuestionKind, ResolvedAnswer};
use crate::utils::poll_until;

/// 应用结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// 成功应用的选项数（填空为 0 或 1）
    pub applied_count: usize,
    /// 找不到控件或未能选中的选项下标
    pub missing: Vec<usize>,
}

impl ApplyReport {
    pub fn applied(&self) -> bool {
        self.applied_count > 0
    }
}

/// 答案应用服务
#[derive(Debug, Clone)]
pub struct ActionApplier {
    poll_interval: Duration,
    poll_attempts: usize,
}

impl ActionApplier {
    pub fn new(timings: &Timings) -> Self {
        Self {
            poll_interval: timings.choice_poll_interval,
            poll_attempts: timings.choice_poll_attempts,
        }
    }

    pub async fn apply<S: HostSurface>(
        &self,
        surface: &S,
        kind: QuestionKind,
        answer: &ResolvedAnswer,
    ) -> ApplyReport {
        match (kind, answer) {
            (QuestionKind::Single | QuestionKind::Judgement, ResolvedAnswer::Selections(indices)) => {
                self.click_each(surface, kind, indices).await
            }
            (QuestionKind::Multiple, ResolvedAnswer::Selections(indices)) => {
                self.toggle_each(surface, indices).await
            }
            (QuestionKind::Completion | QuestionKind::OpenEnded, ResolvedAnswer::Text(text)) => {
                self.fill(surface, kind, text).await
            }
            _ => {
                debug!("题型 {} 与答案 {:?} 不匹配，未做任何操作", kind, answer);
                ApplyReport::default()
            }
        }
    }

    /// 单选 / 判断：每个选项点击一次
    async fn click_each<S: HostSurface>(
        &self,
        surface: &S,
        kind: QuestionKind,
        indices: &[usize],
    ) -> ApplyReport {
        let mut report = ApplyReport::default();
        for &index in indices {
            match surface.activate_choice(kind, index).await {
                Ok(true) => {
                    debug!("已点击选项 {}", option_label(index));
                    report.applied_count += 1;
                }
                Ok(false) => {
                    warn!("找不到选项 {}", option_label(index));
                    report.missing.push(index);
                }
                Err(e) => {
                    warn!("点击选项 {} 失败: {:#}", option_label(index), e);
                    report.missing.push(index);
                }
            }
        }
        report
    }

    /// 多选：点击后轮询选中状态，直到选中或次数用尽
    async fn toggle_each<S: HostSurface>(&self, surface: &S, indices: &[usize]) -> ApplyReport {
        let kind = QuestionKind::Multiple;
        let mut report = ApplyReport::default();

        for &index in indices {
            let label = option_label(index);
            match surface.query_choice_state(kind, index).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    warn!("找不到选项 {}", label);
                    report.missing.push(index);
                    continue;
                }
                Err(e) => {
                    warn!("读取选项 {} 状态失败: {:#}", label, e);
                    report.missing.push(index);
                    continue;
                }
            }

            let outcome = poll_until(
                self.poll_attempts,
                self.poll_interval,
                move || async move {
                    let state = surface.query_choice_state(kind, index).await?;
                    Ok::<bool, anyhow::Error>(state == Some(true))
                },
                move || async move { surface.activate_choice(kind, index).await },
            )
            .await;

            match outcome {
                Ok(outcome) if outcome.satisfied => {
                    debug!("选项 {} 已选中（点击 {} 次）", label, outcome.actions);
                    report.applied_count += 1;
                }
                Ok(outcome) => {
                    warn!("选项 {} 点击 {} 次后仍未选中", label, outcome.actions);
                    report.missing.push(index);
                }
                Err(e) => {
                    warn!("选择选项 {} 失败: {:#}", label, e);
                    report.missing.push(index);
                }
            }
        }
        report
    }

    /// 填空：聚焦、清空、写入、触发事件
    async fn fill<S: HostSurface>(&self, surface: &S, kind: QuestionKind, text: &str) -> ApplyReport {
        let handle = match surface.query_fill_target(kind).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                warn!("找不到输入区域");
                return ApplyReport::default();
            }
            Err(e) => {
                warn!("查找输入区域失败: {:#}", e);
                return ApplyReport::default();
            }
        };

        let result = async {
            surface.focus_fill_target(&handle).await?;
            surface.write_fill_value(&handle, "").await?;
            surface.write_fill_value(&handle, text).await?;
            surface.notify_changed(&handle).await
        }
        .await;

        match result {
            Ok(()) => ApplyReport {
                applied_count: 1,
                missing: Vec::new(),
            },
            Err(e) => {
                warn!("写入答案失败: {:#}", e);
                ApplyReport::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MemoryOption, MemoryQuestion, MemorySurface, SurfaceActivity};

    fn applier() -> ActionApplier {
        ActionApplier::new(&Timings::immediate())
    }

    fn checked(surface: &MemorySurface) -> Vec<bool> {
        surface
            .question(0)
            .map(|q| q.options.iter().map(|o| o.checked).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_single_click() {
        let surface = MemorySurface::new(vec![
            MemoryQuestion::new("单选题", "首都").with_options(&["北京", "上海", "广州"])
        ]);

        let report = applier()
            .apply(&surface, QuestionKind::Single, &ResolvedAnswer::Selections(vec![1]))
            .await;
        assert!(report.applied());
        assert_eq!(checked(&surface), vec![false, true, false]);
        assert_eq!(surface.activity().activations, 1);
    }

    #[tokio::test]
    async fn test_multiple_polls_sluggish_option() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("多选题", "质数")
            .with_option(MemoryOption::new("2"))
            .with_option(MemoryOption::new("3").sluggish(1))
            .with_option(MemoryOption::new("4"))]);

        let report = applier()
            .apply(&surface, QuestionKind::Multiple, &ResolvedAnswer::Selections(vec![0, 1]))
            .await;
        assert_eq!(report.applied_count, 2);
        assert!(report.missing.is_empty());
        assert_eq!(checked(&surface), vec![true, true, false]);
        // 第二个选项第一次点击无效
        assert_eq!(surface.activity().activations, 3);
    }

    #[tokio::test]
    async fn test_multiple_keeps_already_checked() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("多选题", "质数")
            .with_option(MemoryOption::new("2").checked())
            .with_option(MemoryOption::new("3"))]);

        let report = applier()
            .apply(&surface, QuestionKind::Multiple, &ResolvedAnswer::Selections(vec![0, 1]))
            .await;
        assert_eq!(report.applied_count, 2);
        assert_eq!(checked(&surface), vec![true, true]);
        assert_eq!(surface.activity().activations, 1);
    }

    #[tokio::test]
    async fn test_multiple_gives_up_after_attempts() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("多选题", "质数")
            .with_option(MemoryOption::new("2").sluggish(10))]);

        let report = applier()
            .apply(&surface, QuestionKind::Multiple, &ResolvedAnswer::Selections(vec![0]))
            .await;
        assert!(!report.applied());
        assert_eq!(report.missing, vec![0]);
        assert_eq!(surface.activity().activations, 3);
    }

    #[tokio::test]
    async fn test_missing_control_does_not_abort_others() {
        let surface = MemorySurface::new(vec![
            MemoryQuestion::new("多选题", "质数").with_options(&["2", "3"])
        ]);

        let report = applier()
            .apply(&surface, QuestionKind::Multiple, &ResolvedAnswer::Selections(vec![3, 1]))
            .await;
        assert_eq!(report.applied_count, 1);
        assert_eq!(report.missing, vec![3]);
        assert_eq!(checked(&surface), vec![false, true]);
    }

    #[tokio::test]
    async fn test_all_missing_is_not_applied() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("判断题", "地球是圆的")]);

        let report = applier()
            .apply(&surface, QuestionKind::Judgement, &ResolvedAnswer::Selections(vec![0]))
            .await;
        assert!(!report.applied());
    }

    #[tokio::test]
    async fn test_fill_writes_and_notifies() {
        let surface = MemorySurface::new(vec![
            MemoryQuestion::new("填空题", "1+1=____").with_fill("旧")
        ]);

        let report = applier()
            .apply(
                &surface,
                QuestionKind::Completion,
                &ResolvedAnswer::Text("2".to_string()),
            )
            .await;
        assert!(report.applied());
        assert_eq!(surface.question(0).unwrap().fill_value.as_deref(), Some("2"));
        assert_eq!(surface.activity().notifications, 1);
    }

    #[tokio::test]
    async fn test_fill_without_target() {
        let surface = MemorySurface::new(vec![MemoryQuestion::new("填空题", "1+1=____")]);

        let report = applier()
            .apply(
                &surface,
                QuestionKind::Completion,
                &ResolvedAnswer::Text("2".to_string()),
            )
            .await;
        assert!(!report.applied());
        assert_eq!(surface.activity().writes, 0);
    }

    #[tokio::test]
    async fn test_mismatched_answer_is_noop() {
        let surface = MemorySurface::new(vec![
            MemoryQuestion::new("单选题", "首都").with_options(&["北京"])
        ]);

        let report = applier()
            .apply(&surface, QuestionKind::Single, &ResolvedAnswer::Text("北京".to_string()))
            .await;
        assert!(!report.applied());
        assert_eq!(surface.activity(), SurfaceActivity::default());
    }
}
