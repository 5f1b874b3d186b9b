//! 顺序答题器 - 编排层
//!
//! ## 职责
//!
//! 逐题循环：识别 → 作答 → 等待 → 下一题，直到没有下一题、页面上没有题目或收到停止请求。
//!
//! ## 状态
//!
//! ```text
//! Idle → Running → {Answering, Advancing} → Completed | Cancelled | Stalled
//! ```
//!
//! - 所有状态转换都发生在循环内部的检查点
//! - 停止请求只取消 `CancellationToken`，正在进行的网络请求允许完成
//! - 任何一道题失败都只记录，不会中断整个运行

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clients::{AnswerTransport, CompletionSource};
use crate::config::Timings;
use crate::infrastructure::HostSurface;
use crate::models::{IterationResult, RunLog, RunOutcome, RunSummary};
use crate::services::QuestionReader;
use crate::utils::wait_or_cancel;
use crate::workflow::{QuestionCtx, QuestionFlow};

/// 运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
    Answering,
    Advancing,
    Completed,
    Cancelled,
    Stalled,
}

impl From<RunOutcome> for RunPhase {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunPhase::Completed,
            RunOutcome::Cancelled => RunPhase::Cancelled,
            RunOutcome::Stalled => RunPhase::Stalled,
        }
    }
}

/// 进度快照，通过 watch 通道发布
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub phase: RunPhase,
    /// 正在处理的题号
    pub question_number: Option<u32>,
    /// 已处理题数
    pub attempted: usize,
    /// 成功作答题数
    pub succeeded: usize,
    /// 最近一题的结果
    pub last_result: Option<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            phase: RunPhase::Idle,
            question_number: None,
            attempted: 0,
            succeeded: 0,
            last_result: None,
        }
    }
}

/// 单次运行的状态，每次运行重新创建
#[derive(Debug, Default)]
struct RunState {
    log: RunLog,
    success_count: usize,
    iteration: u32,
}

impl RunState {
    fn record(&mut self, result: IterationResult) {
        if result.applied {
            self.success_count += 1;
        }
        self.log.push(result);
    }

    fn finish(self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            question_count: self.log.len(),
            success_count: self.success_count,
            log: self.log,
        }
    }
}

/// 顺序答题器
pub struct SequentialRunner<S, T, C> {
    surface: S,
    reader: QuestionReader,
    flow: QuestionFlow<T, C>,
    timings: Timings,
    progress: watch::Sender<Progress>,
}

impl<S, T, C> SequentialRunner<S, T, C>
where
    S: HostSurface,
    T: AnswerTransport,
    C: CompletionSource,
{
    pub fn new(surface: S, flow: QuestionFlow<T, C>, timings: Timings) -> Self {
        let (progress, _) = watch::channel(Progress::default());
        Self {
            surface,
            reader: QuestionReader::new(),
            flow,
            timings,
            progress,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// 订阅进度
    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    fn publish(&self, state: &RunState, phase: RunPhase, question_number: Option<u32>) {
        self.progress.send_replace(Progress {
            phase,
            question_number,
            attempted: state.log.len(),
            succeeded: state.success_count,
            last_result: state.log.entries().last().map(|r| r.to_string()),
        });
    }

    /// 执行一次完整运行
    ///
    /// 无论以何种方式结束，都返回包含全部题目记录的汇总。
    pub async fn run(&self, cancel: &CancellationToken) -> RunSummary {
        let mut state = RunState::default();
        self.publish(&state, RunPhase::Running, None);
        info!("▶ 开始答题");

        let outcome = self.run_loop(&mut state, cancel).await;

        let summary = state.finish(outcome);
        self.progress.send_replace(Progress {
            phase: outcome.into(),
            question_number: None,
            attempted: summary.question_count,
            succeeded: summary.success_count,
            last_result: summary.log.entries().last().map(|r| r.to_string()),
        });
        info!("📊 {}", summary.message());
        summary
    }

    async fn run_loop(&self, state: &mut RunState, cancel: &CancellationToken) -> RunOutcome {
        let timings = self.timings;

        loop {
            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            let snapshot = self.reader.read(&self.surface).await;
            if !snapshot.kind.is_recognized() {
                warn!("⚠️ 未找到可识别的题目");
                return RunOutcome::Stalled;
            }

            state.iteration += 1;
            let ctx = QuestionCtx::new(snapshot.number, state.iteration);
            info!("{} 📝 {}", ctx, snapshot.kind);

            let result = if snapshot.has_prior_answer {
                info!("{} ↷ 已有答案，跳过", ctx);
                IterationResult::skipped(ctx.question_number, snapshot.kind, "已有答案，跳过")
            } else {
                if cancel.is_cancelled() {
                    return RunOutcome::Cancelled;
                }
                self.publish(state, RunPhase::Answering, Some(ctx.question_number));
                self.flow.run(&self.surface, &snapshot, &ctx).await
            };
            debug!("{} 结果: {}", ctx, result);
            state.record(result);
            self.publish(state, RunPhase::Running, Some(ctx.question_number));

            // 等待页面保存本题作答
            if !wait_or_cancel(timings.answer_settle, cancel).await {
                return RunOutcome::Cancelled;
            }
            self.publish(state, RunPhase::Advancing, Some(ctx.question_number));

            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            match self.surface.next_enabled().await {
                Ok(true) => {}
                Ok(false) => {
                    info!("{} 已是最后一题", ctx);
                    return RunOutcome::Completed;
                }
                Err(e) => {
                    warn!("{} 无法读取下一题按钮: {:#}", ctx, e);
                    return RunOutcome::Completed;
                }
            }

            if cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            match self.surface.activate_next().await {
                Ok(true) => debug!("{} ➡ 下一题", ctx),
                Ok(false) => {
                    info!("{} 下一题按钮不可用，结束", ctx);
                    return RunOutcome::Completed;
                }
                Err(e) => {
                    warn!("{} 切换下一题失败: {:#}", ctx, e);
                    return RunOutcome::Completed;
                }
            }

            // 等待新题目渲染
            if !wait_or_cancel(timings.advance_settle, cancel).await {
                return RunOutcome::Cancelled;
            }
            if !self.reader.detect_kind(&self.surface).await.is_recognized() {
                info!("已离开答题页面，结束");
                return RunOutcome::Completed;
            }

            if !wait_or_cancel(timings.between_questions, cancel).await {
                return RunOutcome::Cancelled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ChatRequest, ChunkStream, SourceRequest};
    use crate::infrastructure::{MemoryOption, MemoryQuestion, MemorySurface};
    use crate::models::{IterationStatus, QuestionKind};
    use crate::services::{
        ActionApplier, AnswerSourceClient, CompletionSettings, CompletionStreamer, SourceStrategy,
    };
    use anyhow::{anyhow, Result};
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct BankAnswer(&'static str);

    impl AnswerTransport for BankAnswer {
        async fn send(&self, _request: &SourceRequest) -> Result<JsonValue> {
            Ok(json!({"code": 1, "data": {"answer": self.0}}))
        }
    }

    struct NoCompletion;

    impl CompletionSource for NoCompletion {
        async fn stream_chat(&self, _request: &ChatRequest) -> Result<ChunkStream> {
            Err(anyhow!("未启用"))
        }
    }

    fn runner(
        questions: Vec<MemoryQuestion>,
        answer: &'static str,
    ) -> SequentialRunner<MemorySurface, BankAnswer, NoCompletion> {
        runner_on(MemorySurface::new(questions), answer, Timings::immediate())
    }

    fn runner_on<S: HostSurface>(
        surface: S,
        answer: &'static str,
        timings: Timings,
    ) -> SequentialRunner<S, BankAnswer, NoCompletion> {
        let flow = QuestionFlow::new(
            AnswerSourceClient::new(
                BankAnswer(answer),
                SourceStrategy::Fixed {
                    url: "https://tk.example.com/query".to_string(),
                    token: "t0k".to_string(),
                },
                Duration::ZERO,
            ),
            CompletionStreamer::new(
                NoCompletion,
                CompletionSettings {
                    api_key: "sk-test".to_string(),
                    base_url: "https://api.example.com/v1".to_string(),
                    model: "m".to_string(),
                    system_prompt: String::new(),
                },
            ),
            ActionApplier::new(&timings),
        );
        SequentialRunner::new(surface, flow, timings)
    }

    fn single(prompt: &str) -> MemoryQuestion {
        MemoryQuestion::new("单选题", prompt).with_options(&["甲", "乙", "丙"])
    }

    #[tokio::test]
    async fn test_runs_until_last_question() {
        let runner = runner(vec![single("一"), single("二"), single("三")], "B");

        let summary = runner.run(&CancellationToken::new()).await;
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.question_count, 3);
        assert_eq!(summary.success_count, 3);
        let numbers: Vec<u32> = summary.log.entries().iter().map(|r| r.question_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(runner.surface().activity().advances, 2);
    }

    #[tokio::test]
    async fn test_page_numbers_used_when_present() {
        let runner = runner(vec![single("一").numbered("7.（2 分）")], "A");

        let summary = runner.run(&CancellationToken::new()).await;
        assert_eq!(summary.log.entries()[0].question_number, 7);
    }

    #[tokio::test]
    async fn test_stalls_without_question() {
        let runner = runner(vec![MemoryQuestion::new("阅读题", "……")], "A");

        let summary = runner.run(&CancellationToken::new()).await;
        assert_eq!(summary.outcome, RunOutcome::Stalled);
        assert!(summary.log.is_empty());
        assert_eq!(summary.message(), "答题未找到题目: 成功 0/0 题");
    }

    #[tokio::test]
    async fn test_prior_answer_is_skipped_and_advanced() {
        let answered = MemoryQuestion::new("单选题", "一")
            .with_option(MemoryOption::new("甲").checked())
            .with_option(MemoryOption::new("乙"));
        let runner = runner(vec![answered, single("二")], "B");

        let summary = runner.run(&CancellationToken::new()).await;
        let entries = summary.log.entries();
        assert_eq!(entries[0].status, IterationStatus::Skipped);
        assert_eq!(entries[1].status, IterationStatus::Answered);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.skipped_count(), 1);
        // 已作答的题目没有被改动
        let first = runner.surface().question(0).unwrap();
        assert!(first.options[0].checked);
        assert!(!first.options[1].checked);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_run() {
        let runner = runner(
            vec![
                MemoryQuestion::new("主观题", "论述").with_fill(""),
                single("二"),
            ],
            "C",
        );

        let summary = runner.run(&CancellationToken::new()).await;
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.question_count, 2);
        assert_eq!(summary.log.entries()[0].status, IterationStatus::Failed);
        assert_eq!(summary.log.entries()[0].kind, QuestionKind::OpenEnded);
        assert_eq!(summary.log.entries()[1].selected_options, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_navigation_away_completes() {
        let runner = runner(vec![single("一"), MemoryQuestion::new("阅读题", "")], "A");

        let summary = runner.run(&CancellationToken::new()).await;
        assert_eq!(summary.outcome, RunOutcome::Completed);
        assert_eq!(summary.question_count, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let runner = runner(vec![single("一")], "A");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = runner.run(&cancel).await;
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert!(summary.log.is_empty());
        assert_eq!(runner.surface().activity().activations, 0);
    }

    #[tokio::test]
    async fn test_progress_reports_terminal_phase() {
        let runner = runner(vec![single("一"), single("二")], "A");
        let progress = runner.subscribe();
        assert_eq!(progress.borrow().phase, RunPhase::Idle);

        runner.run(&CancellationToken::new()).await;
        let last = progress.borrow().clone();
        assert_eq!(last.phase, RunPhase::Completed);
        assert_eq!(last.attempted, 2);
        assert_eq!(last.succeeded, 2);
    }

    /// 在某个页面原语被调用时请求停止
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum StopAt {
        /// 读取选项时，即作答之前
        OptionRead,
        /// 检查"下一题"按钮时
        NextCheck,
        /// 点击"下一题"时
        Advance,
        /// 切换后重新识别题型时
        Recheck,
    }

    struct StoppingSurface {
        inner: MemorySurface,
        stop_at: StopAt,
        cancel: CancellationToken,
        advanced: AtomicBool,
    }

    impl StoppingSurface {
        fn new(questions: Vec<MemoryQuestion>, stop_at: StopAt, cancel: &CancellationToken) -> Self {
            Self {
                inner: MemorySurface::new(questions),
                stop_at,
                cancel: cancel.clone(),
                advanced: AtomicBool::new(false),
            }
        }

        fn trip(&self, point: StopAt) {
            if self.stop_at == point {
                self.cancel.cancel();
            }
        }
    }

    impl HostSurface for StoppingSurface {
        type Handle = usize;

        async fn query_tag(&self) -> Result<Option<String>> {
            if self.advanced.load(Ordering::SeqCst) {
                self.trip(StopAt::Recheck);
            }
            self.inner.query_tag().await
        }

        async fn query_number_label(&self) -> Result<Option<String>> {
            self.inner.query_number_label().await
        }

        async fn query_prompt_text(&self, kind: QuestionKind) -> Result<String> {
            self.inner.query_prompt_text(kind).await
        }

        async fn query_option_texts(&self, kind: QuestionKind) -> Result<Vec<String>> {
            self.trip(StopAt::OptionRead);
            self.inner.query_option_texts(kind).await
        }

        async fn query_choice_state(&self, kind: QuestionKind, index: usize) -> Result<Option<bool>> {
            self.inner.query_choice_state(kind, index).await
        }

        async fn activate_choice(&self, kind: QuestionKind, index: usize) -> Result<bool> {
            self.inner.activate_choice(kind, index).await
        }

        async fn query_fill_target(&self, kind: QuestionKind) -> Result<Option<usize>> {
            self.inner.query_fill_target(kind).await
        }

        async fn read_fill_value(&self, handle: &usize) -> Result<String> {
            self.inner.read_fill_value(handle).await
        }

        async fn focus_fill_target(&self, handle: &usize) -> Result<()> {
            self.inner.focus_fill_target(handle).await
        }

        async fn write_fill_value(&self, handle: &usize, value: &str) -> Result<()> {
            self.inner.write_fill_value(handle, value).await
        }

        async fn notify_changed(&self, handle: &usize) -> Result<()> {
            self.inner.notify_changed(handle).await
        }

        async fn next_enabled(&self) -> Result<bool> {
            self.trip(StopAt::NextCheck);
            self.inner.next_enabled().await
        }

        async fn activate_next(&self) -> Result<bool> {
            let advanced = self.inner.activate_next().await?;
            self.advanced.store(advanced, Ordering::SeqCst);
            self.trip(StopAt::Advance);
            Ok(advanced)
        }
    }

    async fn run_stopping_at(
        stop_at: StopAt,
    ) -> (RunSummary, SequentialRunner<StoppingSurface, BankAnswer, NoCompletion>) {
        let cancel = CancellationToken::new();
        let surface = StoppingSurface::new(vec![single("一"), single("二"), single("三")], stop_at, &cancel);
        let runner = runner_on(surface, "B", Timings::immediate());
        let summary = runner.run(&cancel).await;
        (summary, runner)
    }

    #[tokio::test]
    async fn test_stop_before_answering_leaves_question_untouched() {
        let (summary, runner) = run_stopping_at(StopAt::OptionRead).await;

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert!(summary.log.is_empty());
        assert_eq!(runner.surface().inner.activity().activations, 0);
        assert_eq!(runner.surface().inner.activity().advances, 0);
    }

    #[tokio::test]
    async fn test_stop_at_next_check_does_not_advance() {
        let (summary, runner) = run_stopping_at(StopAt::NextCheck).await;

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.question_count, 1);
        assert_eq!(summary.success_count, 1);
        assert_eq!(runner.surface().inner.activity().advances, 0);
        assert_eq!(runner.surface().inner.current_index(), 0);
    }

    #[tokio::test]
    async fn test_stop_during_advance_ends_after_post_advance_wait() {
        let (summary, runner) = run_stopping_at(StopAt::Advance).await;

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.question_count, 1);
        assert_eq!(runner.surface().inner.activity().advances, 1);
        // 第 2 题已显示但没有作答
        let second = runner.surface().inner.question(1).unwrap();
        assert!(second.options.iter().all(|o| !o.checked));
    }

    #[tokio::test]
    async fn test_stop_during_recheck_ends_before_next_iteration() {
        let (summary, runner) = run_stopping_at(StopAt::Recheck).await;

        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.question_count, 1);
        assert_eq!(runner.surface().inner.activity().advances, 1);
        assert!(runner.surface().inner.question(1).unwrap().options.iter().all(|o| !o.checked));
    }

    #[tokio::test]
    async fn test_stop_interrupts_settle_wait() {
        let timings = Timings {
            answer_settle: Duration::from_secs(60),
            ..Timings::immediate()
        };
        let runner = runner_on(MemorySurface::new(vec![single("一"), single("二")]), "A", timings);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), runner.run(&cancel))
            .await
            .expect("停止请求应在等待期间生效");
        assert_eq!(summary.outcome, RunOutcome::Cancelled);
        assert_eq!(summary.question_count, 1);
        assert_eq!(runner.surface().activity().advances, 0);
    }
}
