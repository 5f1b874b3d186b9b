//! 题目处理流程 - 流程层
//!
//! 核心职责：定义"一道题"的完整作答流程
//!
//! 流程顺序：
//! 1. 选择题 / 填空题：题库查询 → 答案解析 → 写入页面
//! 2. 主观题：AI 流式生成，边生成边写入
//!
//! 每个阶段的失败都转换为 `PipelineFailure` 记录在结果中，不向上抛出。

use tracing::{debug, info, warn};

use crate::clients::{AnswerTransport, CompletionSource};
use crate::error::PipelineFailure;
use crate::infrastructure::HostSurface;
use crate::models::{IterationResult, QuestionKind, QuestionSnapshot, ResolvedAnswer};
use crate::services::{
    resolve, ActionApplier, AnswerSourceClient, CompletionStreamer, StreamStatus,
};
use crate::utils::truncate_text;
use crate::workflow::question_ctx::QuestionCtx;

/// 题目处理流程
///
/// - 编排单道题的作答步骤
/// - 不持有页面资源，页面由调用方传入
/// - 只依赖业务能力（services）
pub struct QuestionFlow<T, C> {
    answer_source: AnswerSourceClient<T>,
    streamer: CompletionStreamer<C>,
    applier: ActionApplier,
}

impl<T: AnswerTransport, C: CompletionSource> QuestionFlow<T, C> {
    pub fn new(
        answer_source: AnswerSourceClient<T>,
        streamer: CompletionStreamer<C>,
        applier: ActionApplier,
    ) -> Self {
        Self {
            answer_source,
            streamer,
            applier,
        }
    }

    /// 作答当前题目
    pub async fn run<S: HostSurface>(
        &self,
        surface: &S,
        snapshot: &QuestionSnapshot,
        ctx: &QuestionCtx,
    ) -> IterationResult {
        let number = ctx.question_number;
        let kind = snapshot.kind;
        debug!("{} 题干: {}", ctx, truncate_text(&snapshot.prompt_text, 50));

        match kind {
            QuestionKind::Unrecognized => {
                IterationResult::failed(number, kind, PipelineFailure::Detection)
            }
            QuestionKind::OpenEnded => self.stream_open_ended(surface, snapshot, ctx).await,
            _ => match self.answer_from_bank(surface, snapshot, ctx).await {
                Ok(result) => result,
                Err(failure) => {
                    warn!("{} ✗ {}", ctx, failure);
                    IterationResult::failed(number, kind, failure)
                }
            },
        }
    }

    /// 题库查询 → 解析 → 写入
    async fn answer_from_bank<S: HostSurface>(
        &self,
        surface: &S,
        snapshot: &QuestionSnapshot,
        ctx: &QuestionCtx,
    ) -> Result<IterationResult, PipelineFailure> {
        let kind = snapshot.kind;
        if snapshot.prompt_text.trim().is_empty() {
            return Err(PipelineFailure::Extraction("题干为空".to_string()));
        }
        if matches!(kind, QuestionKind::Single | QuestionKind::Multiple)
            && snapshot.option_texts.is_empty()
        {
            return Err(PipelineFailure::Extraction("未找到选项".to_string()));
        }
        self.answer_source.ensure_configured()?;

        info!("{} 🔍 查询题库...", ctx);
        let raw = self.answer_source.query(&snapshot.to_query()).await;
        if !raw.found {
            return Err(PipelineFailure::SourceUnavailable(raw.message));
        }
        if let Some(title) = &raw.corrected_title {
            debug!("{} 题库题干: {}", ctx, truncate_text(title, 50));
        }
        if let Some(times) = raw.remaining_times {
            debug!("{} 题库剩余次数: {}", ctx, times);
        }
        info!("{} ✓ 题库答案: {}", ctx, truncate_text(&raw.text, 50));

        let resolved = resolve(&raw.text, kind, &snapshot.option_texts);
        if resolved.is_empty() {
            return Err(PipelineFailure::Resolution(truncate_text(&raw.text, 50)));
        }

        let report = self.applier.apply(surface, kind, &resolved).await;
        if !report.applied() {
            return Err(PipelineFailure::Application(match &resolved {
                ResolvedAnswer::Selections(_) => format!(
                    "无法选择选项 {}",
                    resolved.labels().iter().collect::<String>()
                ),
                _ => "无法写入答案".to_string(),
            }));
        }

        let result = match resolved {
            ResolvedAnswer::Selections(indices) => {
                let applied: Vec<usize> = indices
                    .into_iter()
                    .filter(|i| !report.missing.contains(i))
                    .collect();
                IterationResult::answered(ctx.question_number, kind, "已选择答案")
                    .with_selections(applied)
            }
            ResolvedAnswer::Text(text) => {
                IterationResult::answered(ctx.question_number, kind, "已填写答案")
                    .with_filled_text(text)
            }
            ResolvedAnswer::Unresolved => {
                return Err(PipelineFailure::Resolution(truncate_text(&raw.text, 50)))
            }
        };
        info!("{} ✓ {}", ctx, result.message);
        Ok(result.with_source(raw.source_name))
    }

    /// 主观题流式作答
    async fn stream_open_ended<S: HostSurface>(
        &self,
        surface: &S,
        snapshot: &QuestionSnapshot,
        ctx: &QuestionCtx,
    ) -> IterationResult {
        let number = ctx.question_number;
        let kind = snapshot.kind;
        if snapshot.prompt_text.trim().is_empty() {
            return IterationResult::failed(
                number,
                kind,
                PipelineFailure::Extraction("题干为空".to_string()),
            );
        }

        info!("{} 🤖 AI 作答中...", ctx);
        let outcome = self
            .streamer
            .stream_answer(surface, kind, &snapshot.prompt_text)
            .await;
        let model = self.streamer.settings().model.clone();

        match outcome.status {
            StreamStatus::Completed => {
                info!(
                    "{} ✓ AI 作答完成，共 {} 字",
                    ctx,
                    outcome.text.chars().count()
                );
                IterationResult::answered(number, kind, "已生成答案")
                    .with_filled_text(outcome.text)
                    .with_source(model)
            }
            StreamStatus::Skipped => IterationResult::skipped(number, kind, "已有答案"),
            StreamStatus::Failed => {
                let failure = outcome.failure.unwrap_or_else(|| {
                    PipelineFailure::SourceUnavailable("AI 未返回内容".to_string())
                });
                warn!("{} ✗ {}", ctx, failure);
                let result = IterationResult::failed(number, kind, failure);
                if outcome.text.is_empty() {
                    result
                } else {
                    result.with_filled_text(outcome.text)
                }
            }
        }
    }
}
