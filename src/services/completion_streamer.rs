/// 主观题流式作答
///
/// 从 AI 流式接口逐段取回答案，边接收边写入页面输入区域。
/// 输入区域已有内容时直接跳过，不请求 AI。
use futures::StreamExt;
use reqwest::Url;
use tracing::{debug, info, warn};

use crate::clients::{ChatRequest, CompletionChunk, CompletionSource};
use crate::config::Config;
use crate::error::PipelineFailure;
use crate::infrastructure::HostSurface;
use crate::models::QuestionKind;

/// AI 调用参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl CompletionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: config.llm_api_key.clone(),
            base_url: config.llm_api_base_url.clone(),
            model: config.llm_model_name.clone(),
            system_prompt: config.llm_system_prompt.clone(),
        }
    }

    /// 校验凭证和端点，返回去掉末尾 `/` 的端点
    pub fn validated_endpoint(&self) -> Result<String, PipelineFailure> {
        if self.api_key.trim().is_empty() {
            return Err(PipelineFailure::Configuration(
                "未配置 AI API Key (LLM_API_KEY)".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(PipelineFailure::Configuration("未配置 AI 模型名称".to_string()));
        }
        let endpoint = self.base_url.trim().trim_end_matches('/').to_string();
        Url::parse(&endpoint).map_err(|e| {
            PipelineFailure::Configuration(format!("AI 接口地址无效 '{}': {}", self.base_url, e))
        })?;
        Ok(endpoint)
    }
}

/// 流式作答状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Completed,
    /// 输入区域已有内容
    Skipped,
    Failed,
}

/// 流式作答结果；失败时 `text` 保留已接收的部分
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOutcome {
    pub status: StreamStatus,
    pub text: String,
    pub failure: Option<PipelineFailure>,
}

impl StreamOutcome {
    fn completed(text: String) -> Self {
        Self {
            status: StreamStatus::Completed,
            text,
            failure: None,
        }
    }

    fn skipped() -> Self {
        Self {
            status: StreamStatus::Skipped,
            text: String::new(),
            failure: None,
        }
    }

    fn failed(failure: PipelineFailure, partial: String) -> Self {
        Self {
            status: StreamStatus::Failed,
            text: partial,
            failure: Some(failure),
        }
    }
}

/// 主观题流式作答服务
pub struct CompletionStreamer<C> {
    source: C,
    settings: CompletionSettings,
}

impl<C: CompletionSource> CompletionStreamer<C> {
    pub fn new(source: C, settings: CompletionSettings) -> Self {
        Self { source, settings }
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub async fn stream_answer<S: HostSurface>(
        &self,
        surface: &S,
        kind: QuestionKind,
        prompt: &str,
    ) -> StreamOutcome {
        let handle = match surface.query_fill_target(kind).await {
            Ok(Some(handle)) => handle,
            Ok(None) => {
                return StreamOutcome::failed(
                    PipelineFailure::Application("找不到答题输入区域".to_string()),
                    String::new(),
                )
            }
            Err(e) => {
                return StreamOutcome::failed(
                    PipelineFailure::Application(format!("查找输入区域失败: {:#}", e)),
                    String::new(),
                )
            }
        };

        match surface.read_fill_value(&handle).await {
            Ok(existing) if !existing.trim().is_empty() => {
                info!("输入区域已有内容，跳过");
                return StreamOutcome::skipped();
            }
            Ok(_) => {}
            Err(e) => {
                return StreamOutcome::failed(
                    PipelineFailure::Application(format!("读取输入区域失败: {:#}", e)),
                    String::new(),
                )
            }
        }

        let endpoint = match self.settings.validated_endpoint() {
            Ok(endpoint) => endpoint,
            Err(failure) => return StreamOutcome::failed(failure, String::new()),
        };
        if prompt.trim().is_empty() {
            return StreamOutcome::failed(
                PipelineFailure::Extraction("题干为空".to_string()),
                String::new(),
            );
        }

        let prepared = async {
            surface.focus_fill_target(&handle).await?;
            surface.write_fill_value(&handle, "").await
        }
        .await;
        if let Err(e) = prepared {
            return StreamOutcome::failed(
                PipelineFailure::Application(format!("清空输入区域失败: {:#}", e)),
                String::new(),
            );
        }

        let request = ChatRequest {
            system_prompt: self.settings.system_prompt.clone(),
            user_prompt: prompt.trim().to_string(),
            credential: self.settings.api_key.clone(),
            endpoint,
            model: self.settings.model.clone(),
        };

        let mut stream = match self.source.stream_chat(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("AI 请求失败: {:#}", e);
                return StreamOutcome::failed(
                    PipelineFailure::SourceUnavailable(format!("AI 请求失败: {:#}", e)),
                    String::new(),
                );
            }
        };

        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(CompletionChunk::Delta(delta)) => {
                    if delta.is_empty() {
                        continue;
                    }
                    if let Err(e) = surface.append_fill_value(&handle, &delta).await {
                        warn!("写入流式内容失败: {:#}", e);
                        return StreamOutcome::failed(
                            PipelineFailure::Application(format!("写入流式内容失败: {:#}", e)),
                            buffer,
                        );
                    }
                    buffer.push_str(&delta);
                }
                Ok(CompletionChunk::Done) => break,
                Err(e) => {
                    warn!("AI 流中断，已接收 {} 字符: {:#}", buffer.chars().count(), e);
                    return StreamOutcome::failed(
                        PipelineFailure::SourceUnavailable(format!("AI 流中断: {:#}", e)),
                        buffer,
                    );
                }
            }
        }

        if let Err(e) = surface.notify_changed(&handle).await {
            warn!("触发输入事件失败: {:#}", e);
        }

        if buffer.trim().is_empty() {
            return StreamOutcome::failed(
                PipelineFailure::SourceUnavailable("AI 未返回内容".to_string()),
                buffer,
            );
        }

        debug!("流式作答完成，共 {} 字符", buffer.chars().count());
        StreamOutcome::completed(buffer)
    }
}
