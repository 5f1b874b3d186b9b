//! AI 流式对话客户端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 的流式接口
//! - 支持自定义 API 端点和模型（兼容 OpenAI API 的服务）

use anyhow::Result;
use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, warn};

/// 一次流式对话请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub credential: String,
    pub endpoint: String,
    pub model: String,
}

/// 流中的一段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionChunk {
    /// 增量文本
    Delta(String),
    /// 结束标记
    Done,
}

pub type ChunkStream = BoxStream<'static, Result<CompletionChunk>>;

/// 流式文本来源
#[allow(async_fn_in_trait)]
pub trait CompletionSource {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream>;
}

/// OpenAI 兼容接口的流式客户端
#[derive(Debug, Clone)]
pub struct LlmClient {
    temperature: f32,
    max_tokens: u32,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl LlmClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionSource for LlmClient {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream> {
        debug!(
            "调用 AI 流式接口，模型: {}, 端点: {}",
            request.model, request.endpoint
        );

        let openai_config = OpenAIConfig::new()
            .with_api_key(&request.credential)
            .with_api_base(&request.endpoint);
        let client = Client::with_config(openai_config);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.as_str())
            .build()?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .stream(true)
            .build()?;

        let response_stream = client
            .chat()
            .create_stream(chat_request)
            .await
            .map_err(|e| {
                warn!("AI 流式接口调用失败: {}", e);
                anyhow::anyhow!("AI 流式接口调用失败: {}", e)
            })?;

        let deltas = response_stream.map(|item| match item {
            Ok(response) => Ok(CompletionChunk::Delta(
                response
                    .choices
                    .into_iter()
                    .filter_map(|choice| choice.delta.content)
                    .collect(),
            )),
            Err(e) => Err(anyhow::anyhow!("AI 流式数据读取失败: {}", e)),
        });

        Ok(deltas
            .chain(stream::once(async { Ok(CompletionChunk::Done) }))
            .boxed())
    }
}
