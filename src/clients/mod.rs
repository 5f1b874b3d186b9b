//! 外部服务客户端
//!
//! - `TikuClient` - 题库 HTTP 请求
//! - `LlmClient` - AI 流式对话

pub mod llm_client;
pub mod tiku_client;

pub use llm_client::{ChatRequest, ChunkStream, CompletionChunk, CompletionSource, LlmClient};
pub use tiku_client::{AnswerTransport, SourceRequest, TikuClient};
