/// 题库 HTTP 客户端
///
/// 只负责把准备好的请求发出去并把响应体解析为 JSON，
/// 不关心题库的字段含义。
use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::models::HttpMethod;

/// 一次题库请求
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRequest {
    pub method: HttpMethod,
    pub url: String,
    /// 查询串参数（GET）
    pub query: Vec<(String, String)>,
    /// JSON 请求体（POST）
    pub body: Option<JsonValue>,
}

impl SourceRequest {
    pub fn get(url: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: JsonValue) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }
}

/// 题库请求的传输层
#[allow(async_fn_in_trait)]
pub trait AnswerTransport {
    /// 发送请求；非 2xx、网络错误或非 JSON 响应都返回错误
    async fn send(&self, request: &SourceRequest) -> Result<JsonValue>;
}

/// 基于 reqwest 的题库客户端
#[derive(Clone, Default)]
pub struct TikuClient {
    http: reqwest::Client,
}

impl TikuClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnswerTransport for TikuClient {
    async fn send(&self, request: &SourceRequest) -> Result<JsonValue> {
        debug!("题库请求: {:?} {}", request.method, request.url);

        let builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url).query(&request.query),
            HttpMethod::Post => {
                let builder = self.http.post(&request.url);
                match &request.body {
                    Some(body) => builder.json(body),
                    None => builder,
                }
            }
        };

        let response = builder
            .send()
            .await
            .with_context(|| format!("请求失败: {}", request.url))?
            .error_for_status()
            .with_context(|| format!("HTTP 状态异常: {}", request.url))?;

        let body: JsonValue = response
            .json()
            .await
            .with_context(|| format!("响应不是合法 JSON: {}", request.url))?;

        debug!("题库响应: {}", body);
        Ok(body)
    }
}
