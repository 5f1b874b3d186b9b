/// 答案来源服务
///
/// 两种策略：
/// - 固定题库接口：一次 GET 请求
/// - 模板化多题库：按顺序尝试，遇到第一个非空答案即停止
///
/// 网络错误、非 2xx、非法 JSON 都不会向外抛出，统一返回 `found = false`。
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clients::{AnswerTransport, SourceRequest};
use crate::error::PipelineFailure;
use crate::models::source::lookup_path;
use crate::models::{AnswerQuery, HttpMethod, RawAnswer, ResponseHandler, SourceDescriptor, SuccessRule};

const FIXED_SOURCE_NAME: &str = "题库接口";

/// 答案来源策略
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStrategy {
    /// 固定接口，`GET url?title=&type=&token=&options=`
    Fixed { url: String, token: String },
    /// 按顺序尝试的模板化题库源
    Templated {
        sources: Vec<SourceDescriptor>,
        token: String,
    },
}

/// 答案来源客户端
pub struct AnswerSourceClient<T> {
    transport: T,
    strategy: SourceStrategy,
    between_sources: Duration,
}

impl<T: AnswerTransport> AnswerSourceClient<T> {
    pub fn new(transport: T, strategy: SourceStrategy, between_sources: Duration) -> Self {
        Self {
            transport,
            strategy,
            between_sources,
        }
    }

    /// 检查凭证和题库源配置
    pub fn ensure_configured(&self) -> Result<(), PipelineFailure> {
        match &self.strategy {
            SourceStrategy::Fixed { token, .. } if token.trim().is_empty() => Err(
                PipelineFailure::Configuration("未配置题库 token (ANSWER_TOKEN)".to_string()),
            ),
            SourceStrategy::Templated { sources, .. } if sources.is_empty() => Err(
                PipelineFailure::Configuration("没有可用的题库源".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// 查询答案
    pub async fn query(&self, query: &AnswerQuery) -> RawAnswer {
        if query.title.trim().is_empty() {
            return RawAnswer::not_found("", "题目为空");
        }
        if let Err(failure) = self.ensure_configured() {
            return RawAnswer::not_found("", failure.to_string());
        }

        match &self.strategy {
            SourceStrategy::Fixed { url, token } => self.query_fixed(url, token, query).await,
            SourceStrategy::Templated { sources, token } => {
                self.query_templated(sources, token, query).await
            }
        }
    }

    async fn query_fixed(&self, url: &str, token: &str, query: &AnswerQuery) -> RawAnswer {
        let request = SourceRequest::get(
            url,
            vec![
                ("title".to_string(), query.title.clone()),
                ("type".to_string(), query.type_code.clone()),
                ("token".to_string(), token.to_string()),
                ("options".to_string(), query.joined_options()),
            ],
        );

        let body = match self.transport.send(&request).await {
            Ok(body) => body,
            Err(e) => {
                warn!("题库请求失败: {:#}", e);
                let mut answer = RawAnswer::not_found(FIXED_SOURCE_NAME, format!("请求失败: {:#}", e));
                answer.attempts_tried = 1;
                return answer;
            }
        };

        let handler = fixed_handler();
        let extracted = handler.extract(&body);
        let remaining_times = lookup_path(&body, "data.times").and_then(JsonValue::as_i64);
        let message = lookup_path(&body, "message")
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string();

        match extracted.answer {
            Some(text) => {
                debug!("题库返回答案: {}", text);
                RawAnswer {
                    found: true,
                    text,
                    corrected_title: extracted.question,
                    source_name: FIXED_SOURCE_NAME.to_string(),
                    attempts_tried: 1,
                    remaining_times,
                    extra: extracted.extra,
                    message,
                }
            }
            None => {
                let reason = if message.is_empty() {
                    "题库未返回答案".to_string()
                } else {
                    message
                };
                RawAnswer {
                    attempts_tried: 1,
                    remaining_times,
                    ..RawAnswer::not_found(FIXED_SOURCE_NAME, reason)
                }
            }
        }
    }

    async fn query_templated(
        &self,
        sources: &[SourceDescriptor],
        token: &str,
        query: &AnswerQuery,
    ) -> RawAnswer {
        let mut failures = Vec::new();

        for (attempt, source) in sources.iter().enumerate() {
            if attempt > 0 && !self.between_sources.is_zero() {
                tokio::time::sleep(self.between_sources).await;
            }
            let attempts_tried = attempt + 1;

            let request = build_request(source, query, token);
            debug!("尝试题库 [{}] ({}/{})", source.name, attempts_tried, sources.len());

            let body = match self.transport.send(&request).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("题库 [{}] 请求失败: {:#}", source.name, e);
                    failures.push(format!("{}: 请求失败", source.name));
                    continue;
                }
            };

            let extracted = source.handler.extract(&body);
            match extracted.answer {
                Some(text) => {
                    info!("✓ 题库 [{}] 找到答案", source.name);
                    return RawAnswer {
                        found: true,
                        text,
                        corrected_title: extracted.question,
                        source_name: source.name.clone(),
                        attempts_tried,
                        remaining_times: None,
                        extra: extracted.extra,
                        message: format!("来自 {}", source.name),
                    };
                }
                None => {
                    debug!("题库 [{}] 没有答案", source.name);
                    failures.push(format!("{}: 未找到答案", source.name));
                }
            }
        }

        RawAnswer {
            attempts_tried: sources.len(),
            ..RawAnswer::not_found("", format!("所有题库均未找到答案 ({})", failures.join("; ")))
        }
    }
}

/// 固定接口的响应格式 `{code, message, data: {question, answer, times}}`
fn fixed_handler() -> ResponseHandler {
    ResponseHandler {
        success: Some(SuccessRule {
            path: "code".to_string(),
            equals: JsonValue::from(1),
        }),
        answer: "data.answer".to_string(),
        question: Some("data.question".to_string()),
        extra: Some("data.ai".to_string()),
    }
}

/// 替换模板中的 `${title}` `${options}` `${type}` `${token}`，未知占位符替换为空
pub fn render_template(template: &str, query: &AnswerQuery, token: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{(\w+)\}") else {
        return template.to_string();
    };
    let options = query.joined_options();
    re.replace_all(template, |caps: &Captures| match &caps[1] {
        "title" => query.title.clone(),
        "options" => options.clone(),
        "type" => query.type_code.clone(),
        "token" => token.to_string(),
        _ => String::new(),
    })
    .into_owned()
}

fn render_value(value: &JsonValue, query: &AnswerQuery, token: &str) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(render_template(s, query, token)),
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| render_value(v, query, token)).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, query, token)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// 按题库源描述生成请求
pub fn build_request(source: &SourceDescriptor, query: &AnswerQuery, token: &str) -> SourceRequest {
    let url = render_template(&source.url, query, token);
    match source.method {
        HttpMethod::Get => SourceRequest::get(
            url,
            source
                .data
                .iter()
                .map(|(key, value)| {
                    let rendered = match render_value(value, query, token) {
                        JsonValue::String(s) => s,
                        other => other.to_string(),
                    };
                    (key.clone(), rendered)
                })
                .collect(),
        ),
        HttpMethod::Post => SourceRequest::post(
            url,
            JsonValue::Object(
                source
                    .data
                    .iter()
                    .map(|(key, value)| (key.clone(), render_value(value, query, token)))
                    .collect(),
            ),
        ),
    }
}
