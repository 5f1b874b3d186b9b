//! 模板化题库源描述
//!
//! 每个源描述一个 HTTP 请求模板和一个声明式的响应提取规则。

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// 题库源描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// URL 模板，支持 `${title}` 等占位符
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// 参数模板；GET 放在查询串，POST 作为 JSON 请求体
    #[serde(default)]
    pub data: BTreeMap<String, JsonValue>,
    pub handler: ResponseHandler,
}

/// 声明式响应提取规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseHandler {
    /// 成功条件；缺省时只要答案非空即视为成功
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessRule>,
    /// 答案字段路径，如 `data.answer`
    pub answer: String,
    /// 修正题干字段路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// 附加信息字段路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// 字段等于给定值时视为成功
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessRule {
    pub path: String,
    pub equals: JsonValue,
}

/// 从响应中提取出的 (答案, 修正题干, 附加信息)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extracted {
    pub answer: Option<String>,
    pub question: Option<String>,
    pub extra: Option<JsonValue>,
}

impl ResponseHandler {
    pub fn extract(&self, response: &JsonValue) -> Extracted {
        let succeeded = self
            .success
            .as_ref()
            .map_or(true, |rule| lookup_path(response, &rule.path) == Some(&rule.equals));

        let answer = if succeeded {
            lookup_path(response, &self.answer)
                .and_then(value_to_text)
                .filter(|a| !a.trim().is_empty())
        } else {
            None
        };

        Extracted {
            answer,
            question: self
                .question
                .as_deref()
                .and_then(|p| lookup_path(response, p))
                .and_then(value_to_text),
            extra: self
                .extra
                .as_deref()
                .and_then(|p| lookup_path(response, p))
                .filter(|v| !v.is_null())
                .cloned(),
        }
    }
}

/// 按点号路径查找 JSON 字段，数字段作为数组下标
pub fn lookup_path<'a>(value: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn value_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_text).collect();
            Some(parts.join("\n"))
        }
        other => Some(other.to_string()),
    }
}

/// 内置默认题库源
pub fn default_sources(token: &str) -> Vec<SourceDescriptor> {
    let mut data = BTreeMap::new();
    data.insert("token".to_string(), JsonValue::String(token.to_string()));
    data.insert("title".to_string(), JsonValue::String("${title}".to_string()));
    data.insert("options".to_string(), JsonValue::String("${options}".to_string()));
    data.insert("type".to_string(), JsonValue::String("${type}".to_string()));

    vec![SourceDescriptor {
        name: "言溪题库".to_string(),
        homepage: Some("https://tk.enncy.cn/".to_string()),
        url: "https://tk.enncy.cn/query".to_string(),
        method: HttpMethod::Get,
        data,
        handler: ResponseHandler {
            success: Some(SuccessRule {
                path: "code".to_string(),
                equals: JsonValue::from(1),
            }),
            answer: "data.answer".to_string(),
            question: Some("data.question".to_string()),
            extra: Some("data.ai".to_string()),
        },
    }]
}
