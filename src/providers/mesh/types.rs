//! Protobuf messages of the `llm_mesh.ChatCompletionService` RPC.
//!
//! Hand-maintained prost structs mirroring `proto/llm_mesh.proto`. Scalars that
//! the caller may omit are proto3 `optional` so that presence survives the hop.
use serde::Serialize;
use std::collections::HashMap;

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChatCompletionMessage {
    #[prost(string, tag = "1")]
    pub role: String,
    #[prost(string, tag = "2")]
    pub content: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ChatCompletionRequest {
    #[prost(string, tag = "1")]
    pub model: String,
    #[prost(message, repeated, tag = "2")]
    pub messages: Vec<ChatCompletionMessage>,
    #[prost(uint32, optional, tag = "3")]
    pub max_tokens: Option<u32>,
    #[prost(float, optional, tag = "4")]
    pub temperature: Option<f32>,
    #[prost(float, optional, tag = "5")]
    pub top_p: Option<f32>,
    #[prost(uint32, optional, tag = "6")]
    pub n: Option<u32>,
    #[prost(bool, optional, tag = "7")]
    pub stream: Option<bool>,
    #[prost(string, repeated, tag = "8")]
    pub stop: Vec<String>,
    #[prost(float, optional, tag = "9")]
    pub presence_penalty: Option<f32>,
    #[prost(float, optional, tag = "10")]
    pub frequency_penalty: Option<f32>,
    #[prost(map = "string, int64", tag = "11")]
    pub logit_bias: HashMap<String, i64>,
    #[prost(string, optional, tag = "12")]
    pub user: Option<String>,
}

/// 流式响应块；网关只负责序列化转发，不解析其中字段
#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct ChatCompletionResponse {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub object: String,
    #[prost(int64, tag = "3")]
    pub created: i64,
    #[prost(string, tag = "4")]
    pub model: String,
    #[prost(message, repeated, tag = "5")]
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct ChatCompletionChoice {
    #[prost(uint32, tag = "1")]
    pub index: u32,
    #[prost(message, optional, tag = "2")]
    pub delta: Option<ChatCompletionDelta>,
    #[prost(string, tag = "3")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub finish_reason: String,
}

#[derive(Clone, PartialEq, Serialize, prost::Message)]
pub struct ChatCompletionDelta {
    #[prost(string, tag = "1")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[prost(string, tag = "2")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
}
