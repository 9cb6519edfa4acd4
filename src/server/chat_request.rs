use serde::Deserialize;
use std::collections::HashMap;

use crate::providers::mesh::types::{ChatCompletionMessage, ChatCompletionRequest};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

/// OpenAI-style chat completion request accepted on `/v1/chat/completions`.
///
/// Notes:
/// - Every optional scalar stays `None` when the caller omits it, so an explicit
///   `0`/`false` is forwarded as such instead of being folded into "unset".
/// - `max_tokens` and `n` are signed here; the mesh RPC carries them unsigned.
/// - Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub n: Option<i64>,
    pub stream: Option<bool>,
    pub stop: Option<Vec<String>>,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub logit_bias: Option<HashMap<String, i64>>,
    pub user: Option<String>,
}

/// Maps the HTTP request onto the mesh RPC request, field for field.
///
/// Pure and total: no range checks happen here. Negative `max_tokens`/`n`
/// wrap like any two's-complement cast and the backend is trusted to reject them.
pub fn to_backend_request(request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_backend_message).collect(),
        max_tokens: request.max_tokens.map(narrow_unsigned),
        temperature: request.temperature,
        top_p: request.top_p,
        n: request.n.map(narrow_unsigned),
        stream: request.stream,
        stop: request.stop.clone().unwrap_or_default(),
        presence_penalty: request.presence_penalty,
        frequency_penalty: request.frequency_penalty,
        logit_bias: request.logit_bias.clone().unwrap_or_default(),
        user: request.user.clone(),
    }
}

fn to_backend_message(message: &ChatMessage) -> ChatCompletionMessage {
    ChatCompletionMessage {
        role: message.role.clone(),
        content: message.content.clone(),
    }
}

fn narrow_unsigned(value: i64) -> u32 {
    value as u32
}
