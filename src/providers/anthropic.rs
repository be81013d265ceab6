use super::http_client::build_provider_client;
use super::traits::{Provider, ProviderFuture};
use super::{
    ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason, api_error,
    scrub_secret_patterns,
};
use crate::tools::ToolSpec;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_TOKENS: u32 = 2048;

pub struct AnthropicProvider {
    api_key: Option<String>,
    messages_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicToolDef>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<InputContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicToolDef {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: Vec<ResponseContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<&str>) -> Self {
        Self::with_base_url(api_key, None)
    }

    pub fn with_base_url(api_key: Option<&str>, base_url: Option<&str>) -> Self {
        let base = base_url.map_or("https://api.anthropic.com", |u| u.trim_end_matches('/'));
        Self {
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(ToString::to_string),
            messages_url: format!("{base}/v1/messages"),
            client: build_provider_client(Duration::from_secs(120)),
        }
    }

    fn to_message(provider_message: &ProviderMessage) -> Message {
        let role = match provider_message.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        if let [ContentBlock::Text { text }] = provider_message.content.as_slice() {
            return Message {
                role,
                content: MessageContent::Text(scrub_secret_patterns(text).into_owned()),
            };
        }

        let blocks = provider_message
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => InputContentBlock::Text {
                    text: scrub_secret_patterns(text).into_owned(),
                },
                ContentBlock::ToolUse { id, name, input } => InputContentBlock::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                },
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => InputContentBlock::ToolResult {
                    tool_use_id: tool_use_id.clone(),
                    content: scrub_secret_patterns(content).into_owned(),
                    is_error: *is_error,
                },
            })
            .collect();

        Message {
            role,
            content: MessageContent::Blocks(blocks),
        }
    }

    fn build_request(
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        tools: &[ToolSpec],
        model: &str,
        temperature: f64,
    ) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            system: system_prompt.map(ToString::to_string),
            messages: messages.iter().map(Self::to_message).collect(),
            tools: tools
                .iter()
                .map(|tool| AnthropicToolDef {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    input_schema: tool.parameters.clone(),
                })
                .collect(),
            temperature,
        }
    }

    fn map_stop_reason(stop_reason: Option<&str>) -> Option<StopReason> {
        stop_reason.map(|reason| match reason {
            "end_turn" | "stop_sequence" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            _ => StopReason::Error,
        })
    }

    fn into_provider_response(chat_response: ChatResponse) -> ProviderResponse {
        let content_blocks: Vec<ContentBlock> = chat_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseContentBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseContentBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ResponseContentBlock::Unsupported => None,
            })
            .collect();

        let text = content_blocks
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut response = match chat_response.usage {
            Some(usage) => ProviderResponse::with_usage(text, usage.input_tokens, usage.output_tokens),
            None => ProviderResponse::text_only(text),
        };
        response.content_blocks = content_blocks;
        response.stop_reason = Self::map_stop_reason(chat_response.stop_reason.as_deref());
        if let Some(model) = chat_response.model {
            response = response.with_model(model);
        }
        response
    }

    async fn call_api(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key not set. Set ANTHROPIC_API_KEY."))?;

        let response = self
            .client
            .post(&self.messages_url)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .header("x-api-key", api_key)
            .json(request)
            .send()
            .await
            .context("Anthropic request failed")?;

        if !response.status().is_success() {
            return Err(api_error("Anthropic", response).await);
        }

        response
            .json()
            .await
            .context("Anthropic response JSON decode failed")
    }
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        tools: &'a [ToolSpec],
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a> {
        Box::pin(async move {
            let request = Self::build_request(system_prompt, messages, tools, model, temperature);
            let chat_response = self.call_api(&request).await?;
            Ok(Self::into_provider_response(chat_response))
        })
    }
}
