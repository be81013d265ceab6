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
use serde_json::Value;
use std::time::Duration;

/// Any backend speaking the OpenAI chat-completions dialect (DeepSeek, OpenAI).
pub struct OpenAiCompatibleProvider {
    name: String,
    completions_url: String,
    /// Pre-computed `"Bearer <key>"` header value
    auth_header: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<FunctionTool>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<FunctionCall>>,
}

impl Message {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FunctionTool {
    r#type: &'static str,
    function: FunctionDefinition,
}

#[derive(Debug, Serialize)]
struct FunctionDefinition {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    id: String,
    r#type: String,
    function: FunctionCallBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCallBody {
    name: String,
    /// JSON-encoded arguments
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<FunctionCall>>,
}

impl OpenAiCompatibleProvider {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            auth_header: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            client: build_provider_client(Duration::from_secs(120)),
        }
    }

    /// One provider message can fan out into an assistant message plus one
    /// `tool` message per result.
    fn to_messages(provider_message: &ProviderMessage) -> Vec<Message> {
        let mut text_parts = Vec::new();
        let mut calls = Vec::new();
        let mut results = Vec::new();

        for block in &provider_message.content {
            match block {
                ContentBlock::Text { text } => {
                    text_parts.push(scrub_secret_patterns(text).into_owned());
                }
                ContentBlock::ToolUse { id, name, input } => calls.push(FunctionCall {
                    id: id.clone(),
                    r#type: "function".into(),
                    function: FunctionCallBody {
                        name: name.clone(),
                        arguments: input.to_string(),
                    },
                }),
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error: _,
                } => results.push(Message {
                    role: "tool",
                    content: Some(scrub_secret_patterns(content).into_owned()),
                    tool_call_id: Some(tool_use_id.clone()),
                    tool_calls: None,
                }),
            }
        }

        let text = (!text_parts.is_empty()).then(|| text_parts.join("\n"));
        let mut messages = Vec::new();
        match provider_message.role {
            MessageRole::Assistant if text.is_some() || !calls.is_empty() => {
                messages.push(Message {
                    role: "assistant",
                    content: text,
                    tool_call_id: None,
                    tool_calls: (!calls.is_empty()).then_some(calls),
                });
            }
            MessageRole::User => {
                if let Some(text) = text {
                    messages.push(Message::text("user", text));
                }
            }
            MessageRole::Assistant => {}
        }
        messages.extend(results);
        messages
    }

    fn build_request(
        system_prompt: Option<&str>,
        messages: &[ProviderMessage],
        tools: &[ToolSpec],
        model: &str,
        temperature: f64,
    ) -> ChatRequest {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system_prompt {
            wire.push(Message::text("system", system.to_string()));
        }
        wire.extend(messages.iter().flat_map(Self::to_messages));

        ChatRequest {
            model: model.to_string(),
            messages: wire,
            temperature,
            tools: tools
                .iter()
                .map(|tool| FunctionTool {
                    r#type: "function",
                    function: FunctionDefinition {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        }
    }

    fn map_finish_reason(finish_reason: Option<&str>) -> StopReason {
        match finish_reason {
            Some("stop") => StopReason::EndTurn,
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            Some(_) | None => StopReason::Error,
        }
    }

    fn parse_tool_calls(&self, calls: Vec<FunctionCall>) -> anyhow::Result<Vec<ContentBlock>> {
        calls
            .into_iter()
            .map(|call| {
                let arguments = if call.function.arguments.trim().is_empty() {
                    "{}"
                } else {
                    call.function.arguments.as_str()
                };
                let input: Value = serde_json::from_str(arguments).with_context(|| {
                    format!(
                        "{} tool call arguments were not valid JSON for {}",
                        self.name, call.function.name
                    )
                })?;
                Ok(ContentBlock::ToolUse {
                    id: call.id,
                    name: call.function.name,
                    input,
                })
            })
            .collect()
    }

    fn into_provider_response(&self, chat_response: ChatResponse) -> anyhow::Result<ProviderResponse> {
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("No response from {}", self.name))?;

        let text = choice.message.content.unwrap_or_default();
        let mut content_blocks = self.parse_tool_calls(choice.message.tool_calls.unwrap_or_default())?;
        if !text.is_empty() {
            content_blocks.insert(0, ContentBlock::Text { text: text.clone() });
        }

        let mut response = match chat_response.usage {
            Some(usage) => {
                ProviderResponse::with_usage(text, usage.prompt_tokens, usage.completion_tokens)
            }
            None => ProviderResponse::text_only(text),
        };
        response.content_blocks = content_blocks;
        response.stop_reason = Some(Self::map_finish_reason(choice.finish_reason.as_deref()));
        if let Some(model) = chat_response.model {
            response = response.with_model(model);
        }
        Ok(response)
    }

    async fn call_api(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let auth_header = self
            .auth_header
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("{} API key not set", self.name))?;

        let response = self
            .client
            .post(&self.completions_url)
            .header("Authorization", auth_header)
            .json(request)
            .send()
            .await
            .with_context(|| format!("{} request failed", self.name))?;

        if !response.status().is_success() {
            return Err(api_error(&self.name, response).await);
        }

        response
            .json()
            .await
            .with_context(|| format!("{} response JSON decode failed", self.name))
    }
}

impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
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
            self.into_provider_response(chat_response)
        })
    }
}
