use super::response::{ProviderMessage, ProviderResponse};
use crate::tools::ToolSpec;
use std::future::Future;
use std::pin::Pin;

pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = anyhow::Result<ProviderResponse>> + Send + 'a>>;

/// A completion backend. One call is one round: the response carries either
/// final text or tool invocations for the caller to execute.
pub trait Provider: Send + Sync {
    /// Provider identifier (e.g. "anthropic", "deepseek").
    fn name(&self) -> &str;

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        tools: &'a [ToolSpec],
        model: &'a str,
        temperature: f64,
    ) -> ProviderFuture<'a>;
}
