use crate::providers::{ContentBlock, MessageRole, Provider, ProviderMessage};
use crate::tools::{ToolRegistry, ToolResult};
use std::sync::Arc;

/// Absolute upper bound on completion rounds, regardless of configuration.
pub(crate) const TOOL_LOOP_HARD_CAP: usize = 25;

/// Drives completion rounds until the model answers in plain text or the
/// round cap is hit. Tool results go back as JSON-encoded [`ToolResult`]s.
pub struct ToolLoop {
    registry: Arc<ToolRegistry>,
    max_rounds: usize,
}

/// Record of a single tool invocation within the loop.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub args: serde_json::Value,
    pub result: ToolResult,
    pub round: usize,
}

/// Why the tool loop terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStopReason {
    /// The model answered without requesting tools
    Completed,
    /// Round cap reached while the model still wanted tools
    MaxRounds,
}

#[derive(Debug)]
pub struct ToolLoopResult {
    pub final_text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    pub rounds: usize,
    pub stop_reason: LoopStopReason,
}

impl ToolLoopResult {
    pub fn called(&self, tool_name: &str) -> bool {
        self.tool_calls.iter().any(|call| call.tool_name == tool_name)
    }
}

/// Parameters for a single [`ToolLoop::run`] invocation.
pub struct ToolLoopRun<'a> {
    pub provider: &'a dyn Provider,
    pub system_prompt: &'a str,
    /// Prior turns plus the new user message
    pub messages: Vec<ProviderMessage>,
    pub model: &'a str,
    pub temperature: f64,
}

impl ToolLoop {
    pub fn new(registry: Arc<ToolRegistry>, max_rounds: usize) -> Self {
        Self {
            registry,
            max_rounds: max_rounds.clamp(1, TOOL_LOOP_HARD_CAP),
        }
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Backend errors propagate; tool failures never do.
    pub async fn run(&self, params: ToolLoopRun<'_>) -> anyhow::Result<ToolLoopResult> {
        let tools = self.registry.specs();
        let mut messages = params.messages;
        let mut tool_calls = Vec::new();

        for round in 1..=self.max_rounds {
            let response = params
                .provider
                .chat_with_tools(
                    Some(params.system_prompt),
                    &messages,
                    &tools,
                    params.model,
                    params.temperature,
                )
                .await?;

            tracing::debug!(
                provider = params.provider.name(),
                round,
                stop_reason = ?response.stop_reason,
                "completion round"
            );

            if !response.has_tool_use() {
                return Ok(ToolLoopResult {
                    final_text: response.text.trim().to_string(),
                    tool_calls,
                    rounds: round,
                    stop_reason: LoopStopReason::Completed,
                });
            }

            messages.push(response.to_assistant_message());

            let mut results = Vec::new();
            for call in response.tool_calls() {
                let args_len = call.input.to_string().len();
                tracing::info!(tool = %call.name, args_len, "tool call");
                let result = self.registry.execute(&call.name, call.input.clone()).await;
                let content = result.to_content();
                tracing::info!(tool = %call.name, result_len = content.len(), "tool result");

                results.push(ContentBlock::ToolResult {
                    tool_use_id: call.id,
                    content,
                    is_error: !result.success,
                });
                tool_calls.push(ToolCallRecord {
                    tool_name: call.name,
                    args: call.input,
                    result,
                    round,
                });
            }
            messages.push(ProviderMessage::tool_results(results));
        }

        tracing::warn!(
            max_rounds = self.max_rounds,
            "tool loop hit the round cap without a final answer"
        );
        Ok(ToolLoopResult {
            final_text: last_assistant_text(&messages),
            tool_calls,
            rounds: self.max_rounds,
            stop_reason: LoopStopReason::MaxRounds,
        })
    }
}

fn last_assistant_text(messages: &[ProviderMessage]) -> String {
    messages
        .iter()
        .rev()
        .filter(|msg| msg.role == MessageRole::Assistant)
        .flat_map(|msg| msg.content.iter().rev())
        .find_map(|block| match block {
            ContentBlock::Text { text } if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedProvider;
    use crate::providers::ProviderResponse;
    use crate::tools::{Tool, ToolFuture};
    use serde_json::json;

    struct PingTool;

    impl Tool for PingTool {
        fn name(&self) -> &str {
            "ping"
        }

        fn description(&self) -> &str {
            "pong"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }

        fn execute(&self, _args: serde_json::Value) -> ToolFuture<'_> {
            Box::pin(async { Ok(ToolResult::ok("pong")) })
        }
    }

    fn tool_loop(max_rounds: usize) -> ToolLoop {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(PingTool));
        ToolLoop::new(Arc::new(registry), max_rounds)
    }

    fn run_params<'a>(provider: &'a ScriptedProvider) -> ToolLoopRun<'a> {
        ToolLoopRun {
            provider,
            system_prompt: "sys",
            messages: vec![ProviderMessage::user("hi")],
            model: "m",
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn executes_tools_then_returns_final_text() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool_use("t1", "ping", json!({})),
            ScriptedProvider::tool_use("t2", "missing", json!({"x": 1})),
            ProviderResponse::text_only("  done  "),
        ]);

        let result = tool_loop(10).run(run_params(&provider)).await.unwrap();
        assert_eq!(result.stop_reason, LoopStopReason::Completed);
        assert_eq!(result.final_text, "done");
        assert_eq!(result.rounds, 3);
        assert!(result.called("ping"));
        assert!(!result.tool_calls[1].result.success);

        // round 3 saw: user, assistant(tool), results, assistant(tool), results
        let seen = provider.seen_messages();
        assert_eq!(seen[2].len(), 5);
        let ContentBlock::ToolResult { content, is_error, .. } = &seen[2][2].content[0] else {
            panic!("expected tool result");
        };
        assert_eq!(content, r#"{"success":true,"output":"pong"}"#);
        assert!(!is_error);
    }

    #[tokio::test]
    async fn round_cap_is_a_soft_stop() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool_use("t1", "ping", json!({})),
            ScriptedProvider::tool_use("t2", "ping", json!({})),
            ProviderResponse::text_only("never reached"),
        ]);

        let result = tool_loop(2).run(run_params(&provider)).await.unwrap();
        assert_eq!(result.stop_reason, LoopStopReason::MaxRounds);
        assert_eq!(result.rounds, 2);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn backend_errors_propagate() {
        let provider = ScriptedProvider::new(vec![]);
        assert!(tool_loop(3).run(run_params(&provider)).await.is_err());
    }

    #[test]
    fn cap_is_clamped() {
        assert_eq!(tool_loop(0).max_rounds(), 1);
        assert_eq!(tool_loop(500).max_rounds(), TOOL_LOOP_HARD_CAP);
    }
}
