use spark_coach::channels::{Channel, ChannelFuture, ChannelMessage};
use spark_coach::providers::{ContentBlock, Provider, ProviderFuture, ProviderMessage, ProviderResponse};
use spark_coach::tools::ToolSpec;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Default)]
pub struct FakeProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    seen_messages: Mutex<Vec<Vec<ProviderMessage>>>,
}

impl FakeProvider {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(
                texts
                    .iter()
                    .map(|text| ProviderResponse::text_only(*text))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.seen_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Text of the last user message in each call.
    pub fn last_user_texts(&self) -> Vec<String> {
        self.seen_messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|messages| messages.last())
            .flat_map(|message| message.content.iter())
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn chat_with_tools<'a>(
        &'a self,
        _system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        _tools: &'a [ToolSpec],
        _model: &'a str,
        _temperature: f64,
    ) -> ProviderFuture<'a> {
        Box::pin(async move {
            self.seen_messages
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(messages.to_vec());
            self.responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted response left"))
        })
    }
}

#[derive(Default)]
pub struct FakeChannel {
    sent: Mutex<Vec<String>>,
}

impl FakeChannel {
    pub fn sent(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Channel for FakeChannel {
    fn name(&self) -> &str {
        "fake"
    }

    fn send<'a>(&'a self, message: &'a str, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(message.to_string());
            Ok(())
        })
    }

    fn send_typing<'a>(&'a self, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async { Ok(()) })
    }

    fn listen(&self, _tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> ChannelFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

pub fn incoming(text: &str) -> ChannelMessage {
    ChannelMessage {
        id: "m".into(),
        sender: "42".into(),
        chat_id: "42".into(),
        content: text.into(),
        timestamp: 0,
    }
}

/// Poll `condition` every 10ms until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
