//! In-memory provider and channel doubles for agent tests.

use crate::channels::{Channel, ChannelFuture, ChannelMessage};
use crate::providers::{ContentBlock, Provider, ProviderFuture, ProviderMessage, ProviderResponse};
use crate::tools::ToolSpec;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Replays canned responses in order; errors once the script runs out.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResponse>>,
    seen: Mutex<Vec<Vec<ProviderMessage>>>,
    systems: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn new(script: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub(crate) fn tool_use(id: &str, name: &str, input: serde_json::Value) -> ProviderResponse {
        let mut response = ProviderResponse::text_only("");
        response.content_blocks = vec![ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }];
        response
    }

    pub(crate) fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub(crate) fn seen_messages(&self) -> Vec<Vec<ProviderMessage>> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn system_prompts(&self) -> Vec<String> {
        self.systems.lock().unwrap().clone()
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn chat_with_tools<'a>(
        &'a self,
        system_prompt: Option<&'a str>,
        messages: &'a [ProviderMessage],
        _tools: &'a [ToolSpec],
        _model: &'a str,
        _temperature: f64,
    ) -> ProviderFuture<'a> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.systems
                .lock()
                .unwrap()
                .push(system_prompt.unwrap_or_default().to_string());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        })
    }
}

/// Records sends; can be told to fail them.
#[derive(Default)]
pub(crate) struct RecordingChannel {
    sent: Mutex<Vec<(String, String)>>,
    typing: AtomicUsize,
    fail_sends: AtomicBool,
}

impl RecordingChannel {
    pub(crate) fn failing() -> Self {
        let channel = Self::default();
        channel.fail_sends.store(true, Ordering::SeqCst);
        channel
    }

    pub(crate) fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }
}

impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn send<'a>(&'a self, message: &'a str, recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            if self.fail_sends.load(Ordering::SeqCst) {
                anyhow::bail!("transport down");
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), message.to_string()));
            Ok(())
        })
    }

    fn send_typing<'a>(&'a self, _recipient: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            self.typing.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn listen(
        &self,
        _tx: tokio::sync::mpsc::Sender<ChannelMessage>,
    ) -> ChannelFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}
