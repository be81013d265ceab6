use super::{POLL_TIMEOUT_SECS, TelegramChannel};
use crate::channels::traits::{Channel, ChannelFuture, ChannelMessage};
use crate::providers::sanitize_api_error;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Text message from one update, or `None` for anything else.
pub(crate) fn parse_update(update: &Value) -> Option<ChannelMessage> {
    let message = update.get("message")?;
    let text = message.get("text").and_then(Value::as_str)?;

    let sender = message
        .get("from")
        .and_then(|f| f.get("id"))
        .and_then(Value::as_i64)?
        .to_string();
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)
        .map_or_else(|| sender.clone(), |id| id.to_string());
    let timestamp = message
        .get("date")
        .and_then(Value::as_u64)
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        });

    Some(ChannelMessage {
        id: Uuid::new_v4().to_string(),
        sender,
        chat_id,
        content: text.to_string(),
        timestamp,
    })
}

impl TelegramChannel {
    async fn call(&self, method: &str, body: &Value) -> anyhow::Result<Value> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "Telegram {method} request failed: {}",
                    sanitize_api_error(&e.to_string())
                )
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
            anyhow::bail!(
                "Telegram {method} failed ({status}): {}",
                sanitize_api_error(&err)
            );
        }

        Ok(resp.json().await?)
    }

    pub(super) async fn poll_once(&self, offset: &mut i64) -> anyhow::Result<Vec<ChannelMessage>> {
        let body = serde_json::json!({
            "offset": *offset,
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"]
        });
        let data = self.call("getUpdates", &body).await?;

        let mut messages = Vec::new();
        for update in data
            .get("result")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            // Advance offset past this update
            if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                *offset = uid + 1;
            }
            if let Some(message) = parse_update(update) {
                messages.push(message);
            }
        }
        Ok(messages)
    }
}

impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn send<'a>(&'a self, message: &'a str, chat_id: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "text": message,
            });
            self.call("sendMessage", &body).await?;
            Ok(())
        })
    }

    fn send_typing<'a>(&'a self, chat_id: &'a str) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            let body = serde_json::json!({
                "chat_id": chat_id,
                "action": "typing",
            });
            self.call("sendChatAction", &body).await?;
            Ok(())
        })
    }

    fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> ChannelFuture<'_, ()> {
        Box::pin(async move {
            let mut offset: i64 = 0;
            tracing::info!("Telegram channel listening for messages...");

            loop {
                let messages = match self.poll_once(&mut offset).await {
                    Ok(messages) => messages,
                    Err(error) => {
                        tracing::warn!(%error, "Telegram poll error");
                        tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                        continue;
                    }
                };

                for message in messages {
                    if tx.send(message).await.is_err() {
                        return Ok(());
                    }
                }
            }
        })
    }
}
