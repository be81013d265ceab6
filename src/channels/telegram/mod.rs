//! Telegram Bot API transport: `getUpdates` long polling in, `sendMessage`
//! and `sendChatAction` out.

mod handler;

use crate::providers::http_client::build_provider_client;
use reqwest::Client;
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
/// Server-side long-poll timeout for `getUpdates`
const POLL_TIMEOUT_SECS: u64 = 30;

pub struct TelegramChannel {
    bot_token: String,
    api_base: String,
    client: Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self::with_api_base(bot_token, TELEGRAM_API_BASE)
    }

    pub fn with_api_base(bot_token: String, api_base: &str) -> Self {
        Self {
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: build_provider_client(Duration::from_secs(POLL_TIMEOUT_SECS + 15)),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }
}

pub(crate) use handler::parse_update;
