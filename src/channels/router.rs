use super::commands::ChatCommand;
use super::traits::{Channel, ChannelMessage};
use crate::agent::prompts::INTRO_MESSAGE;
use crate::agent::{Clock, Coach, DebounceBuffer, SessionCommand, system_clock};
use crate::store::Workspace;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const PRIVATE_REPLY: &str = "Sorry, this bot is private.";

/// Inbound queue between the transport listener and the router
const INBOUND_BUFFER: usize = 64;

/// Entry point for every incoming message: authorization, commands, and
/// hand-off of ordinary text to the debounce buffer.
pub struct MessageRouter {
    allowed_user: String,
    channel: Arc<dyn Channel>,
    debounce: Arc<DebounceBuffer>,
    coach: Arc<Coach>,
    workspace: Arc<Workspace>,
    clock: Clock,
}

impl MessageRouter {
    pub fn new(
        allowed_user: impl Into<String>,
        channel: Arc<dyn Channel>,
        debounce: Arc<DebounceBuffer>,
        coach: Arc<Coach>,
        workspace: Arc<Workspace>,
    ) -> Self {
        Self {
            allowed_user: allowed_user.into(),
            channel,
            debounce,
            coach,
            workspace,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn route(&self, message: ChannelMessage) -> anyhow::Result<()> {
        if message.sender != self.allowed_user {
            tracing::warn!(sender = %message.sender, "ignoring message from unknown sender");
            return self.channel.send(PRIVATE_REPLY, &message.chat_id).await;
        }

        match ChatCommand::parse(&message.content) {
            Some(command) => {
                tracing::info!(?command, "chat command");
                let reply = self.run_command(command, &message).await;
                self.channel.send(&reply, &message.chat_id).await
            }
            None => {
                if let Err(error) = self.channel.send_typing(&message.chat_id).await {
                    tracing::debug!(%error, "typing indicator failed");
                }
                self.debounce
                    .on_message(&message.sender, &message.chat_id, message.content);
                Ok(())
            }
        }
    }

    async fn run_command(&self, command: ChatCommand, message: &ChannelMessage) -> String {
        match command {
            ChatCommand::Start => INTRO_MESSAGE.to_string(),
            ChatCommand::Access => self.workspace.policy().summary(),
            ChatCommand::Clear => {
                let cleared = self.coach.clear_history().await;
                format!("cleared {cleared} msgs, fresh start")
            }
            ChatCommand::Session(session) => self.run_session(session, message).await,
            ChatCommand::Unknown(name) => format!("Unknown command: {name}"),
        }
    }

    /// Session flows hold the interaction lock like any other turn.
    async fn run_session(&self, session: SessionCommand, message: &ChannelMessage) -> String {
        if let Err(error) = self.channel.send_typing(&message.chat_id).await {
            tracing::debug!(%error, "typing indicator failed");
        }
        let now = (self.clock)();
        let turn = self.coach.chat(session.prompt(), now);
        match self.debounce.run_exclusive(&message.sender, turn).await {
            Ok(reply) => reply,
            Err(error) => {
                tracing::error!(%session, %error, "session command failed");
                format!("Error: {error}")
            }
        }
    }

    /// Pump the transport into [`Self::route`] until the listener stops.
    pub async fn run_listener(self: Arc<Self>) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel(INBOUND_BUFFER);
        let channel = Arc::clone(&self.channel);
        let listener = tokio::spawn(async move { channel.listen(tx).await });

        tracing::info!(channel = self.channel.name(), "listening for messages");
        while let Some(message) = rx.recv().await {
            if let Err(error) = self.route(message).await {
                tracing::error!(%error, "failed to handle incoming message");
            }
        }

        listener.await??;
        anyhow::bail!("{} listener stopped", self.channel.name())
    }
}
