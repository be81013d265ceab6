use crate::agent::SessionCommand;

/// Slash commands understood by the bot. Commands bypass the debounce buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Access,
    Clear,
    Session(SessionCommand),
    Unknown(String),
}

impl ChatCommand {
    /// `None` for ordinary messages. Accepts `/cmd@botname args`.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.trim().strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word).to_ascii_lowercase();

        Some(match name.as_str() {
            "start" => Self::Start,
            "access" => Self::Access,
            "clear" => Self::Clear,
            other => match other.parse::<SessionCommand>() {
                Ok(session) => Self::Session(session),
                Err(_) => Self::Unknown(other.to_string()),
            },
        })
    }
}
