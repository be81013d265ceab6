use super::Provider;
use super::anthropic::AnthropicProvider;
use super::compatible::OpenAiCompatibleProvider;
use std::fmt;
use std::str::FromStr;

/// Completion backends the agent can be pointed at. Resolved once at
/// startup; call sites only see `dyn Provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    DeepSeek,
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::DeepSeek => "deepseek",
            Self::OpenAi => "openai",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-5-haiku-20241022",
            Self::DeepSeek => "deepseek-chat",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Extra output-format instruction appended to the tick prompt.
    pub fn decision_format_hint(self) -> &'static str {
        match self {
            Self::Anthropic => "",
            Self::DeepSeek | Self::OpenAi => {
                "\n\nIMPORTANT: finish with ONLY the JSON decision in a ```json block. \
                 No prose after it."
            }
        }
    }

    /// Provider-specific rules appended to the conversation prompt.
    pub fn coach_style_boost(self) -> &'static str {
        match self {
            Self::Anthropic => "",
            Self::DeepSeek | Self::OpenAi => {
                "\n---\n\n## Model-specific\n\n\
                 STYLE: SHORT. Each thought on its own line. 1-5 words when possible.\n\n\
                 Read your history before responding. Never repeat yourself.\n\n\
                 Call workspace_write when the user sets tasks or gives feedback. \
                 Saying \"updated\" without calling the tool loses the data. \
                 Prefer mode=\"append\" for check-ins.\n\n\
                 When the user gives a duration (\"30 min\"), respect it."
            }
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAi),
            other => Err(format!(
                "unknown provider: {other} (expected anthropic, deepseek or openai)"
            )),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn create_provider(kind: ProviderKind, api_key: Option<&str>) -> Box<dyn Provider> {
    match kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key)),
        ProviderKind::DeepSeek => Box::new(OpenAiCompatibleProvider::new(
            "deepseek",
            "https://api.deepseek.com",
            api_key,
        )),
        ProviderKind::OpenAi => Box::new(OpenAiCompatibleProvider::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
        )),
    }
}
