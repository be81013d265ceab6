use crate::error::ConfigError;
use crate::providers::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Root of the shared document workspace (notes, daily files, state).
    #[serde(default)]
    pub workspace_root: PathBuf,

    #[serde(default = "ModelConfig::orchestrator_default")]
    pub orchestrator: ModelConfig,

    #[serde(default = "ModelConfig::coach_default")]
    pub coach: ModelConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub debounce: DebounceConfig,

    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub persona: PersonaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            workspace_root: PathBuf::new(),
            orchestrator: ModelConfig::orchestrator_default(),
            coach: ModelConfig::coach_default(),
            telegram: TelegramConfig::default(),
            scheduler: SchedulerConfig::default(),
            debounce: DebounceConfig::default(),
            access: AccessConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

impl Config {
    /// Collect every startup-fatal problem. Missing credentials are reported
    /// together so the operator can fix them in one pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self
            .telegram
            .bot_token
            .as_deref()
            .is_none_or(|t| t.trim().is_empty())
        {
            missing.push("TELEGRAM_BOT_TOKEN".to_string());
        }
        if self
            .telegram
            .allowed_user
            .as_deref()
            .is_none_or(|u| u.trim().is_empty())
        {
            missing.push("USER_TELEGRAM_ID".to_string());
        }
        for section in [&self.orchestrator, &self.coach] {
            let kind = section.kind()?;
            if section
                .api_key
                .as_deref()
                .is_none_or(|k| k.trim().is_empty())
            {
                let env = kind.api_key_env().to_string();
                if !missing.contains(&env) {
                    missing.push(env);
                }
            }
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        if !self.workspace_root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "workspace root is not a directory: {}",
                self.workspace_root.display()
            )));
        }

        self.scheduler.validate()?;
        self.debounce.validate()
    }
}

// ── Model providers ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// "anthropic", "deepseek" or "openai"
    pub provider: String,
    /// Overrides the provider's default model
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Hard cap on completion rounds per turn
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tool_rounds() -> usize {
    10
}

impl ModelConfig {
    fn orchestrator_default() -> Self {
        Self {
            provider: "anthropic".into(),
            model: None,
            api_key: None,
            temperature: default_temperature(),
            max_tool_rounds: default_max_tool_rounds(),
        }
    }

    fn coach_default() -> Self {
        Self::orchestrator_default()
    }

    pub fn kind(&self) -> Result<ProviderKind, ConfigError> {
        self.provider.parse().map_err(ConfigError::Validation)
    }

    /// Configured model, or the provider's default.
    pub fn model_name(&self) -> Result<String, ConfigError> {
        let kind = self.kind()?;
        Ok(self
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| kind.default_model().to_string()))
    }
}

// ── Telegram ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Numeric user id of the only correspondent allowed to talk to the bot
    #[serde(default)]
    pub allowed_user: Option<String>,
}

// ── Scheduler ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Quiet window start hour (inclusive, 24h local time)
    #[serde(default = "default_quiet_start")]
    pub quiet_start: u32,
    /// Quiet window end hour (exclusive)
    #[serde(default = "default_quiet_end")]
    pub quiet_end: u32,
    #[serde(default = "default_tick_min_secs")]
    pub tick_min_secs: u64,
    #[serde(default = "default_tick_max_secs")]
    pub tick_max_secs: u64,
    /// Minimum gap between two proactive sends
    #[serde(default = "default_min_spacing_secs")]
    pub min_spacing_secs: u64,
    /// Fast iteration: no spacing floor, short tick window
    #[serde(default)]
    pub test_mode: bool,
    #[serde(default = "default_morning_time")]
    pub morning_time: String,
    #[serde(default = "default_evening_time")]
    pub evening_time: String,
    #[serde(default = "default_morning_message")]
    pub morning_message: String,
    #[serde(default = "default_evening_message")]
    pub evening_message: String,
    /// Shortest declared work window that suppresses outreach
    #[serde(default = "default_min_deadline_minutes")]
    pub min_deadline_minutes: u32,
}

fn default_quiet_start() -> u32 {
    23
}

fn default_quiet_end() -> u32 {
    8
}

fn default_tick_min_secs() -> u64 {
    60
}

fn default_tick_max_secs() -> u64 {
    20 * 60
}

fn default_min_spacing_secs() -> u64 {
    5 * 60
}

fn default_morning_time() -> String {
    "08:00".into()
}

fn default_evening_time() -> String {
    "21:00".into()
}

fn default_morning_message() -> String {
    "gm, what's on the agenda today?".into()
}

fn default_evening_message() -> String {
    "how'd today go?".into()
}

fn default_min_deadline_minutes() -> u32 {
    5
}

pub(crate) const TEST_MODE_TICK_MIN_SECS: u64 = 10;
pub(crate) const TEST_MODE_TICK_MAX_SECS: u64 = 20;

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            quiet_start: default_quiet_start(),
            quiet_end: default_quiet_end(),
            tick_min_secs: default_tick_min_secs(),
            tick_max_secs: default_tick_max_secs(),
            min_spacing_secs: default_min_spacing_secs(),
            test_mode: false,
            morning_time: default_morning_time(),
            evening_time: default_evening_time(),
            morning_message: default_morning_message(),
            evening_message: default_evening_message(),
            min_deadline_minutes: default_min_deadline_minutes(),
        }
    }
}

impl SchedulerConfig {
    /// Spacing floor between proactive sends; `None` in test mode.
    pub fn min_spacing(&self) -> Option<Duration> {
        if self.test_mode {
            None
        } else {
            Some(Duration::from_secs(self.min_spacing_secs))
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.quiet_start > 23 || self.quiet_end > 23 {
            return Err(ConfigError::Validation(format!(
                "quiet hours must be within 0..=23 (got {}..{})",
                self.quiet_start, self.quiet_end
            )));
        }
        if self.tick_min_secs == 0 || self.tick_min_secs > self.tick_max_secs {
            return Err(ConfigError::Validation(format!(
                "tick window must satisfy 0 < min <= max (got {}..={})",
                self.tick_min_secs, self.tick_max_secs
            )));
        }
        for time in [&self.morning_time, &self.evening_time] {
            crate::platform::scheduler::parse_clock_time(time)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
        Ok(())
    }
}

// ── Debounce / pacing ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet period after the last message before a turn starts
    #[serde(default = "default_debounce_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_fragment_pause_min_ms")]
    pub fragment_pause_min_ms: u64,
    #[serde(default = "default_fragment_pause_max_ms")]
    pub fragment_pause_max_ms: u64,
}

fn default_debounce_delay_ms() -> u64 {
    4_000
}

fn default_fragment_pause_min_ms() -> u64 {
    800
}

fn default_fragment_pause_max_ms() -> u64 {
    2_000
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_debounce_delay_ms(),
            fragment_pause_min_ms: default_fragment_pause_min_ms(),
            fragment_pause_max_ms: default_fragment_pause_max_ms(),
        }
    }
}

impl DebounceConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fragment_pause_min_ms > self.fragment_pause_max_ms {
            return Err(ConfigError::Validation(format!(
                "fragment pause min ({}) exceeds max ({})",
                self.fragment_pause_min_ms, self.fragment_pause_max_ms
            )));
        }
        Ok(())
    }
}

// ── Access control ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default = "default_readable")]
    pub readable: Vec<String>,
    #[serde(default = "default_writable")]
    pub writable: Vec<String>,
    #[serde(default = "default_blocked")]
    pub blocked: Vec<String>,
    /// Workspace-relative location of the persisted coordination record
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

fn default_readable() -> Vec<String> {
    [
        "now.md",
        "memory/*.md",
        "memory/spark/*.md",
        "memory/spark/*.json",
        "memory/timeline/perspective.md",
        "memory/timeline/daily/*.md",
        "memory/timeline/todo/*.md",
        "memory/people/*.md",
        "tinker",
        "tinker/*",
        "tinker/**/*.md",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_writable() -> Vec<String> {
    [
        "memory/timeline/daily/*.md",
        "memory/timeline/todo/*.md",
        "memory/spark/*.md",
        "memory/spark/*.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_blocked() -> Vec<String> {
    ["*.secret.md", "private/**", ".git/**"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_state_path() -> String {
    "memory/spark/state.json".into()
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            readable: default_readable(),
            writable: default_writable(),
            blocked: default_blocked(),
            state_path: default_state_path(),
        }
    }
}

// ── Persona ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuiltLevel {
    Chill,
    #[default]
    Medium,
    Savage,
}

impl GuiltLevel {
    pub fn note(self) -> &'static str {
        match self {
            Self::Chill => "go easy on them",
            Self::Medium => "normal guilt trips",
            Self::Savage => "be ruthless",
        }
    }
}

impl std::str::FromStr for GuiltLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chill" => Ok(Self::Chill),
            "medium" => Ok(Self::Medium),
            "savage" => Ok(Self::Savage),
            other => Err(format!("unknown guilt level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub user_pronouns: String,
    #[serde(default)]
    pub guilt_level: GuiltLevel,
    /// Free-form voice description, e.g. "supportive coach"
    #[serde(default)]
    pub style: String,
}

impl PersonaConfig {
    /// Name used when tagging the correspondent's lines.
    pub fn display_name(&self) -> &str {
        let name = self.user_name.trim();
        if name.is_empty() { "User" } else { name }
    }

    /// One-line persona summary: name, pronouns and how hard to push.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.user_name.trim().is_empty() {
            parts.push(format!("Name: {}", self.user_name.trim()));
        }
        if !self.user_pronouns.trim().is_empty() {
            parts.push(format!("Pronouns: {}", self.user_pronouns.trim()));
        }
        parts.push(format!("Guilt level: {}", self.guilt_level.note()));
        parts.join(", ")
    }
}
