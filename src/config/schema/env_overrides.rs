use super::Config;
use super::types::{TEST_MODE_TICK_MAX_SECS, TEST_MODE_TICK_MIN_SECS};
use crate::providers::ProviderKind;
use std::path::PathBuf;

/// Minutes (possibly fractional) to whole seconds, at least one.
fn minutes_to_secs(minutes: f64) -> u64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let secs = (minutes * 60.0).round() as u64;
    secs.max(1)
}

impl Config {
    /// Load `.env` (current directory, then the config directory) without
    /// overwriting variables already present in the process environment.
    pub fn load_dotenv(&self) {
        let _ = dotenvy::dotenv();
        if let Some(dir) = self.config_path.parent() {
            let _ = dotenvy::from_path(dir.join(".env"));
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(workspace) =
            std::env::var("SPARK_WORKSPACE").or_else(|_| std::env::var("THINK_OS_PATH"))
            && !workspace.is_empty()
        {
            self.workspace_root = PathBuf::from(workspace);
        }

        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN")
            && !token.is_empty()
        {
            self.telegram.bot_token = Some(token);
        }

        if let Ok(user) = std::env::var("USER_TELEGRAM_ID")
            && !user.is_empty()
        {
            self.telegram.allowed_user = Some(user);
        }

        if let Ok(provider) = std::env::var("ORCHESTRATOR_PROVIDER")
            && !provider.is_empty()
        {
            self.orchestrator.provider = provider.to_ascii_lowercase();
        }

        if let Ok(provider) = std::env::var("COACH_PROVIDER")
            && !provider.is_empty()
        {
            self.coach.provider = provider.to_ascii_lowercase();
        }

        for section in [&mut self.orchestrator, &mut self.coach] {
            if section.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
                continue;
            }
            if let Ok(kind) = section.provider.parse::<ProviderKind>()
                && let Ok(key) = std::env::var(kind.api_key_env())
                && !key.is_empty()
            {
                section.api_key = Some(key);
            }
        }

        if let Ok(flag) = std::env::var("TEST_MODE") {
            self.scheduler.test_mode = flag.eq_ignore_ascii_case("true");
        }
        if self.scheduler.test_mode {
            self.scheduler.tick_min_secs = TEST_MODE_TICK_MIN_SECS;
            self.scheduler.tick_max_secs = TEST_MODE_TICK_MAX_SECS;
        }

        if let Ok(hour) = std::env::var("QUIET_START")
            && let Ok(hour) = hour.parse::<u32>()
            && hour < 24
        {
            self.scheduler.quiet_start = hour;
        }

        if let Ok(hour) = std::env::var("QUIET_END")
            && let Ok(hour) = hour.parse::<u32>()
            && hour < 24
        {
            self.scheduler.quiet_end = hour;
        }

        if let Ok(minutes) = std::env::var("TICK_MIN_MINUTES")
            && let Ok(minutes) = minutes.parse::<f64>()
            && minutes > 0.0
        {
            self.scheduler.tick_min_secs = minutes_to_secs(minutes);
        }

        if let Ok(minutes) = std::env::var("TICK_MAX_MINUTES")
            && let Ok(minutes) = minutes.parse::<f64>()
            && minutes > 0.0
        {
            self.scheduler.tick_max_secs = minutes_to_secs(minutes);
        }

        if let Ok(name) = std::env::var("USER_NAME")
            && !name.is_empty()
        {
            self.persona.user_name = name;
        }

        if let Ok(pronouns) = std::env::var("USER_PRONOUNS")
            && !pronouns.is_empty()
        {
            self.persona.user_pronouns = pronouns;
        }

        if let Ok(level) = std::env::var("GUILT_LEVEL") {
            match level.parse() {
                Ok(level) => self.persona.guilt_level = level,
                Err(error) => tracing::warn!(%error, "ignoring GUILT_LEVEL"),
            }
        }

        if let Ok(style) = std::env::var("SPARK_STYLE")
            && !style.is_empty()
        {
            self.persona.style = style;
        }
    }
}
