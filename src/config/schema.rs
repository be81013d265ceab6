mod env_overrides;
mod loader;
#[cfg(test)]
mod test_env;
mod types;

pub use types::{
    AccessConfig, Config, DebounceConfig, GuiltLevel, ModelConfig, PersonaConfig,
    SchedulerConfig, TelegramConfig,
};
