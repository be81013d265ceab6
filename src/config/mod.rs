pub mod schema;

pub use schema::{
    AccessConfig, Config, DebounceConfig, GuiltLevel, ModelConfig, PersonaConfig,
    SchedulerConfig, TelegramConfig,
};
