pub mod anthropic;
pub mod compatible;
pub mod factory;
pub mod http_client;
pub mod response;
pub mod scrub;
pub mod traits;

pub use factory::{ProviderKind, create_provider};
pub use response::{
    ContentBlock, MessageRole, ProviderMessage, ProviderResponse, StopReason, ToolCall,
};
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::{Provider, ProviderFuture};
