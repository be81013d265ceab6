pub mod commands;
pub mod router;
pub mod telegram;
pub mod traits;

pub use commands::ChatCommand;
pub use router::MessageRouter;
pub use telegram::TelegramChannel;
pub use traits::{Channel, ChannelFuture, ChannelMessage};
