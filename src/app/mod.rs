pub mod dispatch;
pub mod runtime;

pub use runtime::{RuntimeParts, SparkRuntime};
