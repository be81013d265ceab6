pub mod policy;

pub use policy::{AccessMode, AccessPolicy, ResolvedPath};
