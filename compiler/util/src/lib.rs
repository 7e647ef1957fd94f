//! Shared utilities for the resolver crates.

mod info;
mod path;
mod shared;

pub use info::*;
pub use path::*;
pub use shared::*;
