use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// An item with location information attached.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithInfo<I, T> {
    /// Where the item came from.
    pub info: I,

    /// The item itself.
    pub item: T,
}

impl<I, T> WithInfo<I, T> {
    /// Attach `info` to `item`.
    pub fn new(info: I, item: T) -> Self {
        WithInfo { info, item }
    }
}
