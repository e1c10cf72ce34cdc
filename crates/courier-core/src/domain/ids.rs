//! Domain identifiers.
//!
//! `CallbackId` は request と response を対応付ける整数トークンです。
//! ワイヤ上では素の整数としてシリアライズされます（`{"id": 1, ...}`）。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Correlation token carried by every protocol message.
///
/// Unique among in-flight requests of one controller. A response always
/// carries the id of the request that produced it.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(u64);

impl CallbackId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for CallbackId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cb-{}", self.0)
    }
}
