//! IdGenerator port - 相関 ID 生成の抽象化
//!
//! Controller は request ごとに新しい `CallbackId` を払い出します。
//! テスト容易性のために trait として抽象化しています。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::CallbackId;

/// IdGenerator は in-flight な request 間で重複しない ID を生成
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから同時に呼ばれる）
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CallbackId;
}

/// Monotonic counter starting at 1.
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> CallbackId {
        CallbackId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
