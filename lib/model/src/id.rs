use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out unique numbers for entities that have no identifier in their source data.
///
/// All datasets that end up in the same output must share one generator, otherwise their
/// generated subjects may collide.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id. The first id is `1`.
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}
