//! Process-wide projectile identifier allocation

use parking_lot::Mutex;

/// Hands out projectile ids, never reusing one.
///
/// Guarded by its own lock so id allocation does not serialize behind
/// unrelated world mutations.
#[derive(Debug, Default)]
pub struct ProjectileIds {
    last: Mutex<u64>,
}

impl ProjectileIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id (first id is 1)
    pub fn next(&self) -> u64 {
        let mut last = self.last.lock();
        *last += 1;
        *last
    }

    /// Most recently allocated id, 0 if none yet
    pub fn last(&self) -> u64 {
        *self.last.lock()
    }
}
