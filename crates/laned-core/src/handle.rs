use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::LanedError;
use crate::lane::Lane;
use crate::strategy::SelectionStrategy;
use crate::transport::Transport;

/// A single-use proxy onto a lane's transport, returned by
/// `LanedManager::acquire`.
///
/// Dereferences transparently to `T` so callers drive the transport through
/// its own API. Releases its lane's in-flight slot exactly once, whichever
/// comes first of an explicit `close`/`close_async` call or `Drop`. Never
/// closes the underlying transport itself — the transport stays open for
/// the lane's entire lifetime, handle or no handle.
pub struct BorrowedHandle<T: Transport> {
    lane: Arc<Lane<T>>,
    strategy: Arc<dyn SelectionStrategy>,
    released: AtomicBool,
}

impl<T: Transport> BorrowedHandle<T> {
    pub(crate) fn new(lane: Arc<Lane<T>>, strategy: Arc<dyn SelectionStrategy>) -> Self {
        lane.acquire();
        Self {
            lane,
            strategy,
            released: AtomicBool::new(false),
        }
    }

    /// Index of the lane this handle was drawn from.
    pub fn lane_index(&self) -> usize {
        self.lane.index()
    }

    /// Releases the in-flight slot. Safe to call more than once; only the
    /// first call has any effect. The lane's counter owns the decrement;
    /// the strategy hook that follows is informational (see
    /// `SelectionStrategy::on_released`).
    pub fn close(&self) {
        if self
            .released
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.lane.release();
            self.strategy.on_released(self.lane.index());
        }
    }

    /// Async alias for `close`, kept for call sites that otherwise only ever
    /// await transport operations on this handle.
    pub async fn close_async(&self) -> Result<(), LanedError> {
        self.close();
        Ok(())
    }
}

impl<T: Transport> Deref for BorrowedHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.lane.transport()
    }
}

impl<T: Transport> Drop for BorrowedHandle<T> {
    fn drop(&mut self) {
        self.close();
    }
}
