// Refresh-cycle exclusion.

use std::sync::atomic::{AtomicBool, Ordering};

/// Held for the duration of one refresh cycle.
///
/// Acquisition never waits: a second caller gets `None` and skips its
/// cycle. The flag is cleared on drop, including on early return and
/// cancellation.
#[derive(Debug)]
pub(crate) struct UpdateGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> UpdateGuard<'a> {
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let flag = AtomicBool::new(false);
        let guard = UpdateGuard::try_acquire(&flag);
        assert!(guard.is_some());
        assert!(UpdateGuard::try_acquire(&flag).is_none());

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(UpdateGuard::try_acquire(&flag).is_some());
    }
}
