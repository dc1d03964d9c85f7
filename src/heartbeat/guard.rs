//! Single-flight guard for heartbeat sends.

use std::sync::atomic::{AtomicBool, Ordering};

/// Lock-free "send in progress" flag.
///
/// Acquisition is a single atomic swap: a caller that loses the race gets
/// `None` and must drop its tick rather than wait.
#[derive(Debug, Default)]
pub struct SendGuard {
    in_flight: AtomicBool,
}

impl SendGuard {
    /// Create a released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard, or `None` if a send is already in flight.
    pub fn try_acquire(&self) -> Option<SendPermit<'_>> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(SendPermit { guard: self })
        }
    }

    /// Whether a permit is currently outstanding.
    pub fn is_held(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases the guard when dropped, including on unwind or future cancellation.
#[derive(Debug)]
pub struct SendPermit<'a> {
    guard: &'a SendGuard,
}

impl Drop for SendPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = SendGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_held());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_held());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_permit_released_on_panic() {
        let guard = SendGuard::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _permit = guard.try_acquire().unwrap();
            panic!("send blew up");
        }));
        assert!(result.is_err());
        assert!(!guard.is_held());
    }

    #[test]
    fn test_only_one_thread_wins() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::{Arc, Barrier};

        let guard = Arc::new(SendGuard::new());
        let winners = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let hold = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let winners = Arc::clone(&winners);
                let barrier = Arc::clone(&barrier);
                let hold = Arc::clone(&hold);
                std::thread::spawn(move || {
                    barrier.wait();
                    let permit = guard.try_acquire();
                    if permit.is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                    // Keep the permit alive until everyone has tried.
                    hold.wait();
                    drop(permit);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        assert!(!guard.is_held());
    }
}
