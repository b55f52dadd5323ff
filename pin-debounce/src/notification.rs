//! Broadcast one-shot notification.
//!
//! A [`Notification`] is a latch with clear-then-wait semantics: [`Notification::wait`] clears the
//! latch and then waits for the *next* [`Notification::set`]. All tasks waiting at that moment wake
//! together. Multiple sets before anyone waits coalesce into the single latched flag.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::Poll;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::waitqueue::MultiWakerRegistration;

use crate::RawMutex;

struct NotificationState<const N: usize> {
    /// Latched until the next `wait` or `clear`
    set: bool,
    /// Bumped on every `set`, waiters resolve once it moves past the value they captured
    generation: u32,
    wakers: MultiWakerRegistration<N>,
}

/// Broadcast notification that can wake up to `N` waiting tasks at once.
///
/// If more than `N` tasks wait at the same time, registered tasks are woken early and simply
/// register again, so correctness doesn't depend on `N`.
pub struct Notification<const N: usize> {
    state: Mutex<RawMutex, RefCell<NotificationState<N>>>,
}

impl<const N: usize> Default for Notification<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Notification<N> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(NotificationState {
                set: false,
                generation: 0,
                wakers: MultiWakerRegistration::new(),
            })),
        }
    }

    /// Latch the notification and wake every waiting task.
    pub fn set(&self) {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.set = true;
            s.generation = s.generation.wrapping_add(1);
            s.wakers.wake();
        })
    }

    pub fn clear(&self) {
        self.state.lock(|s| s.borrow_mut().set = false)
    }

    /// Whether the notification was set since it was last cleared
    pub fn is_set(&self) -> bool {
        self.state.lock(|s| s.borrow().set)
    }

    /// Clear the latch, then wait until the next `set`.
    pub async fn wait(&self) {
        let generation = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            s.set = false;
            s.generation
        });

        poll_fn(|cx| {
            self.state.lock(|s| {
                let mut s = s.borrow_mut();
                if s.generation != generation {
                    Poll::Ready(())
                } else {
                    s.wakers.register(cx.waker());
                    Poll::Pending
                }
            })
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use embassy_futures::block_on;
    use embassy_futures::join::{join, join3};
    use embassy_futures::yield_now;

    use super::*;

    #[test]
    fn test_set_latches_until_cleared() {
        let notification: Notification<2> = Notification::new();
        assert!(!notification.is_set());
        notification.set();
        notification.set();
        assert!(notification.is_set());
        notification.clear();
        assert!(!notification.is_set());
    }

    #[test]
    fn test_wait_ignores_earlier_set() {
        let notification: Notification<2> = Notification::new();
        notification.set();

        let mut woke = false;
        block_on(join(
            async {
                notification.wait().await;
                woke = true;
            },
            async {
                // The stale set above was cleared by `wait`, so the waiter is still pending here
                yield_now().await;
                assert!(!notification.is_set());
                notification.set();
            },
        ));
        assert!(woke);
    }

    #[test]
    fn test_all_waiters_wake_on_single_set() {
        let notification: Notification<2> = Notification::new();
        let mut woke = [false; 2];
        let (first, second) = woke.split_at_mut(1);

        block_on(join3(
            async {
                notification.wait().await;
                first[0] = true;
            },
            async {
                notification.wait().await;
                second[0] = true;
            },
            async {
                yield_now().await;
                notification.set();
            },
        ));
        assert_eq!(woke, [true, true]);
    }
}
