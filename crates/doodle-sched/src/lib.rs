//! One-shot, cancellable, delayed-task scheduling.
//!
//! The game layer needs three kinds of "do this later, unless something
//! else happens first" timers: the turn-duration countdown
//! (`scheduled_next_turn`), the trick delay (`scheduled_trick`), and the
//! fixed post-win pause before the next turn starts. All three share the
//! same shape: sleep for a duration, then run a callback — unless
//! cancelled first. [`ScheduledTask`] is that shape, built directly on a
//! spawned Tokio task rather than a coroutine that re-invokes itself, so
//! cancellation is a single `abort()` away and is safe to call any number
//! of times.
//!
//! ```text
//! ScheduledTask::spawn(duration, async { ... })
//!     │
//!     ├─ fires after `duration` if never cancelled
//!     └─ cancel() / drop() aborts it before it fires (idempotent)
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Handle to a single scheduled, cancellable delayed task.
///
/// Dropping the handle cancels the task, same as calling
/// [`cancel`](Self::cancel) explicitly — a `Game` that replaces
/// `scheduled_next_turn` with a new one doesn't need to remember to
/// cancel the old one first.
#[derive(Debug)]
pub struct ScheduledTask {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
}

impl ScheduledTask {
    /// Spawns `body` to run after `delay`, unless cancelled first.
    pub fn spawn<F>(delay: Duration, body: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let guard = Arc::clone(&cancelled);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if guard.load(Ordering::SeqCst) {
                return;
            }
            body.await;
        });

        Self { handle, cancelled }
    }

    /// Cancels the task. Idempotent: cancelling an already-cancelled or
    /// already-fired task is a no-op. Returns `true` if this call is the
    /// one that prevented the body from running.
    pub fn cancel(&self) -> bool {
        let already = self.cancelled.swap(true, Ordering::SeqCst);
        self.handle.abort();
        !already
    }

    /// Whether this task has been cancelled (does not distinguish
    /// "already fired" from "never will fire").
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the underlying task has finished running (fired to
    /// completion or was aborted).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let guard = Arc::clone(&fired);
        let _task = ScheduledTask::spawn(Duration::from_secs(5), async move {
            guard.store(true, Ordering::SeqCst);
        });

        tokio::time::advance(Duration::from_secs(4)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst), "should not fire early");

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert!(fired.load(Ordering::SeqCst), "should have fired by now");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_fire_prevents_body() {
        let fired = Arc::new(AtomicBool::new(false));
        let guard = Arc::clone(&fired);
        let task = ScheduledTask::spawn(Duration::from_secs(5), async move {
            guard.store(true, Ordering::SeqCst);
        });

        assert!(task.cancel());

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent() {
        let task = ScheduledTask::spawn(Duration::from_secs(1), async {});
        assert!(task.cancel());
        assert!(!task.cancel(), "second cancel should report no-op");
        assert!(!task.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_cancels() {
        let count = Arc::new(AtomicU32::new(0));
        let guard = Arc::clone(&count);
        let task = ScheduledTask::spawn(Duration::from_secs(5), async move {
            guard.fetch_add(1, Ordering::SeqCst);
        });
        drop(task);

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_task_cancels_the_previous_one() {
        // Mirrors how a Game replaces `scheduled_next_turn` on every
        // turn advance: the old handle is simply dropped.
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut current = ScheduledTask::spawn(Duration::from_secs(5), {
            let log = Arc::clone(&log);
            async move { log.lock().unwrap().push("first") }
        });

        tokio::time::advance(Duration::from_secs(1)).await;
        current = ScheduledTask::spawn(Duration::from_secs(5), {
            let log = Arc::clone(&log);
            async move { log.lock().unwrap().push("second") }
        });

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        drop(current);

        assert_eq!(*log.lock().unwrap(), vec!["second"]);
    }

    #[test]
    fn is_cancelled_reflects_state() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let task = ScheduledTask::spawn(Duration::from_secs(60), async {});
            assert!(!task.is_cancelled());
            task.cancel();
            assert!(task.is_cancelled());
        });
    }
}
