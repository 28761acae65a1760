//! Cooperative cancellation for playback waits
//!
//! Playback never gets preempted. It polls a [`CancelToken`] between sleep
//! chunks and before every action, so a cancel request takes effect within
//! one chunk width however long the wait is.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared cancel flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed,
    Cancelled,
}

/// How waits between events are slept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Waits up to this long are slept in one go and cannot be interrupted
    pub small_wait_threshold: Duration,
    /// Longer waits are slept in slices of this size, checking for cancel
    /// before each slice
    pub chunk: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            small_wait_threshold: Duration::from_millis(200),
            chunk: Duration::from_millis(20),
        }
    }
}

impl WaitPolicy {
    pub fn wait(&self, total: Duration, cancel: &CancelToken) -> WaitOutcome {
        if total.is_zero() {
            return WaitOutcome::Completed;
        }
        if total <= self.small_wait_threshold {
            thread::sleep(total);
            return WaitOutcome::Completed;
        }

        let chunk = self.chunk.max(Duration::from_millis(1));
        // Waits too long to have a deadline only end on cancel.
        let deadline = Instant::now().checked_add(total);
        loop {
            if cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let left = match deadline {
                Some(d) => d.saturating_duration_since(Instant::now()),
                None => chunk,
            };
            if left.is_zero() {
                return WaitOutcome::Completed;
            }
            thread::sleep(left.min(chunk));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_waits_sleep_in_one_step_even_when_cancelled() {
        let policy = WaitPolicy::default();
        let cancel = CancelToken::new();
        cancel.cancel();

        let start = Instant::now();
        assert_eq!(policy.wait(Duration::from_millis(60), &cancel), WaitOutcome::Completed);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn long_waits_notice_cancel_within_a_chunk() {
        let policy = WaitPolicy::default();
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            remote.cancel();
            Instant::now()
        });

        let start = Instant::now();
        let outcome = policy.wait(Duration::from_secs(5), &cancel);
        let returned = Instant::now();
        let cancelled_at = canceller.join().unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
        // One chunk plus scheduler slack
        assert!(returned.saturating_duration_since(cancelled_at) < Duration::from_millis(150));
    }

    #[test]
    fn unbounded_waits_still_end_on_cancel() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(80));
            remote.cancel();
        });

        let start = Instant::now();
        let outcome = WaitPolicy::default().wait(Duration::MAX, &cancel);
        canceller.join().unwrap();

        assert_eq!(outcome, WaitOutcome::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn long_waits_run_to_completion() {
        let policy = WaitPolicy::default();
        let start = Instant::now();
        assert_eq!(
            policy.wait(Duration::from_millis(300), &CancelToken::new()),
            WaitOutcome::Completed
        );
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(600));
    }

    #[test]
    fn reset_clears_the_flag_for_all_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
        b.reset();
        assert!(!a.is_cancelled());
    }
}
