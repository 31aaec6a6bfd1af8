//! One-shot load-completion signal
//!
//! Releases must not race an in-flight firmware load, so every load
//! arms this signal and completes it exactly once, on every exit path.
//! Waiters block until the current load settles; a completion wakes
//! all of them. The signal starts completed and is re-armed by the
//! first acquire of each boot cycle.

use parking_lot::{Condvar, Mutex};

pub(crate) struct Completion {
    done: Mutex<bool>,
    cvar: Condvar,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            done: Mutex::new(true),
            cvar: Condvar::new(),
        }
    }

    /// Begin a new load cycle; waiters will block until [`complete`].
    ///
    /// [`complete`]: Completion::complete
    pub(crate) fn arm(&self) {
        *self.done.lock() = false;
    }

    /// Settle the current cycle and wake every waiter.
    pub(crate) fn complete(&self) {
        *self.done.lock() = true;
        self.cvar.notify_all();
    }

    /// Block until the current cycle settles.
    pub(crate) fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.cvar.wait(&mut done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_starts_completed() {
        let completion = Completion::new();
        completion.wait(); // must not block
    }

    #[test]
    fn test_wakes_multiple_waiters() {
        let completion = Arc::new(Completion::new());
        completion.arm();

        let mut waiters = Vec::new();
        for _ in 0..4 {
            let completion = Arc::clone(&completion);
            waiters.push(std::thread::spawn(move || completion.wait()));
        }

        std::thread::sleep(Duration::from_millis(20));
        completion.complete();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_rearm_blocks_again() {
        let completion = Arc::new(Completion::new());
        completion.wait();
        completion.arm();

        let other = Arc::clone(&completion);
        let waiter = std::thread::spawn(move || other.wait());
        std::thread::sleep(Duration::from_millis(10));
        assert!(!waiter.is_finished());

        completion.complete();
        waiter.join().unwrap();
    }
}
