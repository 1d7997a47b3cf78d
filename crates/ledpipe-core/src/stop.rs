#![forbid(unsafe_code)]

//! Cooperative stop signal for the reader thread.
//!
//! The reader checks [`StopSignal::is_stopped`] at the top of every loop
//! iteration and sleeps through [`StopSignal::wait_timeout`], so a stop
//! request cuts a retry backoff short instead of waiting it out.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

type Shared = Arc<(Mutex<bool>, Condvar)>;

/// Observer side, held by the worker.
#[derive(Clone)]
pub struct StopSignal {
    inner: Shared,
}

impl StopSignal {
    /// Create a new stop signal pair (signal, trigger).
    #[must_use]
    pub fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: inner.clone(),
        };
        (signal, StopTrigger { inner })
    }

    /// Check if the stop signal has been triggered.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *lock(&self.inner.0)
    }

    /// Wait for either the stop signal or a timeout.
    ///
    /// Returns `true` if stopped, `false` if timed out. Spurious wakeups are
    /// absorbed by re-waiting for the remaining time.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock_, cvar) = &*self.inner;
        let mut stopped = lock(lock_);
        let deadline = Instant::now() + duration;

        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = cvar
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
        }
        true
    }
}

/// Controller side, used to request the stop.
pub struct StopTrigger {
    inner: Shared,
}

impl StopTrigger {
    /// Signal the worker to stop and wake it if it is waiting.
    pub fn stop(&self) {
        let (lock_, cvar) = &*self.inner;
        *lock(lock_) = true;
        cvar.notify_all();
    }
}

fn lock(mutex: &Mutex<bool>) -> MutexGuard<'_, bool> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
