//! Repeating timers that drive the scheduler
//!
//! The scheduler only needs "call this every N milliseconds until told to
//! stop". `ThreadTimer` does that on a dedicated OS thread so ticks never
//! depend on an async runtime being present.

use anyhow::Context;
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Callback fired on every timer period
pub type TickFn = Box<dyn Fn() + Send + 'static>;

/// Fixed-interval repeating timer with start/cancel semantics
pub trait TickTimer: Send {
    /// Start firing `tick` every `interval`, first firing immediately
    fn start(&mut self, interval: Duration, tick: TickFn) -> anyhow::Result<()>;

    /// Stop firing. Must not block on an in-flight tick: a tick may be the
    /// one asking for the cancel.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Commands sent to the timer thread
enum TimerCommand {
    Shutdown,
}

/// Timer backed by a named OS thread
///
/// The thread runs `tick`, then waits on its command channel with the
/// interval as timeout. A timeout means "fire again"; a shutdown command or
/// a dropped sender ends the loop.
pub struct ThreadTimer {
    name: String,
    control: Option<SyncSender<TimerCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadTimer {
    pub fn new() -> Self {
        Self::named("slotgrid-scheduler")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            control: None,
            handle: None,
        }
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickTimer for ThreadTimer {
    fn start(&mut self, interval: Duration, tick: TickFn) -> anyhow::Result<()> {
        self.cancel();

        // one slot is enough: the only command is shutdown
        let (tx, rx) = mpsc::sync_channel::<TimerCommand>(1);
        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || loop {
                tick();
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(TimerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                        tracing::trace!("Timer thread exiting");
                        break;
                    }
                }
            })
            .with_context(|| format!("Failed to spawn timer thread '{}'", self.name))?;

        self.control = Some(tx);
        self.handle = Some(handle);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(tx) = self.control.take() {
            let _ = tx.try_send(TimerCommand::Shutdown);
        }
        // detach: the thread finishes its current tick and exits on its own
        self.handle.take();
    }

    fn is_active(&self) -> bool {
        self.control.is_some()
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Timer that never fires by itself, for driving ticks by hand in tests
#[cfg(test)]
pub(crate) mod manual {
    use super::{TickFn, TickTimer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Counts shared with the test after the timer moves into a scheduler
    #[derive(Clone, Default)]
    pub(crate) struct TimerCounts {
        pub starts: Arc<AtomicUsize>,
        pub cancels: Arc<AtomicUsize>,
        pub tick: Arc<Mutex<Option<TickFn>>>,
    }

    impl TimerCounts {
        pub fn starts(&self) -> usize {
            self.starts.load(Ordering::SeqCst)
        }

        pub fn cancels(&self) -> usize {
            self.cancels.load(Ordering::SeqCst)
        }

        /// Fire the registered tick callback once, as the timer thread would
        ///
        /// The callback is taken out while it runs so a tick that cancels
        /// (or restarts) the timer doesn't deadlock on the slot.
        pub fn fire(&self) -> bool {
            let Some(tick) = self.tick.lock().unwrap().take() else {
                return false;
            };
            let cancels = self.cancels();
            tick();
            if self.cancels() == cancels {
                let mut slot = self.tick.lock().unwrap();
                if slot.is_none() {
                    *slot = Some(tick);
                }
            }
            true
        }
    }

    pub(crate) struct ManualTimer {
        counts: TimerCounts,
        active: bool,
    }

    impl ManualTimer {
        pub fn new() -> (Self, TimerCounts) {
            let counts = TimerCounts::default();
            (
                Self {
                    counts: counts.clone(),
                    active: false,
                },
                counts,
            )
        }
    }

    impl TickTimer for ManualTimer {
        fn start(&mut self, _interval: Duration, tick: TickFn) -> anyhow::Result<()> {
            self.counts.starts.fetch_add(1, Ordering::SeqCst);
            *self.counts.tick.lock().unwrap() = Some(tick);
            self.active = true;
            Ok(())
        }

        fn cancel(&mut self) {
            self.counts.cancels.fetch_add(1, Ordering::SeqCst);
            self.counts.tick.lock().unwrap().take();
            self.active = false;
        }

        fn is_active(&self) -> bool {
            self.active
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    #[test]
    fn test_thread_timer_fires_until_cancelled() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut timer = ThreadTimer::named("timer-test");
        timer
            .start(
                Duration::from_millis(5),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();
        assert!(timer.is_active());

        let deadline = Instant::now() + Duration::from_secs(5);
        while fired.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert!(fired.load(Ordering::SeqCst) >= 3);

        timer.cancel();
        assert!(!timer.is_active());
        // let an in-flight tick land, then make sure nothing else does
        thread::sleep(Duration::from_millis(30));
        let settled = fired.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(fired.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn test_first_tick_is_immediate() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut timer = ThreadTimer::named("timer-test-immediate");
        timer
            .start(
                Duration::from_secs(60),
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while fired.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        timer.cancel();
    }
}
