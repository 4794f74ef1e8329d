//! Refresh scheduler
//!
//! One timer drives every refresh-enabled container. Ticks alternate between
//! two passes so generator evaluation and surface writes never interleave
//! within one tick:
//!
//! ```text
//! step 0 (even)  render:  clear surface → populate callback → write current content
//! step 1 (odd)   refresh: re-run every generator, write nothing
//! step 2 (even)  render:  values computed at step 1 become visible
//! ```
//!
//! The registry lock covers register/deregister and the start/stop decision
//! only. A tick snapshots the registry under the lock and runs the passes
//! after releasing it, so a pass may register or deregister containers
//! (including its own) without deadlocking.
//!
//! The scheduler is an explicit service: create one at startup, hand clones
//! to containers, call [`Scheduler::force_stop`] at shutdown.

mod timer;

#[cfg(test)]
pub(crate) use timer::manual::{ManualTimer, TimerCounts};
pub use timer::{ThreadTimer, TickFn, TickTimer};

use crate::config::SchedulerConfig;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

/// Something the scheduler can tick
pub trait Refreshable: Send + Sync {
    /// Even step: rebuild the surface from current cell content
    fn render_pass(&self);

    /// Odd step: advance generators without touching the surface
    fn refresh_pass(&self);
}

struct Registry {
    entries: Vec<(u64, Weak<dyn Refreshable>)>,
    step: u64,
    running: bool,
    /// Bumped on every start so a tick from a cancelled timer is ignored
    generation: u64,
}

struct SchedulerInner {
    registry: Mutex<Registry>,
    timer: Mutex<Box<dyn TickTimer>>,
    interval: Duration,
}

/// Cloneable handle to the shared scheduler
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Scheduler backed by a [`ThreadTimer`]
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_timer(config.interval(), Box::new(ThreadTimer::new()))
    }

    /// Scheduler backed by any timer implementation
    pub fn with_timer(interval: Duration, timer: Box<dyn TickTimer>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                registry: Mutex::new(Registry {
                    entries: Vec::new(),
                    step: 0,
                    running: false,
                    generation: 0,
                }),
                timer: Mutex::new(timer),
                interval,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Ticks run since the timer last started
    pub fn step(&self) -> u64 {
        lock(&self.inner.registry).step
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.registry).running
    }

    /// Number of registered containers
    pub fn registered(&self) -> usize {
        lock(&self.inner.registry).entries.len()
    }

    pub fn is_registered(&self, id: u64) -> bool {
        lock(&self.inner.registry)
            .entries
            .iter()
            .any(|(entry, _)| *entry == id)
    }

    /// Add a container; the first registrant starts the timer
    pub fn register(&self, id: u64, target: Weak<dyn Refreshable>) {
        let mut registry = lock(&self.inner.registry);
        if registry.entries.iter().any(|(entry, _)| *entry == id) {
            tracing::debug!("Grid #{} already registered for refresh", id);
            return;
        }
        registry.entries.push((id, target));
        tracing::debug!(
            "Grid #{} registered for refresh ({} total)",
            id,
            registry.entries.len()
        );
        if registry.entries.len() == 1 {
            self.start_locked(&mut registry);
        }
    }

    /// Remove a container; the last one out stops the timer
    pub fn deregister(&self, id: u64) {
        let mut registry = lock(&self.inner.registry);
        let before = registry.entries.len();
        registry.entries.retain(|(entry, _)| *entry != id);
        if registry.entries.len() == before {
            return;
        }
        tracing::debug!(
            "Grid #{} deregistered ({} remaining)",
            id,
            registry.entries.len()
        );
        if registry.entries.is_empty() {
            self.stop_locked(&mut registry);
        }
    }

    /// Unconditional stop, for process shutdown
    pub fn force_stop(&self) {
        let mut registry = lock(&self.inner.registry);
        tracing::warn!(
            "Stopping grid scheduler at shutdown ({} container(s) still registered)",
            registry.entries.len()
        );
        registry.entries.clear();
        self.stop_locked(&mut registry);
    }

    /// Run one tick now
    ///
    /// The timer calls this on every period; tests call it directly.
    pub fn tick(&self) {
        self.inner.tick(None);
    }

    fn start_locked(&self, registry: &mut Registry) {
        registry.step = 0;
        registry.generation += 1;
        let generation = registry.generation;
        let weak = Arc::downgrade(&self.inner);
        let tick: TickFn = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.tick(Some(generation));
            }
        });

        match lock(&self.inner.timer).start(self.inner.interval, tick) {
            Ok(()) => {
                registry.running = true;
                tracing::debug!(
                    "Grid scheduler started (every {:?})",
                    self.inner.interval
                );
            }
            Err(e) => {
                registry.running = false;
                tracing::error!("Grid scheduler failed to start: {:#}", e);
            }
        }
    }

    fn stop_locked(&self, registry: &mut Registry) {
        if registry.running {
            lock(&self.inner.timer).cancel();
            tracing::debug!("Grid scheduler stopped after {} tick(s)", registry.step);
        }
        registry.running = false;
        registry.step = 0;
    }
}

impl SchedulerInner {
    fn tick(&self, generation: Option<u64>) {
        let (step, targets) = {
            let mut registry = lock(&self.registry);
            if let Some(generation) = generation {
                if !registry.running || registry.generation != generation {
                    return;
                }
            }
            let step = registry.step;
            registry.step += 1;
            registry.entries.retain(|(_, weak)| weak.strong_count() > 0);
            let targets: Vec<(u64, Arc<dyn Refreshable>)> = registry
                .entries
                .iter()
                .filter_map(|(id, weak)| weak.upgrade().map(|target| (*id, target)))
                .collect();
            (step, targets)
        };

        let render = step % 2 == 0;
        for (id, target) in targets {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                if render {
                    target.render_pass();
                } else {
                    target.refresh_pass();
                }
            }));
            if outcome.is_err() {
                tracing::error!(
                    "Grid #{} {} pass panicked; other grids keep ticking",
                    id,
                    if render { "render" } else { "refresh" }
                );
            }
        }
    }
}

impl Drop for SchedulerInner {
    fn drop(&mut self) {
        let running = self
            .registry
            .get_mut()
            .map(|registry| registry.running)
            .unwrap_or(false);
        if running {
            self.timer
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTarget {
        renders: AtomicUsize,
        refreshes: AtomicUsize,
    }

    impl Refreshable for CountingTarget {
        fn render_pass(&self) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }

        fn refresh_pass(&self) {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Exploding;

    impl Refreshable for Exploding {
        fn render_pass(&self) {
            panic!("render exploded");
        }

        fn refresh_pass(&self) {
            panic!("refresh exploded");
        }
    }

    fn manual() -> (Scheduler, TimerCounts) {
        let (timer, counts) = ManualTimer::new();
        (
            Scheduler::with_timer(Duration::from_millis(50), Box::new(timer)),
            counts,
        )
    }

    fn weak(target: &Arc<dyn Refreshable>) -> Weak<dyn Refreshable> {
        Arc::downgrade(target)
    }

    #[test]
    fn test_timer_starts_and_stops_on_transitions_only() {
        let (scheduler, counts) = manual();
        let a: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
        let b: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());

        scheduler.register(1, weak(&a));
        assert!(scheduler.is_running());
        scheduler.register(2, weak(&b));
        assert_eq!(counts.starts(), 1);

        scheduler.deregister(1);
        assert_eq!(counts.cancels(), 0);
        assert!(scheduler.is_running());

        scheduler.deregister(2);
        assert_eq!(counts.cancels(), 1);
        assert!(!scheduler.is_running());

        // restart on the next 0 -> 1 transition
        scheduler.register(1, weak(&a));
        assert_eq!(counts.starts(), 2);
    }

    #[test]
    fn test_duplicate_register_and_unknown_deregister_are_noops() {
        let (scheduler, counts) = manual();
        let a: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
        scheduler.register(1, weak(&a));
        scheduler.register(1, weak(&a));
        assert_eq!(scheduler.registered(), 1);

        scheduler.deregister(42);
        assert_eq!(counts.cancels(), 0);
        assert!(scheduler.is_registered(1));
    }

    #[test]
    fn test_ticks_alternate_render_and_refresh() {
        let (scheduler, counts) = manual();
        let concrete = Arc::new(CountingTarget::default());
        let target: Arc<dyn Refreshable> = concrete.clone();
        scheduler.register(7, weak(&target));

        assert!(counts.fire()); // step 0
        assert_eq!(concrete.renders.load(Ordering::SeqCst), 1);
        assert_eq!(concrete.refreshes.load(Ordering::SeqCst), 0);

        assert!(counts.fire()); // step 1
        assert_eq!(concrete.refreshes.load(Ordering::SeqCst), 1);

        assert!(counts.fire()); // step 2
        assert_eq!(concrete.renders.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.step(), 3);
    }

    #[test]
    fn test_step_resets_when_last_container_leaves() {
        let (scheduler, _counts) = manual();
        let target: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
        scheduler.register(1, weak(&target));
        scheduler.tick();
        scheduler.tick();
        scheduler.tick();
        assert_eq!(scheduler.step(), 3);

        scheduler.deregister(1);
        assert_eq!(scheduler.step(), 0);
    }

    #[test]
    fn test_stale_timer_generation_is_ignored() {
        let (scheduler, counts) = manual();
        let concrete = Arc::new(CountingTarget::default());
        let target: Arc<dyn Refreshable> = concrete.clone();

        scheduler.register(1, weak(&target));
        let stale_generation = lock(&scheduler.inner.registry).generation;
        scheduler.deregister(1);
        scheduler.register(1, weak(&target));

        scheduler.inner.tick(Some(stale_generation));
        assert_eq!(concrete.renders.load(Ordering::SeqCst), 0);

        assert!(counts.fire());
        assert_eq!(concrete.renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_container_does_not_block_others() {
        let (scheduler, _counts) = manual();
        let bad: Arc<dyn Refreshable> = Arc::new(Exploding);
        let concrete = Arc::new(CountingTarget::default());
        let good: Arc<dyn Refreshable> = concrete.clone();
        scheduler.register(1, weak(&bad));
        scheduler.register(2, weak(&good));

        scheduler.tick();
        scheduler.tick();
        assert_eq!(concrete.renders.load(Ordering::SeqCst), 1);
        assert_eq!(concrete.refreshes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dead_entries_are_skipped() {
        let (scheduler, _counts) = manual();
        let target: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
        scheduler.register(1, weak(&target));
        drop(target);

        scheduler.tick();
        assert_eq!(scheduler.registered(), 0);
    }

    #[test]
    fn test_force_stop_clears_registry() {
        let (scheduler, counts) = manual();
        let target: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
        scheduler.register(1, weak(&target));
        scheduler.force_stop();

        assert!(!scheduler.is_running());
        assert_eq!(scheduler.registered(), 0);
        assert_eq!(counts.cancels(), 1);

        // stopping again only logs
        scheduler.force_stop();
        assert_eq!(counts.cancels(), 1);
    }

    #[test]
    fn test_concurrent_register_and_deregister_keep_transitions_exact() {
        let (scheduler, counts) = manual();

        let churn: Vec<_> = (0..8u64)
            .map(|id| {
                let scheduler = scheduler.clone();
                std::thread::spawn(move || {
                    let target: Arc<dyn Refreshable> = Arc::new(CountingTarget::default());
                    for _ in 0..200 {
                        scheduler.register(id, weak(&target));
                        scheduler.deregister(id);
                    }
                })
            })
            .collect();
        for handle in churn {
            handle.join().expect("churn thread panicked");
        }

        assert!(counts.starts() >= 1);
        assert_eq!(counts.starts(), counts.cancels());
        assert_eq!(scheduler.registered(), 0);
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.step(), 0);

        // all in from separate threads, then all out
        let targets: Vec<Arc<dyn Refreshable>> = (0..8)
            .map(|_| Arc::new(CountingTarget::default()) as Arc<dyn Refreshable>)
            .collect();
        let joins: Vec<_> = targets
            .iter()
            .enumerate()
            .map(|(id, target)| {
                let scheduler = scheduler.clone();
                let target = weak(target);
                std::thread::spawn(move || scheduler.register(id as u64, target))
            })
            .collect();
        for handle in joins {
            handle.join().expect("register thread panicked");
        }
        assert_eq!(scheduler.registered(), 8);
        assert!(scheduler.is_running());
        assert_eq!(counts.starts(), counts.cancels() + 1);

        let joins: Vec<_> = (0..8u64)
            .map(|id| {
                let scheduler = scheduler.clone();
                std::thread::spawn(move || scheduler.deregister(id))
            })
            .collect();
        for handle in joins {
            handle.join().expect("deregister thread panicked");
        }
        assert_eq!(scheduler.registered(), 0);
        assert!(!scheduler.is_running());
        assert_eq!(counts.starts(), counts.cancels());
    }

    #[test]
    fn test_thread_timer_drives_ticks() {
        let config = SchedulerConfig { interval_ms: 5 };
        let scheduler = Scheduler::new(&config);
        let concrete = Arc::new(CountingTarget::default());
        let target: Arc<dyn Refreshable> = concrete.clone();
        scheduler.register(1, weak(&target));

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while concrete.refreshes.load(Ordering::SeqCst) < 2 && std::time::Instant::now() < deadline
        {
            std::thread::sleep(Duration::from_millis(2));
        }
        assert!(concrete.renders.load(Ordering::SeqCst) >= 2);
        assert!(concrete.refreshes.load(Ordering::SeqCst) >= 2);
        scheduler.deregister(1);
        assert!(!scheduler.is_running());
    }
}
