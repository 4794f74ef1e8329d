//! GridContainer - the fluent handle callers configure and build
//!
//! The handle is a cheap clone over shared state. Configuration setters take
//! `&self` and return `&Self` so calls chain:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use slotgrid::grid::{CellSpec, GridContainer};
//! # use slotgrid::host::{memory::MemoryHost, ViewerId};
//! # use slotgrid::scheduler::Scheduler;
//! # let host = Arc::new(MemoryHost::<String>::new());
//! # let scheduler = Scheduler::new(&Default::default());
//! let shop = GridContainer::new(host, scheduler);
//! shop.set_size(27)
//!     .set_title("Shop")
//!     .set_border(CellSpec::fixed("glass".to_string()))
//!     .build(&ViewerId::new("alex"));
//! ```

use super::cell::{Cell, CellContext, CellSpec, ClickHandler};
use super::isolate;
use super::state::{CloseHandler, GeneratorScope, Grid, PopulateHandler};
use super::template::Template;
use crate::config::GridDefaults;
use crate::host::{
    ClickEvent, CloseEvent, Content, EventListener, Host, LayoutKind, SurfaceId, ViewerId,
};
use crate::scheduler::{Refreshable, Scheduler};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by every clone of a container handle
///
/// The host holds it weakly as an event listener and the scheduler holds it
/// weakly as a refresh target.
pub(crate) struct Shared<C: Content> {
    pub(crate) id: u64,
    pub(crate) grid: Mutex<Grid<C>>,
    pub(crate) host: Arc<dyn Host<C>>,
    pub(crate) scheduler: Scheduler,
    this: Weak<Shared<C>>,
}

impl<C: Content> Shared<C> {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Grid<C>> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self) -> Option<GridContainer<C>> {
        self.this.upgrade().map(|shared| GridContainer { shared })
    }

    fn build(&self, viewer: &ViewerId) {
        let opened = {
            let mut grid = self.lock();
            if grid.surface.is_some() {
                None
            } else {
                let surface = grid.materialize(self.host.as_ref());
                let surface_id = surface.id();
                grid.surface = Some(surface);
                grid.built = true;
                Some((surface_id, grid.refresh))
            }
        };
        self.fill();

        let Some((surface, refresh)) = opened else {
            // already open: manual refresh only
            tracing::debug!("Grid #{} repopulated", self.id);
            return;
        };

        // host calls happen unlocked: a host may dispatch events synchronously
        self.host.open(viewer, surface);

        if refresh {
            let target: Weak<dyn Refreshable> = self.this.clone();
            self.scheduler.register(self.id, target);
        }

        let listener: Weak<dyn EventListener<C>> = self.this.clone();
        let listener = self.host.attach(listener);

        let still_open = {
            let mut grid = self.lock();
            let still_open = grid.surface_id() == Some(surface);
            if still_open {
                grid.listener = Some(listener);
                grid.scheduled = refresh;
            }
            still_open
        };
        if !still_open {
            // stopped (or rebuilt) while the host calls ran
            self.host.detach(listener);
            if refresh {
                self.scheduler.deregister(self.id);
            }
            tracing::debug!("Grid #{} stopped before build finished", self.id);
            return;
        }
        tracing::debug!(
            "Grid #{} built as {:?} for {} (refresh: {})",
            self.id,
            surface,
            viewer,
            refresh
        );
    }

    pub(crate) fn stop(&self) {
        let (listener, scheduled, surface) = {
            let mut grid = self.lock();
            grid.built = false;
            (
                grid.listener.take(),
                std::mem::take(&mut grid.scheduled),
                grid.surface.take(),
            )
        };

        if listener.is_none() && !scheduled && surface.is_none() {
            return;
        }
        if let Some(listener) = listener {
            self.host.detach(listener);
        }
        if scheduled {
            self.scheduler.deregister(self.id);
        }
        let surface_id = surface.as_ref().map(|surface| surface.id());
        drop(surface);
        tracing::debug!("Grid #{} stopped (surface {:?})", self.id, surface_id);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Passes (callbacks run unlocked and may use the container handle)
    // ─────────────────────────────────────────────────────────────────────────

    fn run_populate(&self) {
        let Some(populate) = self.lock().populate_handler() else {
            return;
        };
        let Some(handle) = self.handle() else {
            return;
        };
        isolate("populate", self.id, || populate(&handle));
    }

    fn run_generators(&self, scope: GeneratorScope) {
        let (pending, size, title) = {
            let grid = self.lock();
            (
                grid.pending_generators(scope),
                grid.size(),
                grid.title().to_string(),
            )
        };
        if pending.is_empty() {
            return;
        }

        let mut results = Vec::with_capacity(pending.len());
        for (slot, generator) in pending {
            let ctx = match scope {
                GeneratorScope::Missing => CellContext::detached(slot),
                GeneratorScope::All | GeneratorScope::Visible => {
                    CellContext::new(slot, size, &title)
                }
            };
            // a panicking generator keeps its previous value
            if let Some(value) = isolate("generator", self.id, || generator(&ctx)) {
                results.push((slot, generator, value));
            }
        }
        self.lock().store_generated(results);
    }

    /// Build-time population: populate callback, refresh every cell that
    /// fits on the surface, write the result
    fn fill(&self) {
        self.run_populate();
        self.run_generators(GeneratorScope::Visible);
        self.run_generators(GeneratorScope::Missing);
        self.lock().write_cells();
    }
}

impl<C: Content> Refreshable for Shared<C> {
    /// Clear, run the populate callback, write current content
    fn render_pass(&self) {
        if !self.lock().clear_surface() {
            return;
        }
        self.run_populate();
        self.run_generators(GeneratorScope::Missing);
        self.lock().write_cells();
    }

    /// Advance every generator without touching the surface
    fn refresh_pass(&self) {
        self.run_generators(GeneratorScope::All);
    }
}

impl<C: Content> Drop for Shared<C> {
    fn drop(&mut self) {
        let grid = self.grid.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(listener) = grid.listener.take() {
            self.host.detach(listener);
        }
        if std::mem::take(&mut grid.scheduled) {
            self.scheduler.deregister(self.id);
        }
    }
}

/// Handle to one grid container
pub struct GridContainer<C: Content> {
    shared: Arc<Shared<C>>,
}

impl<C: Content> Clone for GridContainer<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Content> GridContainer<C> {
    /// One row, no title, interaction allowed
    pub fn new(host: Arc<dyn Host<C>>, scheduler: Scheduler) -> Self {
        Self::create(host, scheduler, 9, String::new(), false)
    }

    /// Start from configured defaults
    ///
    /// An invalid default size is rejected like any other and the container
    /// keeps one row.
    pub fn with_defaults(
        host: Arc<dyn Host<C>>,
        scheduler: Scheduler,
        defaults: &GridDefaults,
    ) -> Self {
        let container = Self::create(
            host,
            scheduler,
            9,
            defaults.default_title.clone(),
            defaults.interaction_cancelled,
        );
        container.set_size(defaults.default_size);
        container
    }

    fn create(
        host: Arc<dyn Host<C>>,
        scheduler: Scheduler,
        size: usize,
        title: String,
        interaction_cancelled: bool,
    ) -> Self {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new_cyclic(|this| Shared {
            id,
            grid: Mutex::new(Grid::new(id, size, title, interaction_cancelled)),
            host,
            scheduler,
            this: this.clone(),
        });
        Self { shared }
    }

    /// Process-unique container id
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────────────────

    /// Slot count for size-driven surfaces: a multiple of 9 below 54
    pub fn set_size(&self, size: usize) -> &Self {
        self.shared
            .lock()
            .configure_size(size, self.shared.host.as_ref());
        self
    }

    pub fn set_title(&self, title: impl Into<String>) -> &Self {
        self.shared
            .lock()
            .configure_title(title.into(), self.shared.host.as_ref());
        self
    }

    /// Use a host layout instead of a sized grid; `None` goes back to size
    pub fn set_layout(&self, layout: Option<LayoutKind>) -> &Self {
        self.shared
            .lock()
            .configure_layout(layout, self.shared.host.as_ref());
        self
    }

    /// Register with the scheduler on build
    pub fn set_refresh(&self, refresh: bool) -> &Self {
        self.shared.lock().configure_refresh(refresh);
        self
    }

    /// Callback run before cells are applied on every population pass
    pub fn set_populate<F>(&self, populate: F) -> &Self
    where
        F: Fn(&GridContainer<C>) + Send + Sync + 'static,
    {
        let handler: PopulateHandler<C> = Arc::new(populate);
        self.shared.lock().configure_populate(Some(handler));
        self
    }

    pub fn set_close_handler<F>(&self, handler: F) -> &Self
    where
        F: Fn(&CloseEvent) + Send + Sync + 'static,
    {
        let handler: CloseHandler = Arc::new(handler);
        self.shared.lock().on_close = Some(handler);
        self
    }

    /// Callback for any click while this container is the top surface
    pub fn set_click_handler<F>(&self, handler: F) -> &Self
    where
        F: Fn(&mut ClickEvent<C>) + Send + Sync + 'static,
    {
        let handler: ClickHandler<C> = Arc::new(handler);
        self.shared.lock().on_click = Some(handler);
        self
    }

    /// Default cancellation for slots no cell claims
    pub fn set_interaction_cancelled(&self, cancelled: bool) -> &Self {
        self.shared.lock().set_interaction_cancelled(cancelled);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cells
    // ─────────────────────────────────────────────────────────────────────────

    /// Put a cell at `slot`, replacing whatever was there
    ///
    /// A generator runs once here, before the container is locked, so it may
    /// read the container.
    pub fn set_cell(&self, slot: usize, spec: CellSpec<C>) -> &Self {
        let cell = Cell::new(slot, spec);
        self.shared.lock().insert_cell(cell);
        self
    }

    pub fn clear_slot(&self, slot: usize) -> &Self {
        self.shared.lock().clear_slot(slot);
        self
    }

    /// Apply one spec to every border slot of the current size
    pub fn set_border(&self, spec: CellSpec<C>) -> &Self {
        let slots = self.shared.lock().border_slots();
        let cells: Vec<Cell<C>> = slots
            .into_iter()
            .map(|slot| Cell::new(slot, spec.clone()))
            .collect();
        let mut grid = self.shared.lock();
        for cell in cells {
            grid.insert_cell(cell);
        }
        drop(grid);
        self
    }

    /// Copy of the cell at `slot`
    pub fn cell(&self, slot: usize) -> Option<Cell<C>> {
        self.shared.lock().cell(slot).cloned()
    }

    /// Occupied slots, ascending
    pub fn slots(&self) -> Vec<usize> {
        self.shared.lock().slots()
    }

    pub fn border_slots(&self) -> Vec<usize> {
        self.shared.lock().border_slots()
    }

    /// Snapshot every cell into a reusable template
    pub fn template(&self) -> Template<C> {
        Template::new(self.shared.lock().cells().cloned().collect())
    }

    /// Insert every cell of `template`, replacing cells at the same slots
    pub fn apply_template(&self, template: &Template<C>) -> &Self {
        let mut grid = self.shared.lock();
        for cell in template.cells() {
            grid.insert_cell(cell.clone());
        }
        self
    }

    /// Run `f` against the locked grid state
    ///
    /// `f` must not call back into this container's handle.
    pub fn with_grid<R>(&self, f: impl FnOnce(&mut Grid<C>) -> R) -> R {
        f(&mut self.shared.lock())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Materialize and open for `viewer`, or repopulate if already open
    pub fn build(&self, viewer: &ViewerId) -> &Self {
        self.shared.build(viewer);
        self
    }

    /// Tear down: detach, deregister, drop the surface. Safe to repeat.
    pub fn stop(&self) {
        self.shared.stop();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn size(&self) -> usize {
        self.shared.lock().size()
    }

    pub fn title(&self) -> String {
        self.shared.lock().title().to_string()
    }

    pub fn layout(&self) -> Option<LayoutKind> {
        self.shared.lock().layout()
    }

    pub fn is_refresh_enabled(&self) -> bool {
        self.shared.lock().is_refresh_enabled()
    }

    pub fn is_interaction_cancelled(&self) -> bool {
        self.shared.lock().is_interaction_cancelled()
    }

    pub fn is_built(&self) -> bool {
        self.shared.lock().is_built()
    }

    /// Whether a surface currently exists
    pub fn is_open(&self) -> bool {
        self.shared.lock().surface.is_some()
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.shared.lock().surface_id()
    }

    /// Whether the router is attached to the host
    pub fn is_listening(&self) -> bool {
        self.shared.lock().listener.is_some()
    }
}

impl<C: Content> fmt::Debug for GridContainer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GridContainer")
            .field(&*self.shared.lock())
            .finish()
    }
}
