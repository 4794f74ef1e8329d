//! Grid state guarded by the container lock
//!
//! `Grid` is everything a container knows: configuration, cells, callbacks
//! and the materialized surface. The container handle wraps it in a mutex.
//! User callbacks never run while that mutex is held: passes copy out what a
//! callback needs, release the lock, and fold the results back in.

use super::cell::{Cell, CellSpec, ClickHandler, Generator};
use super::container::GridContainer;
use crate::host::{
    CloseEvent, Content, Host, LayoutKind, ListenerId, Surface, SurfaceId, SurfaceLayout,
    MAX_SIZE, ROW_WIDTH,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Runs before cells are applied on every population pass
pub type PopulateHandler<C> = Arc<dyn Fn(&GridContainer<C>) + Send + Sync>;

/// Invoked when the viewer closes the container
pub type CloseHandler = Arc<dyn Fn(&CloseEvent) + Send + Sync>;

/// Why a size was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeError {
    Zero,
    NotWholeRows(usize),
    TooLarge(usize),
}

impl fmt::Display for SizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "a grid can't have a size of 0"),
            Self::NotWholeRows(size) => write!(
                f,
                "a grid can't have a size of {} (not a multiple of {})",
                size, ROW_WIDTH
            ),
            Self::TooLarge(size) => write!(
                f,
                "a grid can't have a size of {} (must be below {})",
                size, MAX_SIZE
            ),
        }
    }
}

impl std::error::Error for SizeError {}

/// Check a size-driven grid size
pub fn validate_size(size: usize) -> Result<usize, SizeError> {
    if size == 0 {
        Err(SizeError::Zero)
    } else if size % ROW_WIDTH != 0 {
        Err(SizeError::NotWholeRows(size))
    } else if size >= MAX_SIZE {
        Err(SizeError::TooLarge(size))
    } else {
        Ok(size)
    }
}

/// Whether `slot` sits on the rectangular border of a grid of `size`
///
/// Grids below three rows are all border.
pub fn is_border_slot(slot: usize, size: usize) -> bool {
    size < 3 * ROW_WIDTH
        || slot < ROW_WIDTH
        || slot % ROW_WIDTH == 0
        || slot % ROW_WIDTH == ROW_WIDTH - 1
        || slot > size.saturating_sub(ROW_WIDTH)
}

/// Border slots of a grid of `size`, ascending
pub fn border_slots(size: usize) -> Vec<usize> {
    (0..size).filter(|&slot| is_border_slot(slot, size)).collect()
}

/// Lock-protected state of one container
pub struct Grid<C: Content> {
    pub(crate) id: u64,
    pub(crate) size: usize,
    pub(crate) title: String,
    pub(crate) layout: Option<LayoutKind>,
    pub(crate) cells: BTreeMap<usize, Cell<C>>,
    pub(crate) on_populate: Option<PopulateHandler<C>>,
    pub(crate) on_close: Option<CloseHandler>,
    pub(crate) on_click: Option<ClickHandler<C>>,
    pub(crate) interaction_cancelled: bool,
    pub(crate) refresh: bool,
    pub(crate) surface: Option<Box<dyn Surface<C>>>,
    pub(crate) built: bool,
    /// Set while the router is attached to the host
    pub(crate) listener: Option<ListenerId>,
    /// Set while registered with the scheduler
    pub(crate) scheduled: bool,
}

impl<C: Content> Grid<C> {
    pub(crate) fn new(id: u64, size: usize, title: String, interaction_cancelled: bool) -> Self {
        Self {
            id,
            size,
            title,
            layout: None,
            cells: BTreeMap::new(),
            on_populate: None,
            on_close: None,
            on_click: None,
            interaction_cancelled,
            refresh: false,
            surface: None,
            built: false,
            listener: None,
            scheduled: false,
        }
    }

    /// Container id, stable for the container's lifetime
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout(&self) -> Option<LayoutKind> {
        self.layout
    }

    /// Layout the surface is (or would be) created from
    pub fn surface_layout(&self) -> SurfaceLayout {
        match self.layout {
            Some(kind) => SurfaceLayout::Kind(kind),
            None => SurfaceLayout::Sized(self.size),
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn is_refresh_enabled(&self) -> bool {
        self.refresh
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.surface.as_ref().map(|surface| surface.id())
    }

    pub fn is_interaction_cancelled(&self) -> bool {
        self.interaction_cancelled
    }

    pub fn set_interaction_cancelled(&mut self, cancelled: bool) {
        self.interaction_cancelled = cancelled;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cells
    // ─────────────────────────────────────────────────────────────────────────

    /// Put a cell at `slot`, replacing whatever was there
    pub fn set_cell(&mut self, slot: usize, spec: CellSpec<C>) -> &mut Self {
        self.insert_cell(Cell::new(slot, spec));
        self
    }

    /// Insert a ready-made cell (remove-then-insert)
    pub fn insert_cell(&mut self, cell: Cell<C>) {
        self.cells.remove(&cell.slot());
        self.cells.insert(cell.slot(), cell);
    }

    /// Remove the cell at `slot`, if any
    pub fn clear_slot(&mut self, slot: usize) -> &mut Self {
        self.cells.remove(&slot);
        self
    }

    pub fn cell(&self, slot: usize) -> Option<&Cell<C>> {
        self.cells.get(&slot)
    }

    pub fn cell_mut(&mut self, slot: usize) -> Option<&mut Cell<C>> {
        self.cells.get_mut(&slot)
    }

    /// Occupied slots, ascending
    pub fn slots(&self) -> Vec<usize> {
        self.cells.keys().copied().collect()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell<C>> {
        self.cells.values()
    }

    pub fn border_slots(&self) -> Vec<usize> {
        border_slots(self.size)
    }

    /// Apply one spec to every border slot
    pub fn set_border(&mut self, spec: CellSpec<C>) -> &mut Self {
        for slot in self.border_slots() {
            self.set_cell(slot, spec.clone());
        }
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration (frozen once built)
    // ─────────────────────────────────────────────────────────────────────────

    fn frozen(&self, option: &str) -> bool {
        if self.built {
            tracing::warn!(
                "Grid #{}: can't change {} once the grid is built",
                self.id,
                option
            );
        }
        self.built
    }

    pub(crate) fn configure_size(&mut self, size: usize, host: &dyn Host<C>) {
        if self.frozen("size") {
            return;
        }
        if let Err(e) = validate_size(size) {
            tracing::error!("Grid #{}: {}", self.id, e);
            return;
        }
        if self.size != size {
            self.size = size;
            // a layout kind decides the surface shape, size doesn't
            if self.layout.is_none() {
                self.regenerate(host);
            }
        }
    }

    pub(crate) fn configure_title(&mut self, title: String, host: &dyn Host<C>) {
        if self.frozen("title") {
            return;
        }
        if self.title != title {
            self.title = title;
            self.regenerate(host);
        }
    }

    pub(crate) fn configure_layout(&mut self, layout: Option<LayoutKind>, host: &dyn Host<C>) {
        if self.frozen("layout") {
            return;
        }
        if self.layout != layout {
            self.layout = layout;
            self.regenerate(host);
        }
    }

    pub(crate) fn configure_refresh(&mut self, refresh: bool) {
        if !self.frozen("refresh") {
            self.refresh = refresh;
        }
    }

    pub(crate) fn configure_populate(&mut self, handler: Option<PopulateHandler<C>>) {
        if !self.frozen("populate callback") {
            self.on_populate = handler;
        }
    }

    /// Swap an existing surface for a blank one matching the configuration
    fn regenerate(&mut self, host: &dyn Host<C>) {
        let Some(mut stale) = self.surface.take() else {
            return;
        };
        stale.clear();
        drop(stale);
        let surface = self.materialize(host);
        tracing::debug!(
            "Grid #{}: surface regenerated as {:?}",
            self.id,
            surface.id()
        );
        self.surface = Some(surface);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Surface passes
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a fresh surface from the current configuration
    pub(crate) fn materialize(&self, host: &dyn Host<C>) -> Box<dyn Surface<C>> {
        host.create_surface(self.surface_layout(), &self.title)
    }

    pub(crate) fn populate_handler(&self) -> Option<PopulateHandler<C>> {
        self.on_populate.clone()
    }

    /// Generators a pass has to run, cloned out so they can run unlocked
    pub(crate) fn pending_generators(&self, scope: GeneratorScope) -> Vec<(usize, Generator<C>)> {
        let capacity = self.surface.as_ref().map_or(0, |surface| surface.size());
        self.cells
            .values()
            .filter(|cell| match scope {
                GeneratorScope::All => true,
                GeneratorScope::Visible => cell.slot() < capacity,
                GeneratorScope::Missing => cell.peek().is_none(),
            })
            .filter_map(|cell| cell.generator().map(|g| (cell.slot(), Arc::clone(g))))
            .collect()
    }

    /// Fold generator results back in
    ///
    /// A result is dropped when its cell was replaced or given another
    /// generator while the generators ran.
    pub(crate) fn store_generated(&mut self, results: Vec<(usize, Generator<C>, Option<C>)>) {
        for (slot, generator, value) in results {
            if let Some(cell) = self.cells.get_mut(&slot) {
                if cell.generator().is_some_and(|g| Arc::ptr_eq(g, &generator)) {
                    cell.set_content(value);
                }
            }
        }
    }

    /// Wipe the surface; false when there is none
    pub(crate) fn clear_surface(&mut self) -> bool {
        match self.surface.as_mut() {
            Some(surface) => {
                surface.clear();
                true
            }
            None => false,
        }
    }

    /// Write every in-bounds cell's stored content to the surface
    pub(crate) fn write_cells(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let capacity = surface.size();
        for cell in self.cells.values() {
            if cell.slot() < capacity {
                surface.set(cell.slot(), cell.peek().cloned().unwrap_or_else(C::empty));
            }
        }
    }
}

/// Which generators a pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GeneratorScope {
    /// Every generator-backed cell (scheduler refresh)
    All,
    /// Cells that fit on the current surface (build)
    Visible,
    /// Cells with no stored value yet, in a detached context
    Missing,
}

impl<C: Content> fmt::Debug for Grid<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("title", &self.title)
            .field("layout", &self.layout)
            .field("cells", &self.cells.len())
            .field("refresh", &self.refresh)
            .field("built", &self.built)
            .field("surface", &self.surface.as_ref().map(|s| s.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellContext;
    use crate::host::memory::MemoryHost;

    fn grid(size: usize) -> Grid<String> {
        Grid::new(1, size, String::new(), false)
    }

    #[test]
    fn test_validate_size() {
        for size in [9, 18, 27, 36, 45] {
            assert_eq!(validate_size(size), Ok(size));
        }
        assert_eq!(validate_size(0), Err(SizeError::Zero));
        assert_eq!(validate_size(10), Err(SizeError::NotWholeRows(10)));
        assert_eq!(validate_size(54), Err(SizeError::TooLarge(54)));
        assert_eq!(validate_size(63), Err(SizeError::TooLarge(63)));
    }

    #[test]
    fn test_small_grids_are_all_border() {
        assert_eq!(border_slots(9), (0..9).collect::<Vec<_>>());
        assert_eq!(border_slots(18), (0..18).collect::<Vec<_>>());
    }

    #[test]
    fn test_border_slots_three_rows() {
        // only the middle of row two is inside
        let expected: Vec<usize> = (0..27).filter(|&s| !(10..=16).contains(&s)).collect();
        assert_eq!(border_slots(27), expected);
    }

    #[test]
    fn test_border_matches_predicate_for_every_valid_size() {
        for size in [9, 18, 27, 36, 45] {
            let border = border_slots(size);
            for slot in 0..size {
                // written out in the host's row arithmetic
                let expected = size < 27
                    || slot < 9
                    || slot % 9 == 0
                    || (slot >= 8 && (slot - 8) % 9 == 0)
                    || slot as isize > size as isize - 9;
                assert_eq!(border.contains(&slot), expected, "slot {slot} of {size}");
            }
        }
    }

    #[test]
    fn test_set_cell_replaces() {
        let mut grid = grid(9);
        grid.set_cell(3, CellSpec::fixed("a".to_string()));
        grid.set_cell(3, CellSpec::fixed("b".to_string()).cancelled(false));
        assert_eq!(grid.slots(), vec![3]);
        let cell = grid.cell(3).unwrap();
        assert_eq!(cell.peek().map(String::as_str), Some("b"));
        assert!(!cell.is_cancelled());
    }

    #[test]
    fn test_clear_slot_is_idempotent() {
        let mut grid = grid(9);
        grid.set_cell(1, CellSpec::fixed("a".to_string()));
        grid.clear_slot(1).clear_slot(1);
        assert!(grid.cell(1).is_none());
    }

    #[test]
    fn test_set_border_uses_current_size() {
        let mut grid = grid(36);
        grid.set_border(CellSpec::fixed("pane".to_string()));
        assert_eq!(grid.slots(), border_slots(36));
        assert!(grid.cell(10).is_none());
    }

    #[test]
    fn test_surface_writes_without_surface_are_noops() {
        let mut grid = grid(9);
        grid.set_cell(0, CellSpec::fixed("a".to_string()));
        assert!(!grid.clear_surface());
        grid.write_cells();
        assert!(grid.pending_generators(GeneratorScope::Visible).is_empty());
        assert_eq!(grid.cell(0).unwrap().peek().map(String::as_str), Some("a"));
    }

    #[test]
    fn test_generated_values_skip_replaced_cells() {
        let mut grid = grid(9);
        grid.set_cell(1, CellSpec::generated(|_: &CellContext| Some("old".to_string())));
        grid.set_cell(2, CellSpec::generated(|_: &CellContext| Some("old".to_string())));
        let pending = grid.pending_generators(GeneratorScope::All);
        assert_eq!(pending.len(), 2);

        // slot 2 is replaced while its generator is running elsewhere
        grid.set_cell(2, CellSpec::fixed("fixed".to_string()));
        let results = pending
            .into_iter()
            .map(|(slot, generator)| (slot, generator, Some("new".to_string())))
            .collect();
        grid.store_generated(results);

        assert_eq!(grid.cell(1).unwrap().peek().map(String::as_str), Some("new"));
        assert_eq!(grid.cell(2).unwrap().peek().map(String::as_str), Some("fixed"));
    }

    #[test]
    fn test_border_predicate_handles_extreme_slots() {
        assert!(is_border_slot(usize::MAX, 45));
        assert!(is_border_slot(44, 45));
        assert!(!is_border_slot(31, 45));
    }

    #[test]
    fn test_configure_rejects_invalid_size() {
        let host = MemoryHost::<String>::new();
        let mut grid = grid(27);
        grid.configure_size(28, &host);
        grid.configure_size(0, &host);
        grid.configure_size(54, &host);
        assert_eq!(grid.size(), 27);
        grid.configure_size(45, &host);
        assert_eq!(grid.size(), 45);
    }

    #[test]
    fn test_configure_is_frozen_once_built() {
        let host = MemoryHost::<String>::new();
        let mut grid = grid(9);
        grid.built = true;
        grid.configure_size(18, &host);
        grid.configure_title("Later".to_string(), &host);
        grid.configure_layout(Some(LayoutKind::Hopper), &host);
        grid.configure_refresh(true);
        assert_eq!(grid.size(), 9);
        assert_eq!(grid.title(), "");
        assert_eq!(grid.layout(), None);
        assert!(!grid.is_refresh_enabled());
    }

    #[test]
    fn test_existing_surface_is_regenerated_on_change() {
        let host = MemoryHost::<String>::new();
        let mut grid = grid(9);
        grid.surface = Some(grid.materialize(&host));
        let first = grid.surface_id().unwrap();

        // same value: surface kept
        grid.configure_title(String::new(), &host);
        assert_eq!(grid.surface_id(), Some(first));

        grid.configure_title("Shop".to_string(), &host);
        let second = grid.surface_id().unwrap();
        assert_ne!(first, second);
        assert!(host.contents(first).is_none());
        assert_eq!(host.title(second).as_deref(), Some("Shop"));

        grid.configure_size(18, &host);
        assert_eq!(grid.surface.as_ref().unwrap().size(), 18);

        // size alone doesn't matter once a layout kind is set
        grid.configure_layout(Some(LayoutKind::Hopper), &host);
        let hopper = grid.surface_id().unwrap();
        grid.configure_size(27, &host);
        assert_eq!(grid.surface_id(), Some(hopper));
        assert_eq!(grid.surface.as_ref().unwrap().size(), 5);
    }
}
