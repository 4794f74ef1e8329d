//! The demo's in-process world: one host, one scheduler, one container

use crate::config::Config;
use crate::grid::{CellContext, CellSpec, GridContainer};
use crate::host::memory::MemoryHost;
use crate::host::{ClickEvent, DragEvent, ViewerId, ROW_WIDTH};
use crate::scheduler::Scheduler;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Slots of the interesting cells (inside the border of a 3+ row grid)
const CLOCK_SLOT: usize = 10;
const SPINNER_SLOT: usize = 11;
const CLICKS_SLOT: usize = 12;
pub const BUTTON_SLOT: usize = 13;
const RESET_SLOT: usize = 16;

pub struct DemoSession {
    pub host: Arc<MemoryHost<String>>,
    pub scheduler: Scheduler,
    pub viewer: ViewerId,
    pub container: GridContainer<String>,
    clicks: Arc<AtomicUsize>,
}

impl DemoSession {
    pub fn new(config: &Config) -> Self {
        let host = Arc::new(MemoryHost::new());
        let scheduler = Scheduler::new(&config.scheduler);
        let container = GridContainer::with_defaults(host.clone(), scheduler.clone(), &config.grid);
        let clicks = Arc::new(AtomicUsize::new(0));

        let spins = AtomicUsize::new(0);
        let (counted, reset, shown) = (clicks.clone(), clicks.clone(), clicks.clone());
        container
            .set_size(config.demo.size)
            .set_title("slotgrid demo")
            .set_refresh(config.demo.refresh)
            .set_border(CellSpec::fixed("▒▒".to_string()))
            .set_cell(
                CLOCK_SLOT,
                CellSpec::generated(|_: &CellContext| {
                    Some(chrono::Local::now().format("%H:%M:%S").to_string())
                }),
            )
            .set_cell(
                SPINNER_SLOT,
                CellSpec::generated(move |_: &CellContext| {
                    let n = spins.fetch_add(1, Ordering::Relaxed);
                    Some(SPINNER[n % SPINNER.len()].to_string())
                }),
            )
            .set_cell(
                BUTTON_SLOT,
                CellSpec::fixed("click me".to_string()).on_click(move |_| {
                    counted.fetch_add(1, Ordering::Relaxed);
                }),
            )
            .set_cell(
                RESET_SLOT,
                CellSpec::fixed("reset".to_string()).on_click(move |_| {
                    reset.store(0, Ordering::Relaxed);
                }),
            )
            .set_populate(move |grid| {
                let label = format!("clicks: {}", shown.load(Ordering::Relaxed));
                grid.set_cell(CLICKS_SLOT, CellSpec::fixed(label));
            });

        Self {
            host,
            scheduler,
            viewer: ViewerId::new("demo"),
            container,
            clicks,
        }
    }

    /// Build (or repopulate) the container for the demo viewer
    pub fn open(&self) {
        self.container.build(&self.viewer);
    }

    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::Relaxed)
    }

    /// Slot count of the open surface, 0 when closed
    pub fn capacity(&self) -> usize {
        self.container
            .surface_id()
            .and_then(|surface| self.host.contents(surface))
            .map_or(0, |contents| contents.len())
    }

    /// Open surface contents split into rows
    pub fn rows(&self) -> Option<Vec<Vec<String>>> {
        let contents = self.host.contents(self.container.surface_id()?)?;
        Some(contents.chunks(ROW_WIDTH).map(<[String]>::to_vec).collect())
    }

    pub fn click(&self, slot: usize) -> Option<ClickEvent<String>> {
        self.host.click(&self.viewer, slot)
    }

    /// Drag across the whole row containing `slot`
    pub fn drag_row(&self, slot: usize) -> Option<DragEvent> {
        let start = slot - slot % ROW_WIDTH;
        let end = (start + ROW_WIDTH).min(self.capacity());
        self.host.drag(&self.viewer, (start..end).collect())
    }

    pub fn close(&self) -> bool {
        self.host.close(&self.viewer)
    }

    /// Stop the container and the scheduler
    pub fn shutdown(&self) {
        self.container.stop();
        self.scheduler.force_stop();
    }
}
