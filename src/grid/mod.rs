//! Grid containers
//!
//! A [`GridContainer`] owns a set of [`Cell`]s, the configuration of the
//! surface it shows, and the callbacks that react to viewers. Containers are
//! configured through a fluent handle, built for a viewer, and from then on
//! driven by host events (see `router`) and scheduler ticks.
//!
//! ```text
//!   configure ──► build(viewer) ──► open ──► stop()
//!      ▲                              │ events / ticks
//!      └────────── (rebuild) ─────────┘
//! ```

mod cell;
mod container;
mod router;
mod state;
mod template;


pub use cell::{Cell, CellContext, CellSource, CellSpec, ClickHandler, Generator};
pub use container::GridContainer;
pub use state::{
    border_slots, is_border_slot, validate_size, CloseHandler, Grid, PopulateHandler, SizeError,
};
pub use template::Template;

use std::panic::{self, AssertUnwindSafe};

/// Run a user callback, containing any panic it raises
///
/// Returns `None` if the callback panicked. The panic is logged with the
/// callback kind and the owning container so one bad callback can't take
/// down a tick or an event dispatch.
pub(crate) fn isolate<R>(kind: &str, container: u64, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!("Grid #{}: {} callback panicked: {}", container, kind, message);
            None
        }
    }
}
