//! slotgrid - grid containers on top of a slot-based display host
//!
//! A [`grid::GridContainer`] owns a set of cells (fixed or generated
//! content, click behaviour, an interaction-cancelled flag) and shows them
//! on a [`host::Surface`] opened for a viewer. While it is open the
//! container answers the host's close, click, drag and move events, and a
//! shared [`scheduler::Scheduler`] alternates render and refresh passes over
//! every container that asked for periodic refresh.
//!
//! [`host::memory::MemoryHost`] is a complete in-process host used by the
//! demo binary and the tests.

pub mod config;
pub mod demo;
pub mod grid;
pub mod host;
pub mod logging;
pub mod scheduler;
