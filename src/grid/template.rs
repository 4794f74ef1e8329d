//! Reusable cell layouts
//!
//! A template is a detached copy of a container's cells. Applying it to
//! another container stamps the same cells (content, generators, flags and
//! click handlers) onto the same slots.

use super::cell::Cell;
use crate::host::Content;
use std::fmt;

#[derive(Clone)]
pub struct Template<C: Content> {
    cells: Vec<Cell<C>>,
}

impl<C: Content> Template<C> {
    pub fn new(cells: Vec<Cell<C>>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell<C>] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<C: Content> fmt::Debug for Template<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template").field("cells", &self.cells).finish()
    }
}
