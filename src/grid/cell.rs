//! Cell - one slot's content policy
//!
//! A cell either holds fixed content or a generator that is re-run on every
//! refresh. Generator-backed cells remember their last value, so reading a
//! cell never re-runs the generator except for the one-shot lazy
//! materialization when the stored value is `None`.

use crate::host::{ClickEvent, Content};
use std::fmt;
use std::sync::Arc;

/// Computes a cell's content from its context
pub type Generator<C> = Arc<dyn Fn(&CellContext) -> Option<C> + Send + Sync>;

/// Invoked when the cell is clicked while its container is open
pub type ClickHandler<C> = Arc<dyn Fn(&mut ClickEvent<C>) + Send + Sync>;

/// What a generator gets to look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellContext<'a> {
    pub slot: usize,
    /// Size of the owning grid, 0 when detached
    pub size: usize,
    /// Title of the owning grid, empty when detached
    pub title: &'a str,
}

impl<'a> CellContext<'a> {
    pub fn new(slot: usize, size: usize, title: &'a str) -> Self {
        Self { slot, size, title }
    }

    /// Context used before the cell belongs to any grid
    pub fn detached(slot: usize) -> CellContext<'static> {
        CellContext {
            slot,
            size: 0,
            title: "",
        }
    }
}

/// Where a cell's content comes from
#[derive(Clone)]
pub enum CellSource<C: Content> {
    Fixed(C),
    Generated(Generator<C>),
}

impl<C: Content> fmt::Debug for CellSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(content) => f.debug_tuple("Fixed").field(content).finish(),
            Self::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

/// Everything about a cell except its slot
///
/// One spec can be stamped onto many slots (see `set_border`).
#[derive(Clone)]
pub struct CellSpec<C: Content> {
    pub source: CellSource<C>,
    /// Whether interaction with the slot is suppressed
    pub cancelled: bool,
    pub on_click: Option<ClickHandler<C>>,
}

impl<C: Content> CellSpec<C> {
    /// Fixed content, interaction cancelled
    pub fn fixed(content: C) -> Self {
        Self {
            source: CellSource::Fixed(content),
            cancelled: true,
            on_click: None,
        }
    }

    /// Generated content, interaction cancelled
    pub fn generated<F>(generator: F) -> Self
    where
        F: Fn(&CellContext) -> Option<C> + Send + Sync + 'static,
    {
        Self {
            source: CellSource::Generated(Arc::new(generator)),
            cancelled: true,
            on_click: None,
        }
    }

    pub fn cancelled(mut self, cancelled: bool) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn on_click<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut ClickEvent<C>) + Send + Sync + 'static,
    {
        self.on_click = Some(Arc::new(handler));
        self
    }
}

impl<C: Content> fmt::Debug for CellSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellSpec")
            .field("source", &self.source)
            .field("cancelled", &self.cancelled)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

/// Content unit bound to one slot
#[derive(Clone)]
pub struct Cell<C: Content> {
    slot: usize,
    content: Option<C>,
    generator: Option<Generator<C>>,
    cancelled: bool,
    on_click: Option<ClickHandler<C>>,
}

impl<C: Content> Cell<C> {
    /// Build a cell; a generator is run once right away
    pub fn new(slot: usize, spec: CellSpec<C>) -> Self {
        let (content, generator) = match spec.source {
            CellSource::Fixed(content) => (Some(content), None),
            CellSource::Generated(generator) => (None, Some(generator)),
        };
        let mut cell = Self {
            slot,
            content,
            generator,
            cancelled: spec.cancelled,
            on_click: spec.on_click,
        };
        if cell.generator.is_some() {
            cell.refresh(&CellContext::detached(slot));
            // never observed unrefreshed, even if the generator said nothing
            if cell.content.is_none() {
                cell.content = Some(C::empty());
            }
        }
        cell
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Re-run the generator, if any, and keep its result
    pub fn refresh(&mut self, ctx: &CellContext) {
        if let Some(generator) = &self.generator {
            self.content = generator(ctx);
        }
    }

    /// Current content, never absent
    ///
    /// A `None` value triggers one refresh with a detached context first.
    pub fn content(&mut self) -> C {
        if self.content.is_none() {
            self.refresh(&CellContext::detached(self.slot));
        }
        self.content.clone().unwrap_or_else(C::empty)
    }

    /// Stored value without lazy materialization
    pub fn peek(&self) -> Option<&C> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Option<C>) {
        self.content = content;
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    pub fn generator(&self) -> Option<&Generator<C>> {
        self.generator.as_ref()
    }

    /// Replace (or remove) the generator; the stored value is kept until the
    /// next refresh
    pub fn set_generator(&mut self, generator: Option<Generator<C>>) {
        self.generator = generator;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
    }

    pub fn on_click(&self) -> Option<&ClickHandler<C>> {
        self.on_click.as_ref()
    }

    pub fn set_on_click(&mut self, handler: Option<ClickHandler<C>>) {
        self.on_click = handler;
    }
}

impl<C: Content> fmt::Debug for Cell<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("slot", &self.slot)
            .field("content", &self.content)
            .field("generator", &self.generator.is_some())
            .field("cancelled", &self.cancelled)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}
