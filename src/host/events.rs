// Interaction events delivered by the host
//
// One tagged enum covers every interaction kind, so a listener routes with a
// single `match` instead of one callback registration per kind.

use super::{Content, SurfaceId, ViewerId};

/// Every interaction the host can deliver to a grid listener
#[derive(Debug, Clone)]
pub enum GridEvent<C: Content> {
    Close(CloseEvent),
    Click(ClickEvent<C>),
    Drag(DragEvent),
    Move(MoveEvent),
}

impl<C: Content> GridEvent<C> {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Close(_) => "close",
            Self::Click(_) => "click",
            Self::Drag(_) => "drag",
            Self::Move(_) => "move",
        }
    }

    /// Final cancellation state, `None` for events that cannot be cancelled
    pub fn is_cancelled(&self) -> Option<bool> {
        match self {
            Self::Close(_) => None,
            Self::Click(e) => Some(e.cancelled),
            Self::Drag(e) => Some(e.cancelled),
            Self::Move(e) => Some(e.cancelled),
        }
    }
}

/// A viewer closed a surface
#[derive(Debug, Clone)]
pub struct CloseEvent {
    pub viewer: ViewerId,
    /// Top-level surface of the viewer's view
    pub top: SurfaceId,
    /// The surface the close originated from
    pub surface: SurfaceId,
    /// Whether the originating surface has a holder (a block, an entity...).
    /// Anonymous surfaces created by the runtime have none.
    pub has_holder: bool,
}

/// A viewer clicked a slot
#[derive(Debug, Clone)]
pub struct ClickEvent<C: Content> {
    pub viewer: ViewerId,
    /// Top-level surface of the view, `None` when the click has no surface context
    pub top: Option<SurfaceId>,
    /// The surface that was actually clicked (top or the viewer's own)
    pub clicked: Option<SurfaceId>,
    pub slot: usize,
    /// Content under the cursor at click time
    pub current: Option<C>,
    pub cancelled: bool,
}

impl<C: Content> ClickEvent<C> {
    /// Whether the clicked slot holds something other than the empty sentinel
    pub fn has_content(&self) -> bool {
        self.current.as_ref().is_some_and(|c| !c.is_empty())
    }
}

/// A viewer dragged content across several slots
#[derive(Debug, Clone)]
pub struct DragEvent {
    pub viewer: ViewerId,
    pub surface: SurfaceId,
    /// Slots of `surface` touched by the drag
    pub slots: Vec<usize>,
    /// Raw view slots touched by the drag
    pub raw_slots: Vec<usize>,
    pub cancelled: bool,
}

impl DragEvent {
    /// Whether `slot` is part of the drag footprint
    pub fn touches(&self, slot: usize) -> bool {
        self.slots.contains(&slot) || self.raw_slots.contains(&slot)
    }
}

/// Content moved between two surfaces without a viewer click
#[derive(Debug, Clone)]
pub struct MoveEvent {
    pub source: SurfaceId,
    pub initiator: SurfaceId,
    pub destination: SurfaceId,
    pub cancelled: bool,
}
