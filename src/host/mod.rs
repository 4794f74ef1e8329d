//! Host collaborator contracts
//!
//! The grid runtime never draws anything itself. A host application owns the
//! rendering surface, the viewers and the event pump; this module describes
//! what the runtime needs from it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                          Host                            │
//! │   create_surface ─ open ─ attach/detach listeners        │
//! └──────────────────────────────────────────────────────────┘
//!        │ Box<dyn Surface>              ▲ GridEvent
//!        ▼                               │
//! ┌──────────────┐   render / refresh   ┌──────────────┐
//! │ GridContainer│◄─────────────────────│  Scheduler   │
//! └──────────────┘                      └──────────────┘
//! ```
//!
//! [`memory::MemoryHost`] is a complete in-process implementation used by the
//! demo and the tests.

pub mod events;
pub mod memory;

use std::fmt::Debug;
use std::sync::Weak;

pub use events::{ClickEvent, CloseEvent, DragEvent, GridEvent, MoveEvent};

/// Width of one grid row. Size-driven surfaces are always whole rows.
pub const ROW_WIDTH: usize = 9;

/// Exclusive upper bound for size-driven surfaces.
pub const MAX_SIZE: usize = 54;

/// Content that can be placed in a slot
///
/// Hosts define what an "item" is. The runtime only needs to copy it,
/// compare it, and recognise the empty sentinel.
pub trait Content: Clone + PartialEq + Debug + Send + Sync + 'static {
    /// The "nothing here" value
    fn empty() -> Self;

    /// Whether this value is the empty sentinel
    fn is_empty(&self) -> bool;
}

impl Content for String {
    fn empty() -> Self {
        String::new()
    }

    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

/// Identity of a display surface, compared by value in events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

/// Identity of a viewer (the player a surface is shown to)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewerId(pub String);

impl ViewerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for ViewerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle returned by [`Host::attach`], used to detach later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host-defined fixed layouts, used instead of an explicit size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// 3x3 dispenser grid
    Dispenser,
    /// 3x3 dropper grid
    Dropper,
    /// Five slots in a row
    Hopper,
    /// Crafting grid plus result slot
    Workbench,
    /// Input, fuel, result
    Furnace,
    /// Two inputs and a result
    Anvil,
    /// Three bottles, ingredient, fuel
    Brewing,
    /// Item and lapis
    Enchanting,
    /// Single payment slot
    Beacon,
}

impl LayoutKind {
    /// Number of slots a surface of this kind exposes
    pub fn capacity(self) -> usize {
        match self {
            Self::Dispenser | Self::Dropper => 9,
            Self::Hopper | Self::Brewing => 5,
            Self::Workbench => 10,
            Self::Furnace | Self::Anvil => 3,
            Self::Enchanting => 2,
            Self::Beacon => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dispenser => "dispenser",
            Self::Dropper => "dropper",
            Self::Hopper => "hopper",
            Self::Workbench => "workbench",
            Self::Furnace => "furnace",
            Self::Anvil => "anvil",
            Self::Brewing => "brewing",
            Self::Enchanting => "enchanting",
            Self::Beacon => "beacon",
        }
    }
}

/// How a surface should be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLayout {
    /// A chest-like grid of `n` slots (whole rows)
    Sized(usize),
    /// One of the host's fixed layouts
    Kind(LayoutKind),
}

impl SurfaceLayout {
    /// Slot capacity of a surface created from this layout
    pub fn capacity(self) -> usize {
        match self {
            Self::Sized(size) => size,
            Self::Kind(kind) => kind.capacity(),
        }
    }
}

/// A materialized display surface
///
/// Owned by exactly one container. Writes outside `0..size()` are the
/// caller's bug; the container checks bounds before calling `set`.
pub trait Surface<C: Content>: Send {
    fn id(&self) -> SurfaceId;

    /// Number of slots
    fn size(&self) -> usize;

    /// Remove all content
    fn clear(&mut self);

    fn set(&mut self, slot: usize, content: C);

    /// Current content at `slot`, `None` when out of range
    fn get(&self, slot: usize) -> Option<C>;
}

/// Receives interaction events from the host's event pump
pub trait EventListener<C: Content>: Send + Sync {
    /// Handle one event. The listener may flip the event's `cancelled` flag.
    fn on_event(&self, event: &mut GridEvent<C>);
}

/// The host application
///
/// Listeners are held weakly: dropping a container without stopping it
/// never keeps it alive inside the host.
pub trait Host<C: Content>: Send + Sync {
    fn create_surface(&self, layout: SurfaceLayout, title: &str) -> Box<dyn Surface<C>>;

    /// Present `surface` to `viewer`
    fn open(&self, viewer: &ViewerId, surface: SurfaceId);

    fn attach(&self, listener: Weak<dyn EventListener<C>>) -> ListenerId;

    fn detach(&self, listener: ListenerId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_capacity() {
        assert_eq!(SurfaceLayout::Sized(27).capacity(), 27);
        assert_eq!(SurfaceLayout::Kind(LayoutKind::Workbench).capacity(), 10);
        assert_eq!(SurfaceLayout::Kind(LayoutKind::Beacon).capacity(), 1);
    }

    #[test]
    fn test_string_content_sentinel() {
        assert!(Content::is_empty(&String::empty()));
        assert!(!Content::is_empty(&"stone".to_string()));
    }
}
