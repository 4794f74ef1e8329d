//! In-process host
//!
//! `MemoryHost` keeps surfaces as plain vectors and dispatches events
//! synchronously to attached listeners. It stands in for a game server in the
//! demo and in tests, and doubles as a reference for writing a real adapter.

use super::{
    ClickEvent, CloseEvent, Content, DragEvent, EventListener, GridEvent, Host, ListenerId,
    MoveEvent, Surface, SurfaceId, SurfaceLayout, ViewerId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Backing storage of one surface, shared between the host and its handle
#[derive(Debug)]
struct SurfaceRecord<C> {
    title: String,
    slots: Vec<C>,
}

type SurfaceTable<C> = Arc<Mutex<HashMap<SurfaceId, SurfaceRecord<C>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Surface handle handed to a container
///
/// Dropping the handle destroys the surface on the host side.
pub struct MemorySurface<C: Content> {
    id: SurfaceId,
    size: usize,
    table: SurfaceTable<C>,
}

impl<C: Content> Surface<C> for MemorySurface<C> {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn size(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        if let Some(record) = lock(&self.table).get_mut(&self.id) {
            record.slots.iter_mut().for_each(|slot| *slot = C::empty());
        }
    }

    fn set(&mut self, slot: usize, content: C) {
        if let Some(target) = lock(&self.table)
            .get_mut(&self.id)
            .and_then(|record| record.slots.get_mut(slot))
        {
            *target = content;
        }
    }

    fn get(&self, slot: usize) -> Option<C> {
        lock(&self.table)
            .get(&self.id)
            .and_then(|record| record.slots.get(slot).cloned())
    }
}

impl<C: Content> Drop for MemorySurface<C> {
    fn drop(&mut self) {
        lock(&self.table).remove(&self.id);
    }
}

/// A complete in-memory host
pub struct MemoryHost<C: Content> {
    surfaces: SurfaceTable<C>,
    views: Mutex<HashMap<ViewerId, SurfaceId>>,
    listeners: Mutex<Vec<(ListenerId, Weak<dyn EventListener<C>>)>>,
    next_surface: AtomicU64,
    next_listener: AtomicU64,
    created: AtomicUsize,
    opened: AtomicUsize,
}

impl<C: Content> MemoryHost<C> {
    pub fn new() -> Self {
        Self {
            surfaces: Arc::new(Mutex::new(HashMap::new())),
            views: Mutex::new(HashMap::new()),
            listeners: Mutex::new(Vec::new()),
            next_surface: AtomicU64::new(1),
            next_listener: AtomicU64::new(1),
            created: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
        }
    }

    /// Deliver an event to every live listener, returning it with the final
    /// cancellation state
    ///
    /// Listeners are snapshotted first so a listener may detach itself (or
    /// others) while handling the event.
    pub fn dispatch(&self, mut event: GridEvent<C>) -> GridEvent<C> {
        let listeners: Vec<Arc<dyn EventListener<C>>> = {
            let mut guard = lock(&self.listeners);
            guard.retain(|(_, weak)| weak.strong_count() > 0);
            guard.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };
        tracing::trace!(
            "Dispatching {} event to {} listener(s)",
            event.kind(),
            listeners.len()
        );
        for listener in listeners {
            listener.on_event(&mut event);
        }
        event
    }

    /// Surface currently shown to `viewer`
    pub fn open_surface(&self, viewer: &ViewerId) -> Option<SurfaceId> {
        lock(&self.views).get(viewer).copied()
    }

    /// Snapshot of a surface's slots, `None` once the surface is destroyed
    pub fn contents(&self, surface: SurfaceId) -> Option<Vec<C>> {
        lock(&self.surfaces)
            .get(&surface)
            .map(|record| record.slots.clone())
    }

    pub fn content_at(&self, surface: SurfaceId, slot: usize) -> Option<C> {
        lock(&self.surfaces)
            .get(&surface)
            .and_then(|record| record.slots.get(slot).cloned())
    }

    pub fn title(&self, surface: SurfaceId) -> Option<String> {
        lock(&self.surfaces)
            .get(&surface)
            .map(|record| record.title.clone())
    }

    /// Number of surfaces alive right now
    pub fn surface_count(&self) -> usize {
        lock(&self.surfaces).len()
    }

    /// Total surfaces ever created
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Total `open` calls
    pub fn opened_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    /// Number of attached listeners that are still alive
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Viewer simulation
    // ─────────────────────────────────────────────────────────────────────────

    /// Viewer clicks `slot` of the surface they have open
    ///
    /// Returns `None` when the viewer has nothing open.
    pub fn click(&self, viewer: &ViewerId, slot: usize) -> Option<ClickEvent<C>> {
        let surface = self.open_surface(viewer)?;
        let current = self.content_at(surface, slot);
        let event = GridEvent::Click(ClickEvent {
            viewer: viewer.clone(),
            top: Some(surface),
            clicked: Some(surface),
            slot,
            current,
            cancelled: false,
        });
        match self.dispatch(event) {
            GridEvent::Click(click) => Some(click),
            _ => None,
        }
    }

    /// Viewer places `content` into `slot` by hand, bypassing every listener
    pub fn place(&self, viewer: &ViewerId, slot: usize, content: C) -> bool {
        let Some(surface) = self.open_surface(viewer) else {
            return false;
        };
        let mut surfaces = lock(&self.surfaces);
        match surfaces
            .get_mut(&surface)
            .and_then(|record| record.slots.get_mut(slot))
        {
            Some(target) => {
                *target = content;
                true
            }
            None => false,
        }
    }

    /// Viewer drags across `slots` of the surface they have open
    pub fn drag(&self, viewer: &ViewerId, slots: Vec<usize>) -> Option<DragEvent> {
        let surface = self.open_surface(viewer)?;
        let event = GridEvent::Drag(DragEvent {
            viewer: viewer.clone(),
            surface,
            raw_slots: slots.clone(),
            slots,
            cancelled: false,
        });
        match self.dispatch(event) {
            GridEvent::Drag(drag) => Some(drag),
            _ => None,
        }
    }

    /// Something (a hopper, another plugin) moves content between surfaces
    pub fn transfer(
        &self,
        source: SurfaceId,
        initiator: SurfaceId,
        destination: SurfaceId,
    ) -> MoveEvent {
        let event = GridEvent::Move(MoveEvent {
            source,
            initiator,
            destination,
            cancelled: false,
        });
        match self.dispatch(event) {
            GridEvent::Move(moved) => moved,
            // dispatch never changes the variant
            _ => MoveEvent {
                source,
                initiator,
                destination,
                cancelled: false,
            },
        }
    }

    /// Viewer closes whatever they have open
    pub fn close(&self, viewer: &ViewerId) -> bool {
        let Some(surface) = lock(&self.views).remove(viewer) else {
            return false;
        };
        self.dispatch(GridEvent::Close(CloseEvent {
            viewer: viewer.clone(),
            top: surface,
            surface,
            has_holder: false,
        }));
        true
    }
}

impl<C: Content> Default for MemoryHost<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Content> Host<C> for MemoryHost<C> {
    fn create_surface(&self, layout: SurfaceLayout, title: &str) -> Box<dyn Surface<C>> {
        let id = SurfaceId(self.next_surface.fetch_add(1, Ordering::Relaxed));
        let size = layout.capacity();
        lock(&self.surfaces).insert(
            id,
            SurfaceRecord {
                title: title.to_string(),
                slots: vec![C::empty(); size],
            },
        );
        self.created.fetch_add(1, Ordering::Relaxed);
        tracing::trace!("Created surface {:?} ({:?}, {} slots)", id, layout, size);
        Box::new(MemorySurface {
            id,
            size,
            table: Arc::clone(&self.surfaces),
        })
    }

    fn open(&self, viewer: &ViewerId, surface: SurfaceId) {
        lock(&self.views).insert(viewer.clone(), surface);
        self.opened.fetch_add(1, Ordering::Relaxed);
    }

    fn attach(&self, listener: Weak<dyn EventListener<C>>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn detach(&self, listener: ListenerId) {
        lock(&self.listeners).retain(|(id, _)| *id != listener);
    }
}
