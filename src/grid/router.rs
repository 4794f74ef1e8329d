// Event routing for an open container
//
// The host delivers every interaction to every attached listener; each
// handler first decides whether the event targets this container's surface
// and ignores it otherwise. User callbacks run with the grid unlocked so they
// may call back into the container.

use super::cell::{Cell, CellSpec};
use super::container::Shared;
use super::isolate;
use crate::host::{
    ClickEvent, CloseEvent, Content, DragEvent, EventListener, GridEvent, MoveEvent,
};

impl<C: Content> EventListener<C> for Shared<C> {
    fn on_event(&self, event: &mut GridEvent<C>) {
        match event {
            GridEvent::Close(close) => self.route_close(close),
            GridEvent::Click(click) => self.route_click(click),
            GridEvent::Drag(drag) => self.route_drag(drag),
            GridEvent::Move(moved) => self.route_move(moved),
        }
    }
}

impl<C: Content> Shared<C> {
    fn route_close(&self, event: &CloseEvent) {
        let handler = {
            let grid = self.lock();
            let Some(mine) = grid.surface_id() else {
                return;
            };
            let targeted = event.top == mine || (event.surface == mine && !event.has_holder);
            if !targeted {
                return;
            }
            grid.on_close.clone()
        };

        tracing::debug!("Grid #{} closed by {}", self.id, event.viewer);
        if let Some(handler) = handler {
            isolate("close", self.id, || handler(event));
        }
        self.stop();
    }

    fn route_click(&self, event: &mut ClickEvent<C>) {
        let container_handler = {
            let grid = self.lock();
            let Some(mine) = grid.surface_id() else {
                return;
            };
            if event.top.is_none() {
                return;
            }
            if event.top == Some(mine) {
                grid.on_click.clone()
            } else {
                None
            }
        };
        if let Some(handler) = container_handler {
            isolate("click", self.id, || handler(&mut *event));
        }

        let cell_handler = {
            let mut grid = self.lock();
            // the container handler may have stopped us
            let Some(mine) = grid.surface_id() else {
                return;
            };
            if event.clicked != Some(mine) {
                return;
            }

            event.cancelled = grid.is_interaction_cancelled();
            let slot = event.slot;
            let owner = grid
                .cell(slot)
                .map(|cell| (cell.is_cancelled(), cell.on_click().cloned()));
            match owner {
                Some((cancelled, handler)) => {
                    event.cancelled = cancelled;
                    handler.filter(|_| event.has_content())
                }
                None => {
                    // something outside the runtime changed this slot
                    let shown = grid
                        .surface
                        .as_ref()
                        .and_then(|surface| surface.get(slot))
                        .filter(|content| !content.is_empty());
                    match shown {
                        Some(content) => {
                            tracing::trace!("Grid #{}: adopting slot {}", self.id, slot);
                            let spec = CellSpec::fixed(content).cancelled(false);
                            grid.insert_cell(Cell::new(slot, spec));
                        }
                        None => {
                            grid.clear_slot(slot);
                        }
                    }
                    None
                }
            }
        };
        if let Some(handler) = cell_handler {
            isolate("cell click", self.id, || handler(&mut *event));
        }
    }

    fn route_drag(&self, event: &mut DragEvent) {
        let grid = self.lock();
        if grid.surface_id() != Some(event.surface) {
            return;
        }
        let protected = grid
            .cells()
            .any(|cell| cell.is_cancelled() && event.touches(cell.slot()));
        event.cancelled = event.cancelled || protected;
    }

    fn route_move(&self, event: &mut MoveEvent) {
        let grid = self.lock();
        let Some(mine) = grid.surface_id() else {
            return;
        };
        // any side counts: a move initiated elsewhere that only lands here
        // is governed too, not only moves whose source is this grid
        if event.source == mine || event.initiator == mine || event.destination == mine {
            event.cancelled = grid.is_interaction_cancelled();
        }
    }
}
