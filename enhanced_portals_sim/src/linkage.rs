// Part-to-controller linkage.
//
// Each structural part stores the coordinate of its controller (same world)
// in a `PartRecord`. The link is a lookup key, not a reference. A populated
// cache answers directly; otherwise `resolve_controller()` checks that a
// controller record sits at the coordinate and only then memoizes it. The
// cache is dropped whenever the coordinate is written (`set_controller()`,
// persistence, replication), and a signal aimed at a controller that has
// since vanished is simply not delivered.
//
// States of a part:
//
//   Unlinked --set_controller(Some)--> Linked --set_controller(None)--> Unlinked
//
// Events raised on parts turn into signals queued on the controller record
// (`ControllerRecord::signal`), which the external controller logic drains:
// - a part breaking asks its controller to terminate its connection;
// - a part placed next to existing parts asks each neighbour's controller
//   to deconstruct the whole structure.
//
// See also: `records.rs` for `PartRecord` / `ControllerRecord`.

use crate::records::{BlockRecord, ControllerSignal};
use crate::sync::SyncQueue;
use crate::types::{BlockPos, Direction, GridLocation};
use crate::world::GridAccessor;

fn is_controller<G: GridAccessor + ?Sized>(grid: &G, loc: GridLocation) -> bool {
    matches!(grid.record(loc), Some(BlockRecord::Controller(_)))
}

/// Location of the controller the part at `part` is linked to. Without a
/// cached answer, `None` until a controller record sits at the coordinate.
pub fn resolve_controller<G: GridAccessor + ?Sized>(
    grid: &mut G,
    part: GridLocation,
) -> Option<GridLocation> {
    let record = grid.record(part)?.as_part()?;
    if let Some(cached) = record.cached_controller() {
        return Some(cached.in_world(part.world));
    }
    let target = record.controller()?.in_world(part.world);
    if !is_controller(grid, target) {
        return None;
    }
    if let Some(record) = grid.record_mut(part).and_then(BlockRecord::as_part_mut) {
        record.cache_resolved();
    }
    Some(target)
}

/// Link (or unlink, with `None`) the part at `part`. Returns `false` if
/// `part` holds no part record.
pub fn set_controller<G: GridAccessor + ?Sized>(
    grid: &mut G,
    sync: &mut SyncQueue,
    part: GridLocation,
    controller: Option<BlockPos>,
) -> bool {
    let Some(record) = grid.record_mut(part).and_then(BlockRecord::as_part_mut) else {
        return false;
    };
    record.set_controller(controller);
    grid.mark_dirty(part);
    if grid.is_authoritative() {
        sync.push_current(grid, part);
    }
    true
}

fn signal_controller<G: GridAccessor + ?Sized>(
    grid: &mut G,
    part: GridLocation,
    signal: ControllerSignal,
) -> Option<GridLocation> {
    let controller = resolve_controller(grid, part)?;
    grid.record_mut(controller)
        .and_then(BlockRecord::as_controller_mut)?
        .signal(signal);
    log::debug!("part at {part} signalled {signal:?} to controller at {controller}");
    Some(controller)
}

/// The part at `part` is being broken.
pub fn on_part_broken<G: GridAccessor + ?Sized>(
    grid: &mut G,
    part: GridLocation,
) -> Option<GridLocation> {
    signal_controller(grid, part, ControllerSignal::TerminateConnection)
}

/// Another part was placed next to the part at `part`.
pub fn on_neighbor_placed<G: GridAccessor + ?Sized>(
    grid: &mut G,
    part: GridLocation,
) -> Option<GridLocation> {
    signal_controller(grid, part, ControllerSignal::Deconstruct)
}

/// A part was placed at `placed`. Notifies every adjacent part and returns
/// the controllers that were signalled, in direction order.
pub fn on_part_placed<G: GridAccessor + ?Sized>(
    grid: &mut G,
    placed: GridLocation,
) -> Vec<GridLocation> {
    let mut signalled = Vec::new();
    for dir in Direction::ALL {
        let neighbor = placed.offset(dir);
        if !matches!(grid.record(neighbor), Some(BlockRecord::Part(_))) {
            continue;
        }
        if let Some(controller) = on_neighbor_placed(grid, neighbor) {
            signalled.push(controller);
        }
    }
    signalled
}
