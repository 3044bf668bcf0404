// Portal removal.
//
// Two ways to clear portal cells back to empty:
//
// - `remove_cells()`: drain an explicit list. Used to roll back a failed
//   build, where the list is exactly the cells that build converted.
// - `remove_portal()`: breadth-first flood from a single seed over
//   connected portal cells, following either one plane or all six
//   directions (`Spread::AllDirections`). Used for deliberate teardown when
//   the caller does not know the membership.
//
// `remove_around()` tries the six neighbours of a reference block (up,
// down, north, south, east, west) and floods from each one that still holds
// a portal; `remove_from_modifier()` floods from a modifier's active face
// and tells the modifier's upgrades about it.

use crate::config::PortalConfig;
use crate::module::ModuleRegistry;
use crate::records::BlockRecord;
use crate::types::{Direction, GridLocation, Spread};
use crate::world::GridAccessor;
use std::collections::{BTreeSet, VecDeque};

/// Neighbour order used by the around-a-block entry points.
pub const AROUND_BLOCK_ORDER: [Direction; 6] = [
    Direction::Up,
    Direction::Down,
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
];

/// Revert every listed cell to empty, in order.
pub fn remove_cells<G: GridAccessor + ?Sized>(grid: &mut G, cells: &[GridLocation]) {
    for &loc in cells {
        grid.set_empty(loc);
    }
}

/// Clear the portal connected to `seed`. Returns the number of cells
/// removed; 0 if `seed` is not a portal cell.
pub fn remove_portal<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    spread: Spread,
) -> usize {
    if grid.block(seed) != config.portal_block {
        return 0;
    }

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    let mut removed = 0;
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) || grid.block(current) != config.portal_block {
            continue;
        }
        grid.set_empty(current);
        removed += 1;
        for &dir in spread.directions() {
            queue.push_back(current.offset(dir));
        }
    }

    log::debug!("removed {removed} portal cells from {seed}");
    removed
}

/// Clear every portal touching `reference` on any of its six faces.
pub fn remove_around<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    reference: GridLocation,
) -> usize {
    AROUND_BLOCK_ORDER
        .iter()
        .map(|&dir| remove_portal(grid, config, reference.offset(dir), Spread::AllDirections))
        .sum()
}

/// Clear the portal on the active face of the modifier at `modifier`.
/// Returns `None` if `modifier` does not hold a modifier record.
pub fn remove_from_modifier<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    modules: &mut ModuleRegistry,
    modifier: GridLocation,
) -> Option<usize> {
    let (facing, upgrades) = match grid.record(modifier) {
        Some(BlockRecord::Modifier(record)) => (record.facing, record.upgrades.clone()),
        _ => return None,
    };
    let removed = remove_portal(
        grid,
        config,
        modifier.offset(facing),
        Spread::AllDirections,
    );
    if removed > 0 {
        modules.notify_portal_removed(&upgrades, modifier);
    }
    Some(removed)
}
