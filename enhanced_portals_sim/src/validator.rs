// Post-construction structure validation.
//
// Re-walks a freshly built region and requires every connected portal cell
// to be fully framed (four frame neighbours in the structure's plane, no
// blocking neighbour). Forgiveness chances only exist while a build grows;
// a finished structure with any gap left in it is invalid.
//
// Mirrors trust the authoritative side and always validate.

use crate::config::PortalConfig;
use crate::frame::classify_neighbors;
use crate::types::{GridLocation, Orientation};
use crate::world::GridAccessor;
use std::collections::{BTreeSet, VecDeque};

/// Check that the portal connected to `seed` is fully framed in
/// `orientation`.
pub fn validate<G: GridAccessor + ?Sized>(
    grid: &G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
) -> bool {
    if !grid.is_authoritative() {
        return true;
    }

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if grid.block(current) != config.portal_block || !visited.insert(current) {
            continue;
        }
        if !classify_neighbors(grid, config, current, orientation).is_fully_framed() {
            return false;
        }
        for dir in orientation.growth_directions() {
            queue.push_back(current.offset(dir));
        }
    }
    true
}
