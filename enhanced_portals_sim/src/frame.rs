// Frame classification and orientation detection.
//
// `classify_neighbors()` scores a candidate cell for one portal plane: it
// counts how many of the four in-plane neighbours are frame (portal blocks
// included) and reports `blocked` as soon as one neighbour is neither frame
// nor growth-permeable. Blocked always wins over the side count at the call
// sites: a structure may not touch a block it can neither lean on nor
// replace.
//
// `detect_orientation()` looks at the direct axis neighbours of a cell and
// returns the first plane whose four neighbours are all frame, testing
// X-aligned, then Z-aligned, then horizontal.

use crate::config::PortalConfig;
use crate::types::{Direction, GridLocation, Orientation};
use crate::world::GridAccessor;

/// Frame adjacency of one cell in one plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborScan {
    /// Number of in-plane neighbours that are frame, in `0..=4`.
    pub side_count: u8,
    /// A neighbour can neither border nor be replaced by the portal.
    pub blocked: bool,
}

impl NeighborScan {
    pub fn is_fully_framed(self) -> bool {
        !self.blocked && self.side_count == 4
    }
}

/// Score `loc` for growth in `orientation`.
pub fn classify_neighbors<G: GridAccessor + ?Sized>(
    grid: &G,
    config: &PortalConfig,
    loc: GridLocation,
    orientation: Orientation,
) -> NeighborScan {
    let mut side_count = 0;
    for dir in orientation.frame_directions() {
        let block = grid.block(loc.offset(dir));
        if config.is_frame_block(block, true) {
            side_count += 1;
        } else if !config.is_growth_permeable(block) {
            return NeighborScan {
                side_count,
                blocked: true,
            };
        }
    }
    NeighborScan {
        side_count,
        blocked: false,
    }
}

/// Determine the plane of the portal at `loc` from its surrounding frame.
pub fn detect_orientation<G: GridAccessor + ?Sized>(
    grid: &G,
    config: &PortalConfig,
    loc: GridLocation,
) -> Option<Orientation> {
    let framed = |dirs: [Direction; 4]| {
        dirs.iter()
            .all(|&dir| config.is_frame_block(grid.block(loc.offset(dir)), true))
    };

    if framed([Direction::West, Direction::East, Direction::Up, Direction::Down]) {
        Some(Orientation::XAligned)
    } else if framed([Direction::North, Direction::South, Direction::Up, Direction::Down]) {
        Some(Orientation::ZAligned)
    } else if framed([Direction::West, Direction::East, Direction::South, Direction::North]) {
        Some(Orientation::Horizontal)
    } else {
        None
    }
}
