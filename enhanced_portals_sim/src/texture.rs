// Texture flood updates over existing portals.
//
// `flood_update_texture()` recolours the portal connected to a seed. The
// fill key is the *old* texture: only cells currently showing `old` are
// changed, and the walk never passes through a cell showing anything else.
// A region that an earlier partial update already split stays split.
//
// The plane is re-detected from the seed's surroundings on every call; when
// no plane matches, the walk follows all six directions.
//
// Modifiers bordering the portal are updated in place when the caller asks
// for it (`update_modifiers`) and their texture matches `old`. They are
// never walked through.
//
// Replication: on the authoritative side each updated primary cell and
// each updated modifier is pushed to the `SyncQueue`. Other portal cells
// are left to the mirror's local re-derivation (see `sync.rs`).

use crate::config::{PRIMARY_CELL_META, PortalConfig};
use crate::frame::detect_orientation;
use crate::records::BlockRecord;
use crate::sync::SyncQueue;
use crate::types::{DisplayTexture, GridLocation, Spread};
use crate::world::GridAccessor;
use std::collections::{BTreeSet, VecDeque};

/// Recolour the portal at `seed` from `old` to `new`. Returns `false` and
/// changes nothing if `seed` is not a portal block, `old` is unset, or the
/// two textures are equal.
pub fn flood_update_texture<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    sync: &mut SyncQueue,
    seed: GridLocation,
    new: DisplayTexture,
    old: Option<DisplayTexture>,
    update_modifiers: bool,
) -> bool {
    if grid.block(seed) != config.portal_block {
        return false;
    }
    let Some(old) = old else {
        return false;
    };
    if new == old {
        return false;
    }

    let spread = Spread::from(detect_orientation(grid, config, seed));
    let authoritative = grid.is_authoritative();
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    let mut recoloured = 0usize;
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if !visited.insert(current) {
            continue;
        }
        let block = grid.block(current);

        if block == config.portal_block {
            let Some(cell) = grid
                .record_mut(current)
                .and_then(BlockRecord::as_portal_mut)
                .filter(|cell| cell.texture == old)
            else {
                continue;
            };
            cell.texture = new;
            recoloured += 1;
            grid.mark_dirty(current);
            if authoritative && grid.meta(current) == PRIMARY_CELL_META {
                sync.push_current(grid, current);
            }
            for &dir in spread.directions() {
                queue.push_back(current.offset(dir));
            }
        } else if update_modifiers && block == config.modifier_block {
            let Some(modifier) = grid
                .record_mut(current)
                .and_then(BlockRecord::as_modifier_mut)
                .filter(|modifier| modifier.texture == old)
            else {
                continue;
            };
            modifier.texture = new;
            grid.mark_dirty(current);
            if authoritative {
                sync.push_current(grid, current);
            }
        }
    }

    log::debug!("recoloured {recoloured} portal cells from {seed}: {old:?} -> {new:?}");
    true
}

/// Recolour the modifier at `modifier` (if `update_self`) and the portal on
/// its active face. The modifier's texture *before* this call is the fill
/// key. Returns the flood's result; `false` if `modifier` holds no modifier
/// record.
pub fn update_modifier_texture<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    sync: &mut SyncQueue,
    modifier: GridLocation,
    new: DisplayTexture,
    update_self: bool,
) -> bool {
    let Some(record) = grid
        .record_mut(modifier)
        .and_then(BlockRecord::as_modifier_mut)
    else {
        return false;
    };
    let old = record.texture;
    let facing = record.facing;

    if update_self {
        record.texture = new;
        grid.mark_dirty(modifier);
        if grid.is_authoritative() {
            sync.push_current(grid, modifier);
        }
    }

    flood_update_texture(
        grid,
        config,
        sync,
        modifier.offset(facing),
        new,
        Some(old),
        false,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::records::{ModifierRecord, PortalCell};
    use crate::types::{BlockId, Direction, Orientation, WorldId};
    use crate::world::VoxelGrid;

    const OBSIDIAN: BlockId = BlockId(49);

    fn at(x: i32, y: i32, z: i32) -> GridLocation {
        GridLocation::new(WorldId(0), x, y, z)
    }

    /// Framed 3x3 X-aligned portal of `texture`, primary cell at (0, 0, 0).
    /// The bottom frame block under (1, 0, 0) is a modifier facing up.
    fn built_portal(config: &PortalConfig, texture: DisplayTexture) -> VoxelGrid {
        let mut grid = VoxelGrid::server();
        for x in -1..=3 {
            for y in -1..=3 {
                if x == -1 || x == 3 || y == -1 || y == 3 {
                    grid.set_block(at(x, y, 0), OBSIDIAN);
                }
            }
        }
        let modifier = at(1, -1, 0);
        grid.set_block(modifier, config.modifier_block);
        grid.set_record(
            modifier,
            BlockRecord::Modifier(ModifierRecord::new(texture, Direction::Up)),
        );
        assert!(build(
            &mut grid,
            config,
            at(0, 0, 0),
            Orientation::XAligned,
            Some(texture),
            Some(modifier)
        ));
        grid
    }

    fn texture_at(grid: &VoxelGrid, loc: GridLocation) -> Option<DisplayTexture> {
        grid.record(loc).and_then(|record| match record {
            BlockRecord::Portal(cell) => Some(cell.texture),
            BlockRecord::Modifier(modifier) => Some(modifier.texture),
            _ => None,
        })
    }

    #[test]
    fn recolours_whole_region() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();

        assert!(flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(2, 2, 0),
            DisplayTexture::Green,
            Some(DisplayTexture::Blue),
            false
        ));
        for x in 0..3 {
            for y in 0..3 {
                assert_eq!(texture_at(&grid, at(x, y, 0)), Some(DisplayTexture::Green));
            }
        }
        // The modifier was not asked for.
        assert_eq!(texture_at(&grid, at(1, -1, 0)), Some(DisplayTexture::Blue));
    }

    #[test]
    fn diverged_cells_partition_the_update() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        for y in 0..3 {
            let cell = grid
                .record_mut(at(1, y, 0))
                .and_then(BlockRecord::as_portal_mut)
                .unwrap();
            cell.texture = DisplayTexture::Red;
        }
        let mut sync = SyncQueue::new();

        assert!(flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::Green,
            Some(DisplayTexture::Blue),
            false
        ));
        for y in 0..3 {
            assert_eq!(texture_at(&grid, at(0, y, 0)), Some(DisplayTexture::Green));
            assert_eq!(texture_at(&grid, at(1, y, 0)), Some(DisplayTexture::Red));
            // Beyond the red column: unreachable, untouched.
            assert_eq!(texture_at(&grid, at(2, y, 0)), Some(DisplayTexture::Blue));
        }
    }

    #[test]
    fn same_texture_is_rejected() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();
        let before: Vec<_> = grid.cells().map(|(l, c)| (*l, c.clone())).collect();

        assert!(!flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::Blue,
            Some(DisplayTexture::Blue),
            true
        ));
        let after: Vec<_> = grid.cells().map(|(l, c)| (*l, c.clone())).collect();
        assert_eq!(before, after);
        assert!(sync.is_empty());
    }

    #[test]
    fn rejects_unset_old_texture_and_non_portal_seed() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();

        assert!(!flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::Green,
            None,
            false
        ));
        assert!(!flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(-1, 0, 0),
            DisplayTexture::Green,
            Some(DisplayTexture::Blue),
            false
        ));
        assert_eq!(texture_at(&grid, at(0, 0, 0)), Some(DisplayTexture::Blue));
    }

    #[test]
    fn pushes_primary_cell_and_modifiers_only() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();

        assert!(flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(1, 1, 0),
            DisplayTexture::Green,
            Some(DisplayTexture::Blue),
            true
        ));
        let pushed: Vec<_> = sync.events().iter().map(|e| e.location).collect();
        assert_eq!(pushed.len(), 2);
        assert!(pushed.contains(&at(0, 0, 0)));
        assert!(pushed.contains(&at(1, -1, 0)));
        assert_eq!(texture_at(&grid, at(1, -1, 0)), Some(DisplayTexture::Green));
    }

    #[test]
    fn mirror_recolours_without_pushing() {
        let config = PortalConfig::default();
        let mut grid = VoxelGrid::client();
        grid.set_block(at(0, 0, 0), config.portal_block);
        grid.set_record(
            at(0, 0, 0),
            BlockRecord::Portal(PortalCell::new(DisplayTexture::Blue)),
        );
        let mut sync = SyncQueue::new();

        assert!(flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::Green,
            Some(DisplayTexture::Blue),
            true
        ));
        assert_eq!(texture_at(&grid, at(0, 0, 0)), Some(DisplayTexture::Green));
        assert!(sync.is_empty());
    }

    #[test]
    fn undetected_plane_spreads_everywhere() {
        // A loose line of portal blocks with no frame: no plane is
        // detected, yet every connected cell is recoloured.
        let config = PortalConfig::default();
        let mut grid = VoxelGrid::client();
        for loc in [at(0, 0, 0), at(0, 0, 1), at(0, 1, 1), at(1, 1, 1)] {
            grid.set_block(loc, config.portal_block);
            grid.set_record(loc, BlockRecord::Portal(PortalCell::new(DisplayTexture::Blue)));
        }
        let mut sync = SyncQueue::new();
        assert!(flood_update_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::White,
            Some(DisplayTexture::Blue),
            false
        ));
        assert_eq!(texture_at(&grid, at(1, 1, 1)), Some(DisplayTexture::White));
    }

    #[test]
    fn modifier_update_uses_previous_texture_as_key() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();
        let modifier = at(1, -1, 0);

        assert!(update_modifier_texture(
            &mut grid,
            &config,
            &mut sync,
            modifier,
            DisplayTexture::Yellow,
            true
        ));
        assert_eq!(texture_at(&grid, modifier), Some(DisplayTexture::Yellow));
        assert_eq!(texture_at(&grid, at(2, 2, 0)), Some(DisplayTexture::Yellow));
        let pushed: Vec<_> = sync.events().iter().map(|e| e.location).collect();
        assert_eq!(pushed, vec![modifier, at(0, 0, 0)]);
    }

    #[test]
    fn modifier_update_without_self_keeps_modifier() {
        let config = PortalConfig::default();
        let mut grid = built_portal(&config, DisplayTexture::Blue);
        let mut sync = SyncQueue::new();
        let modifier = at(1, -1, 0);

        assert!(update_modifier_texture(
            &mut grid,
            &config,
            &mut sync,
            modifier,
            DisplayTexture::Yellow,
            false
        ));
        assert_eq!(texture_at(&grid, modifier), Some(DisplayTexture::Blue));
        assert_eq!(texture_at(&grid, at(0, 2, 0)), Some(DisplayTexture::Yellow));
        assert!(!update_modifier_texture(
            &mut grid,
            &config,
            &mut sync,
            at(0, 0, 0),
            DisplayTexture::Yellow,
            true
        ));
    }
}
