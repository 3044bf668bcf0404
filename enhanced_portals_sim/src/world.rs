// Grid access seam and the in-memory reference grid.
//
// The host runtime owns the world: block storage, metadata, attached records
// and neighbour notification. The engine talks to it only through the
// `GridAccessor` trait, so every structure operation is a plain function of
// `(grid, config)`. Hosts implement the trait as a thin adapter over their
// world API.
//
// `VoxelGrid` is a sparse implementation backed by a `BTreeMap` keyed by
// `GridLocation`. Cells that were never written read as `BlockId::AIR` with
// metadata 0 and no record, and writing a cell back to that state removes
// its entry, so a fully rolled-back region compares equal to the original.
// It is used by the unit tests, the benches and the replication harness.
// A grid is either authoritative (`VoxelGrid::server()`) or a mirror
// (`VoxelGrid::client()`); construction refuses to run on mirrors.
//
// See also: `records.rs` for `BlockRecord`, `types.rs` for `GridLocation`.
//
// **Critical constraint: single-threaded access.** The engine assumes no
// other structure operation interleaves on the same grid while one runs.

use crate::records::BlockRecord;
use crate::types::{BlockId, GridLocation, WorldId};
use std::collections::{BTreeMap, BTreeSet};

/// Flags passed alongside a metadata write, mirroring the host's
/// notification bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotifyFlags(pub u8);

impl NotifyFlags {
    pub const NONE: NotifyFlags = NotifyFlags(0);
    /// Notify neighbouring blocks of the change.
    pub const BLOCK_UPDATE: NotifyFlags = NotifyFlags(1);
    /// Send the change to observing clients.
    pub const SEND_TO_CLIENTS: NotifyFlags = NotifyFlags(2);
}

/// Read/write access to the host's 3D block grid.
pub trait GridAccessor {
    /// Block type at `loc`.
    fn block(&self, loc: GridLocation) -> BlockId;

    /// Metadata byte at `loc`.
    fn meta(&self, loc: GridLocation) -> u8;

    /// Replace the block at `loc`. Resets metadata and drops the record.
    fn set_block(&mut self, loc: GridLocation, block: BlockId);

    /// Revert `loc` to the empty block.
    fn set_empty(&mut self, loc: GridLocation) {
        self.set_block(loc, BlockId::AIR);
    }

    fn set_meta(&mut self, loc: GridLocation, meta: u8, flags: NotifyFlags);

    fn record(&self, loc: GridLocation) -> Option<&BlockRecord>;

    fn record_mut(&mut self, loc: GridLocation) -> Option<&mut BlockRecord>;

    /// Attach a record to the block currently at `loc`. Ignored for empty
    /// cells.
    fn set_record(&mut self, loc: GridLocation, record: BlockRecord);

    /// Whether this grid is the simulation authority (server side).
    fn is_authoritative(&self) -> bool;

    /// Flag the record at `loc` as needing persistence.
    fn mark_dirty(&mut self, _loc: GridLocation) {}
}

/// One stored cell of a `VoxelGrid`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GridCell {
    pub block: BlockId,
    pub meta: u8,
    pub record: Option<BlockRecord>,
}

impl GridCell {
    fn is_default(&self) -> bool {
        self.block == BlockId::AIR && self.meta == 0 && self.record.is_none()
    }
}

/// Sparse in-memory grid.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    cells: BTreeMap<GridLocation, GridCell>,
    authoritative: bool,
    dirty: BTreeSet<GridLocation>,
}

impl VoxelGrid {
    /// An authoritative grid.
    pub fn server() -> Self {
        Self {
            authoritative: true,
            ..Self::default()
        }
    }

    /// A mirror grid that only applies replicated state.
    pub fn client() -> Self {
        Self::default()
    }

    pub fn cell(&self, loc: GridLocation) -> Option<&GridCell> {
        self.cells.get(&loc)
    }

    /// Number of non-default cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All stored cells in location order.
    pub fn cells(&self) -> impl Iterator<Item = (&GridLocation, &GridCell)> + '_ {
        self.cells.iter()
    }

    /// Locations currently holding `block`, in location order.
    pub fn locations_of(&self, block: BlockId) -> Vec<GridLocation> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.block == block)
            .map(|(&loc, _)| loc)
            .collect()
    }

    /// Copy of every cell in the inclusive box `min..=max` of `world`, in
    /// y-outer, z-mid, x-inner order. Unset cells appear as `None`.
    pub fn snapshot(
        &self,
        world: WorldId,
        min: (i32, i32, i32),
        max: (i32, i32, i32),
    ) -> Vec<Option<GridCell>> {
        let mut out = Vec::new();
        for y in min.1..=max.1 {
            for z in min.2..=max.2 {
                for x in min.0..=max.0 {
                    let loc = GridLocation::new(world, x, y, z);
                    out.push(self.cells.get(&loc).cloned());
                }
            }
        }
        out
    }

    pub fn dirty_locations(&self) -> &BTreeSet<GridLocation> {
        &self.dirty
    }

    fn drop_if_default(&mut self, loc: GridLocation) {
        if self.cells.get(&loc).is_some_and(GridCell::is_default) {
            self.cells.remove(&loc);
        }
    }
}

impl GridAccessor for VoxelGrid {
    fn block(&self, loc: GridLocation) -> BlockId {
        self.cells.get(&loc).map_or(BlockId::AIR, |cell| cell.block)
    }

    fn meta(&self, loc: GridLocation) -> u8 {
        self.cells.get(&loc).map_or(0, |cell| cell.meta)
    }

    fn set_block(&mut self, loc: GridLocation, block: BlockId) {
        if block == BlockId::AIR {
            self.cells.remove(&loc);
            self.dirty.remove(&loc);
            return;
        }
        self.cells.insert(
            loc,
            GridCell {
                block,
                meta: 0,
                record: None,
            },
        );
    }

    fn set_meta(&mut self, loc: GridLocation, meta: u8, _flags: NotifyFlags) {
        self.cells.entry(loc).or_default().meta = meta;
        self.drop_if_default(loc);
    }

    fn record(&self, loc: GridLocation) -> Option<&BlockRecord> {
        self.cells.get(&loc).and_then(|cell| cell.record.as_ref())
    }

    fn record_mut(&mut self, loc: GridLocation) -> Option<&mut BlockRecord> {
        self.cells.get_mut(&loc).and_then(|cell| cell.record.as_mut())
    }

    fn set_record(&mut self, loc: GridLocation, record: BlockRecord) {
        if let Some(cell) = self.cells.get_mut(&loc) {
            cell.record = Some(record);
        }
    }

    fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    fn mark_dirty(&mut self, loc: GridLocation) {
        if self.cells.contains_key(&loc) {
            self.dirty.insert(loc);
        }
    }
}
