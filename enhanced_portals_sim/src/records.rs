// Typed records attached to individual grid cells.
//
// The host grid stores at most one `BlockRecord` per cell. A record exists
// only while its host block does: `GridAccessor::set_block` and
// `set_empty` drop whatever record the cell held. The engine reads and writes
// the in-memory fields; persistence and wire encoding are serde-derived and
// owned by the host (see `sync.rs` for replication).
//
// - `PortalCell`: display texture plus an optional back-reference to the
//   modifier that created the structure.
// - `ModifierRecord`: the modifier's configured texture, its active face,
//   and the ids of installed upgrade modules (see `module.rs`).
// - `PartRecord`: a structural part's link to its controller. The resolved
//   controller is cached but never persisted; see `linkage.rs` for the
//   state machine that maintains it.
// - `ControllerRecord`: collects signals raised by parts for the external
//   controller logic to act on.

use crate::types::{BlockPos, Direction, DisplayTexture};
use serde::{Deserialize, Serialize};

/// Per-cell record of a portal block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalCell {
    pub texture: DisplayTexture,
    /// Position of the owning modifier, always in the same world as this cell.
    pub parent_modifier: Option<BlockPos>,
}

impl PortalCell {
    pub fn new(texture: DisplayTexture) -> Self {
        Self {
            texture,
            parent_modifier: None,
        }
    }
}

/// Record of a portal modifier block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub texture: DisplayTexture,
    /// The active face. Portals driven by this modifier are seeded on the
    /// neighbour in this direction.
    pub facing: Direction,
    /// Installed upgrade module ids, in installation order.
    #[serde(default)]
    pub upgrades: Vec<String>,
}

impl ModifierRecord {
    pub fn new(texture: DisplayTexture, facing: Direction) -> Self {
        Self {
            texture,
            facing,
            upgrades: Vec::new(),
        }
    }
}

/// Link from a structural part to its controller.
///
/// `controller` is the persisted coordinate. `cached_controller` memoizes a
/// successful lookup and is only ever `None` or equal to `controller`; every
/// write to `controller` goes through `set_controller()` which clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    controller: Option<BlockPos>,
    #[serde(skip)]
    cached_controller: Option<BlockPos>,
}

impl PartRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self) -> Option<BlockPos> {
        self.controller
    }

    pub fn cached_controller(&self) -> Option<BlockPos> {
        self.cached_controller
    }

    /// Store a new controller coordinate (or clear it) and drop the cache.
    pub fn set_controller(&mut self, controller: Option<BlockPos>) {
        self.controller = controller;
        self.cached_controller = None;
    }

    /// Remember that the stored coordinate resolved to a controller.
    pub(crate) fn cache_resolved(&mut self) {
        self.cached_controller = self.controller;
    }
}

/// A request raised by a part for its controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerSignal {
    /// A part of the structure was broken; the connection degrades.
    TerminateConnection,
    /// An unexpected part joined the structure; it must be rebuilt.
    Deconstruct,
}

/// Record of a portal controller. Teardown policy lives outside the engine;
/// the engine only queues signals here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerRecord {
    #[serde(skip)]
    pending_signals: Vec<ControllerSignal>,
}

impl ControllerRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&mut self, signal: ControllerSignal) {
        self.pending_signals.push(signal);
    }

    pub fn pending_signals(&self) -> &[ControllerSignal] {
        &self.pending_signals
    }

    /// Hand the queued signals to the controller logic.
    pub fn take_signals(&mut self) -> Vec<ControllerSignal> {
        std::mem::take(&mut self.pending_signals)
    }
}

/// The record attached to a grid cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRecord {
    Portal(PortalCell),
    Modifier(ModifierRecord),
    Part(PartRecord),
    Controller(ControllerRecord),
}

impl BlockRecord {
    pub fn as_portal(&self) -> Option<&PortalCell> {
        match self {
            BlockRecord::Portal(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_portal_mut(&mut self) -> Option<&mut PortalCell> {
        match self {
            BlockRecord::Portal(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_modifier(&self) -> Option<&ModifierRecord> {
        match self {
            BlockRecord::Modifier(modifier) => Some(modifier),
            _ => None,
        }
    }

    pub fn as_modifier_mut(&mut self) -> Option<&mut ModifierRecord> {
        match self {
            BlockRecord::Modifier(modifier) => Some(modifier),
            _ => None,
        }
    }

    pub fn as_part(&self) -> Option<&PartRecord> {
        match self {
            BlockRecord::Part(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_part_mut(&mut self) -> Option<&mut PartRecord> {
        match self {
            BlockRecord::Part(part) => Some(part),
            _ => None,
        }
    }

    pub fn as_controller_mut(&mut self) -> Option<&mut ControllerRecord> {
        match self {
            BlockRecord::Controller(controller) => Some(controller),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_controller_invalidates_cache() {
        let mut part = PartRecord::new();
        part.set_controller(Some(BlockPos::new(1, 2, 3)));
        part.cache_resolved();
        assert_eq!(part.cached_controller(), Some(BlockPos::new(1, 2, 3)));

        part.set_controller(Some(BlockPos::new(4, 5, 6)));
        assert_eq!(part.cached_controller(), None);
        assert_eq!(part.controller(), Some(BlockPos::new(4, 5, 6)));
    }

    #[test]
    fn cache_never_diverges_from_stored_coordinate() {
        let mut part = PartRecord::new();
        part.cache_resolved();
        assert_eq!(part.cached_controller(), None);

        part.set_controller(Some(BlockPos::new(0, 70, 0)));
        part.cache_resolved();
        part.set_controller(None);
        assert_eq!(part.controller(), None);
        assert_eq!(part.cached_controller(), None);
    }

    #[test]
    fn part_persistence_skips_cache() {
        let mut part = PartRecord::new();
        part.set_controller(Some(BlockPos::new(-8, 12, 40)));
        part.cache_resolved();

        let bytes = bincode::serialize(&BlockRecord::Part(part)).unwrap();
        let restored: BlockRecord = bincode::deserialize(&bytes).unwrap();
        let restored = restored.as_part().unwrap();
        assert_eq!(restored.controller(), Some(BlockPos::new(-8, 12, 40)));
        assert_eq!(restored.cached_controller(), None);
    }

    #[test]
    fn controller_signals_drain_once() {
        let mut controller = ControllerRecord::new();
        controller.signal(ControllerSignal::TerminateConnection);
        controller.signal(ControllerSignal::Deconstruct);
        assert_eq!(
            controller.take_signals(),
            vec![
                ControllerSignal::TerminateConnection,
                ControllerSignal::Deconstruct
            ]
        );
        assert!(controller.pending_signals().is_empty());
    }

    #[test]
    fn modifier_without_upgrades_field_loads() {
        let json = r#"{"texture":"Red","facing":"North"}"#;
        let modifier: ModifierRecord = serde_json::from_str(json).unwrap();
        assert_eq!(modifier.texture, DisplayTexture::Red);
        assert_eq!(modifier.facing, Direction::North);
        assert!(modifier.upgrades.is_empty());
    }
}
