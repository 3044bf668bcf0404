// Data-driven portal configuration.
//
// All tunable parameters of the structure engine live in `PortalConfig`,
// loaded from JSON by the host at startup and passed by reference into every
// operation. The engine never reads global settings, so two configs can
// drive two worlds side by side and tests can build exactly the config they
// need.
//
// - `frame_blocks`: block types that may border a portal. The modifier
//   block always counts as frame: a modifier sits in the border of the
//   portal it drives.
// - `growth_permeable_blocks`: block types a portal may grow into,
//   replacing them. Must include `BlockId::AIR` for portals to form in
//   empty space.
// - `max_portal_size`: cell limit per structure (0 = unlimited). A build
//   aborts as soon as it would process a cell while already holding this many.
// - `portal_block` / `modifier_block`: the host ids of the engine's own
//   block types.
//
// See also: `frame.rs` for how the block sets drive classification.

use crate::types::{BlockId, DisplayTexture};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Number of one-time +2 side bonuses a single build may spend to grow
/// across small gaps.
pub const FORGIVENESS_CHANCES: u32 = 10;

/// Metadata value stamped on the first cell of every structure.
pub const PRIMARY_CELL_META: u8 = 1;

/// Errors raised while loading a `PortalConfig`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read portal config: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed portal config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("portal block {0:?} cannot be growth-permeable")]
    PortalBlockPermeable(BlockId),

    #[error("portal and modifier blocks share id {0:?}")]
    BlockIdCollision(BlockId),
}

/// Engine configuration. Loaded from JSON, never mutated while operations
/// run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub frame_blocks: BTreeSet<BlockId>,
    pub growth_permeable_blocks: BTreeSet<BlockId>,
    pub max_portal_size: u32,
    /// Texture used when a build does not request one.
    pub default_texture: DisplayTexture,
    pub portal_block: BlockId,
    pub modifier_block: BlockId,
    /// Upgrade modules a single modifier can hold.
    pub modifier_upgrade_slots: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            // Obsidian.
            frame_blocks: [BlockId(49)].into_iter().collect(),
            // Air, flowing/still water and lava, tall grass, fire, snow layer.
            growth_permeable_blocks: [0, 8, 9, 10, 11, 31, 51, 78]
                .into_iter()
                .map(BlockId)
                .collect(),
            max_portal_size: 4096,
            default_texture: DisplayTexture::Purple,
            portal_block: BlockId(90),
            modifier_block: BlockId(1201),
            modifier_upgrade_slots: 9,
        }
    }
}

impl PortalConfig {
    /// Parse and validate a config from a JSON string. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject configs the engine cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.growth_permeable_blocks.contains(&self.portal_block) {
            return Err(ConfigError::PortalBlockPermeable(self.portal_block));
        }
        if self.portal_block == self.modifier_block {
            return Err(ConfigError::BlockIdCollision(self.portal_block));
        }
        Ok(())
    }

    /// Whether `block` may border a portal. With `include_self`, portal
    /// blocks count as frame too.
    pub fn is_frame_block(&self, block: BlockId, include_self: bool) -> bool {
        if include_self && block == self.portal_block {
            return true;
        }
        block == self.modifier_block || self.frame_blocks.contains(&block)
    }

    /// Whether a portal may grow into (and replace) `block`.
    pub fn is_growth_permeable(&self, block: BlockId) -> bool {
        self.growth_permeable_blocks.contains(&block)
    }

    /// Whether the size limit is reached for a structure of `cells` cells.
    pub fn size_limit_reached(&self, cells: usize) -> bool {
        self.max_portal_size > 0 && cells >= self.max_portal_size as usize
    }
}
