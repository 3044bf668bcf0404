// Portal construction.
//
// `try_build()` grows a portal breadth-first from a seed cell in one plane.
// Every dequeued cell that can still be replaced is scored with
// `classify_neighbors()`:
//
// - blocked: the structure touches something it can neither lean on nor
//   replace. Abort.
// - fewer than two frame sides: spend one of the build's
//   `FORGIVENESS_CHANCES` for a +2 bonus, or drop the cell. A dropped cell
//   stays replaceable and is scored again whenever a converted neighbour
//   queues it, by which time that neighbour counts as frame.
// - two or more: convert the cell to a portal block carrying a `PortalCell`
//   record, and enqueue its in-plane neighbours. The first converted cell
//   is stamped as the structure's primary cell.
//
// The cell count is checked against `max_portal_size` before each dequeued
// cell is processed. Once the queue drains, the whole structure must pass
// `validate()`. Any failure after the first conversion reverts exactly the
// converted cells (`remove_cells()`) before the error is returned, so a
// failed build leaves the grid as it found it.
//
// Only the live block type decides whether a dequeued cell is processed:
// converted cells are no longer replaceable, so each cell converts at most
// once per build.
//
// The convenience forms try every orientation (X, then Z, then horizontal),
// every neighbour of a reference block, or the active face of a modifier.
// Individual attempts log at `debug`; each public entry point writes a
// single `info` line when it fails as a whole.
//
// See also: `frame.rs` for scoring, `validator.rs`, `remover.rs`.
//
// **Critical constraint: authoritative side only.** Mirrors receive portals
// through replication (`sync.rs`) and never build locally.

use crate::config::{FORGIVENESS_CHANCES, PRIMARY_CELL_META, PortalConfig};
use crate::frame::classify_neighbors;
use crate::module::ModuleRegistry;
use crate::records::{BlockRecord, PortalCell};
use crate::remover::{AROUND_BLOCK_ORDER, remove_cells};
use crate::types::{DisplayTexture, GridLocation, Orientation};
use crate::validator::validate;
use crate::world::{GridAccessor, NotifyFlags};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Why a build attempt created nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BuildError {
    #[error("portals can only be built on the authoritative side")]
    NotAuthoritative,

    #[error("seed cell cannot be replaced by a portal")]
    SeedObstructed,

    #[error("size limit {limit} reached after {added} cells")]
    SizeLimitExceeded { limit: u32, added: usize },

    #[error("growth blocked at {at}")]
    Blocked { at: GridLocation },

    #[error("structure is not fully framed")]
    ValidationFailed,

    #[error("no modifier at {at}")]
    NotAModifier { at: GridLocation },
}

/// A successfully built structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub seed: GridLocation,
    pub orientation: Orientation,
    pub texture: DisplayTexture,
    /// Converted cells in conversion order; the first is the primary cell.
    pub cells: Vec<GridLocation>,
}

impl BuildReport {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn primary_cell(&self) -> Option<GridLocation> {
        self.cells.first().copied()
    }
}

/// Build a portal at `seed` in `orientation`. `texture` of `None` uses the
/// configured default; `owner` is the modifier driving the structure.
pub fn try_build<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> Result<BuildReport, BuildError> {
    attempt(grid, config, seed, orientation, texture, owner).inspect_err(|err| {
        log::info!("failed to build {orientation} portal at {seed}: {err}");
    })
}

/// One build attempt, logged at `debug` only.
fn attempt<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> Result<BuildReport, BuildError> {
    let texture = texture.unwrap_or(config.default_texture);
    match grow(grid, config, seed, orientation, texture, owner) {
        Ok(cells) => {
            log::debug!(
                "built {orientation} portal of {} cells at {seed}",
                cells.len()
            );
            Ok(BuildReport {
                seed,
                orientation,
                texture,
                cells,
            })
        }
        Err(err) => {
            log::debug!("{orientation} attempt at {seed} failed: {err}");
            Err(err)
        }
    }
}

fn attempt_any_orientation<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> Result<BuildReport, BuildError> {
    let mut last = Err(BuildError::SeedObstructed);
    for orientation in Orientation::ALL {
        last = attempt(grid, config, seed, orientation, texture, owner);
        if last.is_ok() {
            break;
        }
    }
    last
}

fn grow<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
    texture: DisplayTexture,
    owner: Option<GridLocation>,
) -> Result<Vec<GridLocation>, BuildError> {
    if !grid.is_authoritative() {
        return Err(BuildError::NotAuthoritative);
    }
    if !config.is_growth_permeable(grid.block(seed)) {
        return Err(BuildError::SeedObstructed);
    }

    let mut added: Vec<GridLocation> = Vec::new();
    let mut queue = VecDeque::new();
    let mut chances_left = FORGIVENESS_CHANCES;
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if config.size_limit_reached(added.len()) {
            remove_cells(grid, &added);
            return Err(BuildError::SizeLimitExceeded {
                limit: config.max_portal_size,
                added: added.len(),
            });
        }
        if !config.is_growth_permeable(grid.block(current)) {
            continue;
        }

        let scan = classify_neighbors(grid, config, current, orientation);
        if scan.blocked {
            remove_cells(grid, &added);
            return Err(BuildError::Blocked { at: current });
        }

        let mut sides = scan.side_count;
        if sides < 2 && chances_left > 0 {
            chances_left -= 1;
            sides += 2;
        }
        if sides < 2 {
            continue;
        }

        grid.set_block(current, config.portal_block);
        let mut cell = PortalCell::new(texture);
        cell.parent_modifier = owner
            .filter(|owner| owner.world == current.world)
            .map(GridLocation::pos);
        grid.set_record(current, BlockRecord::Portal(cell));
        if added.is_empty() {
            grid.set_meta(current, PRIMARY_CELL_META, NotifyFlags::SEND_TO_CLIENTS);
        }
        added.push(current);

        for dir in orientation.growth_directions() {
            queue.push_back(current.offset(dir));
        }
    }

    if !validate(grid, config, seed, orientation) {
        remove_cells(grid, &added);
        return Err(BuildError::ValidationFailed);
    }
    Ok(added)
}

/// Boolean form of `try_build()`.
pub fn build<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> bool {
    try_build(grid, config, seed, orientation, texture, owner).is_ok()
}

/// Build with the configured default texture and no owner.
pub fn build_default_texture<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    orientation: Orientation,
) -> bool {
    build(grid, config, seed, orientation, None, None)
}

/// Try X-aligned, Z-aligned and horizontal in turn. Returns the first
/// success, or the last failure.
pub fn try_build_any_orientation<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> Result<BuildReport, BuildError> {
    attempt_any_orientation(grid, config, seed, texture, owner).inspect_err(|err| {
        log::info!("failed to build portal at {seed} in any orientation: {err}");
    })
}

pub fn build_any_orientation<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    seed: GridLocation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> bool {
    try_build_any_orientation(grid, config, seed, texture, owner).is_ok()
}

/// Try every neighbour of `reference` as a seed (up, down, north, south,
/// east, west), each in every orientation.
pub fn try_build_around_block<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    reference: GridLocation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> Result<BuildReport, BuildError> {
    let mut last = Err(BuildError::SeedObstructed);
    for dir in AROUND_BLOCK_ORDER {
        let seed = reference.offset(dir);
        if grid.is_authoritative() && !config.is_growth_permeable(grid.block(seed)) {
            continue;
        }
        last = attempt_any_orientation(grid, config, seed, texture, owner);
        if last.is_ok() {
            break;
        }
    }
    last.inspect_err(|err| {
        log::info!("failed to build portal around {reference}: {err}");
    })
}

pub fn build_around_block<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    reference: GridLocation,
    texture: Option<DisplayTexture>,
    owner: Option<GridLocation>,
) -> bool {
    try_build_around_block(grid, config, reference, texture, owner).is_ok()
}

/// Build the portal driven by the modifier at `modifier`: seeded on its
/// active face, in its texture, owned by it. Installed upgrades are
/// notified on success.
pub fn try_build_from_modifier<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    modules: &mut ModuleRegistry,
    modifier: GridLocation,
) -> Result<BuildReport, BuildError> {
    let (texture, facing, upgrades) = match grid.record(modifier) {
        Some(BlockRecord::Modifier(record)) => {
            (record.texture, record.facing, record.upgrades.clone())
        }
        _ => return Err(BuildError::NotAModifier { at: modifier }),
    };

    let report = try_build_any_orientation(
        grid,
        config,
        modifier.offset(facing),
        Some(texture),
        Some(modifier),
    )?;
    modules.notify_portal_created(&upgrades, modifier);
    Ok(report)
}

pub fn build_from_modifier<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    modules: &mut ModuleRegistry,
    modifier: GridLocation,
) -> bool {
    try_build_from_modifier(grid, config, modules, modifier).is_ok()
}
