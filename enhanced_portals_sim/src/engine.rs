// Top-level engine façade.
//
// `PortalEngine` bundles what every operation needs besides the grid: the
// immutable `PortalConfig`, the upgrade `ModuleRegistry`, and the outgoing
// `SyncQueue`. The host keeps one engine per server (or per client, for the
// mirror side), feeds it `PortalAction`s through `apply()` together with its
// grid adapter, and drains the sync queue after each batch.
//
// `apply()` returns an `ActionResult`: the boolean outcome the host acts on
// (e.g. cancel the interaction when `false`) plus the narrative events.
//
// The free functions in `builder.rs`, `remover.rs`, `texture.rs` and
// `linkage.rs` remain usable directly; the engine adds no behaviour of its
// own beyond event reporting.
//
// **Critical constraint: one action at a time.** `apply()` runs each action
// to completion (including rollback) before returning; hosts must not
// interleave actions on the same grid.

use crate::builder::{
    BuildError, BuildReport, try_build, try_build_any_orientation, try_build_around_block,
    try_build_from_modifier,
};
use crate::command::PortalAction;
use crate::config::PortalConfig;
use crate::event::PortalEvent;
use crate::linkage;
use crate::module::{self, ModuleRegistry, PortalModule, RenderFlags};
use crate::records::{BlockRecord, ControllerSignal};
use crate::remover;
use crate::sync::{self, SyncEvent, SyncQueue};
use crate::texture::{flood_update_texture, update_modifier_texture};
use crate::types::{DisplayTexture, GridLocation, Spread};
use crate::world::GridAccessor;

/// Outcome of one `PortalEngine::apply()` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    pub events: Vec<PortalEvent>,
}

impl ActionResult {
    fn new(success: bool) -> Self {
        Self {
            success,
            events: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PortalEngine {
    config: PortalConfig,
    modules: ModuleRegistry,
    sync: SyncQueue,
}

impl PortalEngine {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            config,
            modules: ModuleRegistry::new(),
            sync: SyncQueue::new(),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn register_module(&mut self, module: Box<dyn PortalModule>) {
        self.modules.register(module);
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Record updates queued for observers since the last drain.
    pub fn drain_sync(&mut self) -> Vec<SyncEvent> {
        self.sync.drain()
    }

    pub fn pending_sync(&self) -> usize {
        self.sync.len()
    }

    /// Visual switches for the portal driven by the modifier at `modifier`.
    pub fn render_flags<G: GridAccessor + ?Sized>(
        &self,
        grid: &G,
        modifier: GridLocation,
    ) -> RenderFlags {
        grid.record(modifier)
            .and_then(BlockRecord::as_modifier)
            .map(|record| self.modules.render_flags(&record.upgrades))
            .unwrap_or_default()
    }

    /// Install a record received from the authoritative side.
    pub fn apply_remote<G: GridAccessor + ?Sized>(
        &self,
        grid: &mut G,
        location: GridLocation,
        record: BlockRecord,
    ) -> bool {
        sync::apply_remote_record(grid, &self.config, location, record)
    }

    /// Run one action against `grid`.
    pub fn apply<G: GridAccessor + ?Sized>(
        &mut self,
        grid: &mut G,
        action: &PortalAction,
    ) -> ActionResult {
        let config = &self.config;
        match action {
            PortalAction::Build {
                seed,
                orientation,
                texture,
            } => {
                let outcome = match orientation {
                    Some(orientation) => {
                        try_build(grid, config, *seed, *orientation, *texture, None)
                    }
                    None => try_build_any_orientation(grid, config, *seed, *texture, None),
                };
                build_result(*seed, outcome)
            }
            PortalAction::BuildAroundBlock { reference, texture } => build_result(
                *reference,
                try_build_around_block(grid, config, *reference, *texture, None),
            ),
            PortalAction::BuildFromModifier { modifier } => build_result(
                *modifier,
                try_build_from_modifier(grid, config, &mut self.modules, *modifier),
            ),
            PortalAction::Remove { seed, spread } => {
                let cells = remover::remove_portal(grid, config, *seed, *spread);
                removal_result(*seed, cells)
            }
            PortalAction::RemoveAround { reference } => {
                let cells = remover::remove_around(grid, config, *reference);
                removal_result(*reference, cells)
            }
            PortalAction::RemoveFromModifier { modifier } => {
                match remover::remove_from_modifier(grid, config, &mut self.modules, *modifier) {
                    Some(cells) => removal_result(*modifier, cells),
                    None => ActionResult::new(false),
                }
            }
            PortalAction::UpdateTexture {
                seed,
                texture,
                old,
                update_modifiers,
            } => {
                let success = flood_update_texture(
                    grid,
                    config,
                    &mut self.sync,
                    *seed,
                    *texture,
                    *old,
                    *update_modifiers,
                );
                texture_result(*seed, *texture, success)
            }
            PortalAction::UpdateModifierTexture {
                modifier,
                texture,
                update_self,
            } => {
                let success = update_modifier_texture(
                    grid,
                    config,
                    &mut self.sync,
                    *modifier,
                    *texture,
                    *update_self,
                );
                texture_result(*modifier, *texture, success)
            }
            PortalAction::LinkPart { part, controller } => {
                let mut result = ActionResult::new(linkage::set_controller(
                    grid,
                    &mut self.sync,
                    *part,
                    *controller,
                ));
                if result.success {
                    result.events.push(PortalEvent::ControllerLinked {
                        part: *part,
                        controller: *controller,
                    });
                }
                result
            }
            PortalAction::PartBroken { part } => {
                let signalled = linkage::on_part_broken(grid, *part);
                signal_result(
                    signalled.into_iter().collect(),
                    ControllerSignal::TerminateConnection,
                )
            }
            PortalAction::PartPlaced { part } => signal_result(
                linkage::on_part_placed(grid, *part),
                ControllerSignal::Deconstruct,
            ),
            PortalAction::InstallUpgrade { modifier, id } => upgrade_result(
                *modifier,
                module::install_upgrade(
                    grid,
                    config,
                    &mut self.modules,
                    &mut self.sync,
                    *modifier,
                    id,
                ),
                PortalEvent::UpgradeInstalled {
                    modifier: *modifier,
                    id: id.clone(),
                },
            ),
            PortalAction::RemoveUpgrade { modifier, id } => upgrade_result(
                *modifier,
                module::remove_upgrade(grid, &mut self.modules, &mut self.sync, *modifier, id),
                PortalEvent::UpgradeRemoved {
                    modifier: *modifier,
                    id: id.clone(),
                },
            ),
        }
    }
}

fn build_result(seed: GridLocation, outcome: Result<BuildReport, BuildError>) -> ActionResult {
    match outcome {
        Ok(report) => ActionResult {
            success: true,
            events: vec![PortalEvent::PortalCreated {
                seed: report.seed,
                orientation: report.orientation,
                texture: report.texture,
                cells: report.cell_count(),
            }],
        },
        Err(reason) => ActionResult {
            success: false,
            events: vec![PortalEvent::BuildFailed { seed, reason }],
        },
    }
}

fn removal_result(origin: GridLocation, cells: usize) -> ActionResult {
    let mut result = ActionResult::new(cells > 0);
    if result.success {
        result
            .events
            .push(PortalEvent::PortalRemoved { origin, cells });
    }
    result
}

fn texture_result(
    seed: GridLocation,
    texture: DisplayTexture,
    success: bool,
) -> ActionResult {
    let mut result = ActionResult::new(success);
    if success {
        result
            .events
            .push(PortalEvent::TextureChanged { seed, texture });
    }
    result
}

fn signal_result(controllers: Vec<GridLocation>, signal: ControllerSignal) -> ActionResult {
    ActionResult {
        success: !controllers.is_empty(),
        events: controllers
            .into_iter()
            .map(|controller| PortalEvent::ControllerSignalled { controller, signal })
            .collect(),
    }
}

fn upgrade_result(
    modifier: GridLocation,
    outcome: Result<(), module::UpgradeError>,
    on_success: PortalEvent,
) -> ActionResult {
    match outcome {
        Ok(()) => ActionResult {
            success: true,
            events: vec![on_success],
        },
        Err(reason) => ActionResult {
            success: false,
            events: vec![PortalEvent::UpgradeRejected { modifier, reason }],
        },
    }
}

/// Convenience for hosts that only know a removal seed: clears in every
/// direction.
pub fn teardown(seed: GridLocation) -> PortalAction {
    PortalAction::Remove {
        seed,
        spread: Spread::AllDirections,
    }
}
