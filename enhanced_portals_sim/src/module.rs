// Upgrade modules installed into portal modifiers.
//
// A module is a capability plugin: the host registers one `PortalModule`
// implementation per upgrade kind in a `ModuleRegistry`, keyed by its unique
// id. A modifier stores only the ids of the modules installed in it (see
// `ModifierRecord::upgrades`), so records stay plain serializable data and
// the behaviour lives in the registry.
//
// The engine consults modules at four points:
// - install/remove on a modifier (`install_upgrade()` / `remove_upgrade()`),
//   which honour `can_install` / `can_remove` and the configured slot count,
//   and push the changed modifier record so mirrors see the new flags;
// - portal created / removed through a modifier, which notify every
//   installed module in installation order;
// - `render_flags()`, which folds the modules' visual switches into the only
//   client-visual data the engine exposes.
//
// See also: `builder.rs` and `remover.rs` for the modifier entry points,
// `engine.rs` for the action dispatch that calls into the registry.

use crate::config::PortalConfig;
use crate::records::BlockRecord;
use crate::sync::SyncQueue;
use crate::types::GridLocation;
use crate::world::GridAccessor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Behaviour of one upgrade kind. Every hook has a permissive default.
pub trait PortalModule {
    /// Registry key; also the id stored in modifier records.
    fn unique_id(&self) -> &str;

    /// Whether this module may join a modifier holding `installed`.
    fn can_install(&self, _installed: &[String]) -> bool {
        true
    }

    /// Whether this module may leave a modifier holding `installed`.
    fn can_remove(&self, _installed: &[String]) -> bool {
        true
    }

    fn on_installed(&mut self, _modifier: GridLocation) {}

    fn on_removed(&mut self, _modifier: GridLocation) {}

    fn on_portal_created(&mut self, _modifier: GridLocation) {}

    fn on_portal_removed(&mut self, _modifier: GridLocation) {}

    fn disables_particles(&self) -> bool {
        false
    }

    fn disables_rendering(&self) -> bool {
        false
    }
}

/// Client-visual switches derived from a modifier's installed modules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFlags {
    pub particles_disabled: bool,
    pub rendering_disabled: bool,
}

/// Why an upgrade could not be installed or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum UpgradeError {
    #[error("no modifier at {0}")]
    NotAModifier(GridLocation),

    #[error("unknown upgrade module {0:?}")]
    UnknownModule(String),

    #[error("upgrade {0:?} is already installed")]
    AlreadyInstalled(String),

    #[error("upgrade {0:?} is not installed")]
    NotInstalled(String),

    #[error("all {0} upgrade slots are in use")]
    NoFreeSlot(usize),

    #[error("upgrade {0:?} refused the change")]
    Refused(String),
}

/// All known upgrade kinds, by id.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Box<dyn PortalModule>>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module kind. Replaces any module with the same id.
    pub fn register(&mut self, module: Box<dyn PortalModule>) {
        self.modules.insert(module.unique_id().to_string(), module);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn notify_portal_created(&mut self, installed: &[String], modifier: GridLocation) {
        for id in installed {
            if let Some(module) = self.modules.get_mut(id) {
                module.on_portal_created(modifier);
            }
        }
    }

    pub fn notify_portal_removed(&mut self, installed: &[String], modifier: GridLocation) {
        for id in installed {
            if let Some(module) = self.modules.get_mut(id) {
                module.on_portal_removed(modifier);
            }
        }
    }

    /// Fold the visual switches of `installed`. Unknown ids are ignored.
    pub fn render_flags(&self, installed: &[String]) -> RenderFlags {
        let mut flags = RenderFlags::default();
        for module in installed.iter().filter_map(|id| self.modules.get(id)) {
            flags.particles_disabled |= module.disables_particles();
            flags.rendering_disabled |= module.disables_rendering();
        }
        flags
    }
}

fn installed_upgrades<G: GridAccessor + ?Sized>(
    grid: &G,
    modifier: GridLocation,
) -> Result<Vec<String>, UpgradeError> {
    match grid.record(modifier) {
        Some(BlockRecord::Modifier(record)) => Ok(record.upgrades.clone()),
        _ => Err(UpgradeError::NotAModifier(modifier)),
    }
}

fn touch_modifier<G: GridAccessor + ?Sized>(
    grid: &mut G,
    sync: &mut SyncQueue,
    modifier: GridLocation,
) {
    grid.mark_dirty(modifier);
    if grid.is_authoritative() {
        sync.push_current(grid, modifier);
    }
}

/// Install upgrade `id` into the modifier at `modifier`.
pub fn install_upgrade<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    registry: &mut ModuleRegistry,
    sync: &mut SyncQueue,
    modifier: GridLocation,
    id: &str,
) -> Result<(), UpgradeError> {
    let installed = installed_upgrades(grid, modifier)?;
    let module = registry
        .modules
        .get_mut(id)
        .ok_or_else(|| UpgradeError::UnknownModule(id.to_string()))?;

    if installed.iter().any(|existing| existing == id) {
        return Err(UpgradeError::AlreadyInstalled(id.to_string()));
    }
    if installed.len() >= config.modifier_upgrade_slots {
        return Err(UpgradeError::NoFreeSlot(config.modifier_upgrade_slots));
    }
    if !module.can_install(&installed) {
        return Err(UpgradeError::Refused(id.to_string()));
    }

    if let Some(record) = grid.record_mut(modifier).and_then(BlockRecord::as_modifier_mut) {
        record.upgrades.push(id.to_string());
    }
    touch_modifier(grid, sync, modifier);
    module.on_installed(modifier);
    Ok(())
}

/// Remove upgrade `id` from the modifier at `modifier`.
pub fn remove_upgrade<G: GridAccessor + ?Sized>(
    grid: &mut G,
    registry: &mut ModuleRegistry,
    sync: &mut SyncQueue,
    modifier: GridLocation,
    id: &str,
) -> Result<(), UpgradeError> {
    let installed = installed_upgrades(grid, modifier)?;
    if !installed.iter().any(|existing| existing == id) {
        return Err(UpgradeError::NotInstalled(id.to_string()));
    }

    // Ids of unregistered modules can always be dropped.
    if let Some(module) = registry.modules.get_mut(id) {
        if !module.can_remove(&installed) {
            return Err(UpgradeError::Refused(id.to_string()));
        }
        module.on_removed(modifier);
    }

    if let Some(record) = grid.record_mut(modifier).and_then(BlockRecord::as_modifier_mut) {
        record.upgrades.retain(|existing| existing != id);
    }
    touch_modifier(grid, sync, modifier);
    Ok(())
}
