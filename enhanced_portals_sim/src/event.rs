// Narrative events emitted by the engine.
//
// Every `PortalEngine::apply()` call returns the `PortalEvent`s describing
// what the action did, in the order it happened. Hosts use them for chat
// feedback, advancement triggers, or logs; tests use them to assert on
// outcomes without re-walking the grid.
//
// Events are output only. Nothing in the engine reads them back.
//
// See also: `engine.rs` for where they are produced, `command.rs` for the
// actions that trigger them.

use crate::builder::BuildError;
use crate::module::UpgradeError;
use crate::records::ControllerSignal;
use crate::types::{BlockPos, DisplayTexture, GridLocation, Orientation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalEvent {
    /// A portal structure was created.
    PortalCreated {
        seed: GridLocation,
        orientation: Orientation,
        texture: DisplayTexture,
        cells: usize,
    },
    /// A build attempt created nothing.
    BuildFailed {
        seed: GridLocation,
        reason: BuildError,
    },
    /// Portal cells connected to `origin` were cleared.
    PortalRemoved { origin: GridLocation, cells: usize },
    /// A texture flood ran from `seed`.
    TextureChanged {
        seed: GridLocation,
        texture: DisplayTexture,
    },
    /// A part's controller link was set or cleared.
    ControllerLinked {
        part: GridLocation,
        controller: Option<BlockPos>,
    },
    /// A signal was queued on a controller.
    ControllerSignalled {
        controller: GridLocation,
        signal: ControllerSignal,
    },
    UpgradeInstalled { modifier: GridLocation, id: String },
    UpgradeRemoved { modifier: GridLocation, id: String },
    UpgradeRejected {
        modifier: GridLocation,
        reason: UpgradeError,
    },
}
