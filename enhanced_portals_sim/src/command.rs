// Actions that mutate portal state.
//
// Every external entry point of the engine has a `PortalAction` variant.
// The host translates its own events (block placed, block broken, player
// interaction, configuration GUI) into actions and hands them to
// `PortalEngine::apply()`, which dispatches to the module implementing the
// operation. Actions are plain serde data, so a host can log, replay or
// forward them.
//
// - `Build` / `BuildAroundBlock` / `BuildFromModifier`: see `builder.rs`.
// - `Remove` / `RemoveAround` / `RemoveFromModifier`: see `remover.rs`.
// - `UpdateTexture` / `UpdateModifierTexture`: see `texture.rs`.
// - `LinkPart` / `PartBroken` / `PartPlaced`: see `linkage.rs`.
// - `InstallUpgrade` / `RemoveUpgrade`: see `module.rs`.
//
// See also: `engine.rs` for the dispatch.

use crate::types::{BlockPos, DisplayTexture, GridLocation, Orientation, Spread};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortalAction {
    /// Build at `seed`. Without an orientation, X, Z and horizontal are
    /// tried in turn. Without a texture, the configured default is used.
    Build {
        seed: GridLocation,
        orientation: Option<Orientation>,
        texture: Option<DisplayTexture>,
    },
    /// Build from the first neighbour of `reference` that can host a seed.
    BuildAroundBlock {
        reference: GridLocation,
        texture: Option<DisplayTexture>,
    },
    /// Build the portal on a modifier's active face.
    BuildFromModifier { modifier: GridLocation },
    /// Clear the portal connected to `seed`.
    Remove { seed: GridLocation, spread: Spread },
    /// Clear every portal touching `reference`.
    RemoveAround { reference: GridLocation },
    /// Clear the portal on a modifier's active face.
    RemoveFromModifier { modifier: GridLocation },
    /// Recolour the portal at `seed` from `old` to `texture`.
    UpdateTexture {
        seed: GridLocation,
        texture: DisplayTexture,
        old: Option<DisplayTexture>,
        update_modifiers: bool,
    },
    /// Recolour a modifier and the portal it drives.
    UpdateModifierTexture {
        modifier: GridLocation,
        texture: DisplayTexture,
        update_self: bool,
    },
    /// Set (or clear) a part's controller.
    LinkPart {
        part: GridLocation,
        controller: Option<BlockPos>,
    },
    /// A part is being broken.
    PartBroken { part: GridLocation },
    /// A part was placed.
    PartPlaced { part: GridLocation },
    InstallUpgrade { modifier: GridLocation, id: String },
    RemoveUpgrade { modifier: GridLocation, id: String },
}
