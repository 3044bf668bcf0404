// enhanced_portals_sim — portal structure engine.
//
// This crate contains the multi-block portal logic: detecting the plane of
// a frame, growing a portal inside it with rollback on failure, validating,
// removing and recolouring connected portal regions, and linking structural
// parts to their controller. It owns no world: every operation works
// against a host grid through the `GridAccessor` trait and an immutable
// `PortalConfig`, so it can be tested, benchmarked and run headless.
//
// Module overview:
// - `types.rs`:     GridLocation, Direction, Orientation, Spread, BlockId, DisplayTexture.
// - `records.rs`:   Typed per-cell records (portal cell, modifier, part, controller).
// - `world.rs`:     GridAccessor trait + the sparse in-memory VoxelGrid.
// - `config.rs`:    PortalConfig: frame/permeable block sets, size limit, block ids.
// - `frame.rs`:     Neighbour classification and orientation detection.
// - `builder.rs`:   Bounded flood-fill construction with rollback.
// - `validator.rs`: Post-construction full-frame check.
// - `remover.rs`:   List and flood-fill removal.
// - `texture.rs`:   Texture flood updates, modifier-driven recolouring.
// - `linkage.rs`:   Part → controller link state machine and signals.
// - `module.rs`:    Upgrade module plugins installed in modifiers.
// - `sync.rs`:      Outgoing record updates + applying them on a mirror.
// - `command.rs`:   PortalAction, every external entry point as data.
// - `event.rs`:     PortalEvent, narrative output of actions.
// - `engine.rs`:    PortalEngine: config, modules and sync outbox behind `apply()`.
//
// The companion crate `enhanced_portals_protocol` carries sync events to
// observers; `replication_tests` exercises both end to end.
//
// **Critical constraint: determinism.** Traversals are breadth-first in a
// fixed direction order and visited sets are `BTreeSet`s. No `HashMap`, no
// system time, no randomness: the same grid and action always produce the
// same result.

pub mod builder;
pub mod command;
pub mod config;
pub mod engine;
pub mod event;
pub mod frame;
pub mod linkage;
pub mod module;
pub mod records;
pub mod remover;
pub mod sync;
pub mod texture;
pub mod types;
pub mod validator;
pub mod world;
