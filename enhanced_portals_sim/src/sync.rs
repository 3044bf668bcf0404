// Record replication to observers.
//
// The engine never talks to the network. Whenever an operation decides that
// observers must learn about a record change, it pushes a `SyncEvent` into
// a `SyncQueue` outbox; the host drains the queue after each action and
// ships the events through its transport (see `enhanced_portals_protocol`
// for the wire messages). Delivery is best-effort and unacknowledged.
//
// Which changes are pushed:
// - texture floods push only the primary cell of a portal plus every
//   modifier they touch;
// - controller links push every part whose link changed.
//
// On the receiving side `apply_remote_record()` installs an incoming record
// on the mirror grid. A primary portal cell whose texture changed is not
// installed verbatim: the mirror re-runs the texture flood locally from it,
// so the rest of the structure follows without its own events.
//
// See also: `texture.rs`, `linkage.rs`.

use crate::config::{PRIMARY_CELL_META, PortalConfig};
use crate::records::BlockRecord;
use crate::texture::flood_update_texture;
use crate::types::{BlockId, GridLocation};
use crate::world::GridAccessor;
use serde::{Deserialize, Serialize};

/// A record that observers near `location` should receive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub location: GridLocation,
    pub record: BlockRecord,
}

/// Outbox of pending record updates, in push order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncQueue {
    events: Vec<SyncEvent>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: GridLocation, record: BlockRecord) {
        self.events.push(SyncEvent { location, record });
    }

    /// Queue the record currently stored at `location`, if any.
    pub fn push_current<G: GridAccessor + ?Sized>(&mut self, grid: &G, location: GridLocation) {
        if let Some(record) = grid.record(location) {
            self.push(location, record.clone());
        }
    }

    pub fn drain(&mut self) -> Vec<SyncEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[SyncEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Install a replicated record on a mirror grid. Returns `false` if the
/// block at `location` cannot hold this kind of record.
pub fn apply_remote_record<G: GridAccessor + ?Sized>(
    grid: &mut G,
    config: &PortalConfig,
    location: GridLocation,
    record: BlockRecord,
) -> bool {
    let block = grid.block(location);
    let accepted = match &record {
        BlockRecord::Portal(_) => block == config.portal_block,
        BlockRecord::Modifier(_) => block == config.modifier_block,
        BlockRecord::Part(_) | BlockRecord::Controller(_) => block != BlockId::AIR,
    };
    if !accepted {
        log::debug!("dropping replicated record for {location}: block {block:?} cannot hold it");
        return false;
    }

    if let BlockRecord::Portal(incoming) = &record {
        let previous = grid
            .record(location)
            .and_then(BlockRecord::as_portal)
            .map(|cell| cell.texture);
        let is_primary = grid.meta(location) == PRIMARY_CELL_META;
        if is_primary && previous.is_some_and(|old| old != incoming.texture) {
            // The mirror never pushes; this outbox is discarded.
            let mut local = SyncQueue::new();
            flood_update_texture(
                grid,
                config,
                &mut local,
                location,
                incoming.texture,
                previous,
                false,
            );
        }
    }

    // Incoming part records never carry a resolved controller, so this also
    // resets the mirror's cache.
    grid.set_record(location, record);
    true
}
