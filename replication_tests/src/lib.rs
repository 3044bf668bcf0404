// Test-only server and observer for replication integration tests.
//
// `TestServer` wraps an authoritative `VoxelGrid` and a `PortalEngine`;
// `TestObserver` wraps a mirror `VoxelGrid` and its own engine. They talk
// through in-memory byte buffers using the real protocol crate: messages are
// JSON-serialized, length-framed, read back and decoded exactly as a socket
// transport would, so the full path is exercised:
// action → sync outbox → RecordUpdate frame → decode → apply on mirror.
//
// Block ids and metadata are not part of the protocol; the host platform
// replicates those itself. `TestObserver::mirror_blocks()` stands in for
// that by copying them from the server grid while leaving records alone.
//
// See also: `tests/full_pipeline.rs` for the scenarios.

use std::io::Cursor;

use enhanced_portals_protocol::{
    ClientMessage, ObserverId, PROTOCOL_VERSION, ServerMessage, UpdateSequence, WireLocation,
    receive, send,
};
use enhanced_portals_sim::command::PortalAction;
use enhanced_portals_sim::config::PortalConfig;
use enhanced_portals_sim::engine::{ActionResult, PortalEngine};
use enhanced_portals_sim::module::{PortalModule, RenderFlags};
use enhanced_portals_sim::records::BlockRecord;
use enhanced_portals_sim::types::{GridLocation, WorldId};
use enhanced_portals_sim::world::{GridAccessor, NotifyFlags, VoxelGrid};

pub fn to_wire(loc: GridLocation) -> WireLocation {
    WireLocation {
        world: loc.world.0,
        pos: [loc.x, loc.y, loc.z],
    }
}

pub fn from_wire(loc: WireLocation) -> GridLocation {
    let [x, y, z] = loc.pos;
    GridLocation::new(WorldId(loc.world), x, y, z)
}

/// Decode every frame in `wire`.
fn read_all<M: serde::de::DeserializeOwned>(wire: &[u8]) -> Vec<M> {
    let mut cursor = Cursor::new(wire);
    let mut messages = Vec::new();
    while (cursor.position() as usize) < wire.len() {
        messages.push(receive(&mut cursor).expect("malformed frame"));
    }
    messages
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

pub struct TestServer {
    pub grid: VoxelGrid,
    pub engine: PortalEngine,
    next_sequence: UpdateSequence,
    next_observer: u32,
}

impl TestServer {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            grid: VoxelGrid::server(),
            engine: PortalEngine::new(config),
            next_sequence: UpdateSequence(0),
            next_observer: 0,
        }
    }

    pub fn apply(&mut self, action: &PortalAction) -> ActionResult {
        self.engine.apply(&mut self.grid, action)
    }

    fn record_update(&mut self, location: GridLocation, record: &BlockRecord) -> ServerMessage {
        let payload = serde_json::to_vec(record).expect("serialize BlockRecord failed");
        let sequence = self.next_sequence;
        self.next_sequence = sequence.next();
        ServerMessage::RecordUpdate {
            sequence,
            location: to_wire(location),
            payload,
        }
    }

    /// Frame every queued sync event as a `RecordUpdate`. Returns the number
    /// of frames written.
    pub fn flush_sync(&mut self, wire: &mut Vec<u8>) -> usize {
        let events = self.engine.drain_sync();
        for event in &events {
            let msg = self.record_update(event.location, &event.record);
            send(wire, &msg).expect("frame RecordUpdate failed");
        }
        events.len()
    }

    /// Answer every client message in `inbox`, writing replies to `wire`.
    pub fn handle_client(&mut self, inbox: &[u8], wire: &mut Vec<u8>) {
        for msg in read_all::<ClientMessage>(inbox) {
            let reply = match msg {
                ClientMessage::Hello {
                    protocol_version,
                    observer_name,
                } => {
                    if protocol_version != PROTOCOL_VERSION {
                        ServerMessage::Rejected {
                            reason: format!("unsupported protocol version {protocol_version}"),
                        }
                    } else {
                        let observer_id = ObserverId(self.next_observer);
                        self.next_observer += 1;
                        log::debug!("observer {observer_name} joined as {observer_id:?}");
                        ServerMessage::Welcome {
                            observer_id,
                            protocol_version: PROTOCOL_VERSION,
                        }
                    }
                }
                ClientMessage::RequestRecord { location } => {
                    let loc = from_wire(location);
                    match self.grid.record(loc).cloned() {
                        Some(record) => self.record_update(loc, &record),
                        None => ServerMessage::RecordMissing { location },
                    }
                }
                ClientMessage::Goodbye => continue,
            };
            send(wire, &reply).expect("frame reply failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Observer side
// ---------------------------------------------------------------------------

pub struct TestObserver {
    pub grid: VoxelGrid,
    engine: PortalEngine,
    pub observer_id: Option<ObserverId>,
    pub rejected: Option<String>,
    last_sequence: Option<UpdateSequence>,
    /// Updates installed on the mirror.
    pub applied: usize,
    /// Updates dropped as stale or unplaceable.
    pub dropped: usize,
}

impl TestObserver {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            grid: VoxelGrid::client(),
            engine: PortalEngine::new(config),
            observer_id: None,
            rejected: None,
            last_sequence: None,
            applied: 0,
            dropped: 0,
        }
    }

    /// Upgrade kinds must be known on both sides for render flags to match.
    pub fn register_module(&mut self, module: Box<dyn PortalModule>) {
        self.engine.register_module(module);
    }

    pub fn render_flags(&self, modifier: GridLocation) -> RenderFlags {
        self.engine.render_flags(&self.grid, modifier)
    }

    pub fn hello(&self, version: u32, out: &mut Vec<u8>) {
        let msg = ClientMessage::Hello {
            protocol_version: version,
            observer_name: "test-observer".into(),
        };
        send(out, &msg).expect("frame Hello failed");
    }

    pub fn request_records(&self, locations: &[GridLocation], out: &mut Vec<u8>) {
        for &loc in locations {
            let msg = ClientMessage::RequestRecord {
                location: to_wire(loc),
            };
            send(out, &msg).expect("frame RequestRecord failed");
        }
    }

    pub fn goodbye(&self, out: &mut Vec<u8>) {
        send(out, &ClientMessage::Goodbye).expect("frame Goodbye failed");
    }

    /// Copy block ids and metadata from the server grid. Records on cells
    /// whose block did not change are kept.
    pub fn mirror_blocks(&mut self, server: &VoxelGrid) {
        let stale: Vec<GridLocation> = self
            .grid
            .cells()
            .map(|(&loc, _)| loc)
            .filter(|&loc| server.cell(loc).is_none())
            .collect();
        for loc in stale {
            self.grid.set_empty(loc);
        }
        for (&loc, cell) in server.cells() {
            if self.grid.block(loc) != cell.block {
                self.grid.set_block(loc, cell.block);
            }
            self.grid.set_meta(loc, cell.meta, NotifyFlags::NONE);
        }
    }

    /// Process every server message in `wire`.
    pub fn receive(&mut self, wire: &[u8]) {
        for msg in read_all::<ServerMessage>(wire) {
            match msg {
                ServerMessage::Welcome { observer_id, .. } => {
                    self.observer_id = Some(observer_id);
                }
                ServerMessage::Rejected { reason } => {
                    self.rejected = Some(reason);
                }
                ServerMessage::RecordUpdate {
                    sequence,
                    location,
                    payload,
                } => {
                    if self.last_sequence.is_some_and(|last| sequence <= last) {
                        self.dropped += 1;
                        continue;
                    }
                    self.last_sequence = Some(sequence);
                    let record: BlockRecord =
                        serde_json::from_slice(&payload).expect("malformed record payload");
                    if self
                        .engine
                        .apply_remote(&mut self.grid, from_wire(location), record)
                    {
                        self.applied += 1;
                    } else {
                        self.dropped += 1;
                    }
                }
                ServerMessage::RecordMissing { .. } => {}
            }
        }
    }
}
