// Integration tests for portal record replication.
//
// Exercises the full path between an authoritative server and a mirror:
// `PortalAction` → engine → sync outbox → framed `RecordUpdate` →
// observer decode → `apply_remote` on the mirror grid. Block ids travel
// out of band via `TestObserver::mirror_blocks()`.

use enhanced_portals_protocol::{ObserverId, PROTOCOL_VERSION};
use enhanced_portals_sim::command::PortalAction;
use enhanced_portals_sim::config::PortalConfig;
use enhanced_portals_sim::engine::teardown;
use enhanced_portals_sim::linkage::resolve_controller;
use enhanced_portals_sim::module::PortalModule;
use enhanced_portals_sim::records::{BlockRecord, ControllerRecord, ModifierRecord, PartRecord};
use enhanced_portals_sim::types::{BlockId, BlockPos, Direction, DisplayTexture, GridLocation, WorldId};
use enhanced_portals_sim::world::{GridAccessor, VoxelGrid};
use replication_tests::{TestObserver, TestServer};

const OBSIDIAN: BlockId = BlockId(49);
const PART: BlockId = BlockId(1300);
const CONTROLLER: BlockId = BlockId(1301);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn at(x: i32, y: i32, z: i32) -> GridLocation {
    GridLocation::new(WorldId(0), x, y, z)
}

fn portal_cells() -> Vec<GridLocation> {
    vec![at(0, 0, 0), at(1, 0, 0), at(0, 1, 0), at(1, 1, 0)]
}

fn texture_at(grid: &VoxelGrid, loc: GridLocation) -> Option<DisplayTexture> {
    grid.record(loc)
        .and_then(BlockRecord::as_portal)
        .map(|cell| cell.texture)
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

/// Obsidian ring around a 2x2 X-aligned interior, with an upward-facing pink
/// modifier in the bottom edge. Returns the modifier location.
fn place_frame(server: &mut TestServer) -> GridLocation {
    for x in -1..=2 {
        for y in -1..=2 {
            if x == -1 || x == 2 || y == -1 || y == 2 {
                server.grid.set_block(at(x, y, 0), OBSIDIAN);
            }
        }
    }
    let modifier = at(0, -1, 0);
    let block = server.engine.config().modifier_block;
    server.grid.set_block(modifier, block);
    server.grid.set_record(
        modifier,
        BlockRecord::Modifier(ModifierRecord::new(DisplayTexture::Pink, Direction::Up)),
    );
    modifier
}

/// Connect an observer: handshake, build from the modifier, mirror the
/// blocks and fetch every record.
fn connected_pair() -> (TestServer, TestObserver, GridLocation) {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let mut observer = TestObserver::new(PortalConfig::default());
    let modifier = place_frame(&mut server);

    let mut inbox = Vec::new();
    observer.hello(PROTOCOL_VERSION, &mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    observer.receive(&wire);
    assert!(observer.observer_id.is_some());

    let built = server.apply(&PortalAction::BuildFromModifier { modifier });
    assert!(built.success);

    observer.mirror_blocks(&server.grid);
    let mut wanted = portal_cells();
    wanted.push(modifier);
    let mut inbox = Vec::new();
    observer.request_records(&wanted, &mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    observer.receive(&wire);
    assert_eq!(observer.applied, wanted.len());

    (server, observer, modifier)
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[test]
fn handshake_assigns_observer_ids() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let mut first = TestObserver::new(PortalConfig::default());
    let mut second = TestObserver::new(PortalConfig::default());

    for observer in [&mut first, &mut second] {
        let mut inbox = Vec::new();
        observer.hello(PROTOCOL_VERSION, &mut inbox);
        let mut wire = Vec::new();
        server.handle_client(&inbox, &mut wire);
        observer.receive(&wire);
    }

    assert_eq!(first.observer_id, Some(ObserverId(0)));
    assert_eq!(second.observer_id, Some(ObserverId(1)));
}

#[test]
fn handshake_rejects_other_versions() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let mut observer = TestObserver::new(PortalConfig::default());

    let mut inbox = Vec::new();
    observer.hello(PROTOCOL_VERSION + 1, &mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    observer.receive(&wire);

    assert_eq!(observer.observer_id, None);
    assert!(observer.rejected.is_some());
}

#[test]
fn goodbye_gets_no_reply() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let observer = TestObserver::new(PortalConfig::default());

    let mut inbox = Vec::new();
    observer.goodbye(&mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    assert!(wire.is_empty());
}

// ---------------------------------------------------------------------------
// Portal records
// ---------------------------------------------------------------------------

#[test]
fn built_portal_reaches_observer_on_request() {
    let (server, observer, modifier) = connected_pair();

    for loc in portal_cells() {
        assert_eq!(texture_at(&observer.grid, loc), Some(DisplayTexture::Pink));
        assert_eq!(observer.grid.record(loc), server.grid.record(loc));
    }
    assert_eq!(observer.grid.meta(at(0, 0, 0)), 1);
    assert_eq!(
        observer.grid.record(modifier),
        server.grid.record(modifier)
    );
}

#[test]
fn build_pushes_nothing_by_itself() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let modifier = place_frame(&mut server);
    assert!(server.apply(&PortalAction::BuildFromModifier { modifier }).success);

    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 0);
    assert!(wire.is_empty());
}

#[test]
fn modifier_recolour_rederives_mirror_from_primary_cell() {
    let (mut server, mut observer, modifier) = connected_pair();

    let result = server.apply(&PortalAction::UpdateModifierTexture {
        modifier,
        texture: DisplayTexture::Black,
        update_self: true,
    });
    assert!(result.success);

    // Only the modifier and the primary cell travel.
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 2);
    observer.receive(&wire);

    for loc in portal_cells() {
        assert_eq!(texture_at(&server.grid, loc), Some(DisplayTexture::Black));
        assert_eq!(texture_at(&observer.grid, loc), Some(DisplayTexture::Black));
    }
    let mirrored = observer
        .grid
        .record(modifier)
        .and_then(BlockRecord::as_modifier)
        .map(|record| record.texture);
    assert_eq!(mirrored, Some(DisplayTexture::Black));
}

#[test]
fn replayed_updates_are_dropped() {
    let (mut server, mut observer, modifier) = connected_pair();
    server.apply(&PortalAction::UpdateModifierTexture {
        modifier,
        texture: DisplayTexture::Lime,
        update_self: true,
    });
    let mut wire = Vec::new();
    server.flush_sync(&mut wire);

    observer.receive(&wire);
    let applied = observer.applied;
    let dropped = observer.dropped;
    observer.receive(&wire);

    assert_eq!(observer.applied, applied);
    assert_eq!(observer.dropped, dropped + 2);
    assert_eq!(texture_at(&observer.grid, at(1, 1, 0)), Some(DisplayTexture::Lime));
}

#[test]
fn record_for_unmirrored_block_is_dropped() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let mut observer = TestObserver::new(PortalConfig::default());
    let modifier = place_frame(&mut server);
    server.apply(&PortalAction::BuildFromModifier { modifier });
    server.apply(&PortalAction::UpdateModifierTexture {
        modifier,
        texture: DisplayTexture::Cyan,
        update_self: true,
    });

    // Blocks never mirrored: both records lack a block to sit on.
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 2);
    observer.receive(&wire);

    assert_eq!(observer.applied, 0);
    assert_eq!(observer.dropped, 2);
    assert!(observer.grid.is_empty());
}

#[test]
fn teardown_reaches_observer_with_blocks() {
    let (mut server, mut observer, modifier) = connected_pair();

    let result = server.apply(&teardown(at(1, 1, 0)));
    assert!(result.success);
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 0);

    observer.mirror_blocks(&server.grid);
    let portal_block = server.engine.config().portal_block;
    assert!(observer.grid.locations_of(portal_block).is_empty());
    for loc in portal_cells() {
        assert!(observer.grid.record(loc).is_none());
    }
    // Untouched cells keep their records.
    assert!(observer.grid.record(modifier).is_some());
}

#[test]
fn failed_build_produces_no_updates() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());

    let result = server.apply(&PortalAction::Build {
        seed: at(10, 10, 10),
        orientation: None,
        texture: Some(DisplayTexture::Red),
    });
    assert!(!result.success);
    assert!(server.grid.is_empty());

    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 0);
}

#[test]
fn missing_record_is_reported() {
    let (mut server, mut observer, _) = connected_pair();
    let applied = observer.applied;

    let mut inbox = Vec::new();
    observer.request_records(&[at(40, 40, 40)], &mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    assert!(!wire.is_empty());
    observer.receive(&wire);

    assert_eq!(observer.applied, applied);
    assert!(observer.grid.record(at(40, 40, 40)).is_none());
}

// ---------------------------------------------------------------------------
// Upgrades
// ---------------------------------------------------------------------------

struct Cloak;

impl PortalModule for Cloak {
    fn unique_id(&self) -> &str {
        "cloak"
    }

    fn disables_particles(&self) -> bool {
        true
    }
}

#[test]
fn installed_upgrade_reaches_mirror_render_flags() {
    let (mut server, mut observer, modifier) = connected_pair();
    server.engine.register_module(Box::new(Cloak));
    observer.register_module(Box::new(Cloak));
    assert!(!observer.render_flags(modifier).particles_disabled);

    let installed = server.apply(&PortalAction::InstallUpgrade {
        modifier,
        id: "cloak".into(),
    });
    assert!(installed.success);
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 1);
    observer.receive(&wire);
    assert!(observer.render_flags(modifier).particles_disabled);

    server.apply(&PortalAction::RemoveUpgrade {
        modifier,
        id: "cloak".into(),
    });
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 1);
    observer.receive(&wire);
    assert!(!observer.render_flags(modifier).particles_disabled);
}

// ---------------------------------------------------------------------------
// Part linkage
// ---------------------------------------------------------------------------

#[test]
fn part_link_replicates_and_resets_mirror_cache() {
    init_logging();
    let mut server = TestServer::new(PortalConfig::default());
    let mut observer = TestObserver::new(PortalConfig::default());
    let part = at(0, 0, 5);
    let controller = at(0, 2, 5);
    server.grid.set_block(controller, CONTROLLER);
    server
        .grid
        .set_record(controller, BlockRecord::Controller(ControllerRecord::new()));
    server.grid.set_block(part, PART);
    server
        .grid
        .set_record(part, BlockRecord::Part(PartRecord::new()));

    let linked = server.apply(&PortalAction::LinkPart {
        part,
        controller: Some(BlockPos::new(0, 2, 5)),
    });
    assert!(linked.success);

    observer.mirror_blocks(&server.grid);
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 1);
    observer.receive(&wire);

    // The controller record arrives on request.
    let mut inbox = Vec::new();
    observer.request_records(&[controller], &mut inbox);
    let mut wire = Vec::new();
    server.handle_client(&inbox, &mut wire);
    observer.receive(&wire);

    assert_eq!(resolve_controller(&mut observer.grid, part), Some(controller));
    let cached = observer
        .grid
        .record(part)
        .and_then(BlockRecord::as_part)
        .and_then(|record| record.cached_controller());
    assert_eq!(cached, Some(BlockPos::new(0, 2, 5)));

    let unlinked = server.apply(&PortalAction::LinkPart {
        part,
        controller: None,
    });
    assert!(unlinked.success);
    let mut wire = Vec::new();
    assert_eq!(server.flush_sync(&mut wire), 1);
    observer.receive(&wire);

    let record = observer
        .grid
        .record(part)
        .and_then(BlockRecord::as_part)
        .cloned();
    let record = record.expect("part record mirrored");
    assert_eq!(record.controller(), None);
    assert_eq!(record.cached_controller(), None);
    assert_eq!(resolve_controller(&mut observer.grid, part), None);
}
