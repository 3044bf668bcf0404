// Core types shared across the portal engine.
//
// Defines grid addressing (`WorldId`, `BlockPos`, `GridLocation`), the six
// axis `Direction`s, portal plane `Orientation`s and the `Spread` used by
// traversals, block identifiers, and the closed `DisplayTexture` set. All
// types derive `Serialize` and `Deserialize` so records and commands can be
// persisted by the host and replicated to observers.
//
// Axis conventions match the host grid:
// - X: east  (positive) / west  (negative)
// - Y: up    (positive) / down  (negative)
// - Z: south (positive) / north (negative)

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// Identifier of a world partition (a dimension in host terms).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldId(pub i32);

/// A position inside a single world. Used for back-references that are only
/// meaningful within the world of the record holding them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Attach a world to this position.
    pub const fn in_world(self, world: WorldId) -> GridLocation {
        GridLocation {
            world,
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A cell address in the host grid: world plus integer coordinates.
///
/// Value type; equality and ordering use all four fields. The total order
/// lets locations key `BTreeSet`/`BTreeMap` visited sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridLocation {
    pub world: WorldId,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridLocation {
    pub const fn new(world: WorldId, x: i32, y: i32, z: i32) -> Self {
        Self { world, x, y, z }
    }

    /// The neighbouring cell one step in `dir`.
    pub fn offset(self, dir: Direction) -> Self {
        let (dx, dy, dz) = dir.to_offset();
        Self {
            world: self.world,
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// The in-world part of this location.
    pub const fn pos(self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for GridLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[world {}] ({}, {}, {})", self.world.0, self.x, self.y, self.z)
    }
}

/// The six axis-aligned directions, in host enumeration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Unit offset `(dx, dy, dz)` for this direction.
    pub const fn to_offset(self) -> (i32, i32, i32) {
        match self {
            Direction::Down => (0, -1, 0),
            Direction::Up => (0, 1, 0),
            Direction::North => (0, 0, -1),
            Direction::South => (0, 0, 1),
            Direction::West => (-1, 0, 0),
            Direction::East => (1, 0, 0),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::Down => Direction::Up,
            Direction::Up => Direction::Down,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

// ---------------------------------------------------------------------------
// Portal geometry
// ---------------------------------------------------------------------------

/// The plane a portal structure lies in.
///
/// `XAligned` spans X and Y at a fixed Z, `ZAligned` spans Z and Y at a
/// fixed X, `Horizontal` spans X and Z at a fixed Y.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    XAligned,
    ZAligned,
    Horizontal,
}

impl Orientation {
    /// Fixed attempt order for builds that do not name an orientation.
    pub const ALL: [Orientation; 3] = [
        Orientation::XAligned,
        Orientation::ZAligned,
        Orientation::Horizontal,
    ];

    /// The four in-plane neighbours inspected when counting frame sides.
    pub const fn frame_directions(self) -> [Direction; 4] {
        match self {
            Orientation::XAligned => [
                Direction::West,
                Direction::East,
                Direction::Up,
                Direction::Down,
            ],
            Orientation::ZAligned => [
                Direction::North,
                Direction::South,
                Direction::Up,
                Direction::Down,
            ],
            Orientation::Horizontal => [
                Direction::North,
                Direction::South,
                Direction::East,
                Direction::West,
            ],
        }
    }

    /// The four in-plane neighbours enqueued when a traversal grows.
    pub const fn growth_directions(self) -> [Direction; 4] {
        match self {
            Orientation::XAligned => [
                Direction::Up,
                Direction::Down,
                Direction::East,
                Direction::West,
            ],
            Orientation::ZAligned => [
                Direction::Up,
                Direction::Down,
                Direction::North,
                Direction::South,
            ],
            Orientation::Horizontal => [
                Direction::North,
                Direction::South,
                Direction::East,
                Direction::West,
            ],
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::XAligned => "X",
            Orientation::ZAligned => "Z",
            Orientation::Horizontal => "HORIZONTAL",
        };
        f.write_str(name)
    }
}

/// Which neighbours a traversal follows.
///
/// `Planar` stays inside one portal plane. `AllDirections` follows all six
/// axis neighbours and is used for teardown, where the shape is irrelevant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spread {
    Planar(Orientation),
    AllDirections,
}

impl Spread {
    /// Neighbour directions followed from each visited cell.
    pub fn directions(self) -> &'static [Direction] {
        static X: [Direction; 4] = Orientation::XAligned.growth_directions();
        static Z: [Direction; 4] = Orientation::ZAligned.growth_directions();
        static H: [Direction; 4] = Orientation::Horizontal.growth_directions();
        static ALL: [Direction; 6] = [
            Direction::Up,
            Direction::Down,
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ];
        match self {
            Spread::Planar(Orientation::XAligned) => &X,
            Spread::Planar(Orientation::ZAligned) => &Z,
            Spread::Planar(Orientation::Horizontal) => &H,
            Spread::AllDirections => &ALL,
        }
    }
}

impl From<Option<Orientation>> for Spread {
    fn from(orientation: Option<Orientation>) -> Self {
        orientation.map_or(Spread::AllDirections, Spread::Planar)
    }
}

// ---------------------------------------------------------------------------
// Blocks and textures
// ---------------------------------------------------------------------------

/// A block-type id from the host registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty cell.
    pub const AIR: BlockId = BlockId(0);
}

impl Default for BlockId {
    fn default() -> Self {
        Self::AIR
    }
}

/// The texture a portal cell or modifier displays.
///
/// "No texture requested" is expressed as `Option::<DisplayTexture>::None`
/// at the call sites that accept it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DisplayTexture {
    Black,
    Red,
    Green,
    Brown,
    Blue,
    Purple,
    Cyan,
    LightGray,
    Gray,
    Pink,
    Lime,
    Yellow,
    LightBlue,
    Magenta,
    Orange,
    White,
    Lava,
    Water,
}

impl Default for DisplayTexture {
    fn default() -> Self {
        Self::Purple
    }
}
