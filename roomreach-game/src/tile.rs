//! Tile byte semantics.
//!
//! The predicates work directly on the tile byte; `TileKind` is the single
//! classification the scanner and the connectivity builder match on.

use serde::{Deserialize, Serialize};

use crate::Direction;
use crate::Direction::{East, North, South, West};

/// Walkable regardless of any room state.
pub fn is_always_walkable(v: u8) -> bool {
    matches!(
        v,
        0x00                // no collision
        | 0x09              // shallow water
        | 0x22              // manual stairs
        | 0x23..=0x24       // floor switches
        | 0x0D..=0x0F       // spikes / floor ice
        | 0x3A..=0x3B       // star tiles
        | 0x40              // thick grass
        | 0x4B              // warp
        | 0x60              // rupee tile
        | 0x68..=0x6B       // conveyors
        | 0xA0 // north/south dungeon swap door
    )
}

/// Walkable depending on object state (pots, pegs, blocks, bombable floor).
pub fn is_maybe_walkable(v: u8) -> bool {
    v & 0xF0 == 0x70 || v == 0x62 || v == 0x66 || v == 0x67
}

pub fn can_hook_thru(v: u8) -> bool {
    is_always_walkable(v)
        || matches!(
            v,
            0x08            // deep water
            | 0x1C | 0x0C   // layer pass through
            | 0x20          // pit
            | 0x28..=0x2B   // ledges
            | 0xB6 | 0xBC // pipe starts
        )
}

/// The hookshot can latch onto this tile.
pub fn is_hookable(v: u8) -> bool {
    v == 0x27 || (0x58..=0x5D).contains(&v) || v & 0xF0 == 0x70
}

/// Diagonal movement may squeeze past this tile.
pub fn can_diagonal(v: u8) -> bool {
    v == 0x20 || v & 0xF0 == 0xB0
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    NorthSouth,
    EastWest,
}

impl Axis {
    /// Doorway tiles alternate axis by the low bit.
    pub fn of_doorway(v: u8) -> Axis {
        if v & 1 == 0 {
            Axis::NorthSouth
        } else {
            Axis::EastWest
        }
    }

    pub fn contains(self, d: Direction) -> bool {
        match self {
            Axis::NorthSouth => d.is_vertical(),
            Axis::EastWest => d.is_horizontal(),
        }
    }

    /// Directions to scout when a doorway is entered without a heading.
    pub fn directions(self) -> [Direction; 2] {
        match self {
            Axis::NorthSouth => [Direction::South, Direction::North],
            Axis::EastWest => [Direction::West, Direction::East],
        }
    }
}

/// Somaria/pipe maze tiles (0xB0..=0xBE).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipeKind {
    Straight,
    /// (approach, leave) pairs.
    Turn(&'static [(Direction, Direction)]),
    LineExit,
    Junction(&'static [Direction]),
    ExitCandidate,
    CrossOver,
    Exit,
}

impl PipeKind {
    pub fn from_byte(v: u8) -> Option<PipeKind> {
        let kind = match v {
            0xB0 | 0xB1 => PipeKind::Straight,
            0xB2 => PipeKind::Turn(&[(West, South), (North, East)]),
            0xB3 => PipeKind::Turn(&[(South, East), (West, North)]),
            0xB4 => PipeKind::Turn(&[(North, West), (East, South)]),
            0xB5 => PipeKind::Turn(&[(East, North), (South, West)]),
            0xB6 => PipeKind::LineExit,
            0xB7 => PipeKind::Junction(&[South, West, East]),
            0xB8 => PipeKind::Junction(&[North, West, East]),
            0xB9 => PipeKind::Junction(&[North, East, South]),
            0xBA => PipeKind::Junction(&[North, West, South]),
            0xBB => PipeKind::Junction(&[North, West, South, East]),
            0xBC => PipeKind::ExitCandidate,
            0xBD => PipeKind::CrossOver,
            0xBE => PipeKind::Exit,
            _ => return None,
        };
        Some(kind)
    }

    /// Outgoing heading of a turn piece, if it accepts this approach.
    pub fn turn(self, approach: Direction) -> Option<Direction> {
        match self {
            PipeKind::Turn(pairs) => pairs
                .iter()
                .find(|(from, _)| *from == approach)
                .map(|(_, to)| *to),
            _ => None,
        }
    }

    /// Junctions are re-enterable from a different side, so they are never
    /// recorded as visited. Same for the exit candidate and cross-over.
    pub fn marks_visited(self) -> bool {
        !matches!(
            self,
            PipeKind::Junction(_) | PipeKind::ExitCandidate | PipeKind::CrossOver
        )
    }
}

pub fn is_straight_pipe(v: u8) -> bool {
    v == 0xB0 || v == 0xB1
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TileKind {
    Floor,
    DeepWater,
    ShallowWater,
    DeepWaterLadder,
    ScrollingFloor,
    /// Spikes and floor ice.
    Hazard,
    LayerPassThrough,
    NorthStairs,
    NorthStairsLayerSwap,
    Pit,
    ManualStairs,
    FloorSwitch,
    HookTarget,
    Ledge(Direction),
    /// Interroom stair exits; `index` selects the room's stair exit slot.
    StairExit {
        index: usize,
        descending: bool,
    },
    StraightStairs(Direction),
    StarTile,
    SouthStairs,
    SouthStairsLayerSwap,
    ThickGrass,
    WarpFloor,
    Chest(u8),
    SpiralStairs,
    RupeeFloor,
    BombableFloor,
    CrystalPeg,
    Conveyor,
    Manipulable(u8),
    Doorway(Axis),
    TeleportDoorway,
    EntranceDoorway(Axis),
    ToggleDoorway,
    DungeonSwapDoor,
    Pipe(PipeKind),
    Door(u8),
    Solid(u8),
}

impl TileKind {
    pub fn classify(v: u8) -> TileKind {
        match v {
            0x00 => TileKind::Floor,
            0x08 => TileKind::DeepWater,
            0x09 => TileKind::ShallowWater,
            0x0A => TileKind::DeepWaterLadder,
            0x0C => TileKind::ScrollingFloor,
            0x0D..=0x0F => TileKind::Hazard,
            0x1C => TileKind::LayerPassThrough,
            0x1D => TileKind::NorthStairs,
            0x1E..=0x1F => TileKind::NorthStairsLayerSwap,
            0x20 => TileKind::Pit,
            0x22 => TileKind::ManualStairs,
            0x23..=0x24 => TileKind::FloorSwitch,
            0x27 => TileKind::HookTarget,
            0x28..=0x2B => match Direction::try_from(v - 0x28) {
                Ok(d) => TileKind::Ledge(d),
                Err(_) => TileKind::Solid(v),
            },
            0x30..=0x37 => TileKind::StairExit {
                index: (v & 3) as usize,
                descending: v & 4 != 0,
            },
            0x38 => TileKind::StraightStairs(Direction::North),
            0x39 => TileKind::StraightStairs(Direction::South),
            0x3A..=0x3B => TileKind::StarTile,
            0x3D => TileKind::SouthStairs,
            0x3E..=0x3F => TileKind::SouthStairsLayerSwap,
            0x40 => TileKind::ThickGrass,
            0x4B => TileKind::WarpFloor,
            0x58..=0x5D => TileKind::Chest(v - 0x58),
            0x5E..=0x5F => TileKind::SpiralStairs,
            0x60 => TileKind::RupeeFloor,
            0x62 => TileKind::BombableFloor,
            0x66..=0x67 => TileKind::CrystalPeg,
            0x68..=0x6B => TileKind::Conveyor,
            0x70..=0x7F => TileKind::Manipulable(v & 0x0F),
            0x89 => TileKind::TeleportDoorway,
            0x80..=0x8D => TileKind::Doorway(Axis::of_doorway(v)),
            0x8E => TileKind::EntranceDoorway(Axis::NorthSouth),
            0x8F => TileKind::EntranceDoorway(Axis::EastWest),
            0xA0 => TileKind::DungeonSwapDoor,
            0x90..=0xAF => TileKind::ToggleDoorway,
            0xB0..=0xBE => match PipeKind::from_byte(v) {
                Some(p) => TileKind::Pipe(p),
                None => TileKind::Solid(v),
            },
            0xF0..=0xFF => TileKind::Door(v),
            _ => TileKind::Solid(v),
        }
    }
}
