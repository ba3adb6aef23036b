use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Direction, Supertile};

/// Tile address within a room: `layer(0x1000) | row(6 bits) << 6 | col(6 bits)`.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapCoord(pub u16);

const EDGE: u16 = 0x3F;
// Rows/cols within this many tiles of a border count as a door edge:
const DOOR_EDGE: u16 = 0x08;

impl MapCoord {
    pub const LAYER2: u16 = 0x1000;
    pub const MASK: u16 = 0x1FFF;

    pub fn new(layer: u16, row: u16, col: u16) -> MapCoord {
        MapCoord((layer & Self::LAYER2) | (row & EDGE) << 6 | (col & EDGE))
    }

    /// Modeled after the game's tilemap coordinate conversion: absolute pixel
    /// coordinates to an 8x8 tile address.
    pub fn from_abs(abs_x: u16, abs_y: u16, layer: u16) -> MapCoord {
        let c = (abs_y & 0x01F8) << 3 | (abs_x & 0x01F8) >> 3;
        if layer != 0 {
            MapCoord(c | Self::LAYER2)
        } else {
            MapCoord(c)
        }
    }

    pub fn to_abs(self, st: Supertile) -> (u16, u16) {
        let (_, row, col) = self.row_col();
        let mut x = (col << 3).wrapping_add(0x1);
        let mut y = (row << 3).wrapping_sub(0xE);
        y = y.wrapping_add((st.0 & 0xF0) << 5);
        x = x.wrapping_add((st.0 & 0x0F) << 9);
        (x, y)
    }

    pub fn index(self) -> usize {
        (self.0 & Self::MASK) as usize
    }

    pub fn layer(self) -> u16 {
        self.0 & Self::LAYER2
    }

    pub fn is_layer2(self) -> bool {
        self.0 & Self::LAYER2 != 0
    }

    pub fn row(self) -> u16 {
        (self.0 & 0x0FC0) >> 6
    }

    pub fn col(self) -> u16 {
        self.0 & 0x003F
    }

    pub fn row_col(self) -> (u16, u16, u16) {
        (self.layer(), self.row(), self.col())
    }

    /// Same row/col on the other layer.
    pub fn flip_layer(self) -> MapCoord {
        MapCoord(self.0 ^ Self::LAYER2)
    }

    pub fn with_layer(self, layer: u16) -> MapCoord {
        MapCoord((self.0 & 0x0FFF) | (layer & Self::LAYER2))
    }

    /// Raw tile-address arithmetic, wrapping within the two-layer grid.
    pub fn offset(self, delta: i32) -> MapCoord {
        MapCoord((i32::from(self.0) + delta).rem_euclid(0x2000) as u16)
    }

    /// Moves `n` tiles in `dir`. Refuses to run along an outer edge row/col
    /// (this keeps the flood fill from leaking around the border) and refuses
    /// to move past the grid.
    pub fn move_by(self, dir: Direction, n: u16) -> Option<MapCoord> {
        let (_, row, col) = self.row_col();

        if (row == 0 || row == EDGE) && !dir.is_vertical() {
            return None;
        }
        if (col == 0 || col == EDGE) && !dir.is_horizontal() {
            return None;
        }

        match dir {
            Direction::North if row >= n => Some(MapCoord(self.0 - (n << 6))),
            Direction::South if row + n <= EDGE => Some(MapCoord(self.0 + (n << 6))),
            Direction::West if col >= n => Some(MapCoord(self.0 - n)),
            Direction::East if col + n <= EDGE => Some(MapCoord(self.0 + n)),
            _ => None,
        }
    }

    /// The outer edge this coordinate lies on, if any.
    pub fn is_edge(self) -> Option<Direction> {
        let (_, row, col) = self.row_col();
        if row == 0 {
            Some(Direction::North)
        } else if row == EDGE {
            Some(Direction::South)
        } else if col == 0 {
            Some(Direction::West)
        } else if col == EDGE {
            Some(Direction::East)
        } else {
            None
        }
    }

    /// The door zone (within 8 tiles of a border) this coordinate lies in, if any.
    pub fn is_door_edge(self) -> Option<Direction> {
        let (_, row, col) = self.row_col();
        if row <= DOOR_EDGE {
            Some(Direction::North)
        } else if row >= EDGE - DOOR_EDGE {
            Some(Direction::South)
        } else if col <= DOOR_EDGE {
            Some(Direction::West)
        } else if col >= EDGE - DOOR_EDGE {
            Some(Direction::East)
        } else {
            None
        }
    }

    /// Projects this coordinate onto the given outer edge.
    pub fn on_edge(self, dir: Direction) -> MapCoord {
        let (layer, row, col) = self.row_col();
        match dir {
            Direction::North => MapCoord::new(layer, 0, col),
            Direction::South => MapCoord::new(layer, EDGE, col),
            Direction::West => MapCoord::new(layer, row, 0),
            Direction::East => MapCoord::new(layer, row, EDGE),
            Direction::None => self,
        }
    }

    /// Mirror of an edge coordinate on the opposite edge.
    pub fn opposite_edge(self) -> Option<MapCoord> {
        let (layer, row, col) = self.row_col();
        match self.is_edge()? {
            Direction::North => Some(MapCoord::new(layer, EDGE, col)),
            Direction::South => Some(MapCoord::new(layer, 0, col)),
            Direction::West => Some(MapCoord::new(layer, row, EDGE)),
            Direction::East => Some(MapCoord::new(layer, row, 0)),
            Direction::None => None,
        }
    }
}

impl Display for MapCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "${:04x}={{{:02x},{:02x}}}", self.0, self.row(), self.col())
    }
}

impl Debug for MapCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
