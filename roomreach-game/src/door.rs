use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{Direction, MapCoord};

/// Door object type byte from the room's door table.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorType(pub u8);

impl DoorType {
    pub const EXPLODING_WALL: DoorType = DoorType(0x30);

    /// Doors leading out of the dungeon.
    pub fn is_exit(self) -> bool {
        matches!(self.0, 0x04..=0x06 | 0x0A..=0x12 | 0x2A)
    }

    pub fn is_layer2(self) -> bool {
        matches!(
            self.0,
            0x02 | 0x04 | 0x06 | 0x0C | 0x10 | 0x24 | 0x26 | 0x3A | 0x3C | 0x3E | 0x40 | 0x44 | 0x48..=0x66
        )
    }

    pub fn is_stairwell(self) -> bool {
        (0x20..=0x26).contains(&self.0)
    }
}

impl Display for DoorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "${:02x}", self.0)
    }
}

/// One entry of the room's door table; `pos` is the top-left tile of the
/// 4x4 door block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    pub door_type: DoorType,
    pub pos: MapCoord,
    pub dir: Direction,
}

impl Display for Door {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}, {}}}", self.door_type, self.pos, self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_door_type_ranges() {
        assert!(DoorType(0x04).is_exit());
        assert!(DoorType(0x12).is_exit());
        assert!(DoorType(0x2A).is_exit());
        assert!(!DoorType(0x2E).is_exit());
        assert!(!DoorType(0x30).is_exit());
        assert!(DoorType(0x50).is_layer2());
        assert!(!DoorType(0x08).is_layer2());
        assert!(DoorType(0x22).is_stairwell());
        assert!(!DoorType(0x28).is_stairwell());
    }
}
