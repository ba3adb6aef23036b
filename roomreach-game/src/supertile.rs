use std::fmt::{self, Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Direction;

/// One underworld room. The low byte is `row << 4 | col` on a 16x16 grid; bit
/// 0x100 selects the second overlay map (EG2).
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Supertile(pub u16);

impl Supertile {
    pub const EG2: u16 = 0x100;

    pub fn is_eg2(self) -> bool {
        self.0 & Self::EG2 != 0
    }

    pub fn row(self) -> u16 {
        (self.0 & 0xF0) >> 4
    }

    pub fn col(self) -> u16 {
        self.0 & 0x0F
    }

    /// Neighboring room in the given direction. Movement never leaves the
    /// 16x16 grid and never crosses between EG1 and EG2.
    pub fn move_by(self, dir: Direction) -> Option<Supertile> {
        let eg = self.0 & 0xFF00;
        let low = self.0 & 0x00FF;
        let next = match dir {
            Direction::North if low & 0xF0 > 0 => low - 0x10,
            Direction::South if low & 0xF0 < 0xF0 => low + 0x10,
            Direction::West if low & 0x0F > 0 => low - 1,
            Direction::East if low & 0x0F < 0x0F => low + 1,
            _ => return None,
        };
        Some(Supertile(eg | next))
    }

    /// Carries the EG2 bit of `from` over to this room; header links are
    /// stored as single bytes.
    pub fn in_map_of(self, from: Supertile) -> Supertile {
        Supertile(self.0 | (from.0 & Self::EG2))
    }
}

impl Display for Supertile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "${:03x}", self.0)
    }
}

impl Debug for Supertile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}
