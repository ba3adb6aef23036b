use std::fmt::{self, Display, Formatter};
use std::path::Path;

use anyhow::{Context, Result, ensure};
use hashbrown::HashSet;
use roomreach_game::Supertile;
use serde::{Deserialize, Serialize};

use crate::connectivity::EntranceRooms;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceSupertiles {
    pub entrance: u8,
    pub supertiles: Vec<Supertile>,
}

/// Which rooms each entrance reaches. Produced by a flood-fill run and read
/// back in static scan mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntranceTable {
    pub entrances: Vec<EntranceSupertiles>,
}

impl EntranceTable {
    pub fn from_rooms<'a>(rooms: impl IntoIterator<Item = &'a EntranceRooms>) -> EntranceTable {
        let mut entrances: Vec<EntranceSupertiles> = rooms
            .into_iter()
            .map(|r| EntranceSupertiles {
                entrance: r.entrance.id,
                supertiles: r.supertiles.clone(),
            })
            .collect();
        entrances.sort_by_key(|e| e.entrance);
        EntranceTable { entrances }
    }

    pub fn load(path: &Path) -> Result<EntranceTable> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read entrance table at {}", path.display()))?;
        let table: EntranceTable = serde_json::from_str(&s)
            .with_context(|| format!("Unable to parse {}", path.display()))?;
        table.validate()?;
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self)?;
        std::fs::write(path, s)
            .with_context(|| format!("Unable to write entrance table to {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for e in &self.entrances {
            ensure!(seen.insert(e.entrance), "entrance ${:02x} listed twice", e.entrance);
        }
        Ok(())
    }

    pub fn get(&self, entrance: u8) -> Option<&EntranceSupertiles> {
        self.entrances.iter().find(|e| e.entrance == entrance)
    }
}

impl Display for EntranceSupertiles {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "entrance ${:02x}:", self.entrance)?;
        for (i, st) in self.supertiles.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{st}")?;
        }
        Ok(())
    }
}

impl Display for EntranceTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for e in &self.entrances {
            writeln!(f, "{e}")?;
        }
        Ok(())
    }
}
