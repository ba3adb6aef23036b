use std::path::Path;

use anyhow::{Context, Result, ensure};
use hashbrown::HashSet;
use roomreach_game::Supertile;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Whether entrances share one room graph or each build their own.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum GraphScope {
    #[default]
    PerEntrance,
    Shared,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq, Display, EnumString)]
pub enum ScanMode {
    #[default]
    FloodFill,
    /// Rooms are taken from a precomputed entrance table instead of being
    /// discovered.
    Static,
}

fn default_hookshot_max_tiles() -> usize {
    0x10
}

fn default_doorway_swap_scan_tiles() -> usize {
    8
}

/// Immutable game layout and engine knobs handed to the connectivity builder.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Rooms whose pits hurt instead of dropping to the warp exit.
    #[serde(default)]
    pub pit_damage_rooms: HashSet<Supertile>,
    #[serde(default)]
    pub graph_scope: GraphScope,
    #[serde(default)]
    pub scan_mode: ScanMode,
    #[serde(default = "default_hookshot_max_tiles")]
    pub hookshot_max_tiles: usize,
    #[serde(default = "default_doorway_swap_scan_tiles")]
    pub doorway_swap_scan_tiles: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            pit_damage_rooms: HashSet::new(),
            graph_scope: GraphScope::default(),
            scan_mode: ScanMode::default(),
            hookshot_max_tiles: default_hookshot_max_tiles(),
            doorway_swap_scan_tiles: default_doorway_swap_scan_tiles(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<EngineConfig> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read engine config at {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("Unable to parse {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<EngineConfig> {
        let config: EngineConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.hookshot_max_tiles > 0 && self.hookshot_max_tiles <= 0x3F,
            "hookshot_max_tiles out of range: {}",
            self.hookshot_max_tiles
        );
        ensure!(
            self.doorway_swap_scan_tiles > 0 && self.doorway_swap_scan_tiles <= 0x3F,
            "doorway_swap_scan_tiles out of range: {}",
            self.doorway_swap_scan_tiles
        );
        Ok(())
    }

    pub fn has_pit_damage(&self, st: Supertile) -> bool {
        self.pit_damage_rooms.contains(&st)
    }
}
