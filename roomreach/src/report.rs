use std::path::Path;

use anyhow::{Context, Result};
use roomreach_game::{MapCoord, Supertile};
use serde::{Deserialize, Serialize};

use crate::connectivity::RoomGraph;
use crate::room::{EntryPoint, ExitPoint, RoomState};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub supertile: Supertile,
    pub entry_points: Vec<EntryPoint>,
    pub exit_points: Vec<ExitPoint>,
    /// Interroom staircases listed in the room header.
    pub stairs: Vec<MapCoord>,
    pub reachable_count: usize,
    pub hookshot_spans: usize,
}

impl RoomSummary {
    pub fn of(room: &RoomState) -> RoomSummary {
        RoomSummary {
            supertile: room.supertile,
            entry_points: room.entry_points.clone(),
            exit_points: room.exit_points.clone(),
            stairs: room.stairs.clone(),
            reachable_count: room.reachable_count(),
            hookshot_spans: room.hookshot.len(),
        }
    }
}

pub fn summarize(graph: &RoomGraph) -> Result<Vec<RoomSummary>> {
    let mut summaries = Vec::new();
    for st in graph.supertiles()? {
        if let Some(summary) = graph.with_room(st, RoomSummary::of)? {
            summaries.push(summary);
        }
    }
    Ok(summaries)
}

pub fn write_summaries(summaries: &[RoomSummary], path: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(summaries)?;
    std::fs::write(path, s)
        .with_context(|| format!("Unable to write room summaries to {}", path.display()))?;
    Ok(())
}

/// Writes each room's reachable overlay as a raw `XXX.rch` file.
pub fn write_reachable(graph: &RoomGraph, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Unable to create {}", dir.display()))?;
    let mut count = 0;
    for st in graph.supertiles()? {
        let path = dir.join(format!("{:03X}.rch", st.0));
        let written = graph.with_room(st, |room| std::fs::write(&path, room.reachable.as_bytes()))?;
        if let Some(res) = written {
            res.with_context(|| format!("Unable to write {}", path.display()))?;
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground_truth::{InertTags, RoomMeta, RoomSnapshot};
    use crate::room::TileMap;

    #[test]
    fn test_summary_lists_stairs_and_reach() -> Result<()> {
        let stairs = vec![MapCoord::new(0, 0x20, 0x24)];
        let snapshot = RoomSnapshot {
            tiles: TileMap::filled(0x00),
            meta: RoomMeta {
                stairs: stairs.clone(),
                ..RoomMeta::default()
            },
        };
        let graph = RoomGraph::new();
        graph.get_or_insert(Supertile(0x12), || {
            let mut room = RoomState::new(Supertile(0x12), snapshot, Box::new(InertTags));
            room.mark_reachable(MapCoord::new(0, 0x10, 0x10), 0x00);
            Ok(room)
        })?;

        let summaries = summarize(&graph)?;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].stairs, stairs);
        assert_eq!(summaries[0].reachable_count, 1);

        let json = serde_json::to_value(&summaries[0])?;
        assert_eq!(json["stairs"], serde_json::json!([0x0824]));
        Ok(())
    }
}
