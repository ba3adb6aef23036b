use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use roomreach::batch::{BatchRunner, EntranceOutcome};
use roomreach::coarse::walk_dungeons;
use roomreach::config::{EngineConfig, ScanMode};
use roomreach::connectivity::RoomGraph;
use roomreach::entrance_table::EntranceTable;
use roomreach::ground_truth::{GroundTruth, SnapshotDir};
use roomreach::report::{summarize, write_reachable, write_summaries};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
struct Args {
    /// Directory holding entrances.json and rooms/
    #[arg(long)]
    snapshot_dir: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,

    /// First entrance to process, in hex
    #[arg(long)]
    entrance_min: Option<String>,

    /// Last entrance to process, in hex
    #[arg(long)]
    entrance_max: Option<String>,

    #[arg(long)]
    output_entrance_table: Option<PathBuf>,

    #[arg(long)]
    output_room_summaries: Option<PathBuf>,

    /// Directory for per-room reachable overlays
    #[arg(long)]
    output_reachable: Option<PathBuf>,

    /// Use a precomputed entrance table instead of the flood fill
    #[arg(long)]
    static_table: Option<PathBuf>,

    /// Only walk dungeons at the supertile level
    #[arg(long)]
    coarse: bool,

    #[arg(long)]
    parallel: bool,
}

fn parse_hex(s: &str) -> Result<u8> {
    let digits = s.trim_start_matches('$').trim_start_matches("0x");
    u8::from_str_radix(digits, 16).with_context(|| format!("invalid entrance id {s}"))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let static_table = match &args.static_table {
        Some(path) => {
            config.scan_mode = ScanMode::Static;
            Some(EntranceTable::load(path)?)
        }
        None => None,
    };

    let ground_truth = SnapshotDir::open(&args.snapshot_dir)?;
    let min = args.entrance_min.as_deref().map(parse_hex).transpose()?;
    let max = args.entrance_max.as_deref().map(parse_hex).transpose()?;
    let entrances: Vec<_> = ground_truth
        .entrances()
        .into_iter()
        .filter(|e| min.map_or(true, |m| e.id >= m) && max.map_or(true, |m| e.id <= m))
        .collect();
    info!("{} entrances selected", entrances.len());

    if args.coarse {
        for dungeon in walk_dungeons(&ground_truth, &entrances)? {
            let supertiles: Vec<String> =
                dungeon.supertiles.iter().map(|st| st.to_string()).collect();
            println!(
                "dungeon {:02x}: {}",
                dungeon.dungeon_id,
                supertiles.join(", ")
            );
        }
        return Ok(());
    }

    let mut runner = BatchRunner::new(&config, &ground_truth).parallel(args.parallel);
    if let Some(table) = &static_table {
        runner = runner.with_static_table(table);
    }
    let runs = runner.run(&entrances);

    for run in &runs {
        if let EntranceOutcome::Failed { entrance, error } = &run.outcome {
            warn!("entrance ${entrance:02x}: {error:#}");
        }
    }

    let table = EntranceTable::from_rooms(runs.iter().filter_map(|r| r.outcome.rooms()));
    print!("{table}");
    if let Some(path) = &args.output_entrance_table {
        table.save(path)?;
        info!("Wrote entrance table to {}", path.display());
    }

    // runs share a graph when the graph scope is shared
    let mut graphs: Vec<Arc<RoomGraph>> = vec![];
    for run in &runs {
        if !graphs.iter().any(|g| Arc::ptr_eq(g, &run.graph)) {
            graphs.push(run.graph.clone());
        }
    }

    if let Some(path) = &args.output_room_summaries {
        let mut summaries = vec![];
        for graph in &graphs {
            summaries.extend(summarize(graph)?);
        }
        write_summaries(&summaries, path)?;
        info!("Wrote {} room summaries to {}", summaries.len(), path.display());
    }

    if let Some(dir) = &args.output_reachable {
        let mut count = 0;
        for graph in &graphs {
            count += write_reachable(graph, dir)?;
        }
        info!("Wrote {count} reachable overlays to {}", dir.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("1f").unwrap(), 0x1F);
        assert_eq!(parse_hex("$04").unwrap(), 0x04);
        assert_eq!(parse_hex("0x85").unwrap(), 0x85);
        assert!(parse_hex("zz").is_err());
    }
}
