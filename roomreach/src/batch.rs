use std::sync::Arc;

use anyhow::Error;
use log::{info, warn};
use rayon::prelude::*;

use crate::config::{EngineConfig, GraphScope};
use crate::connectivity::{ConnectivityBuilder, EntranceRooms, RoomGraph};
use crate::entrance_table::EntranceTable;
use crate::error::ClassificationError;
use crate::ground_truth::{Entrance, GroundTruth};

#[derive(Debug)]
pub enum EntranceOutcome {
    Completed(EntranceRooms),
    Failed { entrance: u8, error: Error },
}

impl EntranceOutcome {
    pub fn entrance(&self) -> u8 {
        match self {
            EntranceOutcome::Completed(rooms) => rooms.entrance.id,
            EntranceOutcome::Failed { entrance, .. } => *entrance,
        }
    }

    pub fn rooms(&self) -> Option<&EntranceRooms> {
        match self {
            EntranceOutcome::Completed(rooms) => Some(rooms),
            EntranceOutcome::Failed { .. } => None,
        }
    }

    /// The tile grammar violation behind a failure, if that is what it was.
    pub fn classification_error(&self) -> Option<&ClassificationError> {
        match self {
            EntranceOutcome::Completed(_) => None,
            EntranceOutcome::Failed { error, .. } => error.downcast_ref::<ClassificationError>(),
        }
    }
}

/// Result of one entrance and the room graph it was built in. With a shared
/// graph scope every run holds the same graph.
pub struct EntranceRun {
    pub outcome: EntranceOutcome,
    pub graph: Arc<RoomGraph>,
}

pub struct BatchRunner<'a, G: GroundTruth + Clone> {
    config: &'a EngineConfig,
    ground_truth: &'a G,
    static_table: Option<&'a EntranceTable>,
    parallel: bool,
}

impl<'a, G: GroundTruth + Clone> BatchRunner<'a, G> {
    pub fn new(config: &'a EngineConfig, ground_truth: &'a G) -> Self {
        BatchRunner {
            config,
            ground_truth,
            static_table: None,
            parallel: false,
        }
    }

    pub fn with_static_table(mut self, table: &'a EntranceTable) -> Self {
        self.static_table = Some(table);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Processes every entrance. A failing entrance is recorded and does not
    /// stop the others.
    pub fn run(&self, entrances: &[Entrance]) -> Vec<EntranceRun> {
        let shared = match self.config.graph_scope {
            GraphScope::Shared => Some(Arc::new(RoomGraph::new())),
            GraphScope::PerEntrance => None,
        };
        let run_one = |entrance: &Entrance| {
            let graph = match &shared {
                Some(graph) => graph.clone(),
                None => Arc::new(RoomGraph::new()),
            };
            let outcome = self.run_entrance(entrance, &graph);
            EntranceRun { outcome, graph }
        };

        let runs: Vec<EntranceRun> = if self.parallel {
            entrances.par_iter().map(run_one).collect()
        } else {
            entrances.iter().map(run_one).collect()
        };

        let failed = runs
            .iter()
            .filter(|r| matches!(r.outcome, EntranceOutcome::Failed { .. }))
            .count();
        info!(
            "processed {} entrances: {} completed, {failed} failed",
            runs.len(),
            runs.len() - failed
        );
        runs
    }

    fn run_entrance(&self, entrance: &Entrance, graph: &RoomGraph) -> EntranceOutcome {
        let ground_truth = self.ground_truth.clone();
        let mut builder = ConnectivityBuilder::new(self.config, &ground_truth, graph);
        if let Some(table) = self.static_table {
            builder = builder.with_static_table(table);
        }
        match builder.process_entrance(entrance) {
            Ok(rooms) => EntranceOutcome::Completed(rooms),
            Err(error) => {
                warn!("entrance ${:02x} failed: {error:#}", entrance.id);
                EntranceOutcome::Failed {
                    entrance: entrance.id,
                    error,
                }
            }
        }
    }
}
