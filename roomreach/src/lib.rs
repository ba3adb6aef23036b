// The changes suggested by this lint usually make the code more cluttered and less clear:
#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod batch;
pub mod coarse;
pub mod config;
pub mod connectivity;
pub mod entrance_table;
pub mod error;
pub mod ground_truth;
pub mod report;
pub mod room;
pub mod scan;
