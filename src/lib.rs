pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod liftover;
pub mod utils;
pub mod web;

pub use adapters::{EnsemblClient, GnomadClient};
pub use config::{CliConfig, TomlConfig};
pub use core::{LiftoverPipeline, SingleLookup};
pub use domain::{ConversionDirection, ConversionResult, FailurePolicy, GenomicCoordinate};
pub use liftover::{ChainMappings, CoordinateConverter};
pub use utils::error::{LiftoverError, Result};
pub use web::{build_router, AppState};
