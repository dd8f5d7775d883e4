// Library interface for GlycoSim modules
// This allows integration tests to access the core functionality

pub mod balance;
pub mod config;
pub mod curve;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod simulator;
pub mod substrate;
pub mod tank;
pub mod zones;

// Re-export commonly used types for convenience
pub use models::*;
pub use curve::{IntensityColumn, MetabolicCurve};
pub use error::{GlycoError, Result};
pub use import::{MetabolicImporter, ZwoImporter, ZwoWorkout};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use simulator::{ComparisonOutput, SimulationInputs, SimulationOutput, Simulator};
pub use tank::TankCalculator;
pub use zones::ZoneCalculator;
