//! JSON export of full simulation reports

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::models::{SimulationRow, SimulationStats};
use crate::simulator::{ComparisonOutput, SimulationOutput};

/// Serialized report wrapper with provenance metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub bonk_time_min: Option<u32>,
    pub stats: SimulationStats,
    pub rows: Vec<SimulationRow>,
}

impl SimulationReport {
    pub fn from_output(output: &SimulationOutput) -> Self {
        SimulationReport {
            generated_at: chrono::Utc::now(),
            bonk_time_min: output.bonk_time(),
            stats: output.stats.clone(),
            rows: output.rows.clone(),
        }
    }
}

/// Export a simulation run as pretty-printed JSON
pub fn export_simulation_report<P: AsRef<Path>>(
    output: &SimulationOutput,
    output_path: P,
) -> Result<(), ExportError> {
    let report = SimulationReport::from_output(output);
    let file = std::fs::File::create(&output_path)?;
    serde_json::to_writer_pretty(file, &report).map_err(|e| ExportError::ExportFailed {
        path: output_path.as_ref().to_path_buf(),
        reason: e.to_string(),
    })
}

/// Export a strategy-vs-fasting comparison as pretty-printed JSON
pub fn export_comparison<P: AsRef<Path>>(
    comparison: &ComparisonOutput,
    output_path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(&output_path)?;
    serde_json::to_writer_pretty(file, comparison).map_err(|e| ExportError::ExportFailed {
        path: output_path.as_ref().to_path_buf(),
        reason: e.to_string(),
    })
}
