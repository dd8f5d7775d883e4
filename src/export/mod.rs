//! Simulation result exporters

use std::path::Path;

use crate::balance::{DailyBalance, HourlyLogRow};
use crate::error::{ExportError, Result};
use crate::simulator::SimulationOutput;

pub mod csv;
#[cfg(feature = "charts")]
pub mod charts;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat {
                format: s.to_string(),
            }
            .into()),
        }
    }

    /// Infer the format from a file extension, defaulting to CSV
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Write a simulation run to the given path in the given format
pub fn export_simulation<P: AsRef<Path>>(
    output: &SimulationOutput,
    format: ExportFormat,
    path: P,
) -> Result<()> {
    match format {
        ExportFormat::Csv => csv::export_simulation_rows(&output.rows, path)?,
        ExportFormat::Json => json::export_simulation_report(output, path)?,
    }
    Ok(())
}

/// Write a weekly balance projection to CSV
pub fn export_weekly<P: AsRef<Path>>(days: &[DailyBalance], path: P) -> Result<()> {
    csv::export_weekly_balance(days, path)?;
    Ok(())
}

/// Write an hourly tapering log to CSV
pub fn export_hourly<P: AsRef<Path>>(rows: &[HourlyLogRow], path: P) -> Result<()> {
    csv::export_hourly_log(rows, path)?;
    Ok(())
}
