//! CSV export of simulation rows and balance projections

use std::io::Write;
use std::path::Path;

use crate::balance::{DailyBalance, HourlyLogRow};
use crate::error::ExportError;
use crate::models::SimulationRow;

/// Export per-minute simulation rows to CSV format
pub fn export_simulation_rows<P: AsRef<Path>>(
    rows: &[SimulationRow],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(file, "Time_Min,Muscle_G_H,Liver_G_H,Exogenous_G_H,Fat_G_H,Pct_Muscle,Pct_Liver,Pct_Exogenous,Pct_Fat,Residual_Muscle_G,Residual_Liver_G,Residual_Total_G,Target_Intake_G_H,Gut_Load_G,Cumulative_Intake_G,Cumulative_Oxidation_G,Intensity_Factor,RER,CHO_Pct,Status")?;

    for row in rows {
        writeln!(
            file,
            "{},{:.2},{:.2},{:.2},{:.2},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1},{:.2},{:.1},{:.1},{:.3},{:.3},{:.1},{:?}",
            row.time_min,
            row.muscle_g_h,
            row.liver_g_h,
            row.exogenous_g_h,
            row.fat_g_h,
            row.pct_muscle,
            row.pct_liver,
            row.pct_exogenous,
            row.pct_fat,
            row.residual_muscle_g,
            row.residual_liver_g,
            row.residual_total_g,
            row.target_intake_g_h,
            row.gut_load_g,
            row.cumulative_intake_g,
            row.cumulative_oxidation_g,
            row.intensity_factor,
            row.rer,
            row.cho_pct,
            row.status
        )?;
    }

    Ok(())
}

/// Export a weekly balance projection to CSV format
pub fn export_weekly_balance<P: AsRef<Path>>(
    days: &[DailyBalance],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Day,Muscle_G,Liver_G,Total_G,Workout,CHO_Intake_G,Estimated_Consumption_G,Net_Balance_G"
    )?;

    for day in days {
        writeln!(
            file,
            "{},{},{},{},\"{}\",{},{},{}",
            day.day,
            day.muscle_g,
            day.liver_g,
            day.total_g,
            day.workout.replace('"', "\"\""),
            day.cho_intake_g,
            day.estimated_consumption_g,
            day.net_balance_g
        )?;
    }

    Ok(())
}

/// Export an hourly tapering log to CSV format
pub fn export_hourly_log<P: AsRef<Path>>(
    rows: &[HourlyLogRow],
    output_path: P,
) -> Result<(), ExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(file, "Timestamp,Day,Hour,Status,Muscle_G,Liver_G,Total_G")?;

    for row in rows {
        writeln!(
            file,
            "{},{},{},{},{:.1},{:.1},{:.1}",
            row.timestamp.format("%Y-%m-%d %H:%M"),
            row.day,
            row.hour,
            row.status.label(),
            row.muscle_g,
            row.liver_g,
            row.total_g
        )?;
    }

    Ok(())
}
