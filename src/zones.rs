//! Training zone tables
//!
//! Power zones for cycling (Coggan 7-zone model from FTP) and heart rate
//! zones for running (LTHR-anchored bands), as displayed alongside the
//! simulation to anchor intensity factors to familiar ranges.

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::error::CalculationError;

/// One display row of a zone table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct ZoneRow {
    /// Zone label, e.g. "Z2 - Endurance"
    #[tabled(rename = "Zone")]
    pub zone: String,
    /// Percentage range relative to the threshold
    #[tabled(rename = "Range %")]
    pub range_pct: String,
    /// Absolute value range (watts or bpm)
    #[tabled(rename = "Value")]
    pub value: String,
}

/// Zone calculation utilities
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Cycling power zones from FTP (7-zone model).
    ///
    /// Boundaries: 55 / 75 / 90 / 105 / 120 / 150 % of FTP.
    pub fn cycling_power_zones(ftp_watts: f64) -> Result<Vec<ZoneRow>, CalculationError> {
        if ftp_watts <= 0.0 {
            return Err(CalculationError::InvalidParameter {
                calculation: "cycling power zones".to_string(),
                parameter: "ftp_watts".to_string(),
                value: ftp_watts.to_string(),
            });
        }

        let w = |pct: f64| (ftp_watts * pct) as i64;

        Ok(vec![
            ZoneRow {
                zone: "Z1 - Active Recovery".to_string(),
                range_pct: "< 55%".to_string(),
                value: format!("< {} W", w(0.55)),
            },
            ZoneRow {
                zone: "Z2 - Endurance".to_string(),
                range_pct: "56 - 75%".to_string(),
                value: format!("{} - {} W", w(0.56), w(0.75)),
            },
            ZoneRow {
                zone: "Z3 - Tempo".to_string(),
                range_pct: "76 - 90%".to_string(),
                value: format!("{} - {} W", w(0.76), w(0.90)),
            },
            ZoneRow {
                zone: "Z4 - Threshold (FTP)".to_string(),
                range_pct: "91 - 105%".to_string(),
                value: format!("{} - {} W", w(0.91), w(1.05)),
            },
            ZoneRow {
                zone: "Z5 - VO2max".to_string(),
                range_pct: "106 - 120%".to_string(),
                value: format!("{} - {} W", w(1.06), w(1.20)),
            },
            ZoneRow {
                zone: "Z6 - Anaerobic Capacity".to_string(),
                range_pct: "121 - 150%".to_string(),
                value: format!("{} - {} W", w(1.21), w(1.50)),
            },
            ZoneRow {
                zone: "Z7 - Neuromuscular Power".to_string(),
                range_pct: "> 150%".to_string(),
                value: format!("> {} W", w(1.50)),
            },
        ])
    }

    /// Running heart rate zones from LTHR.
    ///
    /// Boundaries: 85 / 89 / 94 / 99 / 102 / 106 % of LTHR.
    pub fn running_hr_zones(lthr_bpm: f64) -> Result<Vec<ZoneRow>, CalculationError> {
        if lthr_bpm <= 0.0 {
            return Err(CalculationError::InvalidParameter {
                calculation: "running HR zones".to_string(),
                parameter: "lthr_bpm".to_string(),
                value: lthr_bpm.to_string(),
            });
        }

        let hr = |pct: f64| (lthr_bpm * pct) as i64;

        Ok(vec![
            ZoneRow {
                zone: "Z1 - Recovery".to_string(),
                range_pct: "< 85% LTHR".to_string(),
                value: format!("< {} bpm", hr(0.85)),
            },
            ZoneRow {
                zone: "Z2 - Aerobic".to_string(),
                range_pct: "85 - 89% LTHR".to_string(),
                value: format!("{} - {} bpm", hr(0.85), hr(0.89)),
            },
            ZoneRow {
                zone: "Z3 - Tempo".to_string(),
                range_pct: "90 - 94% LTHR".to_string(),
                value: format!("{} - {} bpm", hr(0.90), hr(0.94)),
            },
            ZoneRow {
                zone: "Z4 - Sub-Threshold".to_string(),
                range_pct: "95 - 99% LTHR".to_string(),
                value: format!("{} - {} bpm", hr(0.95), hr(0.99)),
            },
            ZoneRow {
                zone: "Z5a - Super-Threshold".to_string(),
                range_pct: "100 - 102% LTHR".to_string(),
                value: format!("{} - {} bpm", hr(1.00), hr(1.02)),
            },
            ZoneRow {
                zone: "Z5b - Aerobic Capacity".to_string(),
                range_pct: "103 - 106% LTHR".to_string(),
                value: format!("{} - {} bpm", hr(1.03), hr(1.06)),
            },
            ZoneRow {
                zone: "Z5c - Anaerobic Power".to_string(),
                range_pct: "> 106% LTHR".to_string(),
                value: format!("> {} bpm", hr(1.06)),
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycling_zones_from_250w() {
        let zones = ZoneCalculator::cycling_power_zones(250.0).unwrap();
        assert_eq!(zones.len(), 7);
        assert_eq!(zones[0].value, "< 137 W");
        assert_eq!(zones[3].zone, "Z4 - Threshold (FTP)");
        assert_eq!(zones[3].value, "227 - 262 W");
        assert_eq!(zones[6].value, "> 375 W");
    }

    #[test]
    fn test_running_zones_from_170bpm() {
        let zones = ZoneCalculator::running_hr_zones(170.0).unwrap();
        assert_eq!(zones.len(), 7);
        assert_eq!(zones[0].value, "< 144 bpm");
        assert_eq!(zones[4].value, "170 - 173 bpm");
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(matches!(
            ZoneCalculator::cycling_power_zones(0.0),
            Err(CalculationError::InvalidParameter { .. })
        ));
        assert!(matches!(
            ZoneCalculator::running_hr_zones(-10.0),
            Err(CalculationError::InvalidParameter { .. })
        ));
    }
}
