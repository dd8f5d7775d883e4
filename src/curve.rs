//! Lab metabolic curve interpolation
//!
//! Metabolograph reports arrive as tables of CHO/FAT oxidation rates
//! against a measured intensity axis (power, heart rate, or speed). The
//! simulator samples the curve by linear interpolation; outside the
//! measured range the endpoints are held.

use serde::{Deserialize, Serialize};

/// Which intensity axis of the curve to interpolate over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityColumn {
    Watts,
    HeartRate,
    Speed,
}

impl IntensityColumn {
    pub fn label(&self) -> &'static str {
        match self {
            IntensityColumn::Watts => "Watt",
            IntensityColumn::HeartRate => "HR",
            IntensityColumn::Speed => "Speed",
        }
    }
}

/// One measured point of a metabolic curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Power at this stage (W), if measured
    pub watts: Option<f64>,
    /// Heart rate at this stage (bpm), if measured
    pub heart_rate: Option<f64>,
    /// Speed at this stage (km/h), if measured
    pub speed_kmh: Option<f64>,
    /// Carbohydrate oxidation (g/h)
    pub cho_g_h: f64,
    /// Fat oxidation (g/h)
    pub fat_g_h: f64,
}

impl CurvePoint {
    fn axis_value(&self, column: IntensityColumn) -> Option<f64> {
        match column {
            IntensityColumn::Watts => self.watts,
            IntensityColumn::HeartRate => self.heart_rate,
            IntensityColumn::Speed => self.speed_kmh,
        }
    }
}

/// Lab-measured CHO/FAT-vs-intensity curve
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetabolicCurve {
    pub points: Vec<CurvePoint>,
}

impl MetabolicCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Which intensity axes have data on every point
    pub fn available_columns(&self) -> Vec<IntensityColumn> {
        [
            IntensityColumn::Watts,
            IntensityColumn::HeartRate,
            IntensityColumn::Speed,
        ]
        .into_iter()
        .filter(|col| {
            !self.points.is_empty() && self.points.iter().all(|p| p.axis_value(*col).is_some())
        })
        .collect()
    }

    /// Linearly interpolate (CHO g/h, FAT g/h) at the given intensity.
    ///
    /// Extrapolation clamps to the curve endpoints. An empty curve, or a
    /// column with no data, yields (0, 0).
    pub fn interpolate(&self, x: f64, column: IntensityColumn) -> (f64, f64) {
        let mut samples: Vec<(f64, f64, f64)> = self
            .points
            .iter()
            .filter_map(|p| p.axis_value(column).map(|v| (v, p.cho_g_h, p.fat_g_h)))
            .collect();

        if samples.is_empty() {
            return (0.0, 0.0);
        }

        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let first = samples[0];
        let last = samples[samples.len() - 1];
        if x <= first.0 {
            return (first.1, first.2);
        }
        if x >= last.0 {
            return (last.1, last.2);
        }

        for pair in samples.windows(2) {
            let (x0, cho0, fat0) = pair[0];
            let (x1, cho1, fat1) = pair[1];
            if x >= x0 && x <= x1 {
                if (x1 - x0).abs() < f64::EPSILON {
                    return (cho0, fat0);
                }
                let t = (x - x0) / (x1 - x0);
                return (cho0 + t * (cho1 - cho0), fat0 + t * (fat1 - fat0));
            }
        }

        (last.1, last.2)
    }

    /// Normalize apparent g/min units to g/h.
    ///
    /// Metabolograph exports are inconsistent; when the largest CHO value
    /// is below 10 the table is almost certainly g/min and gets scaled.
    pub fn normalize_units(&mut self) -> bool {
        let max_cho = self
            .points
            .iter()
            .map(|p| p.cho_g_h)
            .fold(f64::NEG_INFINITY, f64::max);

        if !self.points.is_empty() && max_cho < 10.0 {
            for p in &mut self.points {
                p.cho_g_h *= 60.0;
                p.fat_g_h *= 60.0;
            }
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watts_point(watts: f64, cho: f64, fat: f64) -> CurvePoint {
        CurvePoint {
            watts: Some(watts),
            heart_rate: None,
            speed_kmh: None,
            cho_g_h: cho,
            fat_g_h: fat,
        }
    }

    fn test_curve() -> MetabolicCurve {
        MetabolicCurve::new(vec![
            watts_point(100.0, 30.0, 40.0),
            watts_point(200.0, 90.0, 30.0),
            watts_point(300.0, 180.0, 10.0),
        ])
    }

    #[test]
    fn test_interpolation_midpoint() {
        let curve = test_curve();
        let (cho, fat) = curve.interpolate(150.0, IntensityColumn::Watts);
        assert!((cho - 60.0).abs() < 1e-9);
        assert!((fat - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_exact_point() {
        let curve = test_curve();
        let (cho, fat) = curve.interpolate(200.0, IntensityColumn::Watts);
        assert!((cho - 90.0).abs() < 1e-9);
        assert!((fat - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_extrapolation_clamps_to_endpoints() {
        let curve = test_curve();
        assert_eq!(curve.interpolate(50.0, IntensityColumn::Watts), (30.0, 40.0));
        assert_eq!(curve.interpolate(400.0, IntensityColumn::Watts), (180.0, 10.0));
    }

    #[test]
    fn test_empty_curve_yields_zero() {
        let curve = MetabolicCurve::default();
        assert_eq!(curve.interpolate(200.0, IntensityColumn::Watts), (0.0, 0.0));
    }

    #[test]
    fn test_missing_column_yields_zero() {
        let curve = test_curve();
        assert_eq!(
            curve.interpolate(150.0, IntensityColumn::HeartRate),
            (0.0, 0.0)
        );
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_interpolation() {
        let curve = MetabolicCurve::new(vec![
            watts_point(300.0, 180.0, 10.0),
            watts_point(100.0, 30.0, 40.0),
            watts_point(200.0, 90.0, 30.0),
        ]);
        let (cho, _) = curve.interpolate(150.0, IntensityColumn::Watts);
        assert!((cho - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_unit_normalization_heuristic() {
        // Values under 10 look like g/min and get scaled to g/h
        let mut curve = MetabolicCurve::new(vec![
            watts_point(100.0, 0.5, 0.6),
            watts_point(200.0, 1.5, 0.5),
        ]);
        assert!(curve.normalize_units());
        assert!((curve.points[1].cho_g_h - 90.0).abs() < 1e-9);

        // Already g/h: untouched
        let mut curve = test_curve();
        assert!(!curve.normalize_units());
        assert!((curve.points[1].cho_g_h - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_available_columns() {
        let curve = test_curve();
        assert_eq!(curve.available_columns(), vec![IntensityColumn::Watts]);
        assert!(MetabolicCurve::default().available_columns().is_empty());
    }
}
