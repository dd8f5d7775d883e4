//! Minute-stepped metabolic simulator
//!
//! Single forward pass over the effort duration, integrating four
//! competing energy substrates (muscle glycogen, liver glycogen,
//! exogenous carbohydrate, fat) under time-varying intensity. Exogenous
//! oxidation follows first-order absorption kinetics toward a
//! mix-dependent ceiling; muscle output saturates as the tank empties;
//! the liver is capped at a fixed peak output. Reserve exhaustion is a
//! modeled outcome, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curve::MetabolicCurve;
use crate::models::{
    ActivityParameters, ChoMixType, ReserveStatus, SimulationRow, SimulationStats, SportMode,
    Subject, TankState,
};
use crate::substrate::{cho_ratio_from_rer, max_exogenous_oxidation, rer_polynomial};

/// Peak hepatic glucose output (g/min)
const MAX_LIVER_OUTPUT_G_MIN: f64 = 1.2;

/// Saturation exponent for the muscle contribution throttle
const MUSCLE_SATURATION_EXP: f64 = 0.6;

/// Energy density of blended carbohydrate (kcal/g)
const KCAL_PER_G_CHO: f64 = 4.1;

/// Energy density of fat (kcal/g)
const KCAL_PER_G_FAT: f64 = 9.0;

/// Joules per kcal, for the cycling power-to-energy conversion
const JOULES_PER_KCAL: f64 = 4184.0;

/// Everything a single simulation run needs beyond the tank itself.
/// All quantities arrive explicitly; the simulator reads no ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    /// Effort duration in minutes; the run produces floor(duration)+1 rows
    pub duration_min: f64,

    /// Fueling strategy target (g/h); 0 simulates fasting
    pub target_intake_g_h: f64,

    /// Grams of carbohydrate per ingested dose (gel/bottle unit)
    pub cho_per_dose_g: f64,

    /// Absorption lag time constant (minutes)
    pub tau_min: f64,

    /// Fraction of ingested carbohydrate that becomes oxidizable
    pub oxidation_efficiency: f64,

    /// Override for the estimated exogenous oxidation ceiling (g/min)
    pub max_exo_rate_override: Option<f64>,

    /// Carbohydrate mix ingested during the effort
    pub mix_type: ChoMixType,

    /// Per-minute intensity factors overriding the constant reference
    pub intensity_series: Option<Vec<f64>>,
}

impl Default for SimulationInputs {
    fn default() -> Self {
        Self {
            duration_min: 180.0,
            target_intake_g_h: 60.0,
            cho_per_dose_g: 30.0,
            tau_min: 12.0,
            oxidation_efficiency: 0.80,
            max_exo_rate_override: None,
            mix_type: ChoMixType::GlucoseOnly,
            intensity_series: None,
        }
    }
}

/// Complete result of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub rows: Vec<SimulationRow>,
    pub stats: SimulationStats,
}

impl SimulationOutput {
    /// Earliest minute at which the athlete "bonks": liver fully empty
    /// or muscle glycogen at or below 20 g
    pub fn bonk_time(&self) -> Option<u32> {
        self.rows
            .iter()
            .find(|r| r.residual_liver_g <= 0.0 || r.residual_muscle_g <= 20.0)
            .map(|r| r.time_min)
    }
}

/// Strategy-vs-fasting comparison: two independent runs from the same tank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutput {
    /// Run with the requested fueling strategy
    pub strategy: SimulationOutput,
    /// Run with intake forced to zero
    pub fasting: SimulationOutput,
}

/// Instantaneous substrate demand for one minute
struct SubstrateDemand {
    /// Total carbohydrate demand (g/min)
    total_cho_g_min: f64,
    /// Fat oxidation (g/min)
    fat_g_min: f64,
    rer: f64,
    /// Carbohydrate fraction of total substrate energy
    cho_ratio: f64,
}

/// Substrate-ratio determination strategy: either the empirical RER
/// polynomial or an uploaded lab curve. Selected once per invocation.
trait SubstrateModel {
    fn demand(&self, t: u32, intensity_factor: f64, kcal_demand: f64) -> SubstrateDemand;
}

/// Formula-based partitioning: RER polynomial with a crossover-point
/// shift and a late-exercise glycolytic-to-lipolytic drift
struct RerFormulaModel {
    crossover_pct: f64,
}

impl SubstrateModel for RerFormulaModel {
    fn demand(&self, t: u32, intensity_factor: f64, kcal_demand: f64) -> SubstrateDemand {
        // Shifting the effective intensity moves the athlete's crossover
        // point away from the 75% population reference
        let mut effective_if = intensity_factor + (75.0 - self.crossover_pct) / 100.0;
        if effective_if < 0.3 {
            effective_if = 0.3;
        }

        let rer = rer_polynomial(effective_if);
        let base_cho_ratio = cho_ratio_from_rer(rer);

        let mut cho_ratio = base_cho_ratio;
        if intensity_factor < 0.85 && t > 60 {
            let hours_past = (t as f64 - 60.0) / 60.0;
            let metabolic_shift = 0.05 * hours_past.powf(1.2);
            cho_ratio = (base_cho_ratio - metabolic_shift).max(0.05);
        }

        let kcal_cho = kcal_demand * cho_ratio;

        SubstrateDemand {
            total_cho_g_min: kcal_cho / KCAL_PER_G_CHO,
            fat_g_min: kcal_demand * (1.0 - cho_ratio) / KCAL_PER_G_FAT,
            rer,
            cho_ratio,
        }
    }
}

/// Lab-data partitioning: interpolates the uploaded metabolograph curve
/// at the current intensity proxy
struct LabCurveModel<'a> {
    curve: &'a MetabolicCurve,
    activity: &'a ActivityParameters,
}

impl LabCurveModel<'_> {
    /// Map the current intensity factor onto the curve's measured axis
    fn intensity_proxy(&self, intensity_factor: f64) -> f64 {
        let reference_if = self.activity.intensity_factor;
        match self.activity.metabolic_x_col {
            crate::curve::IntensityColumn::Watts => {
                if self.activity.mode == SportMode::Cycling {
                    intensity_factor * self.activity.ftp_watts
                } else {
                    self.activity.avg_watts
                }
            }
            crate::curve::IntensityColumn::HeartRate => {
                if reference_if > 0.0 {
                    self.activity.avg_hr * intensity_factor / reference_if
                } else {
                    self.activity.avg_hr
                }
            }
            crate::curve::IntensityColumn::Speed => self.activity.speed_kmh,
        }
    }
}

impl SubstrateModel for LabCurveModel<'_> {
    fn demand(&self, t: u32, intensity_factor: f64, _kcal_demand: f64) -> SubstrateDemand {
        let x = self.intensity_proxy(intensity_factor);
        let (cho_g_h, fat_g_h) = self
            .curve
            .interpolate(x, self.activity.metabolic_x_col);

        let fatigue_drift = if t > 60 {
            1.0 + (t as f64 - 60.0) * 0.001
        } else {
            1.0
        };

        let total_cho_g_min = cho_g_h / 60.0 * fatigue_drift;
        let fat_g_min = fat_g_h / 60.0;

        let total_substrate = total_cho_g_min + fat_g_min;
        let cho_ratio = if total_substrate > 0.0 {
            total_cho_g_min / total_substrate
        } else {
            1.0
        };

        // Synthetic RER for reporting; the curve bypasses the polynomial
        let rer = 0.7 + 0.3 * cho_ratio;

        SubstrateDemand {
            total_cho_g_min,
            fat_g_min,
            rer,
            cho_ratio,
        }
    }
}

/// The metabolic simulation engine
pub struct Simulator;

impl Simulator {
    /// Run a single forward pass over the effort.
    ///
    /// Operates on working copies of the tank's reserves; the tank,
    /// subject, and activity parameters are never mutated. Calling twice
    /// with identical inputs yields bit-identical rows.
    pub fn simulate(
        tank: &TankState,
        subject: &Subject,
        activity: &ActivityParameters,
        inputs: &SimulationInputs,
    ) -> SimulationOutput {
        let total_minutes = inputs.duration_min.max(0.0).floor() as u32;

        debug!(
            duration_min = total_minutes,
            intake_g_h = inputs.target_intake_g_h,
            mode = ?activity.mode,
            lab_data = activity.use_lab_data,
            "Simulation run"
        );

        let initial_muscle = tank.muscle_glycogen_g;
        let initial_liver = tank.liver_glycogen_g;

        let mut current_muscle = initial_muscle;
        let mut current_liver = initial_liver;

        let reference_if = activity.intensity_factor;

        // Running/other modes share a base rate scaled per minute;
        // cycling recomputes demand from instantaneous power
        let kcal_per_min_base = match activity.mode {
            SportMode::Cycling => {
                (activity.avg_watts * 60.0)
                    / JOULES_PER_KCAL
                    / (activity.gross_efficiency_pct / 100.0)
            }
            SportMode::Running => subject.weight_kg * activity.speed_kmh / 60.0,
            SportMode::Other => subject.vo2max_absolute_l_min * reference_if * 5.0,
        };

        let max_exo_rate_g_min = inputs.max_exo_rate_override.unwrap_or_else(|| {
            max_exogenous_oxidation(
                subject.height_cm,
                subject.weight_kg,
                activity.ftp_watts,
                inputs.mix_type,
            )
        });

        let empty_curve = MetabolicCurve::default();
        let lab_model;
        let formula_model;
        let model: &dyn SubstrateModel = if activity.use_lab_data {
            lab_model = LabCurveModel {
                curve: activity.metabolic_curve.as_ref().unwrap_or(&empty_curve),
                activity,
            };
            &lab_model
        } else {
            formula_model = RerFormulaModel {
                crossover_pct: activity.crossover_pct,
            };
            &formula_model
        };

        let alpha = 1.0 - (-1.0 / inputs.tau_min).exp();
        let is_input_zero = inputs.target_intake_g_h == 0.0;

        let units_per_hour = if inputs.cho_per_dose_g > 0.0 {
            inputs.target_intake_g_h / inputs.cho_per_dose_g
        } else {
            0.0
        };
        let intake_interval_min: u32 = if units_per_hour > 0.0 {
            (60.0 / units_per_hour).round().max(1.0) as u32
        } else {
            total_minutes + 1
        };

        let mut current_exo_oxidation_g_min = 0.0_f64;
        let mut gut_accumulation = 0.0_f64;
        let mut total_fat_burned = 0.0_f64;
        let mut total_muscle_used = 0.0_f64;
        let mut total_liver_used = 0.0_f64;
        let mut total_exo_used = 0.0_f64;
        let mut cumulative_intake = 0.0_f64;
        let mut cumulative_oxidation = 0.0_f64;

        let mut last_kcal_demand = 0.0_f64;
        let mut last_rer = 0.0_f64;
        let mut last_cho_ratio = 0.0_f64;

        let mut rows = Vec::with_capacity(total_minutes as usize + 1);

        for t in 0..=total_minutes {
            let current_if = inputs
                .intensity_series
                .as_ref()
                .and_then(|series| series.get(t as usize).copied())
                .unwrap_or(reference_if);

            let kcal_demand = match activity.mode {
                SportMode::Cycling => {
                    let instant_power = current_if * activity.ftp_watts;
                    let mut efficiency = activity.gross_efficiency_pct;
                    if t > 60 {
                        // Fatigue degrades mechanical efficiency past the
                        // first hour, floored at 15%
                        let loss = (t as f64 - 60.0) * 0.02;
                        efficiency = (activity.gross_efficiency_pct - loss).max(15.0);
                    }
                    (instant_power * 60.0) / JOULES_PER_KCAL / (efficiency / 100.0)
                }
                SportMode::Running | SportMode::Other => {
                    let demand_scaling = if reference_if > 0.0 {
                        current_if / reference_if
                    } else {
                        1.0
                    };
                    let drift_factor = if t > 60 {
                        1.0 + (t as f64 - 60.0) * 0.0005
                    } else {
                        1.0
                    };
                    kcal_per_min_base * drift_factor * demand_scaling
                }
            };

            // Dosing happens on the interval derived from the target rate
            let mut ingested_g = 0.0;
            if !is_input_zero
                && intake_interval_min <= total_minutes
                && t > 0
                && t % intake_interval_min == 0
            {
                ingested_g = inputs.cho_per_dose_g;
            }

            let target_exo_limit = max_exo_rate_g_min * inputs.oxidation_efficiency;

            if t > 0 {
                if is_input_zero {
                    // No intake: oxidation decays toward zero
                    current_exo_oxidation_g_min *= 1.0 - alpha;
                } else {
                    // First-order lag toward the absorption ceiling
                    current_exo_oxidation_g_min +=
                        alpha * (target_exo_limit - current_exo_oxidation_g_min);
                }
                if current_exo_oxidation_g_min < 0.0 {
                    current_exo_oxidation_g_min = 0.0;
                }
            } else {
                current_exo_oxidation_g_min = 0.0;
            }

            if t > 0 {
                gut_accumulation +=
                    ingested_g * inputs.oxidation_efficiency - current_exo_oxidation_g_min;
                if gut_accumulation < 0.0 {
                    gut_accumulation = 0.0;
                }

                cumulative_intake += ingested_g;
                cumulative_oxidation += current_exo_oxidation_g_min;
            }

            let demand = model.demand(t, current_if, kcal_demand);

            // Muscle output throttles as the tank empties: a saturation
            // curve steeper than linear near full, flatter near empty
            let muscle_fill_state = if initial_muscle > 0.0 {
                current_muscle / initial_muscle
            } else {
                0.0
            };
            let muscle_contribution = muscle_fill_state.powf(MUSCLE_SATURATION_EXP);

            let mut muscle_usage = demand.total_cho_g_min * muscle_contribution;
            if current_muscle <= 0.0 {
                muscle_usage = 0.0;
            }

            let blood_glucose_demand = demand.total_cho_g_min - muscle_usage;
            let from_exogenous = blood_glucose_demand.min(current_exo_oxidation_g_min);

            let remaining_blood_demand = blood_glucose_demand - from_exogenous;
            let mut from_liver = remaining_blood_demand.min(MAX_LIVER_OUTPUT_G_MIN);
            if current_liver <= 0.0 {
                from_liver = 0.0;
            }
            // Unmet demand beyond these sources is simply not served

            if t > 0 {
                current_muscle -= muscle_usage;
                current_liver -= from_liver;
                if current_muscle < 0.0 {
                    current_muscle = 0.0;
                }
                if current_liver < 0.0 {
                    current_liver = 0.0;
                }

                total_fat_burned += demand.fat_g_min;
                total_muscle_used += muscle_usage;
                total_liver_used += from_liver;
                total_exo_used += from_exogenous;
            }

            let status = if current_liver < 20.0 {
                ReserveStatus::Critical
            } else if current_muscle < 100.0 {
                ReserveStatus::Warning
            } else {
                ReserveStatus::Optimal
            };

            let g_fat = demand.fat_g_min;
            let mut total_g_min = muscle_usage + from_liver + from_exogenous + g_fat;
            if total_g_min == 0.0 {
                total_g_min = 1.0;
            }

            rows.push(SimulationRow {
                time_min: t,
                muscle_g_h: muscle_usage * 60.0,
                liver_g_h: from_liver * 60.0,
                exogenous_g_h: from_exogenous * 60.0,
                fat_g_h: g_fat * 60.0,
                pct_muscle: muscle_usage / total_g_min * 100.0,
                pct_liver: from_liver / total_g_min * 100.0,
                pct_exogenous: from_exogenous / total_g_min * 100.0,
                pct_fat: g_fat / total_g_min * 100.0,
                residual_muscle_g: current_muscle,
                residual_liver_g: current_liver,
                residual_total_g: current_muscle + current_liver,
                target_intake_g_h: inputs.target_intake_g_h,
                gut_load_g: gut_accumulation,
                cumulative_intake_g: cumulative_intake,
                cumulative_oxidation_g: cumulative_oxidation,
                intensity_factor: current_if,
                rer: demand.rer,
                cho_pct: demand.cho_ratio * 100.0,
                status,
            });

            last_kcal_demand = kcal_demand;
            last_rer = demand.rer;
            last_cho_ratio = demand.cho_ratio;
        }

        let stats = SimulationStats {
            final_muscle_g: current_muscle,
            final_liver_g: current_liver,
            final_glycogen_g: current_muscle + current_liver,
            total_muscle_used_g: total_muscle_used,
            total_liver_used_g: total_liver_used,
            total_exogenous_used_g: total_exo_used,
            total_fat_g: total_fat_burned,
            kcal_per_hour_final: last_kcal_demand * 60.0,
            gut_accumulation_g_h: if inputs.duration_min > 0.0 {
                gut_accumulation / inputs.duration_min * 60.0
            } else {
                0.0
            },
            max_exo_capacity_g_h: max_exo_rate_g_min * 60.0,
            intensity_factor: reference_if,
            avg_rer: last_rer,
            gross_efficiency_pct: activity.gross_efficiency_pct,
            intake_g_h: inputs.target_intake_g_h,
            cho_pct: last_cho_ratio * 100.0,
        };

        SimulationOutput { rows, stats }
    }

    /// Run the strategy-vs-fasting comparison: the requested fueling
    /// plan and an identical run with intake forced to zero, from the
    /// same starting tank. Independent, sequential runs.
    pub fn compare(
        tank: &TankState,
        subject: &Subject,
        activity: &ActivityParameters,
        inputs: &SimulationInputs,
    ) -> ComparisonOutput {
        let strategy = Self::simulate(tank, subject, activity, inputs);

        let fasting_inputs = SimulationInputs {
            target_intake_g_h: 0.0,
            ..inputs.clone()
        };
        let fasting = Self::simulate(tank, subject, activity, &fasting_inputs);

        ComparisonOutput { strategy, fasting }
    }
}
