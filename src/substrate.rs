//! Substrate-partition helper models
//!
//! Small pure functions shared by the tank model and the simulator:
//! storage concentration from aerobic fitness, the empirical RER
//! polynomial, the exogenous oxidation ceiling, and the diet/activity
//! history estimators that feed the tank's filling factor.
//!
//! The numeric constants are empirical fits carried over unchanged from
//! the validated model (Burke et al. 2017; Jeukendrup 2004; Rothschild
//! et al. 2022); they are reproduced, not re-derived.

use serde::{Deserialize, Serialize};

use crate::models::{ChoMixType, FatigueState, SleepQuality};

/// Estimate muscle glycogen storage concentration (g/kg) from relative
/// VO2max (ml/kg/min). Linear in fitness, clamped to the physiological
/// range of 12-26 g/kg.
pub fn concentration_from_vo2max(vo2max_ml_kg_min: f64) -> f64 {
    let conc = 13.0 + (vo2max_ml_kg_min - 30.0) * 0.24;
    conc.clamp(12.0, 26.0)
}

/// Respiratory exchange ratio as a function of intensity factor.
///
/// Sixth-degree polynomial fit over the aerobic intensity range, clamped
/// to RER 0.70 (pure fat) .. 1.15 (supra-threshold glycolytic).
pub fn rer_polynomial(intensity_factor: f64) -> f64 {
    let x = intensity_factor;
    let rer = -0.000000149 * x.powi(6)
        + 141.538462237 * x.powi(5)
        - 565.128206259 * x.powi(4)
        + 890.333333976 * x.powi(3)
        - 691.67948706 * x.powi(2)
        + 265.460857558 * x
        - 39.525121144;
    rer.clamp(0.70, 1.15)
}

/// Carbohydrate fraction of the substrate mix implied by an RER value
pub fn cho_ratio_from_rer(rer: f64) -> f64 {
    ((rer - 0.70) * 3.45).clamp(0.0, 1.0)
}

/// Maximum exogenous carbohydrate oxidation rate (g/min).
///
/// Base rate of 0.8 g/min adjusted upward for stature and absolute power
/// output, scaled by the transporter uplift of the carbohydrate mix and
/// capped by the mix's absolute ceiling.
pub fn max_exogenous_oxidation(
    height_cm: f64,
    _weight_kg: f64,
    ftp_watts: f64,
    mix_type: ChoMixType,
) -> f64 {
    let mut base_rate = 0.8;

    if height_cm > 170.0 {
        base_rate += (height_cm - 170.0) * 0.015;
    }
    if ftp_watts > 200.0 {
        base_rate += (ftp_watts - 200.0) * 0.0015;
    }

    let estimated_g_h = base_rate * 60.0 * mix_type.oxidation_factor();

    (estimated_g_h / 60.0).min(mix_type.max_rate_g_h() / 60.0)
}

/// Depletion factor from one day of non-exercise activity history.
///
/// Steps above/below the 10k baseline and structured activity minutes
/// combine into a multiplicative correction in [0.6, 1.0]. With no
/// activity data at all the declared fatigue state stands in.
pub fn depletion_factor(steps: f64, activity_min: f64, fatigue: FatigueState) -> f64 {
    let steps_factor = (steps - 10_000.0) / 5_000.0 * 0.1 * 0.4;

    let activity_factor = if activity_min < 60.0 {
        (1.0 - activity_min / 60.0) * 0.05 * 0.6
    } else {
        (activity_min - 120.0) / 60.0 * -0.1 * 0.6
    };

    let estimated = (1.0 + steps_factor + activity_factor).clamp(0.6, 1.0);

    if steps == 0.0 && activity_min == 0.0 {
        fatigue.factor()
    } else {
        estimated
    }
}

/// One day of diet and activity history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyHistory {
    /// Total carbohydrate intake for the day (g)
    pub cho_intake_g: f64,
    /// Step count
    pub steps: f64,
    /// Structured activity minutes
    pub activity_min: f64,
}

/// Breakdown of the filling-factor estimate, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillingFactorEstimate {
    /// Final combined filling factor (diet x recovery x sleep)
    pub combined: f64,
    /// Diet x recovery component before the sleep correction
    pub diet_depletion_factor: f64,
    /// Weighted average carbohydrate intake (g/kg/day)
    pub avg_cho_g_kg: f64,
    /// Day -1 intake (g/kg)
    pub day1_cho_g_kg: f64,
    /// Day -2 intake (g/kg)
    pub day2_cho_g_kg: f64,
}

/// Estimate the tank filling factor from the prior 48h of diet, activity,
/// fatigue, and sleep.
///
/// Day -1 carries 70% of the weight, day -2 the remaining 30%. The diet
/// component is piecewise linear between the 2.5 / 5.0 / 10.0 g/kg/day
/// breakpoints, flooring at 0.5 and ceiling at 1.25 (supercompensation).
pub fn filling_factor_from_diet(
    weight_kg: f64,
    day1: DailyHistory,
    day2: DailyHistory,
    fatigue: FatigueState,
    sleep: SleepQuality,
) -> FillingFactorEstimate {
    const CHO_BASE_G_KG: f64 = 5.0;
    const CHO_MAX_G_KG: f64 = 10.0;
    const CHO_MIN_G_KG: f64 = 2.5;

    let day1_g = day1.cho_intake_g.max(1.0);
    let day2_g = day2.cho_intake_g.max(1.0);

    let day1_g_kg = day1_g / weight_kg;
    let day2_g_kg = day2_g / weight_kg;

    let depletion_d1 = depletion_factor(day1.steps, day1.activity_min, fatigue);
    let depletion_d2 = depletion_factor(day2.steps, day2.activity_min, fatigue);
    let recovery_factor = depletion_d1 * 0.7 + depletion_d2 * 0.3;

    let avg_cho_g_kg = day1_g_kg * 0.7 + day2_g_kg * 0.3;

    let diet_factor_base = if avg_cho_g_kg >= CHO_MAX_G_KG {
        1.25
    } else if avg_cho_g_kg >= CHO_BASE_G_KG {
        1.0 + (avg_cho_g_kg - CHO_BASE_G_KG) * (0.25 / (CHO_MAX_G_KG - CHO_BASE_G_KG))
    } else if avg_cho_g_kg > CHO_MIN_G_KG {
        let f = 0.5 + (avg_cho_g_kg - CHO_MIN_G_KG) * (0.5 / (CHO_BASE_G_KG - CHO_MIN_G_KG));
        f.max(0.5)
    } else {
        0.5
    };
    let diet_factor_base = diet_factor_base.clamp(0.5, 1.25);

    let diet_depletion_factor = diet_factor_base * recovery_factor;
    let combined = diet_depletion_factor * sleep.factor();

    FillingFactorEstimate {
        combined,
        diet_depletion_factor,
        avg_cho_g_kg,
        day1_cho_g_kg: day1_g_kg,
        day2_cho_g_kg: day2_g_kg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concentration_clamps() {
        // 30 ml/kg/min maps to the 13 g/kg anchor point
        assert!((concentration_from_vo2max(30.0) - 13.0).abs() < 1e-9);
        // Very low and very high fitness hit the clamps
        assert_eq!(concentration_from_vo2max(0.0), 12.0);
        assert_eq!(concentration_from_vo2max(100.0), 26.0);
    }

    #[test]
    fn test_concentration_monotone() {
        let mut last = concentration_from_vo2max(20.0);
        for v in 21..90 {
            let c = concentration_from_vo2max(v as f64);
            assert!(c >= last);
            last = c;
        }
    }

    #[test]
    fn test_rer_bounds() {
        for i in -20..=40 {
            let rer = rer_polynomial(i as f64 / 10.0);
            assert!((0.70..=1.15).contains(&rer), "RER out of range: {}", rer);
        }
    }

    #[test]
    fn test_rer_crossover_region() {
        // Around threshold intensity the mix must be CHO-dominant
        let rer = rer_polynomial(1.0);
        assert!(rer > 0.95);
        assert!(cho_ratio_from_rer(rer) > 0.85);
        // Low intensity sits near the fat floor
        assert_eq!(rer_polynomial(0.1), 0.70);
        assert_eq!(cho_ratio_from_rer(0.70), 0.0);
    }

    #[test]
    fn test_max_exogenous_oxidation() {
        // Short, low-FTP athlete on glucose only: the 0.8 g/min base
        let rate = max_exogenous_oxidation(165.0, 60.0, 180.0, ChoMixType::GlucoseOnly);
        assert!((rate - 0.8).abs() < 1e-9);

        // Tall, strong athlete on glucose only hits the 60 g/h mix cap
        let rate = max_exogenous_oxidation(190.0, 80.0, 350.0, ChoMixType::GlucoseOnly);
        assert!((rate - 1.0).abs() < 1e-9);

        // Same athlete on a 2:1 mix clears 60 g/h but stays under 90 g/h
        let rate = max_exogenous_oxidation(190.0, 80.0, 350.0, ChoMixType::Mix2to1);
        assert!(rate * 60.0 > 60.0);
        assert!(rate * 60.0 <= 90.0);
    }

    #[test]
    fn test_depletion_factor_fallback() {
        // No activity data: the fatigue state answers
        let f = depletion_factor(0.0, 0.0, FatigueState::Tired);
        assert!((f - 0.60).abs() < 1e-9);

        // Baseline day: near 1.0
        let f = depletion_factor(10_000.0, 120.0, FatigueState::Rested);
        assert!((f - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_depletion_factor_bounds() {
        let f = depletion_factor(40_000.0, 400.0, FatigueState::Rested);
        assert!((0.6..=1.0).contains(&f));
        let f = depletion_factor(500.0, 10.0, FatigueState::Rested);
        assert!((0.6..=1.0).contains(&f));
    }

    fn quiet_day(cho_g: f64) -> DailyHistory {
        DailyHistory {
            cho_intake_g: cho_g,
            steps: 10_000.0,
            activity_min: 120.0,
        }
    }

    #[test]
    fn test_filling_factor_baseline_diet() {
        // 5 g/kg/day for a 74 kg athlete is the 1.0 anchor
        let est = filling_factor_from_diet(
            74.0,
            quiet_day(370.0),
            quiet_day(370.0),
            FatigueState::Rested,
            SleepQuality::Good,
        );
        assert!((est.avg_cho_g_kg - 5.0).abs() < 1e-9);
        assert!((est.combined - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_filling_factor_carb_load_ceiling() {
        // 10+ g/kg/day caps at the supercompensation factor
        let est = filling_factor_from_diet(
            70.0,
            quiet_day(800.0),
            quiet_day(800.0),
            FatigueState::Rested,
            SleepQuality::Good,
        );
        assert!((est.diet_depletion_factor - 1.25).abs() < 0.02);
    }

    #[test]
    fn test_filling_factor_low_carb_floor() {
        let est = filling_factor_from_diet(
            70.0,
            quiet_day(50.0),
            quiet_day(50.0),
            FatigueState::Rested,
            SleepQuality::Good,
        );
        // Below 2.5 g/kg the diet component floors at 0.5
        assert!(est.diet_depletion_factor <= 0.5 + 1e-9);
        assert!(est.combined >= 0.3);
    }

    #[test]
    fn test_filling_factor_sleep_penalty() {
        let good = filling_factor_from_diet(
            74.0,
            quiet_day(370.0),
            quiet_day(370.0),
            FatigueState::Rested,
            SleepQuality::Good,
        );
        let poor = filling_factor_from_diet(
            74.0,
            quiet_day(370.0),
            quiet_day(370.0),
            FatigueState::Rested,
            SleepQuality::Poor,
        );
        assert!((poor.combined / good.combined - 0.85).abs() < 1e-9);
    }
}
