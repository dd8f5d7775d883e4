use glycosim::balance::{self, IntensityBand, PlannedDay, PlannedWorkout};
use glycosim::models::{
    ActivityParameters, ChoMixType, FatigueState, Sex, SleepQuality, SportType, Subject,
};
use glycosim::substrate::{
    cho_ratio_from_rer, concentration_from_vo2max, filling_factor_from_diet,
    max_exogenous_oxidation, rer_polynomial, DailyHistory,
};
use glycosim::{SimulationInputs, Simulator, TankCalculator};

use proptest::prelude::*;

fn arb_sex() -> impl Strategy<Value = Sex> {
    prop_oneof![Just(Sex::Male), Just(Sex::Female)]
}

fn arb_sport() -> impl Strategy<Value = SportType> {
    prop_oneof![
        Just(SportType::Cycling),
        Just(SportType::Running),
        Just(SportType::Triathlon),
        Just(SportType::Swimming),
    ]
}

fn arb_mix() -> impl Strategy<Value = ChoMixType> {
    prop_oneof![
        Just(ChoMixType::GlucoseOnly),
        Just(ChoMixType::Mix2to1),
        Just(ChoMixType::Mix1to08),
    ]
}

fn arb_subject() -> impl Strategy<Value = Subject> {
    (
        45.0..120.0f64,
        150.0..210.0f64,
        0.05..0.35f64,
        arb_sex(),
        12.0..26.0f64,
        arb_sport(),
        0.5..1.25f64,
        any::<bool>(),
    )
        .prop_map(
            |(weight, height, bf, sex, conc, sport, filling, creatine)| Subject {
                weight_kg: weight,
                height_cm: height,
                body_fat_pct: bf,
                sex,
                glycogen_conc_g_kg: conc,
                sport,
                filling_factor: filling,
                uses_creatine: creatine,
                ..Subject::default()
            },
        )
}

proptest! {
    #[test]
    fn tank_invariants_hold_for_any_subject(subject in arb_subject()) {
        let tank = TankCalculator::compute_tank(&subject);

        prop_assert!(tank.active_muscle_kg > 0.0);
        prop_assert!(tank.muscle_glycogen_g >= 0.0);
        prop_assert!(tank.liver_glycogen_g >= 0.0);
        prop_assert!(tank.max_capacity_g > 0.0);
        prop_assert!(
            (tank.muscle_glycogen_g + tank.liver_glycogen_g - tank.actual_available_g).abs()
                < 1e-9
        );
        // Physiological ceiling on muscle storage density
        prop_assert!(tank.muscle_glycogen_g <= tank.active_muscle_kg * 35.0 + 1e-9);
        prop_assert!(tank.fill_pct >= 0.0);
    }

    #[test]
    fn simulation_rows_stay_physical(
        subject in arb_subject(),
        duration in 0u32..480,
        intake in 0.0..150.0f64,
        intensity in 0.3..1.2f64,
        mix in arb_mix(),
    ) {
        let tank = TankCalculator::compute_tank(&subject);
        let activity = ActivityParameters {
            intensity_factor: intensity,
            avg_watts: intensity * 250.0,
            ..ActivityParameters::default()
        };
        let inputs = SimulationInputs {
            duration_min: duration as f64,
            target_intake_g_h: intake,
            mix_type: mix,
            ..SimulationInputs::default()
        };
        let out = Simulator::simulate(&tank, &subject, &activity, &inputs);

        prop_assert_eq!(out.rows.len(), duration as usize + 1);

        let mut prev_total = f64::INFINITY;
        for row in &out.rows {
            prop_assert!(row.residual_muscle_g >= 0.0);
            prop_assert!(row.residual_liver_g >= 0.0);
            prop_assert!(row.gut_load_g >= 0.0);
            prop_assert!(row.fat_g_h >= 0.0);
            prop_assert!(row.liver_g_h <= 1.2 * 60.0 + 1e-9);
            prop_assert!(row.rer >= 0.70 - 1e-9 && row.rer <= 1.15 + 1e-9);
            prop_assert!(row.cho_pct >= 0.0 && row.cho_pct <= 100.0 + 1e-9);
            // Reserves only drain during exercise
            prop_assert!(row.residual_total_g <= prev_total + 1e-9);
            prev_total = row.residual_total_g;
        }

        prop_assert!(out.stats.final_glycogen_g <= tank.actual_available_g + 1e-9);
        if let Some(bonk) = out.bonk_time() {
            prop_assert!(bonk <= duration);
        }
    }

    #[test]
    fn fasting_never_accumulates_intake(
        subject in arb_subject(),
        duration in 1u32..300,
    ) {
        let tank = TankCalculator::compute_tank(&subject);
        let activity = ActivityParameters::default();
        let inputs = SimulationInputs {
            duration_min: duration as f64,
            target_intake_g_h: 0.0,
            ..SimulationInputs::default()
        };
        let out = Simulator::simulate(&tank, &subject, &activity, &inputs);

        for row in &out.rows {
            prop_assert_eq!(row.cumulative_intake_g, 0.0);
            prop_assert!(row.gut_load_g == 0.0);
        }
        prop_assert_eq!(out.stats.total_exogenous_used_g, 0.0);
    }

    #[test]
    fn simulation_is_deterministic(
        subject in arb_subject(),
        duration in 1u32..120,
        intake in 0.0..120.0f64,
    ) {
        let tank = TankCalculator::compute_tank(&subject);
        let activity = ActivityParameters::default();
        let inputs = SimulationInputs {
            duration_min: duration as f64,
            target_intake_g_h: intake,
            ..SimulationInputs::default()
        };
        let a = Simulator::simulate(&tank, &subject, &activity, &inputs);
        let b = Simulator::simulate(&tank, &subject, &activity, &inputs);
        prop_assert_eq!(a.rows, b.rows);
        prop_assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn rer_polynomial_stays_clamped(intensity in -5.0..5.0f64) {
        let rer = rer_polynomial(intensity);
        prop_assert!(rer >= 0.70 && rer <= 1.15);
    }

    #[test]
    fn cho_ratio_is_a_fraction(rer in 0.0..2.0f64) {
        let ratio = cho_ratio_from_rer(rer);
        prop_assert!(ratio >= 0.0 && ratio <= 1.0);
    }

    #[test]
    fn concentration_estimate_stays_physiological(vo2max in 10.0..100.0f64) {
        let conc = concentration_from_vo2max(vo2max);
        prop_assert!(conc >= 12.0 && conc <= 26.0);
    }

    #[test]
    fn exogenous_ceiling_respects_the_mix(
        height in 150.0..210.0f64,
        weight in 45.0..120.0f64,
        ftp in 100.0..450.0f64,
        mix in arb_mix(),
    ) {
        let rate = max_exogenous_oxidation(height, weight, ftp, mix);
        prop_assert!(rate > 0.0);
        prop_assert!(rate <= mix.max_rate_g_h() / 60.0 + 1e-9);
    }

    #[test]
    fn filling_factor_estimate_stays_bounded(
        weight in 45.0..120.0f64,
        cho1 in 0.0..1200.0f64,
        cho2 in 0.0..1200.0f64,
        steps in 0.0..30_000.0f64,
        activity_min in 0.0..300.0f64,
    ) {
        let estimate = filling_factor_from_diet(
            weight,
            DailyHistory { cho_intake_g: cho1, steps, activity_min },
            DailyHistory { cho_intake_g: cho2, steps: 0.0, activity_min: 0.0 },
            FatigueState::Active,
            SleepQuality::Average,
        );
        prop_assert!(estimate.combined > 0.0);
        prop_assert!(estimate.combined <= 1.25);
        prop_assert!(estimate.diet_depletion_factor <= 1.25);
        prop_assert!(estimate.avg_cho_g_kg > 0.0);
    }

    #[test]
    fn weekly_balance_stays_within_tank_bounds(
        intake in 0.0..1000.0f64,
        duration in 0.0..240.0f64,
        weight in 45.0..120.0f64,
        vo2max in 30.0..80.0f64,
    ) {
        let schedule: Vec<PlannedDay> = (0..7)
            .map(|i| PlannedDay {
                workout: if i % 2 == 0 {
                    Some(PlannedWorkout {
                        duration_min: duration,
                        intensity: IntensityBand::Medium,
                    })
                } else {
                    None
                },
                cho_intake_g: intake,
            })
            .collect();

        let days = balance::weekly_balance(400.0, 80.0, 500.0, 100.0, &schedule, weight, vo2max);

        prop_assert_eq!(days.len(), 7);
        for day in &days {
            prop_assert!(day.muscle_g >= 0.0 && day.muscle_g <= 500.0);
            prop_assert!(day.liver_g >= 0.0 && day.liver_g <= 100.0);
            prop_assert!((day.total_g - day.muscle_g - day.liver_g).abs() <= 1.0);
            prop_assert!(day.estimated_consumption_g >= 0.0);
        }
    }
}
