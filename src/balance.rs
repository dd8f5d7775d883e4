//! Coarse-grained glycogen balance projections
//!
//! Simpler daily/hourly bucket arithmetic on top of the tank model:
//! a 7-day weekly balance for planning training/fueling blocks, and an
//! hour-by-hour multi-day tapering simulation for the final days before
//! an event. Both reuse the tank's capacity figures; neither touches the
//! minute-stepped simulator.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::models::{Subject, TankState};
use crate::tank::TankCalculator;

/// Basal hepatic drain feeding the brain and organs (g/h), weekly model
const WEEKLY_LIVER_DRAIN_G_H: f64 = 4.5;

/// Fraction of ingested carbohydrate actually stored as glycogen
const SYNTHESIS_EFFICIENCY: f64 = 0.95;

/// Liver share of exercise carbohydrate usage
const EXERCISE_LIVER_FRACTION: f64 = 0.15;

/// Training intensity band for the weekly planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntensityBand {
    /// Z1-Z2 endurance work
    Low,
    /// Z3 tempo work
    Medium,
    /// Z4+ threshold and above
    High,
}

impl IntensityBand {
    /// Relative intensity (fraction of VO2max) assumed for the band
    pub fn relative_intensity(&self) -> f64 {
        match self {
            IntensityBand::Low => 0.5,
            IntensityBand::Medium => 0.7,
            IntensityBand::High => 0.85,
        }
    }

    /// Carbohydrate share of energy at this band
    pub fn cho_share(&self) -> f64 {
        match self {
            IntensityBand::Low => 0.25,
            IntensityBand::Medium => 0.65,
            IntensityBand::High => 0.95,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntensityBand::Low => "Low (Z1-Z2)",
            IntensityBand::Medium => "Medium (Z3)",
            IntensityBand::High => "High (Z4+)",
        }
    }
}

/// A planned workout within a weekly schedule day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedWorkout {
    pub duration_min: f64,
    pub intensity: IntensityBand,
}

/// One day of the weekly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDay {
    /// Planned workout; None for a rest day
    pub workout: Option<PlannedWorkout>,
    /// Total carbohydrate intake for the day (g)
    pub cho_intake_g: f64,
}

/// End-of-day reserve state in the weekly projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Tabled)]
pub struct DailyBalance {
    #[tabled(rename = "Day")]
    pub day: String,
    #[tabled(rename = "Muscle (g)")]
    pub muscle_g: f64,
    #[tabled(rename = "Liver (g)")]
    pub liver_g: f64,
    #[tabled(rename = "Total (g)")]
    pub total_g: f64,
    #[tabled(rename = "Workout")]
    pub workout: String,
    #[tabled(rename = "CHO in (g)")]
    pub cho_intake_g: f64,
    #[tabled(rename = "Burned (g)")]
    pub estimated_consumption_g: f64,
    #[tabled(rename = "Net (g)")]
    pub net_balance_g: f64,
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Project the glycogen balance over a 7-day schedule.
///
/// Each day pays a basal drain (hepatic 4.5 g/h around the clock plus
/// NEAT at 1.2 g/kg/day), then the workout drain split 85/15 between
/// muscle and liver. Intake refills the liver first, overflow goes to
/// muscle, everything clamped to the tank bounds.
pub fn weekly_balance(
    initial_muscle_g: f64,
    initial_liver_g: f64,
    max_muscle_g: f64,
    max_liver_g: f64,
    schedule: &[PlannedDay],
    weight_kg: f64,
    vo2max_ml_kg_min: f64,
) -> Vec<DailyBalance> {
    let daily_neat_cho = 1.2 * weight_kg;

    let mut current_muscle = initial_muscle_g;
    let mut current_liver = initial_liver_g;

    let mut days = Vec::with_capacity(schedule.len());

    for (i, day) in schedule.iter().enumerate() {
        let total_basal_drain = 24.0 * WEEKLY_LIVER_DRAIN_G_H + daily_neat_cho;

        let (exercise_drain_muscle, exercise_drain_liver, workout_label) = match &day.workout {
            Some(w) if w.duration_min > 0.0 => {
                let rel = w.intensity.relative_intensity();
                let cho_share = w.intensity.cho_share();

                let kcal_min = (vo2max_ml_kg_min * rel * weight_kg / 1000.0) * 5.0;
                let total_kcal = kcal_min * w.duration_min;
                let total_cho_burned = total_kcal * cho_share / 4.0;

                (
                    total_cho_burned * (1.0 - EXERCISE_LIVER_FRACTION),
                    total_cho_burned * EXERCISE_LIVER_FRACTION,
                    format!("{} ({} min)", w.intensity.label(), w.duration_min as i64),
                )
            }
            _ => (0.0, 0.0, "Rest".to_string()),
        };

        let total_consumption = total_basal_drain + exercise_drain_liver + exercise_drain_muscle;
        let effective_input = day.cho_intake_g * SYNTHESIS_EFFICIENCY;
        let net_balance = effective_input - total_consumption;

        let drain_liver_total = total_basal_drain + exercise_drain_liver;

        let surplus_for_muscle;
        if effective_input >= drain_liver_total {
            // Liver needs are covered; surplus refills the liver first
            let surplus_after_liver_needs = effective_input - drain_liver_total;
            let liver_space = max_liver_g - current_liver;
            if surplus_after_liver_needs >= liver_space {
                current_liver = max_liver_g;
                surplus_for_muscle = surplus_after_liver_needs - liver_space;
            } else {
                current_liver += surplus_after_liver_needs;
                surplus_for_muscle = 0.0;
            }
        } else {
            let deficit = drain_liver_total - effective_input;
            current_liver -= deficit;
            surplus_for_muscle = 0.0;
        }

        current_muscle -= exercise_drain_muscle;
        current_muscle += surplus_for_muscle;

        current_muscle = current_muscle.clamp(0.0, max_muscle_g);
        current_liver = current_liver.clamp(0.0, max_liver_g);

        days.push(DailyBalance {
            day: WEEKDAYS[i % 7].to_string(),
            muscle_g: current_muscle.round(),
            liver_g: current_liver.round(),
            total_g: (current_muscle + current_liver).round(),
            workout: workout_label,
            cho_intake_g: day.cho_intake_g,
            estimated_consumption_g: total_consumption.round(),
            net_balance_g: net_balance.round(),
        });
    }

    days
}

/// Basal hepatic drain (g/h), hourly tapering model
const TAPER_LIVER_DRAIN_G_H: f64 = 4.0;

/// What the athlete is doing during a given hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HourStatus {
    Sleep,
    Work,
    Rest,
}

impl HourStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HourStatus::Sleep => "SLEEP",
            HourStatus::Work => "WORK",
            HourStatus::Rest => "REST",
        }
    }
}

/// One day of the tapering plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaperDay {
    pub date: NaiveDate,
    pub sleep_start: NaiveTime,
    pub sleep_end: NaiveTime,
    pub workout_start: NaiveTime,
    /// Planned workout duration (min); 0 for a full rest day
    pub workout_duration_min: f64,
    /// Total carbohydrate intake for the day (g), spread over waking
    /// non-workout hours
    pub cho_intake_g: f64,
    /// Workout intensity factor relative to threshold
    pub intensity_factor: f64,
    /// Mean workout power (W); 0 when unknown
    pub avg_watts: f64,
    /// Whether the workout is a ride (enables the watts-based estimate)
    pub is_cycling: bool,
    /// Glycogen storage efficiency for the night (sleep quality)
    pub storage_efficiency: f64,
}

/// One hour of the tapering projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyLogRow {
    pub timestamp: NaiveDateTime,
    pub day: String,
    pub hour: u32,
    pub status: HourStatus,
    pub muscle_g: f64,
    pub liver_g: f64,
    pub total_g: f64,
}

fn time_to_hours(t: NaiveTime) -> f64 {
    t.hour() as f64 + t.minute() as f64 / 60.0
}

fn is_sleeping(hour: f64, sleep_start: f64, sleep_end: f64) -> bool {
    if sleep_start > sleep_end {
        // Window wraps past midnight
        hour >= sleep_start || hour < sleep_end
    } else {
        hour >= sleep_start && hour < sleep_end
    }
}

/// Simulate the hourly reserve trajectory over the tapering days.
///
/// Starts both compartments at `start_factor` of their ceilings
/// (muscle ceiling = tank max minus the liver allowance, liver ceiling
/// 100 g) and walks every hour of every day through sleep, workout, and
/// feeding windows. Returns the hourly log and the tank state at the
/// end of the final day.
pub fn hourly_tapering(
    subject: &Subject,
    days: &[TaperDay],
    start_factor: f64,
) -> (Vec<HourlyLogRow>, TankState) {
    let tank = TankCalculator::compute_tank(subject);
    let max_muscle = tank.max_capacity_g - 100.0;
    let max_liver = 100.0;

    let mut current_muscle = (max_muscle * start_factor).min(max_muscle);
    let mut current_liver = (max_liver * start_factor).min(max_liver);

    let neat_drain_g_h = subject.weight_kg / 16.0;

    let mut log = Vec::with_capacity(days.len() * 24);

    for day in days {
        let day_label = day.date.format("%d/%m").to_string();

        let sleep_start = time_to_hours(day.sleep_start);
        let sleep_end = time_to_hours(day.sleep_end);
        let work_start = time_to_hours(day.workout_start);
        let work_end = work_start + day.workout_duration_min / 60.0;

        // Feeding window: waking hours outside the workout
        let mut waking_hours = 0u32;
        for h in 0..24 {
            let hf = h as f64;
            let sleeping = is_sleeping(hf, sleep_start, sleep_end);
            let working = hf >= work_start && hf < work_end;
            if !sleeping && !working {
                waking_hours += 1;
            }
        }
        let cho_rate_g_h = if waking_hours > 0 {
            day.cho_intake_g / waking_hours as f64
        } else {
            0.0
        };

        for h in 0..24u32 {
            let hf = h as f64;

            let mut status = HourStatus::Rest;
            if is_sleeping(hf, sleep_start, sleep_end) {
                status = HourStatus::Sleep;
            }
            if hf >= work_start && hf < work_end {
                status = HourStatus::Work;
            }

            let mut hourly_in = 0.0;
            // The brain's hepatic drain never stops
            let mut hourly_out_liver = TAPER_LIVER_DRAIN_G_H;
            let mut hourly_out_muscle = 0.0;

            match status {
                HourStatus::Sleep => {}
                HourStatus::Work => {
                    let mut kcal_h = 600.0 * day.intensity_factor;
                    if day.avg_watts > 0.0 && day.is_cycling {
                        kcal_h = (day.avg_watts * 60.0) / 4.184 / 0.22;
                    }

                    let cho_share = ((day.intensity_factor - 0.5) * 2.5).clamp(0.0, 1.0);
                    let g_cho_work = kcal_h * cho_share / 4.1;

                    hourly_out_muscle = g_cho_work * (1.0 - EXERCISE_LIVER_FRACTION);
                    hourly_out_liver += g_cho_work * EXERCISE_LIVER_FRACTION;
                }
                HourStatus::Rest => {
                    hourly_in = cho_rate_g_h;
                    hourly_out_muscle = neat_drain_g_h;
                }
            }

            let net_flow = hourly_in - (hourly_out_liver + hourly_out_muscle);

            if net_flow > 0.0 {
                // Refilling: 70/30 muscle/liver with overflow back to liver
                let real_storage = net_flow * day.storage_efficiency;

                let mut to_muscle = real_storage * 0.7;
                let mut to_liver = real_storage * 0.3;

                if current_muscle + to_muscle > max_muscle {
                    let overflow = current_muscle + to_muscle - max_muscle;
                    to_muscle -= overflow;
                    to_liver += overflow;
                }

                current_muscle = (current_muscle + to_muscle).min(max_muscle);
                current_liver = (current_liver + to_liver).min(max_liver);
            } else {
                let deficit = -net_flow;

                if status == HourStatus::Work {
                    // Each compartment pays its own share
                    current_liver -= hourly_out_liver;
                    current_muscle -= hourly_out_muscle;
                } else {
                    // Resting deficit lands mostly on the liver
                    current_liver -= deficit * 0.8;
                    current_muscle -= deficit * 0.2;
                }
            }

            current_muscle = current_muscle.max(0.0);
            current_liver = current_liver.max(0.0);

            log.push(HourlyLogRow {
                timestamp: day.date.and_hms_opt(h, 0, 0).expect("valid hour"),
                day: day_label.clone(),
                hour: h,
                status,
                muscle_g: current_muscle,
                liver_g: current_liver,
                total_g: current_muscle + current_liver,
            });
        }
    }

    let final_tank = TankState {
        muscle_glycogen_g: current_muscle,
        liver_glycogen_g: current_liver,
        actual_available_g: current_muscle + current_liver,
        fill_pct: (current_muscle + current_liver) / (max_muscle + max_liver) * 100.0,
        ..tank
    };

    (log, final_tank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sex, SportType};

    fn test_subject() -> Subject {
        Subject {
            weight_kg: 74.0,
            height_cm: 187.0,
            body_fat_pct: 0.11,
            sex: Sex::Male,
            glycogen_conc_g_kg: 22.0,
            sport: SportType::Cycling,
            ..Subject::default()
        }
    }

    fn rest_week(cho_g: f64) -> Vec<PlannedDay> {
        vec![
            PlannedDay {
                workout: None,
                cho_intake_g: cho_g,
            };
            7
        ]
    }

    #[test]
    fn test_weekly_rest_week_with_surplus_fills_tank() {
        let days = weekly_balance(300.0, 60.0, 500.0, 100.0, &rest_week(500.0), 70.0, 50.0);

        assert_eq!(days.len(), 7);
        // Basal drain: 24*4.5 + 1.2*70 = 192 g; 500*0.95 = 475 g in.
        // Surplus tops up liver then muscle; by Sunday both are full.
        let last = &days[6];
        assert_eq!(last.liver_g, 100.0);
        assert_eq!(last.muscle_g, 500.0);
        assert!(last.net_balance_g > 0.0);
    }

    #[test]
    fn test_weekly_starvation_drains_liver_first() {
        let days = weekly_balance(400.0, 100.0, 500.0, 100.0, &rest_week(0.0), 70.0, 50.0);

        // Basal drain of 192 g/day against zero intake empties the liver
        // on day one; muscle only pays exercise drains, and there are none
        assert_eq!(days[0].liver_g, 0.0);
        assert_eq!(days[0].muscle_g, 400.0);
    }

    #[test]
    fn test_weekly_training_day_drains_muscle() {
        let mut schedule = rest_week(200.0);
        schedule[2].workout = Some(PlannedWorkout {
            duration_min: 120.0,
            intensity: IntensityBand::High,
        });
        let days = weekly_balance(450.0, 100.0, 500.0, 100.0, &schedule, 70.0, 50.0);

        // High band: kcal/min = 50*0.85*70/1000*5 = 14.9, 120 min,
        // 95% CHO share / 4 kcal/g ~ 424 g, 85% from muscle
        assert!(days[2].muscle_g < days[1].muscle_g - 300.0);
        assert!(days[2].workout.contains("High"));
        assert_eq!(days[3].workout, "Rest");
    }

    #[test]
    fn test_weekly_bounds() {
        let mut schedule = rest_week(1200.0);
        schedule[5].workout = Some(PlannedWorkout {
            duration_min: 300.0,
            intensity: IntensityBand::High,
        });
        let days = weekly_balance(100.0, 20.0, 500.0, 100.0, &schedule, 70.0, 55.0);

        for d in &days {
            assert!(d.muscle_g >= 0.0 && d.muscle_g <= 500.0);
            assert!(d.liver_g >= 0.0 && d.liver_g <= 100.0);
        }
    }

    fn rest_taper_day(date: NaiveDate, cho_g: f64) -> TaperDay {
        TaperDay {
            date,
            sleep_start: NaiveTime::from_hms_opt(23, 0, 0).unwrap(),
            sleep_end: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            workout_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            workout_duration_min: 0.0,
            cho_intake_g: cho_g,
            intensity_factor: 0.0,
            avg_watts: 0.0,
            is_cycling: true,
            storage_efficiency: 0.95,
        }
    }

    #[test]
    fn test_tapering_produces_24_rows_per_day() {
        let subject = test_subject();
        let days = vec![
            rest_taper_day(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 450.0),
            rest_taper_day(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), 450.0),
        ];
        let (log, _) = hourly_tapering(&subject, &days, 0.6);
        assert_eq!(log.len(), 48);
        assert_eq!(log[0].hour, 0);
        assert_eq!(log[47].hour, 23);
    }

    #[test]
    fn test_tapering_carb_load_refills() {
        let subject = test_subject();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let days: Vec<TaperDay> = (0..3)
            .map(|i| {
                rest_taper_day(
                    date + chrono::Duration::days(i),
                    subject.weight_kg * 9.0, // ~9 g/kg/day carb load
                )
            })
            .collect();

        let (log, final_tank) = hourly_tapering(&subject, &days, 0.6);

        let start_total = log.first().unwrap().total_g;
        assert!(final_tank.actual_available_g > start_total);
        assert!(
            (final_tank.muscle_glycogen_g + final_tank.liver_glycogen_g
                - final_tank.actual_available_g)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn test_tapering_fasting_drains() {
        let subject = test_subject();
        let days = vec![rest_taper_day(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            0.0,
        )];
        let (log, final_tank) = hourly_tapering(&subject, &days, 0.8);

        // 24h of hepatic drain with nothing incoming
        assert!(final_tank.liver_glycogen_g < 80.0 * 0.8);
        for row in &log {
            assert!(row.muscle_g >= 0.0);
            assert!(row.liver_g >= 0.0);
        }
    }

    #[test]
    fn test_tapering_sleep_window_detection() {
        let subject = test_subject();
        let days = vec![rest_taper_day(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            300.0,
        )];
        let (log, _) = hourly_tapering(&subject, &days, 0.6);

        // 23:00-07:00 window wraps midnight
        assert_eq!(log[0].status, HourStatus::Sleep);
        assert_eq!(log[6].status, HourStatus::Sleep);
        assert_eq!(log[7].status, HourStatus::Rest);
        assert_eq!(log[23].status, HourStatus::Sleep);
    }

    #[test]
    fn test_tapering_workout_hours_marked() {
        let subject = test_subject();
        let mut day = rest_taper_day(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), 400.0);
        day.workout_duration_min = 120.0;
        day.intensity_factor = 0.8;
        day.avg_watts = 200.0;
        let (log, _) = hourly_tapering(&subject, &[day], 0.9);

        assert_eq!(log[10].status, HourStatus::Work);
        assert_eq!(log[11].status, HourStatus::Work);
        assert_eq!(log[12].status, HourStatus::Rest);

        // The two workout hours draw the tank down
        assert!(log[11].total_g < log[9].total_g);
    }
}
