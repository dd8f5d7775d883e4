//! Glycogen capacity model (the "tank")
//!
//! Computes maximum and currently-available glycogen reserves (muscle +
//! liver) from subject anthropometrics, training status, and recent
//! diet/fatigue state. Supercompensation headroom (factor 1.25 over the
//! resting baseline) and the creatine co-storage bonus follow Bergstrom
//! et al. 1967 and Roberts et al. 2016.

use tracing::{debug, warn};

use crate::models::{Subject, TankState};

/// Hard physiological ceiling on muscle glycogen (g per kg of active
/// muscle), independent of the nominal max capacity
const MUSCLE_CEILING_G_KG: f64 = 35.0;

/// Fixed liver allowance in the max-capacity figure (g)
const LIVER_ALLOWANCE_G: f64 = 100.0;

/// Storage uplift under creatine supplementation
const CREATINE_MULTIPLIER: f64 = 1.10;

/// Supercompensation headroom over the resting baseline
const SUPERCOMP_FACTOR: f64 = 1.25;

/// Capacity model: computes the tank state from a subject profile.
///
/// Pure and deterministic; performs no input validation. Range
/// constraints on the subject fields are the caller's responsibility.
pub struct TankCalculator;

impl TankCalculator {
    /// Compute maximum and currently-available glycogen reserves.
    ///
    /// The returned state satisfies
    /// `muscle_glycogen_g + liver_glycogen_g == actual_available_g` and
    /// `muscle_glycogen_g <= active_muscle_kg * 35.0`. Available can
    /// exceed the nominal max under creatine/supercompensation; only the
    /// physiological ceiling is a hard bound.
    pub fn compute_tank(subject: &Subject) -> TankState {
        let (total_muscle, muscle_source_note) = match subject.muscle_mass_kg {
            Some(measured) if measured > 0.0 => (
                measured,
                "Total muscle mass (SMM) supplied by the user.".to_string(),
            ),
            _ => (
                subject.lean_body_mass() * subject.muscle_fraction(),
                "Total muscle mass estimated from weight/BF/sex.".to_string(),
            ),
        };

        let active_muscle = total_muscle * subject.sport.active_fraction();

        let creatine_multiplier = if subject.uses_creatine {
            CREATINE_MULTIPLIER
        } else {
            1.0
        };
        let base_muscle_glycogen = active_muscle * subject.glycogen_conc_g_kg;
        let max_capacity =
            base_muscle_glycogen * SUPERCOMP_FACTOR * creatine_multiplier + LIVER_ALLOWANCE_G;

        let final_filling = subject.filling_factor * subject.menstrual_phase.factor();
        let mut current_muscle = base_muscle_glycogen * creatine_multiplier * final_filling;

        let physiological_limit = active_muscle * MUSCLE_CEILING_G_KG;
        if current_muscle > physiological_limit {
            current_muscle = physiological_limit;
        }

        // General depletion correlates with liver depletion too
        let mut liver_fill: f64 = 1.0;
        if subject.filling_factor <= 0.6 {
            liver_fill = 0.6;
        }

        let mut liver_note = None;
        if let Some(glucose) = subject.glucose_mg_dl {
            if glucose < 70.0 {
                liver_fill = 0.2;
                liver_note = Some("Liver criticality (glucose < 70 mg/dL)".to_string());
            } else if glucose < 85.0 {
                liver_fill = liver_fill.min(0.5);
                liver_note = Some("Liver reduction (glucose 70-85 mg/dL)".to_string());
            }
        }

        if let Some(note) = &liver_note {
            warn!(glucose = ?subject.glucose_mg_dl, "{}", note);
        }

        let current_liver = subject.liver_glycogen_g * liver_fill;
        let total_available = current_muscle + current_liver;

        let fill_pct = if max_capacity > 0.0 {
            total_available / max_capacity * 100.0
        } else {
            0.0
        };

        debug!(
            active_muscle_kg = active_muscle,
            max_capacity_g = max_capacity,
            available_g = total_available,
            fill_pct,
            "Tank computed"
        );

        TankState {
            active_muscle_kg: active_muscle,
            max_capacity_g: max_capacity,
            actual_available_g: total_available,
            muscle_glycogen_g: current_muscle,
            liver_glycogen_g: current_liver,
            concentration_used: subject.glycogen_conc_g_kg,
            fill_pct,
            creatine_bonus: subject.uses_creatine,
            muscle_source_note,
            liver_note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MenstrualPhase, Sex, SportType};

    fn reference_subject() -> Subject {
        // 74 kg / 187 cm / 11% BF male cyclist at 22 g/kg, the worked
        // scenario from the model documentation
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

    #[test]
    fn test_reference_scenario() {
        let tank = TankCalculator::compute_tank(&reference_subject());

        // total muscle ~ 74 * 0.89 * 0.53 = 34.9 kg, active ~ 22.0 kg
        assert!((tank.active_muscle_kg - 22.0).abs() < 0.1);
        // base ~ 484 g, max ~ 484 * 1.25 + 100 ~ 705 g
        assert!((tank.muscle_glycogen_g - 484.0).abs() < 2.0);
        assert!((tank.max_capacity_g - 705.0).abs() < 3.0);
    }

    #[test]
    fn test_available_is_muscle_plus_liver() {
        let tank = TankCalculator::compute_tank(&reference_subject());
        assert!(
            (tank.muscle_glycogen_g + tank.liver_glycogen_g - tank.actual_available_g).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_measured_muscle_mass_overrides_estimate() {
        let mut subject = reference_subject();
        subject.muscle_mass_kg = Some(37.4);
        let tank = TankCalculator::compute_tank(&subject);

        assert!((tank.active_muscle_kg - 37.4 * 0.63).abs() < 1e-9);
        assert!(tank.muscle_source_note.contains("supplied by the user"));

        // Zero measurement falls back to the estimate
        subject.muscle_mass_kg = Some(0.0);
        let tank = TankCalculator::compute_tank(&subject);
        assert!(tank.muscle_source_note.contains("estimated"));
    }

    #[test]
    fn test_physiological_ceiling() {
        let mut subject = reference_subject();
        subject.glycogen_conc_g_kg = 26.0;
        subject.uses_creatine = true;
        subject.filling_factor = 1.25;
        let tank = TankCalculator::compute_tank(&subject);

        assert!(tank.muscle_glycogen_g <= tank.active_muscle_kg * 35.0 + 1e-9);
    }

    #[test]
    fn test_creatine_bonus() {
        let mut subject = reference_subject();
        let base = TankCalculator::compute_tank(&subject);

        subject.uses_creatine = true;
        let loaded = TankCalculator::compute_tank(&subject);

        assert!((loaded.muscle_glycogen_g / base.muscle_glycogen_g - 1.10).abs() < 1e-6);
        assert!(loaded.max_capacity_g > base.max_capacity_g);
        assert!(loaded.creatine_bonus);
    }

    #[test]
    fn test_depleted_filling_drags_liver() {
        let mut subject = reference_subject();
        subject.filling_factor = 0.5;
        let tank = TankCalculator::compute_tank(&subject);

        // General depletion forces the liver fill to 0.6
        assert!((tank.liver_glycogen_g - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_glucose_corrections() {
        let mut subject = reference_subject();

        subject.glucose_mg_dl = Some(65.0);
        let tank = TankCalculator::compute_tank(&subject);
        assert!((tank.liver_glycogen_g - 20.0).abs() < 1e-9);
        assert!(tank.liver_note.as_deref().unwrap().contains("< 70"));

        subject.glucose_mg_dl = Some(80.0);
        let tank = TankCalculator::compute_tank(&subject);
        assert!((tank.liver_glycogen_g - 50.0).abs() < 1e-9);

        // Depleted filling already caps the liver at 0.6; mid-range
        // glucose tightens it to 0.5, never loosens it
        subject.filling_factor = 0.5;
        let tank = TankCalculator::compute_tank(&subject);
        assert!((tank.liver_glycogen_g - 50.0).abs() < 1e-9);
        subject.filling_factor = 1.0;

        // Normal glucose: no correction, no note
        subject.glucose_mg_dl = Some(95.0);
        let tank = TankCalculator::compute_tank(&subject);
        assert!((tank.liver_glycogen_g - 100.0).abs() < 1e-9);
        assert!(tank.liver_note.is_none());

        // Unmeasured glucose: no correction either
        subject.glucose_mg_dl = None;
        let tank = TankCalculator::compute_tank(&subject);
        assert!((tank.liver_glycogen_g - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_luteal_phase_reduces_storage() {
        let mut subject = reference_subject();
        subject.sex = Sex::Female;
        let follicular = TankCalculator::compute_tank(&subject);

        subject.menstrual_phase = MenstrualPhase::Luteal;
        let luteal = TankCalculator::compute_tank(&subject);

        assert!((luteal.muscle_glycogen_g / follicular.muscle_glycogen_g - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let subject = reference_subject();
        let a = TankCalculator::compute_tank(&subject);
        let b = TankCalculator::compute_tank(&subject);
        assert_eq!(a, b);
    }
}
