use serde::{Deserialize, Serialize};

use crate::curve::{IntensityColumn, MetabolicCurve};

/// Biological sex, used for the muscle-mass fraction estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

/// Training status presets mapping to typical resting muscle glycogen
/// concentrations (g per kg of active muscle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrainingStatus {
    Sedentary,
    Recreational,
    Trained,
    Advanced,
    Elite,
}

impl TrainingStatus {
    /// Typical glycogen concentration for this training status (g/kg)
    pub fn concentration_g_kg(&self) -> f64 {
        match self {
            TrainingStatus::Sedentary => 13.0,
            TrainingStatus::Recreational => 16.0,
            TrainingStatus::Trained => 19.0,
            TrainingStatus::Advanced => 22.0,
            TrainingStatus::Elite => 25.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainingStatus::Sedentary => "Sedentary / Beginner",
            TrainingStatus::Recreational => "Active / Recreational",
            TrainingStatus::Trained => "Trained (Intermediate)",
            TrainingStatus::Advanced => "Advanced / Competitive",
            TrainingStatus::Elite => "Elite / Pro",
        }
    }
}

/// Sport discipline; carries the fraction of total muscle mass the sport
/// actually recruits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SportType {
    Cycling,
    Running,
    Triathlon,
    XcSkiing,
    Swimming,
}

impl SportType {
    /// Fraction of total muscle mass recruited by this discipline
    pub fn active_fraction(&self) -> f64 {
        match self {
            SportType::Cycling => 0.63,
            SportType::Running => 0.75,
            SportType::Triathlon => 0.85,
            SportType::XcSkiing => 0.95,
            SportType::Swimming => 0.80,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SportType::Cycling => "Cycling (lower-body dominant)",
            SportType::Running => "Running (lower body + core)",
            SportType::Triathlon => "Triathlon (multi-discipline)",
            SportType::XcSkiing => "XC skiing (whole body)",
            SportType::Swimming => "Swimming (upper + lower body)",
        }
    }
}

/// Preceding-days diet regime presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietType {
    HighCarb,
    Normal,
    LowCarb,
}

impl DietType {
    /// Tank filling factor implied by this regime
    pub fn factor(&self) -> f64 {
        match self {
            DietType::HighCarb => 1.25,
            DietType::Normal => 1.00,
            DietType::LowCarb => 0.50,
        }
    }

    /// Reference daily carbohydrate intake (g/kg/day)
    pub fn reference_g_kg(&self) -> f64 {
        match self {
            DietType::HighCarb => 8.0,
            DietType::Normal => 5.0,
            DietType::LowCarb => 2.5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DietType::HighCarb => "Carbohydrate loading (supercompensation)",
            DietType::Normal => "Mixed normocaloric regime (baseline)",
            DietType::LowCarb => "Glucid restriction / low carb",
        }
    }
}

/// Residual fatigue from the preceding training load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FatigueState {
    Rested,
    Active,
    Tired,
}

impl FatigueState {
    pub fn factor(&self) -> f64 {
        match self {
            FatigueState::Rested => 1.0,
            FatigueState::Active => 0.9,
            FatigueState::Tired => 0.60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FatigueState::Rested => "Rest / tapering (full recovery)",
            FatigueState::Active => "Moderate workload (previous 24h)",
            FatigueState::Tired => "High load or muscle damage (EIMD)",
        }
    }
}

/// Sleep quality over the preceding night(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepQuality {
    Good,
    Average,
    Poor,
}

impl SleepQuality {
    pub fn factor(&self) -> f64 {
        match self {
            SleepQuality::Good => 1.0,
            SleepQuality::Average => 0.95,
            SleepQuality::Poor => 0.85,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SleepQuality::Good => "Optimal (>7h, restorative)",
            SleepQuality::Average => "Sufficient (6-7h)",
            SleepQuality::Poor => "Insufficient / disturbed (<6h)",
        }
    }
}

/// Menstrual cycle phase modifier for storage capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenstrualPhase {
    None,
    Follicular,
    Luteal,
}

impl MenstrualPhase {
    pub fn factor(&self) -> f64 {
        match self {
            MenstrualPhase::None => 1.0,
            MenstrualPhase::Follicular => 1.0,
            MenstrualPhase::Luteal => 0.95,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenstrualPhase::None => "Not applicable",
            MenstrualPhase::Follicular => "Follicular phase",
            MenstrualPhase::Luteal => "Luteal phase (premenstrual)",
        }
    }
}

/// Carbohydrate mix used during exercise; multiple-transporter mixes raise
/// both the oxidation factor and the absolute ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoMixType {
    GlucoseOnly,
    Mix2to1,
    Mix1to08,
}

impl ChoMixType {
    /// Oxidation uplift relative to glucose alone
    pub fn oxidation_factor(&self) -> f64 {
        match self {
            ChoMixType::GlucoseOnly => 1.0,
            ChoMixType::Mix2to1 => 1.5,
            ChoMixType::Mix1to08 => 1.7,
        }
    }

    /// Absolute ceiling on exogenous oxidation for this mix (g/h)
    pub fn max_rate_g_h(&self) -> f64 {
        match self {
            ChoMixType::GlucoseOnly => 60.0,
            ChoMixType::Mix2to1 => 90.0,
            ChoMixType::Mix1to08 => 105.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChoMixType::GlucoseOnly => "Glucose/maltodextrin only (standard)",
            ChoMixType::Mix2to1 => "2:1 mix (maltodextrin:fructose)",
            ChoMixType::Mix1to08 => "1:0.8 mix (high fructose)",
        }
    }
}

/// Subject profile; immutable per simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Height in centimeters
    pub height_cm: f64,

    /// Body fat fraction (0.11 = 11%)
    pub body_fat_pct: f64,

    pub sex: Sex,

    /// Muscle glycogen storage concentration (g per kg of active muscle)
    pub glycogen_conc_g_kg: f64,

    pub sport: SportType,

    /// Resting liver glycogen (g)
    pub liver_glycogen_g: f64,

    /// How full the muscular tank currently is relative to a
    /// supercompensated baseline (0-1.25)
    pub filling_factor: f64,

    pub uses_creatine: bool,

    pub menstrual_phase: MenstrualPhase,

    /// Measured blood glucose (mg/dL), if available
    pub glucose_mg_dl: Option<f64>,

    /// Absolute aerobic capacity (L O2/min)
    pub vo2max_absolute_l_min: f64,

    /// Directly measured total muscle mass (kg, from DEXA/BIA); overrides
    /// the anthropometric estimate when present
    pub muscle_mass_kg: Option<f64>,
}

impl Subject {
    /// Lean body mass in kilograms
    pub fn lean_body_mass(&self) -> f64 {
        self.weight_kg * (1.0 - self.body_fat_pct)
    }

    /// Muscle-mass fraction of lean body mass; sex-dependent, with a small
    /// uplift for highly trained storage concentrations
    pub fn muscle_fraction(&self) -> f64 {
        let base = match self.sex {
            Sex::Male => 0.50,
            Sex::Female => 0.42,
        };
        if self.glycogen_conc_g_kg >= 22.0 {
            base + 0.03
        } else {
            base
        }
    }
}

impl Default for Subject {
    fn default() -> Self {
        Self {
            weight_kg: 74.0,
            height_cm: 187.0,
            body_fat_pct: 0.11,
            sex: Sex::Male,
            glycogen_conc_g_kg: TrainingStatus::Advanced.concentration_g_kg(),
            sport: SportType::Cycling,
            liver_glycogen_g: 100.0,
            filling_factor: 1.0,
            uses_creatine: false,
            menstrual_phase: MenstrualPhase::None,
            glucose_mg_dl: None,
            vo2max_absolute_l_min: 3.5,
            muscle_mass_kg: None,
        }
    }
}

/// Computed glycogen reserve state: the "tank"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankState {
    /// Sport-recruited muscle mass (kg)
    pub active_muscle_kg: f64,

    /// Maximum theoretical capacity including supercompensation headroom
    /// and the fixed liver allowance (g)
    pub max_capacity_g: f64,

    /// Currently available glycogen, muscle + liver (g)
    pub actual_available_g: f64,

    /// Current muscle glycogen (g)
    pub muscle_glycogen_g: f64,

    /// Current liver glycogen (g)
    pub liver_glycogen_g: f64,

    /// Storage concentration used for the computation (g/kg)
    pub concentration_used: f64,

    /// Available as a percentage of max capacity
    pub fill_pct: f64,

    /// Whether the creatine storage bonus was applied
    pub creatine_bonus: bool,

    /// Provenance of the total muscle mass figure
    pub muscle_source_note: String,

    /// Liver-risk annotation (hypoglycemia corrections), if any
    pub liver_note: Option<String>,
}

/// Exercise modality driving the energy demand model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SportMode {
    Cycling,
    Running,
    Other,
}

/// Activity configuration consumed by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityParameters {
    pub mode: SportMode,

    /// Gross mechanical efficiency (percent, cycling)
    pub gross_efficiency_pct: f64,

    /// Mean power for the session (W)
    pub avg_watts: f64,

    /// Functional threshold power (W)
    pub ftp_watts: f64,

    /// Mean heart rate for the session (bpm)
    pub avg_hr: f64,

    /// Maximum heart rate (bpm)
    pub max_hr: f64,

    /// Running speed (km/h)
    pub speed_kmh: f64,

    /// Constant reference intensity factor relative to threshold
    pub intensity_factor: f64,

    /// Crossover point as a percentage of threshold intensity
    pub crossover_pct: f64,

    /// Substrate rates come from an uploaded lab curve instead of the
    /// RER polynomial
    pub use_lab_data: bool,

    /// Lab-measured metabolic curve (CHO/FAT vs intensity)
    pub metabolic_curve: Option<MetabolicCurve>,

    /// Which intensity column of the curve to interpolate over
    pub metabolic_x_col: IntensityColumn,
}

impl ActivityParameters {
    /// Intensity factor from a measured value and its threshold, falling
    /// back to the default ratio when the threshold is zero
    pub fn intensity_from(value: f64, threshold: f64) -> f64 {
        if threshold > 0.0 {
            value / threshold
        } else {
            0.8
        }
    }
}

impl Default for ActivityParameters {
    fn default() -> Self {
        Self {
            mode: SportMode::Cycling,
            gross_efficiency_pct: 22.0,
            avg_watts: 200.0,
            ftp_watts: 250.0,
            avg_hr: 150.0,
            max_hr: 185.0,
            speed_kmh: 10.0,
            intensity_factor: 0.8,
            crossover_pct: 75.0,
            use_lab_data: false,
            metabolic_curve: None,
            metabolic_x_col: IntensityColumn::Watts,
        }
    }
}

/// Reserve status at the end of a simulated minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReserveStatus {
    Optimal,
    /// Muscle glycogen below 100 g
    Warning,
    /// Liver glycogen below 20 g; hypoglycemia risk
    Critical,
}

impl ReserveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReserveStatus::Optimal => "Optimal",
            ReserveStatus::Warning => "Warning (empty legs)",
            ReserveStatus::Critical => "Critical (hypoglycemia)",
        }
    }
}

/// One minute of simulated metabolism
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRow {
    /// Minute index from the start of the effort
    pub time_min: u32,

    /// Muscle glycogen usage for this minute, g/h equivalent
    pub muscle_g_h: f64,

    /// Liver glycogen usage for this minute, g/h equivalent
    pub liver_g_h: f64,

    /// Exogenous carbohydrate oxidation for this minute, g/h equivalent
    pub exogenous_g_h: f64,

    /// Fat oxidation for this minute, g/h equivalent
    pub fat_g_h: f64,

    /// Percentage shares of the instantaneous substrate mix
    pub pct_muscle: f64,
    pub pct_liver: f64,
    pub pct_exogenous: f64,
    pub pct_fat: f64,

    /// Residual reserves after this minute (g)
    pub residual_muscle_g: f64,
    pub residual_liver_g: f64,
    pub residual_total_g: f64,

    /// Intake strategy target (g/h)
    pub target_intake_g_h: f64,

    /// Unabsorbed intestinal carbohydrate buildup (g)
    pub gut_load_g: f64,

    /// Cumulative ingested carbohydrate (g)
    pub cumulative_intake_g: f64,

    /// Cumulative exogenous oxidation (g)
    pub cumulative_oxidation_g: f64,

    /// Intensity factor applied this minute
    pub intensity_factor: f64,

    pub rer: f64,

    /// Carbohydrate fraction of total substrate (percent)
    pub cho_pct: f64,

    pub status: ReserveStatus,
}

/// Aggregate results of a simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub final_muscle_g: f64,
    pub final_liver_g: f64,
    pub final_glycogen_g: f64,
    pub total_muscle_used_g: f64,
    pub total_liver_used_g: f64,
    pub total_exogenous_used_g: f64,
    pub total_fat_g: f64,

    /// Energy demand of the final minute extrapolated to an hour (kcal/h)
    pub kcal_per_hour_final: f64,

    /// Mean gut accumulation rate over the run (g/h)
    pub gut_accumulation_g_h: f64,

    /// Exogenous oxidation ceiling reached (g/h)
    pub max_exo_capacity_g_h: f64,

    pub intensity_factor: f64,

    /// RER of the final simulated minute
    pub avg_rer: f64,

    pub gross_efficiency_pct: f64,
    pub intake_g_h: f64,
    pub cho_pct: f64,
}
