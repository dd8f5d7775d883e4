use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tabled::Table;

use glycosim::balance::{self, IntensityBand, PlannedDay, PlannedWorkout, TaperDay};
use glycosim::config::AppConfig;
use glycosim::error::{ErrorSeverity, GlycoError};
use glycosim::export::{self, ExportFormat};
use glycosim::import::{MetabolicImporter, ZwoImporter};
use glycosim::logging::{init_logging, LogConfig};
use glycosim::models::{ActivityParameters, ChoMixType, Sex, SportMode, SportType, TankState};
use glycosim::simulator::Simulator;
use glycosim::tank::TankCalculator;
use glycosim::zones::ZoneCalculator;

/// GlycoSim - Glycogen Reserve and Fueling Simulator
///
/// A Rust-based tool for estimating glycogen storage capacity and
/// simulating minute-by-minute substrate use during endurance exercise.
#[derive(Parser)]
#[command(name = "glycosim")]
#[command(version = "0.1.0")]
#[command(about = "Glycogen reserve and fueling simulator", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the glycogen tank from the athlete profile
    Tank {
        /// Body weight (kg)
        #[arg(long)]
        weight: Option<f64>,

        /// Height (cm)
        #[arg(long)]
        height: Option<f64>,

        /// Body fat percentage (e.g. 11)
        #[arg(long)]
        body_fat: Option<f64>,

        /// Sex (male, female)
        #[arg(long)]
        sex: Option<String>,

        /// Muscle glycogen concentration (g/kg of active muscle)
        #[arg(long)]
        concentration: Option<f64>,

        /// Sport (cycling, running, triathlon, xc-skiing, swimming)
        #[arg(long)]
        sport: Option<String>,

        /// Current tank filling factor (0.2 - 1.25)
        #[arg(long)]
        filling: Option<f64>,

        /// Creatine supplementation
        #[arg(long)]
        creatine: bool,

        /// Measured fasting blood glucose (mg/dL)
        #[arg(long)]
        glucose: Option<f64>,

        /// Measured total muscle mass (kg, DEXA/BIA)
        #[arg(long)]
        muscle_mass: Option<f64>,
    },

    /// Simulate substrate use minute by minute
    Simulate {
        /// Effort duration (min)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Carbohydrate intake target (g/h); 0 for fasting
        #[arg(short, long)]
        intake: Option<f64>,

        /// Carbohydrate per dose (g)
        #[arg(long)]
        dose: Option<f64>,

        /// Gut absorption time constant (min)
        #[arg(long)]
        tau: Option<f64>,

        /// Carbohydrate mix (glucose, 2:1, 1:0.8)
        #[arg(long)]
        mix: Option<String>,

        /// Mean power (W)
        #[arg(long)]
        watts: Option<f64>,

        /// Functional threshold power (W)
        #[arg(long)]
        ftp: Option<f64>,

        /// Locomotion mode for the energy model (cycling, running, other)
        #[arg(long)]
        mode: Option<String>,

        /// Speed for non-cycling modes (km/h)
        #[arg(long)]
        speed: Option<f64>,

        /// Constant intensity factor override
        #[arg(long)]
        intensity: Option<f64>,

        /// Structured workout file (.zwo); drives per-minute intensity
        #[arg(short, long)]
        workout: Option<PathBuf>,

        /// Lactate threshold heart rate for run workouts (bpm)
        #[arg(long, default_value = "170")]
        lthr: f64,

        /// Metabolic cart report (.csv/.txt); substrate rates come from
        /// the lab curve instead of the RER model
        #[arg(long)]
        lab_report: Option<PathBuf>,

        /// Also run a fasting baseline and report the difference
        #[arg(long)]
        compare: bool,

        /// Write the per-minute rows (format from extension: .csv, .json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render a PNG chart of the reserves (needs the charts feature)
        #[arg(long)]
        chart: Option<PathBuf>,
    },

    /// Display training zone tables
    Zones {
        /// Functional threshold power for cycling zones (W)
        #[arg(long)]
        ftp: Option<f64>,

        /// Lactate threshold heart rate for running zones (bpm)
        #[arg(long)]
        lthr: Option<f64>,
    },

    /// Project the glycogen balance over a weekly schedule
    Weekly {
        /// Day spec, repeatable up to 7 times:
        /// "rest:CHO" or "low|medium|high:MINUTES:CHO"
        #[arg(short, long = "day", value_name = "SPEC")]
        days: Vec<String>,

        /// Relative VO2max (ml/kg/min)
        #[arg(long, default_value = "50")]
        vo2max: f64,

        /// Write the daily rows to CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Simulate the hourly reserve trajectory over tapering days
    Taper {
        /// Day spec, repeatable: "DATE:CHO[:WORKOUT_START:MINUTES:IF:WATTS]"
        /// (date as YYYY-MM-DD, workout start as HH:MM)
        #[arg(short, long = "day", value_name = "SPEC")]
        days: Vec<String>,

        /// Sleep window as HH:MM-HH:MM
        #[arg(long, default_value = "23:00-07:00")]
        sleep: String,

        /// Starting fill fraction of both compartments
        #[arg(long, default_value = "0.6")]
        start_fill: f64,

        /// Write the hourly log to CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or initialize the configuration
    Config {
        /// Print the active configuration
        #[arg(short, long)]
        list: bool,

        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_verbosity(cli.verbose))?;

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    match cli.command {
        Commands::Tank {
            weight,
            height,
            body_fat,
            sex,
            concentration,
            sport,
            filling,
            creatine,
            glucose,
            muscle_mass,
        } => {
            let mut subject = config.subject.clone();
            if let Some(w) = weight {
                subject.weight_kg = w;
            }
            if let Some(h) = height {
                subject.height_cm = h;
            }
            if let Some(bf) = body_fat {
                subject.body_fat_pct = bf / 100.0;
            }
            if let Some(s) = sex {
                subject.sex = parse_sex(&s)?;
            }
            if let Some(c) = concentration {
                subject.glycogen_conc_g_kg = c;
            }
            if let Some(s) = sport {
                subject.sport = parse_sport(&s)?;
            }
            if let Some(f) = filling {
                subject.filling_factor = f;
            }
            if creatine {
                subject.uses_creatine = true;
            }
            if glucose.is_some() {
                subject.glucose_mg_dl = glucose;
            }
            if muscle_mass.is_some() {
                subject.muscle_mass_kg = muscle_mass;
            }

            let tank = TankCalculator::compute_tank(&subject);
            print_tank(&tank);
        }

        Commands::Simulate {
            duration,
            intake,
            dose,
            tau,
            mix,
            watts,
            ftp,
            intensity,
            mode,
            speed,
            workout,
            lthr,
            lab_report,
            compare,
            output,
            chart,
        } => {
            let subject = config.subject.clone();
            let tank = TankCalculator::compute_tank(&subject);

            let mut params = config.activity.clone();
            if let Some(w) = watts {
                params.avg_watts = w;
            }
            if let Some(f) = ftp {
                params.ftp_watts = f;
            }
            if let Some(m) = mode {
                params.mode = parse_mode(&m)?;
            }
            if let Some(s) = speed {
                params.speed_kmh = s;
            }
            params.intensity_factor = intensity
                .unwrap_or_else(|| ActivityParameters::intensity_from(params.avg_watts, params.ftp_watts));

            let mut inputs = config.simulation.to_inputs();
            if let Some(d) = duration {
                inputs.duration_min = d;
            }
            if let Some(i) = intake {
                inputs.target_intake_g_h = i;
            }
            if let Some(d) = dose {
                inputs.cho_per_dose_g = d;
            }
            if let Some(t) = tau {
                inputs.tau_min = t;
            }
            if let Some(m) = mix {
                inputs.mix_type = parse_mix(&m)?;
            }

            if let Some(path) = &workout {
                let parsed = ZwoImporter::import_file(
                    path,
                    params.ftp_watts,
                    lthr,
                    params.max_hr,
                    subject.sport,
                )
                .map_err(report)?;
                if parsed.intensity_series.is_empty() {
                    bail!("Workout file contains no usable blocks: {}", path.display());
                }
                println!(
                    "{}",
                    format!(
                        "Loaded workout: {} min, avg IF {:.2}",
                        parsed.total_duration_min, parsed.avg_if
                    )
                    .dimmed()
                );
                inputs.duration_min = parsed.total_duration_min as f64;
                inputs.intensity_series = Some(parsed.intensity_series);
                params.intensity_factor = parsed.avg_if;
                if parsed.avg_power > 0.0 {
                    params.avg_watts = parsed.avg_power;
                }
                if parsed.avg_hr > 0.0 {
                    params.avg_hr = parsed.avg_hr;
                }
            }

            if let Some(path) = &lab_report {
                let curve = MetabolicImporter::import_file(path).map_err(report)?;
                let axes = curve.available_columns();
                let x_col = *axes
                    .first()
                    .ok_or_else(|| anyhow!("Lab report has no usable intensity column"))?;
                println!(
                    "{}",
                    format!("Loaded lab curve: {} points on {}", curve.points.len(), x_col.label())
                        .dimmed()
                );
                params.metabolic_x_col = x_col;
                params.metabolic_curve = Some(curve);
                params.use_lab_data = true;
            }

            if compare {
                let comparison = Simulator::compare(&tank, &subject, &params, &inputs);
                print_stats("With fueling strategy", &comparison.strategy);
                print_stats("Fasting baseline", &comparison.fasting);

                let saved = comparison.strategy.stats.final_glycogen_g
                    - comparison.fasting.stats.final_glycogen_g;
                println!(
                    "\n{} {}",
                    "Glycogen spared by the strategy:".bold(),
                    format!("{:.0} g", saved).green().bold()
                );

                if let Some(path) = output {
                    export::json::export_comparison(&comparison, &path).map_err(report)?;
                    println!("{}", format!("Comparison written to {}", path.display()).dimmed());
                }
            } else {
                let run = Simulator::simulate(&tank, &subject, &params, &inputs);
                print_stats("Simulation", &run);

                if let Some(path) = output {
                    let format = ExportFormat::from_path(&path);
                    export::export_simulation(&run, format, &path).map_err(report)?;
                    println!("{}", format!("Rows written to {}", path.display()).dimmed());
                }

                if let Some(chart_path) = chart {
                    render_chart(&run, &chart_path)?;
                }
            }
        }

        Commands::Zones { ftp, lthr } => {
            let ftp = ftp.unwrap_or(config.activity.ftp_watts);
            println!("{}", format!("Cycling power zones (FTP {:.0} W)", ftp).bold());
            let rows = ZoneCalculator::cycling_power_zones(ftp).map_err(report)?;
            println!("{}", Table::new(&rows));

            if let Some(lthr) = lthr {
                println!("\n{}", format!("Running HR zones (LTHR {:.0} bpm)", lthr).bold());
                let rows = ZoneCalculator::running_hr_zones(lthr).map_err(report)?;
                println!("{}", Table::new(&rows));
            }
        }

        Commands::Weekly {
            days,
            vo2max,
            output,
        } => {
            if days.is_empty() {
                bail!("Provide at least one --day spec, e.g. --day rest:350 --day high:120:450");
            }
            if days.len() > 7 {
                bail!("A weekly schedule holds at most 7 days");
            }

            let schedule: Vec<PlannedDay> = days
                .iter()
                .map(|s| parse_planned_day(s))
                .collect::<Result<_>>()?;

            let subject = config.subject.clone();
            let tank = TankCalculator::compute_tank(&subject);
            let max_muscle = tank.max_capacity_g - 100.0;

            let rows = balance::weekly_balance(
                tank.muscle_glycogen_g,
                tank.liver_glycogen_g,
                max_muscle,
                100.0,
                &schedule,
                subject.weight_kg,
                vo2max,
            );

            println!("{}", "Weekly glycogen balance".bold());
            println!("{}", Table::new(&rows));

            if let Some(path) = output {
                export::export_weekly(&rows, &path).map_err(report)?;
                println!("{}", format!("Rows written to {}", path.display()).dimmed());
            }
        }

        Commands::Taper {
            days,
            sleep,
            start_fill,
            output,
        } => {
            if days.is_empty() {
                bail!("Provide at least one --day spec, e.g. --day 2025-06-01:450");
            }
            let (sleep_start, sleep_end) = parse_sleep_window(&sleep)?;

            let schedule: Vec<TaperDay> = days
                .iter()
                .map(|s| parse_taper_day(s, sleep_start, sleep_end))
                .collect::<Result<_>>()?;

            let subject = config.subject.clone();
            let (log, final_tank) = balance::hourly_tapering(&subject, &schedule, start_fill);

            println!("{}", "Hourly tapering projection".bold());
            for row in log.iter().filter(|r| r.hour % 6 == 0) {
                println!(
                    "  {}  {:5}  muscle {:6.1} g  liver {:5.1} g  total {:6.1} g",
                    row.timestamp.format("%d/%m %H:%M"),
                    row.status.label(),
                    row.muscle_g,
                    row.liver_g,
                    row.total_g
                );
            }
            println!(
                "\n{} {:.0} g ({:.0}% full)",
                "Final reserves:".bold(),
                final_tank.actual_available_g,
                final_tank.fill_pct
            );

            if let Some(path) = output {
                export::export_hourly(&log, &path).map_err(report)?;
                println!("{}", format!("Rows written to {}", path.display()).dimmed());
            }
        }

        Commands::Config { list, init } => {
            let path = AppConfig::default_config_path();
            if init {
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&path)?;
                println!("{}", format!("Default config written to {}", path.display()).green());
            } else if list {
                let toml = toml::to_string_pretty(&config)
                    .with_context(|| "Failed to render configuration")?;
                println!("{}", format!("# {}", path.display()).dimmed());
                print!("{}", toml);
            } else {
                println!("Config path: {}", path.display());
                println!("Use --list to print it or --init to create it.");
            }
        }
    }

    Ok(())
}

/// Funnel a library error through the unified hierarchy at the CLI
/// boundary: log it at its severity, hand the user-facing message up
fn report<E: Into<GlycoError>>(err: E) -> anyhow::Error {
    let err = err.into();
    match err.severity() {
        ErrorSeverity::Warning => tracing::warn!("{}", err),
        _ => tracing::error!("{}", err),
    }
    anyhow!(err.user_message())
}

fn print_tank(tank: &TankState) {
    println!("{}", "Glycogen tank".bold());
    println!("  Active muscle mass:  {:.1} kg ({})", tank.active_muscle_kg, tank.muscle_source_note);
    println!("  Concentration used:  {:.1} g/kg", tank.concentration_used);
    println!("  Max capacity:        {:.0} g", tank.max_capacity_g);
    println!(
        "  Available now:       {} ({:.0}% full)",
        format!("{:.0} g", tank.actual_available_g).bold(),
        tank.fill_pct
    );
    println!("    muscle {:.0} g / liver {:.0} g", tank.muscle_glycogen_g, tank.liver_glycogen_g);
    if tank.creatine_bonus {
        println!("  {}", "Creatine storage bonus applied (+10%)".dimmed());
    }
    if let Some(note) = &tank.liver_note {
        println!("  {}", note.yellow());
    }
}

fn print_stats(title: &str, run: &glycosim::simulator::SimulationOutput) {
    let s = &run.stats;
    println!("\n{}", title.bold().underline());
    println!(
        "  Energy demand: {:.0} kcal/h at IF {:.2} ({:.0}% CHO, RER {:.2})",
        s.kcal_per_hour_final, s.intensity_factor, s.cho_pct, s.avg_rer
    );
    println!(
        "  Used: muscle {:.0} g, liver {:.0} g, exogenous {:.0} g, fat {:.0} g",
        s.total_muscle_used_g, s.total_liver_used_g, s.total_exogenous_used_g, s.total_fat_g
    );
    println!(
        "  Final reserves: {:.0} g (muscle {:.0} / liver {:.0})",
        s.final_glycogen_g, s.final_muscle_g, s.final_liver_g
    );
    println!(
        "  Intake {:.0} g/h, exogenous ceiling {:.0} g/h, gut accumulation {:.1} g/h",
        s.intake_g_h, s.max_exo_capacity_g_h, s.gut_accumulation_g_h
    );

    match run.bonk_time() {
        Some(t) => println!(
            "  {}",
            format!("Reserves critical after {} min ({}h{:02}m)", t, t / 60, t % 60)
                .red()
                .bold()
        ),
        None => println!("  {}", "Reserves hold for the full effort".green()),
    }
}

#[cfg(feature = "charts")]
fn render_chart(run: &glycosim::simulator::SimulationOutput, path: &PathBuf) -> Result<()> {
    export::charts::render_reserves_chart(run, path).map_err(report)?;
    println!("{}", format!("Chart written to {}", path.display()).dimmed());
    Ok(())
}

#[cfg(not(feature = "charts"))]
fn render_chart(_run: &glycosim::simulator::SimulationOutput, _path: &PathBuf) -> Result<()> {
    bail!("Chart rendering requires building with --features charts")
}

fn parse_sex(s: &str) -> Result<Sex> {
    match s.to_lowercase().as_str() {
        "male" | "m" => Ok(Sex::Male),
        "female" | "f" => Ok(Sex::Female),
        _ => bail!("Unknown sex: {} (use male or female)", s),
    }
}

fn parse_sport(s: &str) -> Result<SportType> {
    match s.to_lowercase().as_str() {
        "cycling" | "bike" => Ok(SportType::Cycling),
        "running" | "run" => Ok(SportType::Running),
        "triathlon" => Ok(SportType::Triathlon),
        "xc-skiing" | "skiing" => Ok(SportType::XcSkiing),
        "swimming" | "swim" => Ok(SportType::Swimming),
        _ => bail!("Unknown sport: {}", s),
    }
}

fn parse_mode(s: &str) -> Result<SportMode> {
    match s.to_lowercase().as_str() {
        "cycling" | "bike" => Ok(SportMode::Cycling),
        "running" | "run" => Ok(SportMode::Running),
        "other" => Ok(SportMode::Other),
        _ => bail!("Unknown mode: {} (use cycling, running or other)", s),
    }
}

fn parse_mix(s: &str) -> Result<ChoMixType> {
    match s.to_lowercase().as_str() {
        "glucose" | "malto" => Ok(ChoMixType::GlucoseOnly),
        "2:1" | "mix2" => Ok(ChoMixType::Mix2to1),
        "1:0.8" | "mix108" => Ok(ChoMixType::Mix1to08),
        _ => bail!("Unknown mix: {} (use glucose, 2:1 or 1:0.8)", s),
    }
}

fn parse_band(s: &str) -> Result<IntensityBand> {
    match s.to_lowercase().as_str() {
        "low" => Ok(IntensityBand::Low),
        "medium" | "med" => Ok(IntensityBand::Medium),
        "high" => Ok(IntensityBand::High),
        _ => bail!("Unknown intensity band: {} (use low, medium or high)", s),
    }
}

/// "rest:CHO" or "BAND:MINUTES:CHO"
fn parse_planned_day(spec: &str) -> Result<PlannedDay> {
    let parts: Vec<&str> = spec.split(':').collect();
    match parts.as_slice() {
        [kind, cho] if kind.eq_ignore_ascii_case("rest") => Ok(PlannedDay {
            workout: None,
            cho_intake_g: parse_num(cho, "CHO")?,
        }),
        [band, minutes, cho] => Ok(PlannedDay {
            workout: Some(PlannedWorkout {
                duration_min: parse_num(minutes, "duration")?,
                intensity: parse_band(band)?,
            }),
            cho_intake_g: parse_num(cho, "CHO")?,
        }),
        _ => bail!("Bad day spec '{}' (use rest:CHO or band:minutes:CHO)", spec),
    }
}

/// "DATE:CHO[:WORKOUT_START:MINUTES:IF:WATTS]"
fn parse_taper_day(spec: &str, sleep_start: NaiveTime, sleep_end: NaiveTime) -> Result<TaperDay> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 2 && parts.len() != 6 {
        bail!(
            "Bad day spec '{}' (use DATE:CHO or DATE:CHO:HHMM:minutes:IF:watts)",
            spec
        );
    }

    let date = NaiveDate::parse_from_str(parts[0], "%Y-%m-%d")
        .with_context(|| format!("Bad date in '{}'", spec))?;
    let cho = parse_num(parts[1], "CHO")?;

    let mut day = TaperDay {
        date,
        sleep_start,
        sleep_end,
        workout_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        workout_duration_min: 0.0,
        cho_intake_g: cho,
        intensity_factor: 0.0,
        avg_watts: 0.0,
        is_cycling: true,
        storage_efficiency: 0.95,
    };

    if parts.len() == 6 {
        day.workout_start = NaiveTime::parse_from_str(parts[2], "%H%M")
            .with_context(|| format!("Bad workout start in '{}' (use HHMM)", spec))?;
        day.workout_duration_min = parse_num(parts[3], "duration")?;
        day.intensity_factor = parse_num(parts[4], "IF")?;
        day.avg_watts = parse_num(parts[5], "watts")?;
    }

    Ok(day)
}

/// "HH:MM-HH:MM"
fn parse_sleep_window(s: &str) -> Result<(NaiveTime, NaiveTime)> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| anyhow!("Bad sleep window '{}' (use HH:MM-HH:MM)", s))?;
    let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
        .with_context(|| format!("Bad sleep start in '{}'", s))?;
    let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
        .with_context(|| format!("Bad sleep end in '{}'", s))?;
    Ok((start, end))
}

fn parse_num(s: &str, what: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| anyhow!("Bad {} value: {}", what, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glycosim::error::ImportError;

    #[test]
    fn test_simulate_accepts_mode_and_speed() {
        let cli = Cli::try_parse_from([
            "glycosim", "simulate", "--duration", "90", "--mode", "running", "--speed", "12.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate { mode, speed, .. } => {
                assert_eq!(mode.as_deref(), Some("running"));
                assert_eq!(speed, Some(12.5));
            }
            _ => panic!("expected simulate subcommand"),
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("cycling").unwrap(), SportMode::Cycling);
        assert_eq!(parse_mode("bike").unwrap(), SportMode::Cycling);
        assert_eq!(parse_mode("Run").unwrap(), SportMode::Running);
        assert_eq!(parse_mode("other").unwrap(), SportMode::Other);
        assert!(parse_mode("rowing").is_err());
    }

    #[test]
    fn test_report_surfaces_user_message() {
        let err = report(ImportError::FileNotFound {
            path: PathBuf::from("missing.zwo"),
        });
        assert!(err.to_string().contains("Could not find input file"));
    }
}
