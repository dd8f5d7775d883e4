//! Zwift workout (.zwo) importer
//!
//! Reads the `SteadyState` blocks of a ZWO file into a per-minute
//! intensity-factor series plus duration-weighted averages. Ramp and
//! interval blocks are not expanded; structured files meant for this
//! tool should be exported as steady blocks.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::ImportError;
use crate::models::SportType;

/// Parsed workout ready for the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct ZwoWorkout {
    /// Sport declared by the file (`bike`, `run`), when present
    pub sport_tag: Option<String>,
    /// Intensity factor for each minute of the workout
    pub intensity_series: Vec<f64>,
    pub total_duration_min: u32,
    /// Duration-weighted mean intensity factor
    pub avg_if: f64,
    /// Mean power (W); 0 for non-cycling sports
    pub avg_power: f64,
    /// Mean heart rate (bpm); 0 for cycling
    pub avg_hr: f64,
}

pub struct ZwoImporter;

impl ZwoImporter {
    pub fn can_import(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zwo"))
            .unwrap_or(false)
    }

    /// Import a workout file, scaling averages against the athlete's
    /// thresholds for the selected sport.
    pub fn import_file(
        path: &Path,
        ftp_watts: f64,
        threshold_hr: f64,
        max_hr: f64,
        sport: SportType,
    ) -> Result<ZwoWorkout, ImportError> {
        if !Self::can_import(path) {
            return Err(ImportError::UnsupportedFormat {
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }
        if !path.exists() {
            return Err(ImportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path)?;
        Self::parse_str(&content, ftp_watts, threshold_hr, max_hr, sport)
    }

    pub fn parse_str(
        xml: &str,
        ftp_watts: f64,
        threshold_hr: f64,
        max_hr: f64,
        sport: SportType,
    ) -> Result<ZwoWorkout, ImportError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        let mut sport_tag: Option<String> = None;
        let mut in_sport_tag = false;

        let mut intensity_series: Vec<f64> = Vec::new();
        let mut total_duration_sec: u64 = 0;
        let mut total_weighted_if = 0.0;

        // quick-xml reports input that ends inside an open tag as a plain
        // Eof, so unclosed elements have to be counted to catch truncation
        let mut open_elements: u32 = 0;

        loop {
            {
                let event = reader.read_event_into(&mut buf);
                match &event {
                    Ok(Event::Start(_)) => open_elements += 1,
                    Ok(Event::End(_)) => open_elements = open_elements.saturating_sub(1),
                    _ => {}
                }
                match event {
                    Ok(Event::Start(ref e)) if e.name().as_ref() == b"sportType" => {
                        in_sport_tag = true;
                    }
                    Ok(Event::End(ref e)) if e.name().as_ref() == b"sportType" => {
                        in_sport_tag = false;
                    }
                    Ok(Event::Text(ref t)) if in_sport_tag => {
                        let text = t
                            .unescape()
                            .map_err(|e| parse_error(e.to_string()))?
                            .trim()
                            .to_lowercase();
                        if !text.is_empty() {
                            sport_tag = Some(text);
                        }
                    }
                    Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                        if e.name().as_ref() == b"SteadyState" =>
                    {
                        let duration_sec = read_attr(e, "Duration");
                        let power_ratio = read_attr(e, "Power");

                        match (duration_sec, power_ratio) {
                            (Some(dur), Some(power)) if dur > 0.0 => {
                                let segment_minutes = (dur / 60.0).ceil() as u32;
                                for _ in 0..segment_minutes {
                                    intensity_series.push(power);
                                }
                                total_duration_sec += dur as u64;
                                total_weighted_if += power * (dur / 60.0);
                            }
                            _ => {
                                warn!("Skipping SteadyState block with missing Duration/Power");
                            }
                        }
                    }
                    Ok(Event::Eof) => break,
                    Ok(_) => {}
                    Err(e) => return Err(parse_error(e.to_string())),
                }
            }
            buf.clear();
        }

        if open_elements > 0 {
            return Err(parse_error(format!(
                "unexpected end of file with {} unclosed element(s)",
                open_elements
            )));
        }

        if let Some(tag) = &sport_tag {
            if tag == "bike" && sport != SportType::Cycling {
                warn!(
                    selected = sport.label(),
                    "ZWO file is a bike workout but another sport is selected; \
                     thresholds may not match"
                );
            } else if tag == "run" && sport != SportType::Running {
                warn!(
                    selected = sport.label(),
                    "ZWO file is a run workout but another sport is selected; \
                     thresholds may not match"
                );
            }
        }

        let total_duration_min = ((total_duration_sec as f64) / 60.0).ceil() as u32;

        if total_duration_min == 0 {
            debug!("ZWO file contained no SteadyState blocks");
            return Ok(ZwoWorkout {
                sport_tag,
                intensity_series: Vec::new(),
                total_duration_min: 0,
                avg_if: 0.0,
                avg_power: 0.0,
                avg_hr: 0.0,
            });
        }

        let avg_if = total_weighted_if / total_duration_min as f64;

        let (avg_power, avg_hr) = match sport {
            SportType::Cycling => (avg_if * ftp_watts, 0.0),
            SportType::Running => (0.0, avg_if * threshold_hr),
            _ => (0.0, avg_if * max_hr * 0.85),
        };

        debug!(
            minutes = total_duration_min,
            avg_if, "Parsed ZWO workout"
        );

        Ok(ZwoWorkout {
            sport_tag,
            intensity_series,
            total_duration_min,
            avg_if,
            avg_power,
            avg_hr,
        })
    }
}

fn read_attr(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<f64> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
}

fn parse_error(reason: String) -> ImportError {
    ImportError::ParseError {
        format: "zwo".to_string(),
        reason,
    }
}
