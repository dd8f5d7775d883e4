//! Metabolic cart report importer
//!
//! Lab reports come as CSV/TXT exports from metabolic carts (Cosmed,
//! Cortex, Vyntus and friends) with vendor-specific preambles, locale
//! decimals, and loosely named columns. The importer scans for the
//! header row, maps the CHO/FAT and intensity columns by keyword, and
//! returns a substrate oxidation curve in g/h.

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::curve::{CurvePoint, MetabolicCurve};
use crate::error::ImportError;

/// Header keywords marking the substrate columns
const SUBSTRATE_KEYWORDS: [&str; 4] = ["CHO", "FAT", "CARBO", "LIPID"];

/// Header keywords marking an intensity column
const INTENSITY_KEYWORDS: [&str; 8] =
    ["WATT", "LOAD", "POWER", "HR", "BPM", "HEART", "SPEED", "VEL"];

/// How many leading rows to scan for the header
const HEADER_SCAN_ROWS: usize = 50;

pub struct MetabolicImporter;

impl MetabolicImporter {
    pub fn can_import(path: &Path) -> bool {
        matches!(
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase())
                .as_deref(),
            Some("csv") | Some("txt")
        )
    }

    pub fn import_file(path: &Path) -> Result<MetabolicCurve, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        if !Self::can_import(path) {
            return Err(ImportError::UnsupportedFormat {
                format: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<MetabolicCurve, ImportError> {
        let delimiter = sniff_delimiter(content);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ImportError::ParseError {
                format: "metabolic csv".to_string(),
                reason: e.to_string(),
            })?;
            rows.push(record.iter().map(|f| f.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(ImportError::MissingData {
                field: "report rows".to_string(),
            });
        }

        // Vendor preambles can run for dozens of lines before the table
        let header_idx = rows
            .iter()
            .take(HEADER_SCAN_ROWS)
            .position(|row| {
                let joined = row.join(" ").to_uppercase();
                SUBSTRATE_KEYWORDS.iter().any(|k| joined.contains(k))
                    && INTENSITY_KEYWORDS.iter().any(|k| joined.contains(k))
            })
            .ok_or_else(|| ImportError::MissingData {
                field: "column header row (CHO/FAT plus Watt/HR/Speed)".to_string(),
            })?;

        let header: Vec<String> = rows[header_idx]
            .iter()
            .map(|c| c.trim().to_uppercase())
            .collect();

        let col_cho = find_column(&header, &["CHO", "CARBOHYDRATES", "QCHO", "CARB"]);
        let col_fat = find_column(&header, &["FAT", "LIPIDS", "QFAT"]);
        let col_watt = find_column(&header, &["WATT", "POWER", "POW", "LOAD"]);
        let col_hr = find_column(&header, &["HR", "HEART", "BPM", "FC"]);
        let col_speed = find_column(&header, &["SPEED", "VEL", "KM/H"]);

        let (col_cho, col_fat) = match (col_cho, col_fat) {
            (Some(c), Some(f)) => (c, f),
            _ => {
                return Err(ImportError::MissingData {
                    field: "CHO or FAT column".to_string(),
                })
            }
        };

        if col_watt.is_none() && col_hr.is_none() && col_speed.is_none() {
            return Err(ImportError::MissingData {
                field: "intensity column (Watt, HR or Speed)".to_string(),
            });
        }

        let mut points = Vec::new();
        for row in rows.iter().skip(header_idx + 1) {
            let cho = cell_value(row, col_cho);
            let fat = cell_value(row, col_fat);

            // Rows without both substrate readings are summary/blank lines
            let (cho_g_h, fat_g_h) = match (cho, fat) {
                (Some(c), Some(f)) => (c, f),
                _ => continue,
            };

            points.push(CurvePoint {
                watts: col_watt.and_then(|i| cell_value(row, i)),
                heart_rate: col_hr.and_then(|i| cell_value(row, i)),
                speed_kmh: col_speed.and_then(|i| cell_value(row, i)),
                cho_g_h,
                fat_g_h,
            });
        }

        if points.is_empty() {
            return Err(ImportError::MissingData {
                field: "numeric data rows".to_string(),
            });
        }

        let mut curve = MetabolicCurve::new(points);
        if curve.normalize_units() {
            info!("Report values looked like g/min; rescaled to g/h");
        }

        debug!(
            points = curve.points.len(),
            axes = ?curve.available_columns(),
            "Parsed metabolic report"
        );

        Ok(curve)
    }
}

/// Pick the delimiter with the most hits on the densest of the first lines
fn sniff_delimiter(content: &str) -> u8 {
    let mut best = (b',', 0usize);
    for candidate in [b';', b'\t', b','] {
        let count = content
            .lines()
            .take(HEADER_SCAN_ROWS)
            .map(|l| l.bytes().filter(|b| *b == candidate).count())
            .max()
            .unwrap_or(0);
        if count > best.1 {
            best = (candidate, count);
        }
    }
    best.0
}

/// Match a header cell against keyword candidates.
///
/// Exact match wins; otherwise a containment match is accepted only for
/// short cells, so `CHO G/H` maps to CHO but a remarks column
/// mentioning carbohydrates does not.
fn find_column(header: &[String], keys: &[&str]) -> Option<usize> {
    for (i, col) in header.iter().enumerate() {
        for k in keys {
            if col == k || (col.contains(k) && col.len() < k.len() + 6) {
                return Some(i);
            }
        }
    }
    None
}

fn cell_value(row: &[String], idx: usize) -> Option<f64> {
    row.get(idx).and_then(|raw| extract_number(raw))
}

/// First numeric token in the cell, tolerating comma decimals and units
fn extract_number(raw: &str) -> Option<f64> {
    let s = raw.replace(',', ".");
    let bytes = s.as_bytes();
    let start = bytes.iter().position(|b| b.is_ascii_digit())?;

    let mut end = start;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    s[start..end].parse().ok()
}
