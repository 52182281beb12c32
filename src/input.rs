//! JSON observation records.
//!
//! The record is one object of equal-length arrays:
//!
//! ```json
//! { "time": [...], "nee": [...], "ustar": [...], "temp": [...], "night": [...] }
//! ```
//!
//! `null` marks a missing value in the numeric arrays. `night` accepts
//! booleans or 0/1 flags.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use ustar_threshold::Observations;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NightFlag {
    Bool(bool),
    Number(f64),
}

impl NightFlag {
    fn is_night(&self) -> bool {
        match *self {
            NightFlag::Bool(b) => b,
            NightFlag::Number(v) => v != 0.0 && !v.is_nan(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordJson {
    time: Vec<f64>,
    nee: Vec<Option<f64>>,
    ustar: Vec<Option<f64>>,
    temp: Vec<Option<f64>>,
    night: Vec<NightFlag>,
}

fn present(values: Vec<Option<f64>>) -> Vec<f64> {
    values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()
}

/// Parses a record from a JSON string.
pub fn parse_observations(text: &str) -> Result<Observations> {
    let rec: RecordJson = serde_json::from_str(text).context("failed to parse observation JSON")?;
    let night = rec.night.iter().map(NightFlag::is_night).collect();
    let obs = Observations::new(
        rec.time,
        present(rec.nee),
        present(rec.ustar),
        present(rec.temp),
        night,
    )?;
    Ok(obs)
}

/// Reads a record from a JSON file.
pub fn read_observations(path: &Path) -> Result<Observations> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input: {}", path.display()))?;
    parse_observations(&text).with_context(|| format!("invalid record in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_become_nan_and_flags_accept_numbers() {
        let obs = parse_observations(
            r#"{
                "time": [1.0, 1.5, 2.0],
                "nee": [0.5, null, 1.2],
                "ustar": [0.1, 0.2, null],
                "temp": [10.0, 11.0, 12.0],
                "night": [true, 0, 1]
            }"#,
        )
        .unwrap();
        assert_eq!(obs.len(), 3);
        assert!(obs.nee()[1].is_nan());
        assert!(obs.ustar()[2].is_nan());
        assert_eq!(obs.night(), &[true, false, true]);
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = parse_observations(
            r#"{"time": [1.0, 2.0], "nee": [0.0], "ustar": [0.1, 0.2],
                "temp": [1.0, 2.0], "night": [true, true]}"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("nee"));
    }

    #[test]
    fn missing_field_is_an_error() {
        assert!(parse_observations(r#"{"time": [1.0]}"#).is_err());
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_observations(Path::new("/nonexistent/site.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/site.json"));
    }
}
