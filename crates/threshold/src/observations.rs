//! The observation record consumed by the engine.

use crate::error::ThresholdError;

/// Equal-length arrays of one site record at a fixed time step.
///
/// `time` is a serial day (ordinal or decimal day of year); the engine
/// never interprets it as a calendar date. Missing values are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    time: Vec<f64>,
    nee: Vec<f64>,
    ustar: Vec<f64>,
    temp: Vec<f64>,
    night: Vec<bool>,
}

impl Observations {
    /// Builds a record, checking that every array matches `time` in length.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ThresholdError::EmptyData`] | `time` is empty |
    /// | [`ThresholdError::LengthMismatch`] | any other array differs in length from `time` |
    pub fn new(
        time: Vec<f64>,
        nee: Vec<f64>,
        ustar: Vec<f64>,
        temp: Vec<f64>,
        night: Vec<bool>,
    ) -> Result<Self, ThresholdError> {
        let expected = time.len();
        if expected == 0 {
            return Err(ThresholdError::EmptyData);
        }
        for (field, got) in [
            ("nee", nee.len()),
            ("ustar", ustar.len()),
            ("temp", temp.len()),
            ("night", night.len()),
        ] {
            if got != expected {
                return Err(ThresholdError::LengthMismatch {
                    field,
                    expected,
                    got,
                });
            }
        }
        Ok(Self {
            time,
            nee,
            ustar,
            temp,
            night,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Always `false` for a constructed record.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn nee(&self) -> &[f64] {
        &self.nee
    }

    pub fn ustar(&self) -> &[f64] {
        &self.ustar
    }

    pub fn temp(&self) -> &[f64] {
        &self.temp
    }

    pub fn night(&self) -> &[bool] {
        &self.night
    }
}
