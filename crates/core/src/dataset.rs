//! Dataset loading.
//!
//! The source dataset is a JSON array of raw patient records. It is read
//! once at startup; the normalised cohort then lives in memory for the
//! lifetime of the process. No other persistence exists.

use crate::config::CoreConfig;
use crate::error::{CohortError, CohortResult};
use crate::record::{normalise_cohort, NormalisedCohort, RawPatientRecord};
use std::fs;
use std::path::Path;

/// Reads a JSON array of raw patient records from `path`.
pub fn load_raw_records(path: &Path) -> CohortResult<Vec<RawPatientRecord>> {
    let contents = fs::read_to_string(path).map_err(CohortError::FileRead)?;
    serde_json::from_str(&contents).map_err(CohortError::Deserialization)
}

/// Reads and normalises a dataset in one step.
pub fn load_cohort(path: &Path, cfg: &CoreConfig) -> CohortResult<NormalisedCohort> {
    Ok(normalise_cohort(&load_raw_records(path)?, cfg))
}
