//! # SurvPlot Core
//!
//! Core business logic for the SurvPlot survival analysis service.
//!
//! This crate contains pure data operations:
//! - Normalisation of raw clinical records into time-to-event patients
//! - The survival curve engine (at-risk fractions, step curve, median)
//! - Order-preserving cohort filters
//! - Dataset loading and runtime configuration
//!
//! **No API concerns**: HTTP servers and CLI wiring belong in `api-rest`
//! and `survplot-cli`.

pub mod config;
pub mod constants;
pub mod curve;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod patient;
pub mod record;

pub use config::{default_follow_up_cutoff, follow_up_cutoff_from_env_value, CoreConfig};
pub use curve::{CurvePoint, MedianSurvival, SurvivalCurve};
pub use dataset::{load_cohort, load_raw_records};
pub use error::{CohortError, CohortResult, DataQualityWarning};
pub use filter::{filter_patients, CohortFilter};
pub use patient::Patient;
pub use record::{normalise, normalise_cohort, NormalisedCohort, RawPatientRecord, RejectedRecord};

// Re-export the shared flag types so downstream crates rarely need a direct
// survplot-types dependency.
pub use survplot_types::{FlagError, Sex, YesNo};
