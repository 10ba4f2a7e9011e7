//! Error and data-quality types for the SurvPlot core crate.

#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("malformed {field} value {value:?}: expected a MM/DD/YYYY date")]
    MalformedDate { field: &'static str, value: String },
    #[error(
        "no endpoint date: dateOfDeath {date_of_death:?} and dateOfLastFU {date_of_last_fu:?} are both unparsable"
    )]
    NoEndpoint {
        date_of_death: String,
        date_of_last_fu: String,
    },
    #[error("failed to read dataset file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize dataset: {0}")]
    Deserialization(serde_json::Error),
}

pub type CohortResult<T> = std::result::Result<T, CohortError>;

/// A non-fatal finding on a record that was kept in the cohort.
///
/// These are reported alongside the normalised patients rather than
/// rejecting the record outright; callers decide whether to surface them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataQualityWarning {
    /// The endpoint date precedes the diagnosis date.
    NegativeDuration { mrn: String, name: String, days: i64 },
    /// The diagnosis date precedes the birth date.
    NegativeAge { mrn: String, name: String, years: i32 },
    /// A flag field holds a value that is not a recognised code.
    UnrecognisedFlag {
        mrn: String,
        name: String,
        field: &'static str,
        value: String,
    },
}

impl std::fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityWarning::NegativeDuration { mrn, name, days } => write!(
                f,
                "patient {name} (MRN {mrn}): endpoint precedes diagnosis by {} days",
                -days
            ),
            DataQualityWarning::NegativeAge { mrn, name, years } => write!(
                f,
                "patient {name} (MRN {mrn}): diagnosis precedes birth by {} years",
                -years
            ),
            DataQualityWarning::UnrecognisedFlag {
                mrn,
                name,
                field,
                value,
            } => write!(
                f,
                "patient {name} (MRN {mrn}): unrecognised {field} flag {value:?}"
            ),
        }
    }
}
