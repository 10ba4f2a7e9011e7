//! The normalised patient entity.

use chrono::NaiveDate;
use survplot_types::{Sex, YesNo};

/// A patient record normalised for survival analysis.
///
/// Created once per raw record at load time and never updated afterwards.
/// Filtered views are fresh projections of the full cohort, not in-place
/// mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    /// Display name ("First Last").
    pub name: String,
    /// Medical record number, passed through verbatim.
    pub mrn: String,
    /// Diagnosis date; day zero of the patient's survival clock.
    pub start_date: NaiveDate,
    /// Endpoint date: death when recorded, otherwise the censoring date.
    pub end_date: NaiveDate,
    pub birth_date: NaiveDate,
    /// True iff no valid death date was recorded, so the endpoint is the
    /// last known follow-up rather than the event of interest.
    pub censored: bool,
    /// Whether the patient received their first treatment at this centre.
    pub include: YesNo,
    /// Whether the patient received a bone marrow transplant.
    pub transplant: YesNo,
    pub sex: Sex,
    /// Whole days from diagnosis to endpoint. Negative only when the source
    /// dates are inconsistent, which normalisation reports separately.
    pub time_to_endpoint: i64,
    /// Age in whole years at diagnosis.
    pub age: i32,
}

impl Patient {
    /// Label for the endpoint kind, as displayed next to the endpoint date.
    pub fn endpoint_label(&self) -> &'static str {
        if self.censored {
            "censor"
        } else {
            "death"
        }
    }
}
