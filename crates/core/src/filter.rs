//! Cohort filtering.
//!
//! Filtered views are ephemeral, order-preserving projections recomputed
//! from the immutable base cohort on every apply; nothing is filtered in
//! place. Applying any filter to a cohort sorted by `time_to_endpoint`
//! therefore yields a subset that is still sorted.

use crate::constants::RAW_DATE_FORMAT;
use crate::patient::Patient;
use chrono::NaiveDate;

/// Order-preserving projection of `patients` under an arbitrary predicate.
pub fn filter_patients<F>(patients: &[Patient], predicate: F) -> Vec<Patient>
where
    F: Fn(&Patient) -> bool,
{
    patients.iter().filter(|p| predicate(p)).cloned().collect()
}

/// The demographic/clinical criteria offered by the chart's filter form.
///
/// All criteria are conjunctive; an unset criterion matches every patient.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CohortFilter {
    /// Keep patients diagnosed strictly after this date.
    pub diagnosed_after: Option<NaiveDate>,
    /// Keep patients at least this old at diagnosis.
    pub min_age: Option<i32>,
    /// Keep only patients first treated at this centre.
    pub first_treatment: bool,
    /// Keep only bone marrow transplant recipients.
    pub transplant: bool,
}

impl CohortFilter {
    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `patient` satisfies every active criterion.
    pub fn matches(&self, patient: &Patient) -> bool {
        if let Some(date) = self.diagnosed_after {
            if patient.start_date <= date {
                return false;
            }
        }

        if let Some(age) = self.min_age {
            if patient.age < age {
                return false;
            }
        }

        if self.first_treatment && !patient.include.is_yes() {
            return false;
        }

        if self.transplant && !patient.transplant.is_yes() {
            return false;
        }

        true
    }

    /// Order-preserving projection of `patients` under this filter.
    pub fn apply(&self, patients: &[Patient]) -> Vec<Patient> {
        filter_patients(patients, |p| self.matches(p))
    }

    /// Human-readable caption for the active criteria, as shown above the
    /// chart.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "Currently showing all patients".to_string();
        }

        let mut clauses = Vec::new();
        if let Some(date) = self.diagnosed_after {
            clauses.push(format!("diagnosed after {}", date.format(RAW_DATE_FORMAT)));
        }
        if let Some(age) = self.min_age {
            clauses.push(format!("{age} or older at diagnosis"));
        }
        if self.first_treatment {
            clauses.push("first treated here".to_string());
        }
        if self.transplant {
            clauses.push("who have had a bone marrow transplant".to_string());
        }

        format!("Currently showing patients: {}", clauses.join(", "))
    }
}
