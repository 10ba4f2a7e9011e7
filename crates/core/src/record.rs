//! Raw record intake and normalisation.
//!
//! Converts the free-form records of the source dataset into [`Patient`]
//! entities with a derived endpoint date, censoring flag and survival time.
//! Batch normalisation has partial-failure semantics: records that cannot
//! be normalised are reported alongside the ones that could.

use crate::config::CoreConfig;
use crate::constants::RAW_DATE_FORMAT;
use crate::error::{CohortError, CohortResult, DataQualityWarning};
use crate::patient::Patient;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use survplot_types::{Sex, YesNo};

/// One row of the source dataset, exactly as exported.
///
/// Every field is a free-form string; date fields use `MM/DD/YYYY`. Absent
/// fields default to empty so a partial export still deserialises.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPatientRecord {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(rename = "dateOfDx", default)]
    pub date_of_dx: String,
    #[serde(rename = "dateOfDeath", default)]
    pub date_of_death: String,
    #[serde(rename = "dateOfLastFU", default)]
    pub date_of_last_fu: String,
    #[serde(rename = "dateOfBirth", default)]
    pub date_of_birth: String,
    #[serde(default)]
    pub include: String,
    #[serde(default)]
    pub transplant: String,
    #[serde(default)]
    pub sex: String,
    #[serde(rename = "MRN", default)]
    pub mrn: String,
}

/// Outcome of normalising a batch of raw records.
#[derive(Debug, Default)]
pub struct NormalisedCohort {
    /// Patients sorted ascending by `time_to_endpoint`, stable for ties.
    pub patients: Vec<Patient>,
    /// Records that could not be normalised, with the reason.
    pub rejected: Vec<RejectedRecord>,
    /// Non-fatal findings on records that were kept.
    pub warnings: Vec<DataQualityWarning>,
}

/// A record that failed normalisation.
#[derive(Debug)]
pub struct RejectedRecord {
    /// Position of the record in the source dataset.
    pub index: usize,
    /// MRN of the offending record, when present.
    pub mrn: String,
    pub error: CohortError,
}

/// Normalises a single raw record into a [`Patient`].
///
/// The endpoint is the death date whenever one parses; otherwise the patient
/// is censored at their last follow-up. A follow-up recorded after the
/// configured freshness cutoff is treated as a data-entry artefact and the
/// endpoint becomes the reference date instead (the patient is assumed to
/// still be alive).
///
/// # Errors
///
/// Returns `CohortError::MalformedDate` if `dateOfDx` or `dateOfBirth` does
/// not parse, and `CohortError::NoEndpoint` if neither `dateOfDeath` nor
/// `dateOfLastFU` does. No date is ever silently defaulted.
pub fn normalise(raw: &RawPatientRecord, cfg: &CoreConfig) -> CohortResult<Patient> {
    let start_date = parse_raw_date("dateOfDx", &raw.date_of_dx)?;
    let birth_date = parse_raw_date("dateOfBirth", &raw.date_of_birth)?;

    let (end_date, censored) = match try_parse_raw_date(&raw.date_of_death) {
        Some(death) => (death, false),
        None => {
            let last_fu = try_parse_raw_date(&raw.date_of_last_fu).ok_or_else(|| {
                CohortError::NoEndpoint {
                    date_of_death: raw.date_of_death.clone(),
                    date_of_last_fu: raw.date_of_last_fu.clone(),
                }
            })?;

            // A follow-up after the freshness cutoff cannot be trusted;
            // assume the patient is alive as of the reference date.
            let end = if last_fu > cfg.follow_up_cutoff() {
                cfg.now()
            } else {
                last_fu
            };

            (end, true)
        }
    };

    Ok(Patient {
        name: full_name(&raw.first_name, &raw.last_name),
        mrn: raw.mrn.trim().to_string(),
        start_date,
        end_date,
        birth_date,
        censored,
        include: YesNo::from_raw(&raw.include),
        transplant: YesNo::from_raw(&raw.transplant),
        sex: Sex::from_raw(&raw.sex),
        time_to_endpoint: (end_date - start_date).num_days(),
        age: whole_years_between(birth_date, start_date),
    })
}

/// Normalises a batch of raw records.
///
/// Per-record failures do not abort the batch: each is logged and collected
/// as a [`RejectedRecord`]. Kept records with inconsistent dates or
/// unrecognised flag codes produce [`DataQualityWarning`]s but stay in the
/// cohort. The surviving patients are sorted ascending by
/// `time_to_endpoint`; the survival curve engine and its median estimate
/// rely on this ordering.
pub fn normalise_cohort(records: &[RawPatientRecord], cfg: &CoreConfig) -> NormalisedCohort {
    let mut cohort = NormalisedCohort::default();

    for (index, raw) in records.iter().enumerate() {
        match normalise(raw, cfg) {
            Ok(patient) => {
                collect_warnings(raw, &patient, &mut cohort.warnings);
                cohort.patients.push(patient);
            }
            Err(error) => {
                tracing::warn!("failed to normalise record {index}: {error}");
                cohort.rejected.push(RejectedRecord {
                    index,
                    mrn: raw.mrn.trim().to_string(),
                    error,
                });
            }
        }
    }

    for warning in &cohort.warnings {
        tracing::warn!("{warning}");
    }

    cohort.patients.sort_by_key(|p| p.time_to_endpoint);

    cohort
}

fn collect_warnings(
    raw: &RawPatientRecord,
    patient: &Patient,
    warnings: &mut Vec<DataQualityWarning>,
) {
    if patient.time_to_endpoint < 0 {
        warnings.push(DataQualityWarning::NegativeDuration {
            mrn: patient.mrn.clone(),
            name: patient.name.clone(),
            days: patient.time_to_endpoint,
        });
    }

    if patient.age < 0 {
        warnings.push(DataQualityWarning::NegativeAge {
            mrn: patient.mrn.clone(),
            name: patient.name.clone(),
            years: patient.age,
        });
    }

    for (field, value) in [("include", &raw.include), ("transplant", &raw.transplant)] {
        if value.parse::<YesNo>().is_err() {
            warnings.push(DataQualityWarning::UnrecognisedFlag {
                mrn: patient.mrn.clone(),
                name: patient.name.clone(),
                field,
                value: value.trim().to_string(),
            });
        }
    }

    if raw.sex.parse::<Sex>().is_err() {
        warnings.push(DataQualityWarning::UnrecognisedFlag {
            mrn: patient.mrn.clone(),
            name: patient.name.clone(),
            field: "sex",
            value: raw.sex.trim().to_string(),
        });
    }
}

fn parse_raw_date(field: &'static str, value: &str) -> CohortResult<NaiveDate> {
    try_parse_raw_date(value).ok_or_else(|| CohortError::MalformedDate {
        field,
        value: value.to_string(),
    })
}

fn try_parse_raw_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), RAW_DATE_FORMAT).ok()
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim())
        .trim()
        .to_string()
}

/// Whole calendar years elapsed from `from` to `to`, truncated towards zero
/// (negative when `to` precedes `from`).
pub(crate) fn whole_years_between(from: NaiveDate, to: NaiveDate) -> i32 {
    if to < from {
        return -whole_years_between(to, from);
    }

    let mut years = to.year() - from.year();
    if (to.month(), to.day()) < (from.month(), from.day()) {
        years -= 1;
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn cfg() -> CoreConfig {
        CoreConfig::new(date(2015, 6, 1), date(2015, 2, 1)).expect("valid config")
    }

    fn raw(dx: &str, death: &str, last_fu: &str) -> RawPatientRecord {
        RawPatientRecord {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            date_of_dx: dx.into(),
            date_of_death: death.into(),
            date_of_last_fu: last_fu.into(),
            date_of_birth: "12/10/1960".into(),
            include: "Y".into(),
            transplant: "n".into(),
            sex: "F".into(),
            mrn: "100001".into(),
        }
    }

    #[test]
    fn death_date_becomes_the_endpoint() {
        let patient = normalise(&raw("01/15/2010", "01/15/2012", ""), &cfg()).expect("normalise");
        assert!(!patient.censored);
        assert_eq!(patient.end_date, date(2012, 1, 15));
        assert_eq!(patient.time_to_endpoint, 730);
        assert_eq!(patient.endpoint_label(), "death");
    }

    #[test]
    fn missing_death_censors_at_last_follow_up() {
        let patient = normalise(&raw("01/15/2010", "", "06/30/2014"), &cfg()).expect("normalise");
        assert!(patient.censored);
        assert_eq!(patient.end_date, date(2014, 6, 30));
        assert_eq!(patient.endpoint_label(), "censor");
    }

    #[test]
    fn follow_up_after_cutoff_caps_at_reference_date() {
        let patient = normalise(&raw("01/15/2010", "", "03/15/2015"), &cfg()).expect("normalise");
        assert!(patient.censored);
        assert_eq!(patient.end_date, date(2015, 6, 1));
    }

    #[test]
    fn follow_up_on_the_cutoff_is_not_capped() {
        let patient = normalise(&raw("01/15/2010", "", "02/01/2015"), &cfg()).expect("normalise");
        assert_eq!(patient.end_date, date(2015, 2, 1));
    }

    #[test]
    fn time_to_endpoint_rederives_from_the_normalised_dates() {
        let patient = normalise(&raw("01/15/2010", "", "06/30/2014"), &cfg()).expect("normalise");
        assert_eq!(
            patient.time_to_endpoint,
            (patient.end_date - patient.start_date).num_days()
        );
    }

    #[test]
    fn malformed_diagnosis_date_is_a_hard_error() {
        let err = normalise(&raw("not a date", "01/15/2012", ""), &cfg()).expect_err("reject");
        assert!(matches!(err, CohortError::MalformedDate { field, .. } if field == "dateOfDx"));
    }

    #[test]
    fn malformed_birth_date_is_a_hard_error() {
        let mut record = raw("01/15/2010", "01/15/2012", "");
        record.date_of_birth = "1960-12-10".into();
        let err = normalise(&record, &cfg()).expect_err("reject");
        assert!(matches!(err, CohortError::MalformedDate { field, .. } if field == "dateOfBirth"));
    }

    #[test]
    fn no_endpoint_when_both_candidates_are_unparsable() {
        let err = normalise(&raw("01/15/2010", "unknown", ""), &cfg()).expect_err("reject");
        assert!(matches!(err, CohortError::NoEndpoint { .. }));
    }

    #[test]
    fn age_is_whole_years_at_diagnosis() {
        let mut record = raw("12/09/2010", "01/15/2012", "");
        record.date_of_birth = "12/10/1960".into();
        let patient = normalise(&record, &cfg()).expect("normalise");
        // Diagnosed the day before the fiftieth birthday.
        assert_eq!(patient.age, 49);

        record.date_of_dx = "12/10/2010".into();
        let patient = normalise(&record, &cfg()).expect("normalise");
        assert_eq!(patient.age, 50);
    }

    #[test]
    fn negative_duration_is_kept_with_a_warning() {
        let cohort = normalise_cohort(&[raw("01/15/2012", "01/15/2010", "")], &cfg());
        assert_eq!(cohort.patients.len(), 1);
        assert_eq!(cohort.patients[0].time_to_endpoint, -730);
        assert!(cohort
            .warnings
            .iter()
            .any(|w| matches!(w, DataQualityWarning::NegativeDuration { days: -730, .. })));
    }

    #[test]
    fn unrecognised_flag_codes_are_reported_but_kept() {
        let mut record = raw("01/15/2010", "01/15/2012", "");
        record.transplant = "maybe".into();
        let cohort = normalise_cohort(&[record], &cfg());
        assert_eq!(cohort.patients.len(), 1);
        assert_eq!(cohort.patients[0].transplant, YesNo::Unspecified);
        assert!(cohort.warnings.iter().any(|w| matches!(
            w,
            DataQualityWarning::UnrecognisedFlag { field: "transplant", .. }
        )));
    }

    #[test]
    fn batch_sorts_ascending_by_time_to_endpoint() {
        let records = vec![
            raw("01/15/2010", "01/15/2013", ""),
            raw("01/15/2010", "01/15/2011", ""),
            raw("01/15/2010", "01/15/2012", ""),
        ];
        let cohort = normalise_cohort(&records, &cfg());
        let times: Vec<i64> = cohort.patients.iter().map(|p| p.time_to_endpoint).collect();
        assert_eq!(times, vec![365, 731, 1096]);
    }

    #[test]
    fn batch_sort_is_stable_for_ties() {
        let mut first = raw("01/15/2010", "01/15/2012", "");
        first.first_name = "First".into();
        let mut second = raw("01/15/2010", "01/15/2012", "");
        second.first_name = "Second".into();

        let cohort = normalise_cohort(&[first, second], &cfg());
        assert_eq!(cohort.patients[0].name, "First Lovelace");
        assert_eq!(cohort.patients[1].name, "Second Lovelace");
    }

    #[test]
    fn batch_collects_rejections_without_aborting() {
        let records = vec![
            raw("01/15/2010", "01/15/2012", ""),
            raw("garbage", "01/15/2012", ""),
            raw("01/15/2010", "", "06/30/2014"),
        ];
        let cohort = normalise_cohort(&records, &cfg());
        assert_eq!(cohort.patients.len(), 2);
        assert_eq!(cohort.rejected.len(), 1);
        assert_eq!(cohort.rejected[0].index, 1);
        assert_eq!(cohort.rejected[0].mrn, "100001");
    }

    #[test]
    fn passthrough_fields_are_copied_verbatim() {
        let patient = normalise(&raw("01/15/2010", "01/15/2012", ""), &cfg()).expect("normalise");
        assert_eq!(patient.name, "Ada Lovelace");
        assert_eq!(patient.mrn, "100001");
        assert!(patient.include.is_yes());
        assert!(!patient.transplant.is_yes());
        assert_eq!(patient.sex, Sex::Female);
    }
}
