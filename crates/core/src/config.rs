//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into
//! core operations as a value. Nothing in this crate reads process-wide
//! environment variables or clocks during normal operation, which keeps
//! every computation reproducible and keeps request handling free of
//! ambient state.

use crate::constants::RAW_DATE_FORMAT;
use crate::error::{CohortError, CohortResult};
use chrono::NaiveDate;

/// Core configuration resolved at startup.
#[derive(Clone, Copy, Debug)]
pub struct CoreConfig {
    now: NaiveDate,
    follow_up_cutoff: NaiveDate,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// `now` is the reference date a capped follow-up resolves to;
    /// `follow_up_cutoff` is the data-freshness date beyond which a recorded
    /// follow-up is treated as a data-entry artefact.
    ///
    /// # Errors
    ///
    /// Returns `CohortError::InvalidInput` if the cutoff lies after `now` —
    /// a freshness date in the future cannot cap anything.
    pub fn new(now: NaiveDate, follow_up_cutoff: NaiveDate) -> CohortResult<Self> {
        if follow_up_cutoff > now {
            return Err(CohortError::InvalidInput(format!(
                "follow-up cutoff {follow_up_cutoff} lies after the reference date {now}"
            )));
        }

        Ok(Self {
            now,
            follow_up_cutoff,
        })
    }

    /// The reference "today" used when capping implausible follow-up dates.
    pub fn now(&self) -> NaiveDate {
        self.now
    }

    /// The data-freshness cutoff for follow-up dates.
    pub fn follow_up_cutoff(&self) -> NaiveDate {
        self.follow_up_cutoff
    }
}

/// The follow-up cutoff used when none is configured: the freshness date of
/// the source dataset (February 1st, 2015).
pub fn default_follow_up_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 2, 1).expect("valid calendar date")
}

/// Parse the follow-up cutoff from an optional environment value.
///
/// If `value` is `None` or empty/whitespace, returns the default cutoff.
pub fn follow_up_cutoff_from_env_value(value: Option<String>) -> CohortResult<NaiveDate> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => NaiveDate::parse_from_str(&v, RAW_DATE_FORMAT)
            .map_err(|_| CohortError::MalformedDate {
                field: "follow-up cutoff",
                value: v,
            }),
        None => Ok(default_follow_up_cutoff()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn accepts_cutoff_on_or_before_now() {
        assert!(CoreConfig::new(date(2015, 6, 1), date(2015, 2, 1)).is_ok());
        assert!(CoreConfig::new(date(2015, 2, 1), date(2015, 2, 1)).is_ok());
    }

    #[test]
    fn rejects_cutoff_after_now() {
        let err = CoreConfig::new(date(2015, 1, 1), date(2015, 2, 1)).expect_err("should reject");
        assert!(matches!(err, CohortError::InvalidInput(msg) if msg.contains("cutoff")));
    }

    #[test]
    fn cutoff_defaults_when_value_missing_or_blank() {
        assert_eq!(
            follow_up_cutoff_from_env_value(None).expect("default"),
            date(2015, 2, 1)
        );
        assert_eq!(
            follow_up_cutoff_from_env_value(Some("   ".into())).expect("default"),
            date(2015, 2, 1)
        );
    }

    #[test]
    fn cutoff_parses_the_raw_date_format() {
        assert_eq!(
            follow_up_cutoff_from_env_value(Some("07/04/2016".into())).expect("parse"),
            date(2016, 7, 4)
        );
    }

    #[test]
    fn cutoff_rejects_other_date_formats() {
        let err = follow_up_cutoff_from_env_value(Some("2016-07-04".into()))
            .expect_err("should reject ISO dates");
        assert!(matches!(
            err,
            CohortError::MalformedDate { field, .. } if field == "follow-up cutoff"
        ));
    }
}
