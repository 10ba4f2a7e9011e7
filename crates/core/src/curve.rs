//! Survival curve computation over a normalised cohort.
//!
//! The engine answers "what fraction of the cohort had not yet reached an
//! endpoint after `t` days" from a cumulative step table built in a single
//! pass over the sorted cohort, then looked up by binary search.
//!
//! Censored patients leave the at-risk population exactly like deaths, so
//! the curve is a plain at-risk fraction rather than a censoring-adjusted
//! Kaplan-Meier estimate. This is a stated limitation of the computation,
//! not an oversight.

use crate::patient::Patient;

/// One step of the survival curve: the at-risk fraction remaining once
/// every endpoint at `time` has occurred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    /// Elapsed days since diagnosis.
    pub time: i64,
    /// Fraction of the cohort still at risk, in `[0, 1]`.
    pub at_risk: f64,
}

/// Median survival estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MedianSurvival {
    /// Median survival in whole days.
    Estimated(i64),
    /// Half or more of the cohort is censored; too few observed events to
    /// estimate a median.
    NotEstimable,
    /// The cohort is empty.
    NoData,
}

impl std::fmt::Display for MedianSurvival {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MedianSurvival::Estimated(days) => write!(f, "estimated median = {days} days"),
            MedianSurvival::NotEstimable => write!(f, "median survival is not calculable"),
            MedianSurvival::NoData => write!(f, "no patients selected"),
        }
    }
}

/// Survival curve engine over an immutable, sorted cohort.
#[derive(Debug, Clone)]
pub struct SurvivalCurve {
    total: usize,
    censored: usize,
    /// `time_to_endpoint` of the patient at index `total / 2`; `None` only
    /// for an empty cohort.
    midpoint_time: Option<i64>,
    /// Distinct endpoint times ascending, with the cumulative number of
    /// patients whose endpoint falls at or before each.
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    time: i64,
    reached: usize,
}

impl SurvivalCurve {
    /// Builds the engine from a cohort sorted ascending by
    /// `time_to_endpoint`. The engine never re-sorts its input; callers
    /// filtering an already-sorted cohort with an order-preserving filter
    /// satisfy the precondition for free.
    pub fn from_sorted(patients: &[Patient]) -> Self {
        let mut steps: Vec<Step> = Vec::new();
        for (seen, patient) in patients.iter().enumerate() {
            match steps.last_mut() {
                Some(step) if step.time == patient.time_to_endpoint => step.reached = seen + 1,
                _ => steps.push(Step {
                    time: patient.time_to_endpoint,
                    reached: seen + 1,
                }),
            }
        }

        Self {
            total: patients.len(),
            censored: patients.iter().filter(|p| p.censored).count(),
            midpoint_time: patients
                .get(patients.len() / 2)
                .map(|p| p.time_to_endpoint),
            steps,
        }
    }

    /// Number of patients in the (possibly filtered) cohort.
    pub fn summary_count(&self) -> usize {
        self.total
    }

    /// Number of censored patients in the cohort.
    pub fn censored_count(&self) -> usize {
        self.censored
    }

    /// Fraction of the cohort whose endpoint lies strictly beyond `t` days.
    ///
    /// Monotonically non-increasing in `t`, bounded to `[0, 1]`, and equal
    /// to `1.0` for any `t` before the earliest endpoint. Returns `None`
    /// for an empty cohort.
    pub fn risk_fraction_at(&self, t: i64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }

        let idx = self.steps.partition_point(|step| step.time <= t);
        let reached = if idx == 0 { 0 } else { self.steps[idx - 1].reached };
        Some(1.0 - reached as f64 / self.total as f64)
    }

    /// The survival step curve: one point per distinct endpoint time.
    ///
    /// Each point carries the at-risk fraction remaining once every
    /// endpoint at that time has occurred; drawing it right-continuous
    /// (step-after) reproduces the survival chart. Empty for an empty
    /// cohort.
    pub fn points(&self) -> Vec<CurvePoint> {
        self.steps
            .iter()
            .map(|step| CurvePoint {
                time: step.time,
                at_risk: 1.0 - step.reached as f64 / self.total as f64,
            })
            .collect()
    }

    /// Median survival estimate.
    ///
    /// Estimable only while fewer than half the cohort is censored; the
    /// estimate is the endpoint time of the middle patient of the sorted
    /// cohort. With too few observed events the median is reported as
    /// [`MedianSurvival::NotEstimable`] rather than a number.
    pub fn median(&self) -> MedianSurvival {
        match self.midpoint_time {
            Some(days) if self.censored * 2 < self.total => MedianSurvival::Estimated(days),
            Some(_) => MedianSurvival::NotEstimable,
            None => MedianSurvival::NoData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use survplot_types::{Sex, YesNo};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn patient(time_to_endpoint: i64, censored: bool) -> Patient {
        let start_date = date(2010, 1, 1);
        Patient {
            name: "Test Patient".into(),
            mrn: "0".into(),
            start_date,
            end_date: start_date + chrono::Duration::days(time_to_endpoint),
            birth_date: date(1960, 1, 1),
            censored,
            include: YesNo::Unspecified,
            transplant: YesNo::Unspecified,
            sex: Sex::Unspecified,
            time_to_endpoint,
            age: 50,
        }
    }

    fn cohort(times: &[i64], censored_from: usize) -> Vec<Patient> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| patient(t, i >= censored_from))
            .collect()
    }

    #[test]
    fn risk_fraction_is_one_before_the_first_endpoint() {
        let curve = SurvivalCurve::from_sorted(&cohort(&[10, 20, 30], 3));
        assert_eq!(curve.risk_fraction_at(0), Some(1.0));
        assert_eq!(curve.risk_fraction_at(9), Some(1.0));
    }

    #[test]
    fn risk_fraction_steps_down_at_each_endpoint() {
        let curve = SurvivalCurve::from_sorted(&cohort(&[2, 5, 5, 9], 4));
        assert_eq!(curve.risk_fraction_at(2), Some(0.75));
        assert_eq!(curve.risk_fraction_at(4), Some(0.75));
        assert_eq!(curve.risk_fraction_at(5), Some(0.25));
        assert_eq!(curve.risk_fraction_at(9), Some(0.0));
        assert_eq!(curve.risk_fraction_at(1000), Some(0.0));
    }

    #[test]
    fn risk_fraction_is_monotone_and_bounded() {
        let curve = SurvivalCurve::from_sorted(&cohort(&[1, 3, 3, 7, 12, 40], 4));
        let mut previous = 1.0;
        for t in 0..=41 {
            let fraction = curve.risk_fraction_at(t).expect("non-empty cohort");
            assert!((0.0..=1.0).contains(&fraction));
            assert!(fraction <= previous);
            previous = fraction;
        }
    }

    #[test]
    fn curve_has_one_point_per_distinct_time() {
        let curve = SurvivalCurve::from_sorted(&cohort(&[2, 5, 5, 9], 4));
        let points = curve.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], CurvePoint { time: 2, at_risk: 0.75 });
        assert_eq!(points[1], CurvePoint { time: 5, at_risk: 0.25 });
        assert_eq!(points[2], CurvePoint { time: 9, at_risk: 0.0 });
    }

    #[test]
    fn empty_cohort_yields_the_no_data_results() {
        let curve = SurvivalCurve::from_sorted(&[]);
        assert_eq!(curve.summary_count(), 0);
        assert_eq!(curve.risk_fraction_at(0), None);
        assert!(curve.points().is_empty());
        assert_eq!(curve.median(), MedianSurvival::NoData);
    }

    #[test]
    fn median_is_the_middle_patient_when_few_are_censored() {
        // 10 patients, 2 censored: 0.2 < 0.5, estimable.
        let times: Vec<i64> = (1..=10).map(|i| i * 10).collect();
        let curve = SurvivalCurve::from_sorted(&cohort(&times, 8));
        assert_eq!(curve.censored_count(), 2);
        assert_eq!(curve.median(), MedianSurvival::Estimated(60));
    }

    #[test]
    fn median_is_not_estimable_with_a_censored_majority() {
        // 10 patients, 6 censored: 0.6 >= 0.5.
        let times: Vec<i64> = (1..=10).map(|i| i * 10).collect();
        let curve = SurvivalCurve::from_sorted(&cohort(&times, 4));
        assert_eq!(curve.censored_count(), 6);
        assert_eq!(curve.median(), MedianSurvival::NotEstimable);
    }

    #[test]
    fn median_is_not_estimable_at_exactly_half_censored() {
        let times: Vec<i64> = (1..=10).map(|i| i * 10).collect();
        let curve = SurvivalCurve::from_sorted(&cohort(&times, 5));
        assert_eq!(curve.median(), MedianSurvival::NotEstimable);
    }

    #[test]
    fn single_uncensored_patient_has_an_estimable_median() {
        let curve = SurvivalCurve::from_sorted(&cohort(&[42], 1));
        assert_eq!(curve.median(), MedianSurvival::Estimated(42));
    }

    #[test]
    fn median_captions_match_the_chart_summary() {
        assert_eq!(
            MedianSurvival::Estimated(123).to_string(),
            "estimated median = 123 days"
        );
        assert_eq!(
            MedianSurvival::NotEstimable.to_string(),
            "median survival is not calculable"
        );
        assert_eq!(MedianSurvival::NoData.to_string(), "no patients selected");
    }
}
