//! Constants used throughout the SurvPlot core crate.

/// Date format every raw dataset date field must conform to (`MM/DD/YYYY`).
pub const RAW_DATE_FORMAT: &str = "%m/%d/%Y";
