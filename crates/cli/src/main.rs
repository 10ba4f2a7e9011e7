use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use survplot_core::{
    constants::RAW_DATE_FORMAT, follow_up_cutoff_from_env_value, load_cohort, load_raw_records,
    normalise_cohort, CohortError, CohortFilter, CohortResult, CoreConfig, Patient, SurvivalCurve,
};

#[derive(Parser)]
#[command(name = "survplot")]
#[command(about = "Survival analysis over small clinical cohorts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the normalised cohort
    Patients {
        /// Path to the JSON dataset
        dataset: PathBuf,
        #[command(flatten)]
        cohort: CohortOpts,
    },
    /// Print the cohort summary (n, censored, median survival)
    Summary {
        /// Path to the JSON dataset
        dataset: PathBuf,
        #[command(flatten)]
        cohort: CohortOpts,
        #[command(flatten)]
        filter: FilterOpts,
    },
    /// Print the survival step curve
    Curve {
        /// Path to the JSON dataset
        dataset: PathBuf,
        #[command(flatten)]
        cohort: CohortOpts,
        #[command(flatten)]
        filter: FilterOpts,
    },
    /// Report records that failed normalisation or look inconsistent
    Check {
        /// Path to the JSON dataset
        dataset: PathBuf,
        #[command(flatten)]
        cohort: CohortOpts,
    },
}

#[derive(Args)]
struct CohortOpts {
    /// Follow-up freshness cutoff (MM/DD/YYYY)
    #[arg(long)]
    cutoff: Option<String>,
}

#[derive(Args)]
struct FilterOpts {
    /// Keep patients diagnosed strictly after this date (MM/DD/YYYY)
    #[arg(long)]
    diagnosed_after: Option<String>,
    /// Keep patients at least this old at diagnosis
    #[arg(long)]
    min_age: Option<i32>,
    /// Keep only patients first treated here
    #[arg(long)]
    first_treatment: bool,
    /// Keep only bone marrow transplant recipients
    #[arg(long)]
    transplant: bool,
}

fn build_config(cohort: &CohortOpts) -> CohortResult<CoreConfig> {
    let cutoff = follow_up_cutoff_from_env_value(cohort.cutoff.clone())?;
    CoreConfig::new(Utc::now().date_naive(), cutoff)
}

fn build_filter(filter: &FilterOpts) -> CohortResult<CohortFilter> {
    let diagnosed_after = filter
        .diagnosed_after
        .as_deref()
        .map(|value| {
            NaiveDate::parse_from_str(value.trim(), RAW_DATE_FORMAT).map_err(|_| {
                CohortError::MalformedDate {
                    field: "--diagnosed-after",
                    value: value.to_string(),
                }
            })
        })
        .transpose()?;

    Ok(CohortFilter {
        diagnosed_after,
        min_age: filter.min_age,
        first_treatment: filter.first_treatment,
        transplant: filter.transplant,
    })
}

fn load_filtered(
    dataset: &Path,
    cohort: &CohortOpts,
    filter: &FilterOpts,
) -> CohortResult<(CohortFilter, Vec<Patient>)> {
    let cfg = build_config(cohort)?;
    let filter = build_filter(filter)?;
    let cohort = load_cohort(dataset, &cfg)?;
    let patients = filter.apply(&cohort.patients);
    Ok((filter, patients))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Patients { dataset, cohort }) => {
            let cfg = build_config(&cohort)?;
            let cohort = load_cohort(&dataset, &cfg)?;
            if cohort.patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in &cohort.patients {
                    println!(
                        "MRN: {}, Name: {} ({}{}), Dx: {}, {}: {}, {} days",
                        patient.mrn,
                        patient.name,
                        patient.age,
                        patient.sex,
                        patient.start_date.format(RAW_DATE_FORMAT),
                        patient.endpoint_label(),
                        patient.end_date.format(RAW_DATE_FORMAT),
                        patient.time_to_endpoint
                    );
                }
            }
        }
        Some(Commands::Summary {
            dataset,
            cohort,
            filter,
        }) => {
            let (filter, patients) = load_filtered(&dataset, &cohort, &filter)?;
            let curve = SurvivalCurve::from_sorted(&patients);
            println!("{}", filter.describe());
            println!("n = {}", curve.summary_count());
            println!("censored = {}", curve.censored_count());
            println!("{}", curve.median());
        }
        Some(Commands::Curve {
            dataset,
            cohort,
            filter,
        }) => {
            let (_, patients) = load_filtered(&dataset, &cohort, &filter)?;
            let curve = SurvivalCurve::from_sorted(&patients);
            if curve.summary_count() == 0 {
                println!("No patients selected.");
            } else {
                println!("{:>8}  {:>8}", "days", "at risk");
                for point in curve.points() {
                    println!("{:>8}  {:>7.1}%", point.time, point.at_risk * 100.0);
                }
            }
        }
        Some(Commands::Check { dataset, cohort }) => {
            let cfg = build_config(&cohort)?;
            let records = load_raw_records(&dataset)?;
            let cohort = normalise_cohort(&records, &cfg);
            println!(
                "{} records: {} normalised, {} rejected, {} warnings",
                records.len(),
                cohort.patients.len(),
                cohort.rejected.len(),
                cohort.warnings.len()
            );
            for rejected in &cohort.rejected {
                eprintln!(
                    "record {} (MRN {:?}): {}",
                    rejected.index, rejected.mrn, rejected.error
                );
            }
            for warning in &cohort.warnings {
                eprintln!("{warning}");
            }
        }
        None => {
            println!("Use 'survplot --help' for commands");
        }
    }

    Ok(())
}
