//! # API REST
//!
//! REST API for SurvPlot.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON wire models, CORS)
//!
//! The cohort is loaded and normalised once at startup by the server
//! binary; every request is an independent recomputation over that
//! immutable base set, so handlers share nothing mutable.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use survplot_core::{
    constants::RAW_DATE_FORMAT, CohortFilter, MedianSurvival, Patient, SurvivalCurve,
};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
///
/// Holds the immutable base cohort, sorted ascending by time to endpoint.
/// Filtered views are recomputed per request and never stored.
#[derive(Clone)]
pub struct AppState {
    pub cohort: Arc<Vec<Patient>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_patients, survival_curve, summary),
    components(schemas(
        HealthRes,
        ListPatientsRes,
        PatientRes,
        SurvivalCurveRes,
        PlotPointRes,
        CurveStepRes,
        SummaryRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", get(list_patients))
        .route("/curve", get(survival_curve))
        .route("/summary", get(summary))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A normalised patient as served to the chart, with dates rendered back to
/// the dataset's `MM/DD/YYYY` convention.
#[derive(Serialize, ToSchema)]
pub struct PatientRes {
    pub name: String,
    pub mrn: String,
    #[schema(value_type = String)]
    pub sex: survplot_core::Sex,
    pub age: i32,
    pub censored: bool,
    /// Endpoint kind: "death" or "censor".
    pub endpoint: String,
    pub start_date: String,
    pub end_date: String,
    pub birth_date: String,
    pub time_to_endpoint: i64,
    #[schema(value_type = String)]
    pub include: survplot_core::YesNo,
    #[schema(value_type = String)]
    pub transplant: survplot_core::YesNo,
}

#[derive(Serialize, ToSchema)]
pub struct ListPatientsRes {
    pub patients: Vec<PatientRes>,
}

/// One scatter point of the chart: a patient plotted at their endpoint time
/// against the cohort's at-risk fraction there.
#[derive(Serialize, ToSchema)]
pub struct PlotPointRes {
    pub time: i64,
    pub at_risk: f64,
    pub censored: bool,
    pub name: String,
    pub age: i32,
    #[schema(value_type = String)]
    pub sex: survplot_core::Sex,
}

/// One step of the survival curve, drawn step-after by the chart.
#[derive(Serialize, ToSchema)]
pub struct CurveStepRes {
    pub time: i64,
    pub at_risk: f64,
}

/// The textual summary block next to the chart.
#[derive(Serialize, ToSchema)]
pub struct SummaryRes {
    pub count: usize,
    pub censored: usize,
    /// Median survival in days, absent when not estimable or no data.
    pub median_days: Option<i64>,
    pub median_label: String,
    pub filter_label: String,
}

#[derive(Serialize, ToSchema)]
pub struct SurvivalCurveRes {
    pub points: Vec<PlotPointRes>,
    pub steps: Vec<CurveStepRes>,
    pub summary: SummaryRes,
}

/// Filter criteria accepted by `/curve` and `/summary`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FilterQuery {
    /// Keep patients diagnosed strictly after this MM/DD/YYYY date.
    pub diagnosed_after: Option<String>,
    /// Keep patients at least this old at diagnosis.
    pub min_age: Option<i32>,
    /// Keep only patients first treated at this centre.
    pub first_treatment: Option<bool>,
    /// Keep only bone marrow transplant recipients.
    pub transplant: Option<bool>,
}

fn filter_from_query(query: FilterQuery) -> Result<CohortFilter, (StatusCode, &'static str)> {
    let diagnosed_after = match query.diagnosed_after.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => {
            match NaiveDate::parse_from_str(value, RAW_DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::error!("Invalid diagnosed_after date {value:?}: {e}");
                    return Err((StatusCode::BAD_REQUEST, "Invalid diagnosed_after date"));
                }
            }
        }
        _ => None,
    };

    Ok(CohortFilter {
        diagnosed_after,
        min_age: query.min_age,
        first_treatment: query.first_treatment.unwrap_or(false),
        transplant: query.transplant.unwrap_or(false),
    })
}

fn patient_res(patient: &Patient) -> PatientRes {
    PatientRes {
        name: patient.name.clone(),
        mrn: patient.mrn.clone(),
        sex: patient.sex,
        age: patient.age,
        censored: patient.censored,
        endpoint: patient.endpoint_label().to_string(),
        start_date: patient.start_date.format(RAW_DATE_FORMAT).to_string(),
        end_date: patient.end_date.format(RAW_DATE_FORMAT).to_string(),
        birth_date: patient.birth_date.format(RAW_DATE_FORMAT).to_string(),
        time_to_endpoint: patient.time_to_endpoint,
        include: patient.include,
        transplant: patient.transplant,
    }
}

fn summary_res(curve: &SurvivalCurve, filter: &CohortFilter) -> SummaryRes {
    let median = curve.median();
    SummaryRes {
        count: curve.summary_count(),
        censored: curve.censored_count(),
        median_days: match median {
            MedianSurvival::Estimated(days) => Some(days),
            MedianSurvival::NotEstimable | MedianSurvival::NoData => None,
        },
        median_label: median.to_string(),
        filter_label: filter.describe(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Returns the current health status of the SurvPlot service. Used for
/// monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "SurvPlot REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/patients",
    responses(
        (status = 200, description = "The full normalised cohort", body = ListPatientsRes)
    )
)]
/// List the full normalised cohort
///
/// Returns every patient of the base cohort, unfiltered, sorted ascending
/// by time to endpoint. Dates are rendered in the dataset's MM/DD/YYYY
/// convention for display.
#[axum::debug_handler]
async fn list_patients(State(state): State<AppState>) -> Json<ListPatientsRes> {
    let patients = state.cohort.iter().map(patient_res).collect();
    Json(ListPatientsRes { patients })
}

#[utoipa::path(
    get,
    path = "/curve",
    params(FilterQuery),
    responses(
        (status = 200, description = "Survival curve for the filtered cohort", body = SurvivalCurveRes),
        (status = 400, description = "Bad request")
    )
)]
/// Survival curve for the (optionally filtered) cohort
///
/// Applies the filter criteria to the base cohort, then returns one scatter
/// point per patient, the step curve, and the summary block. The filtered
/// subset inherits the base cohort's ordering, so the curve engine's
/// sortedness precondition holds.
///
/// # Errors
/// Returns `400 Bad Request` if `diagnosed_after` is not an MM/DD/YYYY date.
#[axum::debug_handler]
async fn survival_curve(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<SurvivalCurveRes>, (StatusCode, &'static str)> {
    let filter = filter_from_query(query)?;
    let patients = filter.apply(&state.cohort);
    let curve = SurvivalCurve::from_sorted(&patients);

    let points = patients
        .iter()
        .map(|p| PlotPointRes {
            time: p.time_to_endpoint,
            at_risk: curve.risk_fraction_at(p.time_to_endpoint).unwrap_or(0.0),
            censored: p.censored,
            name: p.name.clone(),
            age: p.age,
            sex: p.sex,
        })
        .collect();

    let steps = curve
        .points()
        .into_iter()
        .map(|p| CurveStepRes {
            time: p.time,
            at_risk: p.at_risk,
        })
        .collect();

    let summary = summary_res(&curve, &filter);

    Ok(Json(SurvivalCurveRes {
        points,
        steps,
        summary,
    }))
}

#[utoipa::path(
    get,
    path = "/summary",
    params(FilterQuery),
    responses(
        (status = 200, description = "Summary for the filtered cohort", body = SummaryRes),
        (status = 400, description = "Bad request")
    )
)]
/// Summary block for the (optionally filtered) cohort
///
/// Returns the patient count, censored count, median survival estimate and
/// the caption describing the active filters.
///
/// # Errors
/// Returns `400 Bad Request` if `diagnosed_after` is not an MM/DD/YYYY date.
#[axum::debug_handler]
async fn summary(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<SummaryRes>, (StatusCode, &'static str)> {
    let filter = filter_from_query(query)?;
    let patients = filter.apply(&state.cohort);
    let curve = SurvivalCurve::from_sorted(&patients);
    Ok(Json(summary_res(&curve, &filter)))
}
