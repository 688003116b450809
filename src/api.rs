//! HTTP API handlers for Binsight.
//!
//! Thin request/response wrappers: each handler fetches the snapshots it
//! needs from storage, hands them to the pure forecasting/aggregation
//! functions with `Utc::now()` as the evaluation instant, and maps failures
//! to status codes. Forecasting is an enhancement, not a critical path — the
//! only errors that surface here come from storage, and an empty fleet or an
//! empty transaction log is a valid state, never an error.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::forecast;
use crate::model::{
    BinSnapshot, BinStatus, BinsQuery, BinsResponse, CreateBinRequest, DepositRequest,
    PredictionsQuery, PredictionsResponse, UpdateBinRequest,
};
use crate::stats::{self, RoutePlan, StatsReport};
use crate::storage::Storage;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/deposits", post(post_deposit))
        .route("/admin/stats", get(get_stats))
        .route("/admin/predictions", get(get_predictions))
        .route("/admin/route", get(get_route))
        .route("/admin/bins", get(get_bins).post(post_bin))
        .route("/admin/bins/:id", patch(patch_bin))
        .route("/admin/bins/:id/empty", post(post_empty_bin))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /deposits - Record a recycling transaction.
///
/// The timestamp is server-assigned. Returns `202 Accepted` on success,
/// `404` when the referenced bin is unknown.
#[instrument(skip(state), fields(bin_id = %request.bin_id))]
pub async fn post_deposit(
    State(state): State<AppState>,
    Json(request): Json<DepositRequest>,
) -> Result<StatusCode, StatusCode> {
    let bin = state.storage.get_bin(&request.bin_id).await.map_err(|e| {
        warn!(bin_id = %request.bin_id, error = %e, "Failed to look up bin");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    if bin.is_none() {
        warn!(bin_id = %request.bin_id, "Deposit for unknown bin");
        return Err(StatusCode::NOT_FOUND);
    }

    match state
        .storage
        .insert_transaction(
            &request.bin_id,
            request.user_id.as_deref(),
            request.points_earned,
            request.co2_saved,
            Utc::now(),
        )
        .await
    {
        Ok(()) => {
            info!(
                bin_id = %request.bin_id,
                points = request.points_earned,
                "Deposit recorded"
            );
            Ok(StatusCode::ACCEPTED)
        }
        Err(e) => {
            warn!(bin_id = %request.bin_id, error = %e, "Failed to record deposit");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /admin/stats - Full dashboard report.
///
/// Combines user/bin/transaction aggregates, high-fill alerts, the top-N
/// fill predictions, and the dense 14-day activity series.
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsReport>, StatusCode> {
    let now = Utc::now();

    let result = tokio::try_join!(
        state.storage.count_distinct_users(),
        state.storage.list_bins(None),
        state.storage.list_transactions(),
    );

    match result {
        Ok((total_users, bins, transactions)) => {
            let report = stats::build_report(total_users, &bins, &transactions, now);
            info!(
                bins = report.bins.total,
                transactions = report.transactions.total,
                predictions = report.predictions.len(),
                "Stats report assembled"
            );
            Ok(Json(report))
        }
        Err(e) => {
            warn!(error = %e, "Failed to assemble stats report");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /admin/predictions - Ranked fill predictions.
///
/// # Query Parameters
///
/// - `limit` (optional): Maximum predictions to return (default: 5)
#[instrument(skip(state))]
pub async fn get_predictions(
    State(state): State<AppState>,
    Query(query): Query<PredictionsQuery>,
) -> Result<Json<PredictionsResponse>, StatusCode> {
    let now = Utc::now();

    match state.storage.list_bins(None).await {
        Ok(bins) => {
            let fleet = forecast::forecast_fleet(&bins, now);
            let skipped_records = fleet.skipped_records;
            let predictions = forecast::rank(fleet.predictions, query.limit);

            info!(
                count = predictions.len(),
                skipped = skipped_records,
                "Predictions computed"
            );
            Ok(Json(PredictionsResponse {
                generated_at: now,
                predictions,
                skipped_records,
            }))
        }
        Err(e) => {
            warn!(error = %e, "Failed to compute predictions");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /admin/route - Prioritized collection route with placeholder ETAs.
///
/// # Query Parameters
///
/// - `limit` (optional): Maximum stops on the route (default: 5)
#[instrument(skip(state))]
pub async fn get_route(
    State(state): State<AppState>,
    Query(query): Query<PredictionsQuery>,
) -> Result<Json<RoutePlan>, StatusCode> {
    let now = Utc::now();

    match state.storage.list_active_bins().await {
        Ok(bins) => {
            let fleet = forecast::forecast_fleet(&bins, now);
            let ranked = forecast::rank(fleet.predictions, query.limit);
            let plan = stats::build_route_plan(ranked, now);

            info!(stops = plan.stops.len(), "Route plan computed");
            Ok(Json(plan))
        }
        Err(e) => {
            warn!(error = %e, "Failed to compute route plan");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /admin/bins - List bins, optionally filtered by status.
///
/// Returns `400` for an unknown status filter value.
#[instrument(skip(state))]
pub async fn get_bins(
    State(state): State<AppState>,
    Query(query): Query<BinsQuery>,
) -> Result<Json<BinsResponse>, StatusCode> {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<BinStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(filter = raw, error = %e, "Invalid status filter");
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => None,
    };

    match state.storage.list_bins(status).await {
        Ok(bins) => {
            let count = bins.len();
            info!(count, "Bins listed");
            Ok(Json(BinsResponse { bins, count }))
        }
        Err(e) => {
            warn!(error = %e, "Failed to list bins");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /admin/bins - Register a new bin.
///
/// `created_at` is server-assigned. Returns `201 Created`, or `409` when the
/// id is already taken.
#[instrument(skip(state), fields(bin_id = %request.id))]
pub async fn post_bin(
    State(state): State<AppState>,
    Json(request): Json<CreateBinRequest>,
) -> Result<(StatusCode, Json<BinSnapshot>), StatusCode> {
    let bin = BinSnapshot {
        id: request.id,
        name: request.name,
        status: request.status,
        fill_level: request.fill_level.clamp(0, 100),
        last_emptied_at: None,
        created_at: Utc::now(),
    };

    match state.storage.insert_bin(&bin).await {
        Ok(true) => {
            info!(bin_id = %bin.id, "Bin registered");
            Ok((StatusCode::CREATED, Json(bin)))
        }
        Ok(false) => {
            warn!(bin_id = %bin.id, "Bin id already registered");
            Err(StatusCode::CONFLICT)
        }
        Err(e) => {
            warn!(bin_id = %bin.id, error = %e, "Failed to register bin");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// PATCH /admin/bins/{id} - Update fill level and/or status.
///
/// Fill levels are clamped into `[0, 100]`. Returns the updated snapshot,
/// or `404` for an unknown bin.
#[instrument(skip(state))]
pub async fn patch_bin(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBinRequest>,
) -> Result<Json<BinSnapshot>, StatusCode> {
    match state
        .storage
        .update_bin(&id, request.fill_level, request.status)
        .await
    {
        Ok(Some(bin)) => {
            info!(bin_id = %id, fill_level = bin.fill_level, "Bin updated");
            Ok(Json(bin))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(bin_id = %id, error = %e, "Failed to update bin");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /admin/bins/{id}/empty - Mark a bin as emptied.
///
/// Resets the fill level to zero, stamps `last_emptied_at`, and returns the
/// bin to active service. Returns `404` for an unknown bin.
#[instrument(skip(state))]
pub async fn post_empty_bin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BinSnapshot>, StatusCode> {
    match state.storage.mark_emptied(&id, Utc::now()).await {
        Ok(Some(bin)) => {
            info!(bin_id = %id, "Bin emptied");
            Ok(Json(bin))
        }
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            warn!(bin_id = %id, error = %e, "Failed to mark bin emptied");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /health - Simple health check endpoint.
pub async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}
