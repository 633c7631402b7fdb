use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use server_api::{
    accept_rsvp, create_rsvp, delete_rsvp, dish_statuses, initialize_dishes, list_rsvps,
    reject_rsvp, stats, update_rsvp,
};
use shared::{
    domain::RsvpId,
    error::{ApiError, ErrorCode},
    protocol::{
        DishStatus, Envelope, RegistrationRequest, RsvpRecord, StatsPayload, UpdateRsvpRequest,
    },
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};
use tracing::{info, warn};

use crate::app_state::AppState;

type Failure = (StatusCode, Json<Envelope<()>>);
type Reply<T> = Result<(StatusCode, Json<Envelope<T>>), Failure>;

pub(crate) fn build_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/rsvps", get(http_list_rsvps).post(http_create_rsvp))
        .route(
            "/rsvps/:rsvp_id",
            put(http_update_rsvp).delete(http_delete_rsvp),
        )
        .route("/rsvps/:rsvp_id/accept", post(http_accept_rsvp))
        .route("/rsvps/:rsvp_id/reject", post(http_reject_rsvp))
        .route("/dishes", get(http_dish_status))
        .route("/stats", get(http_stats))
        .route("/init", post(http_init))
        .layer(cors);

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation | ErrorCode::DishUnavailable => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
    }
}

fn failure(err: ApiError) -> Failure {
    (status_for(err.code), Json(Envelope::failure(err.message)))
}

fn bad_body(rejection: JsonRejection) -> Failure {
    warn!(error = %rejection.body_text(), "rejected malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(Envelope::failure(rejection.body_text())),
    )
}

async fn http_list_rsvps(State(state): State<Arc<AppState>>) -> Reply<Vec<RsvpRecord>> {
    let rsvps = list_rsvps(&state.api).await;
    let total = rsvps.len();
    Ok((StatusCode::OK, Json(Envelope::ok(rsvps).with_total(total))))
}

async fn http_create_rsvp(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegistrationRequest>, JsonRejection>,
) -> Reply<RsvpRecord> {
    let Json(request) = payload.map_err(bad_body)?;
    let dish = request.selected_dish.clone();
    let record = create_rsvp(&state.api, request).await.map_err(|err| {
        info!(%dish, reason = %err.message, "rsvp: registration refused");
        failure(err)
    })?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(record).with_message("RSVP created")),
    ))
}

async fn http_update_rsvp(
    State(state): State<Arc<AppState>>,
    Path(rsvp_id): Path<i64>,
    payload: Result<Json<UpdateRsvpRequest>, JsonRejection>,
) -> Reply<RsvpRecord> {
    let Json(update) = payload.map_err(bad_body)?;
    let record = update_rsvp(&state.api, RsvpId(rsvp_id), update)
        .await
        .map_err(failure)?;
    Ok((
        StatusCode::OK,
        Json(Envelope::ok(record).with_message("RSVP updated")),
    ))
}

async fn http_delete_rsvp(
    State(state): State<Arc<AppState>>,
    Path(rsvp_id): Path<i64>,
) -> Reply<()> {
    delete_rsvp(&state.api, RsvpId(rsvp_id))
        .await
        .map_err(failure)?;
    Ok((StatusCode::OK, Json(Envelope::message_only("RSVP removed"))))
}

async fn http_accept_rsvp(
    State(state): State<Arc<AppState>>,
    Path(rsvp_id): Path<i64>,
) -> Reply<RsvpRecord> {
    let record = accept_rsvp(&state.api, RsvpId(rsvp_id))
        .await
        .map_err(failure)?;
    Ok((
        StatusCode::OK,
        Json(Envelope::ok(record).with_message("RSVP accepted")),
    ))
}

async fn http_reject_rsvp(
    State(state): State<Arc<AppState>>,
    Path(rsvp_id): Path<i64>,
) -> Reply<RsvpRecord> {
    let record = reject_rsvp(&state.api, RsvpId(rsvp_id))
        .await
        .map_err(failure)?;
    Ok((
        StatusCode::OK,
        Json(Envelope::ok(record).with_message("RSVP rejected")),
    ))
}

async fn http_dish_status(State(state): State<Arc<AppState>>) -> Reply<Vec<DishStatus>> {
    Ok((
        StatusCode::OK,
        Json(Envelope::ok(dish_statuses(&state.api).await)),
    ))
}

async fn http_stats(State(state): State<Arc<AppState>>) -> Reply<StatsPayload> {
    Ok((StatusCode::OK, Json(Envelope::ok(stats(&state.api).await))))
}

async fn http_init(State(state): State<Arc<AppState>>) -> Reply<()> {
    let added = initialize_dishes(&state.api).await;
    Ok((
        StatusCode::OK,
        Json(Envelope::message_only(format!(
            "dish counters initialized ({added} added)"
        ))),
    ))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
