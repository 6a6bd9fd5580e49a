use axum::{
    Json,
    extract::{Query, State},
};

use crate::range::{RangeRequest, fetch_range};

use super::ResolverState;
use super::types::{
    ApiFailure, ApiResult, BootstrapResponse, DrawsResponse, HealthResponse, LatestResponse,
    RangeQuery,
};

pub(super) async fn health(State(state): State<ResolverState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        now: state.clock.now().to_rfc3339(),
    })
}

pub(super) async fn latest(State(state): State<ResolverState>) -> ApiResult<LatestResponse> {
    let latest_draw_no = state.resolver.resolve_latest().await?;
    Ok(Json(LatestResponse { latest_draw_no }))
}

pub(super) async fn bootstrap(State(state): State<ResolverState>) -> ApiResult<BootstrapResponse> {
    let draws = state.bootstrap.load(false).await;
    if draws.is_empty() {
        return Err(ApiFailure::not_found("bootstrap snapshot unavailable"));
    }
    Ok(Json(BootstrapResponse {
        draws: draws.as_ref().clone(),
    }))
}

pub(super) async fn draws(
    State(state): State<ResolverState>,
    Query(query): Query<RangeQuery>,
) -> ApiResult<DrawsResponse> {
    let request = RangeRequest::parse(query.start.as_deref(), query.end.as_deref())?;
    let result = fetch_range(&state.resolver, request).await;
    Ok(Json(DrawsResponse {
        draws: result.draws,
        missing: result.missing,
    }))
}
