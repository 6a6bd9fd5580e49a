use aide::OperationOutput;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lotto_draw::Draw;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{LatestResolutionError, RangeValidationError};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub ok: bool,
    /// Server time, RFC 3339.
    pub now: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LatestResponse {
    pub latest_draw_no: u32,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BootstrapResponse {
    pub draws: Vec<Draw>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DrawsResponse {
    pub draws: Vec<Draw>,
    pub missing: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub message: String,
}

/// Raw `start`/`end` values; validated by the handler so that a bad value
/// yields the JSON error body instead of axum's plain-text rejection.
#[derive(Debug, Deserialize, JsonSchema)]
pub(super) struct RangeQuery {
    pub(super) start: Option<String>,
    pub(super) end: Option<String>,
}

pub(super) struct ApiFailure {
    status: StatusCode,
    message: String,
}

impl ApiFailure {
    pub(super) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<RangeValidationError> for ApiFailure {
    fn from(e: RangeValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<LatestResolutionError> for ApiFailure {
    fn from(e: LatestResolutionError) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

impl OperationOutput for ApiFailure {
    type Inner = ErrorBody;
}

pub(super) type ApiResult<T> = Result<Json<T>, ApiFailure>;
