pub mod checkout;
pub mod products;
pub mod recommend;
pub mod upload;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{DefaultBodyLimit, FromRequest, Path, Request};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// JSON error body: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub(crate) fn multipart_error(e: MultipartError) -> ApiError {
    api_error(e.status(), format!("Invalid upload: {}", e.body_text()))
}

pub(crate) fn multipart_rejection(rejection: MultipartRejection) -> ApiError {
    api_error(rejection.status(), rejection.body_text())
}

/// Path parameter, unwrapped or turned into a JSON error.
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(value)| value)
        .map_err(|rejection| api_error(rejection.status(), rejection.body_text()))
}

/// `Json<T>` whose rejections (bad syntax, wrong content type, body too
/// large) are reported as JSON error bodies.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(api_error(rejection.status(), rejection.body_text())),
        }
    }
}

async fn not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

/// All HTTP routes of the service.
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/health", get(products::health))
        .route("/api/products", get(products::list_products))
        .route("/api/products/{id}", get(products::get_product))
        .route("/api/catalog", get(products::catalog_stats))
        .route("/api/catalog/reload", post(products::reload_catalog))
        .route("/api/config", get(products::get_config))
        .route("/api/recommendations", post(recommend::recommend))
        .route("/api/recommendations/initial", get(recommend::initial))
        .route("/api/upload", post(upload::upload_image))
        .route("/uploads/{filename}", get(upload::serve_upload))
        .route("/api/checkout", post(checkout::checkout))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
