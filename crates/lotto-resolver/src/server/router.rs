use std::sync::Arc;

use aide::axum::{ApiRouter, routing::get};
use aide::openapi::{Info, OpenApi};
use aide::scalar::Scalar;
use axum::{Extension, Json, Router, routing::get as axum_get};

use super::ResolverState;
use super::handlers::{bootstrap, draws, health, latest};

pub fn build_router(state: ResolverState) -> Router {
    let mut api = OpenApi {
        info: Info {
            title: "Lotto Resolver API".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            ..Default::default()
        },
        ..Default::default()
    };

    let app = ApiRouter::new()
        .route(
            "/api/docs",
            Scalar::new("/api/docs/openapi.json")
                .with_title("Lotto Resolver API Docs")
                .axum_route(),
        )
        .api_route("/health", get(health))
        .api_route("/api/lotto/latest", get(latest))
        .api_route("/api/lotto/bootstrap", get(bootstrap))
        .api_route("/api/lotto/draws", get(draws))
        .with_state(state)
        .finish_api(&mut api);

    let api = Arc::new(api);
    app.route("/api/docs/openapi.json", axum_get(serve_openapi))
        .layer(Extension(api))
}

async fn serve_openapi(Extension(api): Extension<Arc<OpenApi>>) -> Json<OpenApi> {
    Json((*api).clone())
}
