pub mod api;
mod middleware;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware as axum_middleware, routing::get};

use crate::application::error::ErrorReport;
use crate::application::posts::PostService;
use crate::application::repos::{HealthCheck, RepoError};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub posts: Arc<PostService>,
    pub health: Arc<dyn HealthCheck>,
}

/// Full HTTP surface: the content API plus a database health probe.
pub fn build_router(state: RouterState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(api::build_api_router())
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health(State(state): State<RouterState>) -> Response {
    db_health_response(state.health.health_check().await)
}

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
