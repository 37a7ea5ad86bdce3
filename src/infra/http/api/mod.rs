pub mod error;
pub mod handlers;

use axum::{
    Router,
    routing::{get, put},
};

use crate::infra::http::RouterState;

pub fn build_api_router() -> Router<RouterState> {
    Router::new()
        .route(
            "/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/posts/update-author", put(handlers::update_author))
        .route("/posts/{id}", get(handlers::get_post))
}
