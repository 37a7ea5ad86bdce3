use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use inkpost_api_types::{Post, PostCreateRequest, UpdateAuthorRequest, UpdateAuthorResponse};
use uuid::Uuid;

use crate::application::posts::{CreatePostCommand, RenameAuthorCommand};
use crate::domain::posts::PostRecord;
use crate::infra::http::RouterState;

use super::error::ApiError;

pub async fn list_posts(State(state): State<RouterState>) -> Result<impl IntoResponse, ApiError> {
    let posts = state.posts.list_posts().await?;
    Ok(Json(posts.into_iter().map(post_to_api).collect::<Vec<_>>()))
}

pub async fn get_post(
    State(state): State<RouterState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path?;
    let post = state.posts.find_post(id).await?;
    Ok(Json(post_to_api(post)))
}

pub async fn create_post(
    State(state): State<RouterState>,
    payload: Result<Json<PostCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let command = CreatePostCommand {
        title: payload.title,
        content: payload.content,
        author: payload.author,
    };

    let post = state.posts.create_post(command).await?;
    Ok((StatusCode::CREATED, Json(post_to_api(post))))
}

pub async fn update_author(
    State(state): State<RouterState>,
    payload: Result<Json<UpdateAuthorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let command = RenameAuthorCommand {
        old_author: payload.old_author,
        new_author: payload.new_author,
    };

    let summary = state.posts.rename_author(command).await?;
    Ok(Json(UpdateAuthorResponse {
        updated_count: summary.updated_count,
    }))
}

fn post_to_api(post: PostRecord) -> Post {
    Post {
        id: post.id,
        title: post.title,
        content: post.content,
        author: post.author,
        created_at: post.created_at,
    }
}
