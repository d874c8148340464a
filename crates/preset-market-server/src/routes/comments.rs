//! Comment routes

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, Result},
    models::{
        CommentResponse, CreateCommentRequest, MessageResponse, PaginatedResponse,
        PaginationQuery,
    },
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use axum_extra::extract::WithRejection;
use preset_market_store::{CommentId, PresetId};
use tracing::info;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/preset/{preset_id}",
            get(list_comments).post(create_comment),
        )
        .route("/{id}", delete(delete_comment))
}

/// Comments on a preset, newest first
async fn list_comments(
    State(state): State<AppState>,
    WithRejection(Path(preset_id), _): WithRejection<Path<PresetId>, ApiError>,
    WithRejection(Query(query), _): WithRejection<Query<PaginationQuery>, ApiError>,
) -> Result<Json<PaginatedResponse<CommentResponse>>> {
    ensure_preset_exists(&state, preset_id).await?;

    let page = state
        .db
        .comments()
        .list_for_preset(preset_id, query.page_request())
        .await?;

    Ok(Json(PaginatedResponse::from_page(page, CommentResponse::from)))
}

async fn create_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(preset_id), _): WithRejection<Path<PresetId>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<CreateCommentRequest>, ApiError>,
) -> Result<Json<CommentResponse>> {
    let content = request.content.trim();
    if content.is_empty() {
        return Err(ApiError::validation("Comment content cannot be empty"));
    }
    ensure_preset_exists(&state, preset_id).await?;

    let comment = state
        .db
        .comments()
        .create(preset_id, user.id, content)
        .await?;

    info!(
        "User {} commented on preset {} ({})",
        user.id, preset_id, comment.comment.id
    );
    Ok(Json(CommentResponse::from(comment)))
}

/// Author-only delete
async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<CommentId>, ApiError>,
) -> Result<Json<MessageResponse>> {
    let comment = state
        .db
        .comments()
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;

    if comment.author_id != user.id {
        return Err(ApiError::forbidden("Only the author can delete this comment"));
    }

    state.db.comments().delete(id).await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}

async fn ensure_preset_exists(state: &AppState, preset_id: PresetId) -> Result<()> {
    if state.db.presets().find(preset_id).await?.is_none() {
        return Err(ApiError::not_found("Preset not found"));
    }
    Ok(())
}
