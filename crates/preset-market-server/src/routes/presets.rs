//! Preset management routes

use std::collections::HashSet;

use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    error::{ApiError, Result},
    models::{
        CreatePresetRequest, CreatePresetResponse, MessageResponse, PaginatedResponse,
        PluginSaveResponse, PresetDetails, PresetListQuery, PresetSummary, UpdatePresetRequest,
    },
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use preset_market::{PresetDocument, PreviewOutcome};
use preset_market_store::{
    LikeState, NewPreset, PageRequest, PresetChanges, PresetId, PresetWithAuthor, User,
};
use tracing::{debug, error, info, warn};

/// Create preset routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_presets).post(create_preset))
        .route(
            "/{id}",
            get(get_preset).put(update_preset).delete(delete_preset),
        )
        .route("/{id}/download", get(download_preset))
        .route("/{id}/like", post(toggle_like))
}

/// List public presets with pagination, search and sorting
async fn list_presets(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    WithRejection(Query(query), _): WithRejection<Query<PresetListQuery>, ApiError>,
) -> Result<Json<PaginatedResponse<PresetSummary>>> {
    debug!("Listing presets with query: {:?}", query);

    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let page = state
        .db
        .presets()
        .list_public(
            search,
            query.sort,
            PageRequest::new(query.page, query.page_size),
        )
        .await?;

    let liked = match viewer.id() {
        Some(user_id) => state.db.likes().liked_preset_ids(user_id).await?,
        None => HashSet::new(),
    };

    Ok(Json(PaginatedResponse::from_page(page, |record| {
        let is_liked = liked.contains(&record.preset.id);
        PresetSummary::new(record, is_liked)
    })))
}

/// Get one preset; private presets are only visible to their owner
async fn get_preset(
    State(state): State<AppState>,
    viewer: MaybeAuthUser,
    WithRejection(Path(id), _): WithRejection<Path<PresetId>, ApiError>,
) -> Result<Json<PresetDetails>> {
    let record = find_preset(&state, id).await?;
    let is_owner = viewer.id() == Some(record.preset.author_id);

    if !record.preset.is_public && !is_owner {
        return Err(ApiError::forbidden("This preset is private"));
    }

    let is_liked = match viewer.id() {
        Some(user_id) => state.db.likes().is_liked(id, user_id).await?,
        None => false,
    };

    Ok(Json(PresetDetails::new(record, is_liked, is_owner)))
}

/// Create a preset and render its preview
async fn create_preset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<CreatePresetRequest>, ApiError>,
) -> Result<Json<CreatePresetResponse>> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::validation("Preset name is required"));
    }
    ensure_layout_object(&request.layout)?;

    let preview_image = render_preview(&state, request.layout.clone()).await;

    let created = state
        .db
        .presets()
        .create(NewPreset {
            name,
            description: request.description,
            layout: request.layout,
            preview_image: Some(preview_image),
            author_id: user.id,
            is_public: request.is_public,
        })
        .await?;

    info!(
        "User {} created preset {} ({})",
        user.id, created.preset.id, created.preset.slug
    );

    let preset = created.preset;
    Ok(Json(CreatePresetResponse {
        id: preset.id,
        name: preset.name,
        slug: preset.slug,
        preview_image: preset.preview_image,
        message: "Preset created".to_string(),
    }))
}

/// Owner-only partial update; a new layout re-renders the preview
async fn update_preset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<PresetId>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<UpdatePresetRequest>, ApiError>,
) -> Result<Json<MessageResponse>> {
    let record = find_preset(&state, id).await?;
    ensure_owner(&record, &user, "Only the owner can modify this preset")?;

    let name = match request.name {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(ApiError::validation("Preset name cannot be empty"));
            }
            Some(name)
        }
        None => None,
    };

    let preview_image = match &request.layout {
        Some(layout) => {
            ensure_layout_object(layout)?;
            Some(render_preview(&state, layout.clone()).await)
        }
        None => None,
    };

    state
        .db
        .presets()
        .update(
            id,
            PresetChanges {
                name,
                description: request.description,
                layout: request.layout,
                preview_image,
                is_public: request.is_public,
            },
        )
        .await?;

    info!("User {} updated preset {}", user.id, id);
    Ok(Json(MessageResponse::new("Preset updated")))
}

/// Owner-only delete; comments and likes go with it
async fn delete_preset(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<PresetId>, ApiError>,
) -> Result<Json<MessageResponse>> {
    let record = find_preset(&state, id).await?;
    ensure_owner(&record, &user, "Only the owner can delete this preset")?;

    state.db.presets().delete(id).await?;

    info!("User {} deleted preset {}", user.id, id);
    Ok(Json(MessageResponse::new("Preset deleted")))
}

/// Count a download and hand out the preset document.
///
/// With a plugin directory configured the document is written there and the
/// path returned; if that write fails the document is streamed instead.
async fn download_preset(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<PresetId>, ApiError>,
) -> Result<Response> {
    let record = find_preset(&state, id).await?;
    if !record.preset.is_public {
        return Err(ApiError::forbidden("Preset is not public"));
    }

    let downloads = state.db.presets().record_download(id).await?;
    debug!("Preset {} downloaded {} times", id, downloads);

    let preset = record.preset;
    let document = PresetDocument::new(preset.name, preset.slug, preset.layout)?;

    if let Some(plugin_dir) = state.config.plugin_data_dir.clone() {
        let to_write = document.clone();
        match tokio::task::spawn_blocking(move || to_write.write_to_plugin_dir(&plugin_dir)).await
        {
            Ok(Ok(path)) => {
                info!("Saved preset {} to {}", id, path.display());
                return Ok(Json(PluginSaveResponse {
                    message: "Preset saved to plugin directory".to_string(),
                    path: path.display().to_string(),
                    preset: document,
                })
                .into_response());
            }
            Ok(Err(e)) => warn!("Failed to save preset to plugin directory: {}", e),
            Err(e) => error!("Plugin directory write task failed: {}", e),
        }
    }

    let body = document.to_pretty_json()?;
    let disposition = format!("attachment; filename=\"{}\"", document.file_name());

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/json; charset=utf-8".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// Like or unlike a preset
async fn toggle_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    WithRejection(Path(id), _): WithRejection<Path<PresetId>, ApiError>,
) -> Result<Json<LikeState>> {
    let like = state.db.likes().toggle(id, user.id).await?;
    debug!(
        "User {} {} preset {}",
        user.id,
        if like.liked { "liked" } else { "unliked" },
        id
    );
    Ok(Json(like))
}

async fn find_preset(state: &AppState, id: PresetId) -> Result<PresetWithAuthor> {
    state
        .db
        .presets()
        .find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Preset not found"))
}

fn ensure_owner(record: &PresetWithAuthor, user: &User, message: &str) -> Result<()> {
    if record.preset.author_id != user.id {
        return Err(ApiError::forbidden(message));
    }
    Ok(())
}

fn ensure_layout_object(layout: &serde_json::Value) -> Result<()> {
    if !layout.is_object() {
        return Err(ApiError::validation("Layout must be a JSON object"));
    }
    Ok(())
}

/// Render off the async runtime; failure degrades to the placeholder path
async fn render_preview(state: &AppState, layout: serde_json::Value) -> String {
    let renderer = state.previews.clone();
    match tokio::task::spawn_blocking(move || renderer.render(&layout)).await {
        Ok(PreviewOutcome::Generated { path }) => {
            debug!("Preview written to {}", path);
            path
        }
        Ok(PreviewOutcome::Fallback { path, reason }) => {
            warn!("Preview generation failed, using placeholder: {}", reason);
            path
        }
        Err(e) => {
            error!("Preview task failed: {}", e);
            state.previews.fallback_path().to_string()
        }
    }
}
