use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{ItemsResponse, OwnedPreset, PresetSummary},
};
use axum::{Json, Router, extract::State, routing::get};

pub fn router() -> Router<AppState> {
    Router::new().route("/me/presets", get(my_presets))
}

/// Every preset the caller owns, private ones included
async fn my_presets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ItemsResponse<OwnedPreset>>> {
    let presets = state.db.presets().list_by_author(user.id).await?;
    let liked = state.db.likes().liked_preset_ids(user.id).await?;

    let items = presets
        .into_iter()
        .map(|record| {
            let is_public = record.preset.is_public;
            let is_liked = liked.contains(&record.preset.id);
            OwnedPreset {
                summary: PresetSummary::new(record, is_liked),
                is_public,
            }
        })
        .collect();

    Ok(Json(ItemsResponse { items }))
}
