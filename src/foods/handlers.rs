use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::draft::format_score_for_display;
use crate::error::ApiError;
use crate::foods::dto::{
    DeleteResponse, FoodListItem, LabelParams, LangParams, ListParams, RescanRequest,
    SaveResponse, UploadResponse,
};
use crate::foods::model::{FoodRecord, FoodUpdate, ImageSlot};
use crate::foods::{repo, service};
use crate::i18n::Lang;
use crate::nutrition::{derive_label, NutritionFacts};
use crate::score::{check_eligibility, compute_sub_metrics, SubMetrics};
use crate::state::AppState;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/:id", get(get_food))
        .route("/foods/:id/label", get(get_label))
        .route("/foods/:id/score-preview", get(score_preview))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/foods/:id", axum::routing::delete(delete_food))
        .route("/foods/:id/update", patch(update_food))
        .route("/foods/:id/rescan", post(rescan_food))
        .route(
            "/foods/:id/images/:slot",
            post(upload_image).layer(DefaultBodyLimit::max(20 * 1024 * 1024)), // 20MB
        )
}

fn lang_of(params: &LangParams) -> Lang {
    params.lang.as_deref().map(Lang::from_tag).unwrap_or_default()
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(p): Query<ListParams>,
) -> Result<Json<Vec<FoodListItem>>, ApiError> {
    let foods = repo::list(&state.db, p.order_by, p.dir).await?;
    let items = foods
        .into_iter()
        .map(|f| FoodListItem {
            hfs_display: format_score_for_display(Some(f.hfs), false),
            id: f.id,
            name: f.name,
            brand: f.brand,
            category: f.category,
            hfs: f.hfs,
            energy_kcal: f.energy_kcal,
            front_photo_url: f.front_photo_url,
            last_update: f.last_update,
        })
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodRecord>, ApiError> {
    let food = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(food))
}

#[instrument(skip(state, payload))]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(lang): Query<LangParams>,
    Json(payload): Json<Value>,
) -> Result<Json<SaveResponse>, ApiError> {
    let outcome = service::save_food(&state, id, payload, lang_of(&lang)).await?;
    info!(food_id = %id, hfs = outcome.hfs, warnings = outcome.warnings.len(), "food saved");
    Ok(Json(SaveResponse {
        success: true,
        hfs: outcome.hfs,
        warnings: outcome.warnings,
    }))
}

#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    service::delete_food(&state, id).await?;
    info!(food_id = %id, "food deleted");
    Ok(Json(DeleteResponse { success: true }))
}

/// POST /foods/:id/images/:slot (multipart, field `file`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    Path((id, slot)): Path<(Uuid, ImageSlot)>,
    mut mp: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Ok(Some(field)) = mp.next_field().await {
        let name = field.name().map(|s| s.to_string());
        if name.as_deref() == Some("file") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            upload = Some((data, content_type));
            break;
        }
    }
    let (body, content_type) =
        upload.ok_or_else(|| ApiError::Validation("file is required".into()))?;

    let (path, public_url) = service::upload_image(&state, id, slot, body, &content_type).await?;
    Ok(Json(UploadResponse {
        success: true,
        path,
        public_url,
    }))
}

/// Re-extract one slot's photo and return the merged draft. Nothing is
/// persisted until the client saves.
#[instrument(skip(state, body))]
pub async fn rescan_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RescanRequest>,
) -> Result<Json<Value>, ApiError> {
    match service::rescan_food(&state, id, body.slot, &body.locked_fields).await {
        Ok(draft) => Ok(Json(Value::Object(draft))),
        Err(e) => {
            error!(error = %e, %id, "rescan failed");
            Err(e)
        }
    }
}

#[instrument(skip(state))]
pub async fn get_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(p): Query<LabelParams>,
) -> Result<Json<NutritionFacts>, ApiError> {
    let food = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    let update = FoodUpdate::from(food);
    Ok(Json(derive_label(&update, p.use_portion, p.servings)))
}

#[derive(Debug, Serialize)]
pub struct ScorePreview {
    pub eligible: bool,
    pub warnings: Vec<String>,
    /// Per-100g sub-metric breakdown, present entries only.
    pub scores: SubMetrics,
    pub hfs: f64,
    pub hfs_display: String,
    pub serving_size_value: Option<f64>,
    pub serving_size_unit: Option<String>,
    pub density: Option<f64>,
}

/// Breakdown view for the scores dialog: eligibility, the per-100g
/// parameters, and the stored score.
#[instrument(skip(state))]
pub async fn score_preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<LangParams>,
) -> Result<Json<ScorePreview>, ApiError> {
    let lang = lang_of(&params);
    let food = repo::get(&state.db, id).await?.ok_or(ApiError::NotFound)?;
    let update = FoodUpdate::from(food);

    let report = check_eligibility(&update, update.hfs_version);
    let scores = compute_sub_metrics(&update, lang)
        .map_err(|e| ApiError::Calculation(e.message))?;

    Ok(Json(ScorePreview {
        eligible: report.success,
        warnings: report.messages(lang),
        scores,
        hfs: update.hfs,
        hfs_display: format_score_for_display(Some(update.hfs), false),
        serving_size_value: update.serving_size_value,
        serving_size_unit: update.serving_size_unit,
        density: update.density,
    }))
}
