//! Pipelines behind the food handlers: the save flow (validate, clean,
//! check, score, sanitize, persist), the two-step delete, per-slot image
//! uploads, and the rescan merge.

use bytes::Bytes;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::draft::{self, DraftSession};
use crate::error::ApiError;
use crate::extract::ScanMode;
use crate::foods::model::{FoodRecord, FoodUpdate, ImageSlot};
use crate::foods::repo;
use crate::i18n::{self, Lang};
use crate::score::{calculate_hfs, check_eligibility, HFS_SENTINEL};
use crate::state::AppState;

pub struct SaveOutcome {
    pub hfs: f64,
    pub warnings: Vec<String>,
}

/// Whether the record identifies a product well enough to bother scoring it.
/// Thinner than eligibility: a nameless or brandless record gets the
/// sentinel silently, without a warning.
fn identifies_product(update: &FoodUpdate) -> bool {
    !update.name.trim().is_empty()
        && update
            .brand
            .as_deref()
            .is_some_and(|b| !b.trim().is_empty())
}

/// Optional numerics keep their null-ness: a cleared form input means
/// "not declared", never zero.
const OPTIONAL_NUMERIC_FIELDS: [&str; 3] = ["price", "abv_percentage", "density"];

/// Fields the datastore or the save pipeline owns; client-sent values are
/// discarded before the payload is interpreted.
const SERVER_OWNED_FIELDS: [&str; 4] = ["id", "created_at", "last_update", "hfs"];

/// The editor round-trips cleared inputs as empty strings. Map those back to
/// null (or a parsed number) for the typed fields that are not plain text.
fn normalize_optionals(map: &mut Map<String, Value>) {
    for field in OPTIONAL_NUMERIC_FIELDS {
        if let Some(Value::String(s)) = map.get(field) {
            let trimmed = s.trim();
            let value = trimmed
                .parse::<f64>()
                .map(Value::from)
                .unwrap_or(Value::Null);
            map.insert(field.to_string(), value);
        }
    }
    if let Some(Value::String(s)) = map.get("nova") {
        let value = s.trim().parse::<i64>().map(Value::from).unwrap_or(Value::Null);
        map.insert("nova".to_string(), value);
    }
}

fn clean_ingredients(map: &mut Map<String, Value>) {
    let cleaned: Vec<String> = match map.get("ingredients_list") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        // The editor may hand the list back as the raw comma-joined text.
        Some(Value::String(s)) => draft::split_ingredients(s),
        _ => Vec::new(),
    };
    map.insert("ingredients_list".to_string(), serde_json::json!(cleaned));
}

/// Full save pipeline for a PATCH payload. The payload carries every field;
/// the caller gets back the persisted score and any eligibility warnings.
pub async fn save_food(
    state: &AppState,
    id: Uuid,
    payload: Value,
    lang: Lang,
) -> Result<SaveOutcome, ApiError> {
    let mut map = payload
        .as_object()
        .cloned()
        .ok_or_else(|| ApiError::Validation("Payload must be a JSON object".into()))?;

    let has_name = map
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !has_name {
        return Err(ApiError::Validation(i18n::required_name(lang).to_string()));
    }

    for field in SERVER_OWNED_FIELDS {
        map.remove(field);
    }
    normalize_optionals(&mut map);
    clean_ingredients(&mut map);
    draft::sanitize_numeric_fields(&mut map, &draft::REQUIRED_NUMERIC_FIELDS);

    let mut update: FoodUpdate = serde_json::from_value(Value::Object(map))
        .map_err(|e| ApiError::Validation(format!("Malformed payload: {e}")))?;

    let report = check_eligibility(&update, update.hfs_version);
    let warnings = report.messages(lang);

    // Ineligible records are still saved, carrying the sentinel. A failed
    // calculation blocks the save instead: never persist a half-scored row.
    let hfs = if report.success && identifies_product(&update) {
        let outcome = calculate_hfs(
            &update,
            update.hfs_version,
            state.scorer.as_ref(),
            lang,
        )
        .await
        .map_err(|e| ApiError::Calculation(e.message))?;
        outcome.hfs_score
    } else {
        HFS_SENTINEL
    };

    update.hfs = hfs;
    update.last_update = Some(OffsetDateTime::now_utc());

    let updated = repo::update(&state.db, id, &update)
        .await
        .map_err(ApiError::Transport)?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    Ok(SaveOutcome { hfs, warnings })
}

/// Object keys are flat, so the key is recoverable from the public URL's
/// last path segment.
fn key_from_url(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn image_keys(record: &FoodRecord) -> Vec<String> {
    ImageSlot::ALL
        .iter()
        .filter_map(|slot| slot.url_of(record))
        .filter_map(key_from_url)
        .collect()
}

/// Delete a record and its stored photos. Image removal goes first and is
/// best-effort: failures are logged and the row is deleted anyway, leaving
/// at worst an orphaned object, never a ghost record.
pub async fn delete_food(state: &AppState, id: Uuid) -> Result<(), ApiError> {
    let record = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Transport)?
        .ok_or(ApiError::NotFound)?;

    let keys = image_keys(&record);
    if !keys.is_empty() {
        let failed = state.storage.remove_objects(&keys).await;
        if !failed.is_empty() {
            warn!(food_id = %id, failed = failed.len(), "some images could not be removed; deleting row anyway");
        }
    }

    let deleted = repo::delete(&state.db, id)
        .await
        .map_err(ApiError::Transport)?;
    if !deleted {
        return Err(ApiError::NotFound);
    }
    Ok(())
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Upload one label photo and point the slot's URL column at it.
pub async fn upload_image(
    state: &AppState,
    id: Uuid,
    slot: ImageSlot,
    body: Bytes,
    content_type: &str,
) -> Result<(String, String), ApiError> {
    repo::get(&state.db, id)
        .await
        .map_err(ApiError::Transport)?
        .ok_or(ApiError::NotFound)?;

    let ext = ext_from_mime(content_type).unwrap_or("bin");
    let key = format!("{}-{}-{}.{}", id, slot.as_str(), Uuid::new_v4(), ext);

    state
        .storage
        .put_object(&key, body, content_type)
        .await
        .map_err(ApiError::Transport)?;

    let url = state.storage.public_url(&key);
    repo::set_image_url(&state.db, id, slot.column(), &url)
        .await
        .map_err(ApiError::Transport)?;

    Ok((key, url))
}

/// Re-run extraction over one slot's photo and merge the result into a draft
/// of the stored record. Locked fields and empty raw text are not
/// overwritten. Nothing is persisted; the caller reviews and saves.
pub async fn rescan_food(
    state: &AppState,
    id: Uuid,
    slot: ImageSlot,
    locked_fields: &[String],
) -> Result<Map<String, Value>, ApiError> {
    let record = repo::get(&state.db, id)
        .await
        .map_err(ApiError::Transport)?
        .ok_or(ApiError::NotFound)?;

    let url = slot
        .url_of(&record)
        .ok_or_else(|| ApiError::Validation(format!("No {} photo to rescan", slot.as_str())))?
        .to_string();

    let extracted = state
        .extractor
        .process(&[url], ScanMode::Rescan)
        .await
        .map_err(ApiError::Transport)?;

    let mut session = DraftSession::new(&record).map_err(ApiError::Transport)?;
    for field in locked_fields {
        session.toggle_lock(field);
    }
    session.apply_rescan(&extracted.0);

    Ok(session.draft().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_recovered_from_public_urls() {
        assert_eq!(
            key_from_url("https://cdn.local/food-images/abc-front-1.jpg"),
            Some("abc-front-1.jpg".to_string())
        );
        assert_eq!(key_from_url("https://cdn.local/dir/"), None);
    }

    #[test]
    fn product_identity_requires_name_and_brand() {
        let mut update = FoodUpdate {
            name: "Granola".into(),
            brand: Some("Acme".into()),
            ..FoodUpdate::default()
        };
        assert!(identifies_product(&update));

        update.brand = Some("  ".into());
        assert!(!identifies_product(&update));
        update.brand = None;
        assert!(!identifies_product(&update));
    }

    #[test]
    fn ingredients_cleanup_accepts_arrays_and_raw_text() {
        let mut map = serde_json::json!({"ingredients_list": [" Water ", "", "Salt"]})
            .as_object()
            .cloned()
            .unwrap();
        clean_ingredients(&mut map);
        assert_eq!(map["ingredients_list"], serde_json::json!(["Water", "Salt"]));

        let mut map = serde_json::json!({"ingredients_list": "Water, Sugar,  Salt ,"})
            .as_object()
            .cloned()
            .unwrap();
        clean_ingredients(&mut map);
        assert_eq!(
            map["ingredients_list"],
            serde_json::json!(["Water", "Sugar", "Salt"])
        );

        let mut map = serde_json::Map::new();
        clean_ingredients(&mut map);
        assert_eq!(map["ingredients_list"], serde_json::json!([]));
    }

    #[test]
    fn empty_strings_normalize_to_null_for_optional_numerics() {
        let mut map = serde_json::json!({
            "price": "",
            "abv_percentage": "4.5",
            "density": "",
            "nova": "3",
        })
        .as_object()
        .cloned()
        .unwrap();
        normalize_optionals(&mut map);
        assert_eq!(map["price"], Value::Null);
        assert_eq!(map["abv_percentage"], serde_json::json!(4.5));
        assert_eq!(map["density"], Value::Null);
        assert_eq!(map["nova"], serde_json::json!(3));
    }

    #[test]
    fn payload_parses_after_normalization() {
        let mut map = serde_json::json!({
            "name": "Granola",
            "brand": "Acme",
            "energy_kcal": "400",
            "price": "",
            "nova": "",
            "ingredients_list": "Oats, Honey",
            "hfs": "",
            "created_at": "not-a-timestamp",
        })
        .as_object()
        .cloned()
        .unwrap();

        for field in SERVER_OWNED_FIELDS {
            map.remove(field);
        }
        normalize_optionals(&mut map);
        clean_ingredients(&mut map);
        draft::sanitize_numeric_fields(&mut map, &draft::REQUIRED_NUMERIC_FIELDS);

        let update: FoodUpdate = serde_json::from_value(Value::Object(map)).unwrap();
        assert_eq!(update.energy_kcal, 400.0);
        assert_eq!(update.price, None);
        assert_eq!(update.nova, None);
        assert_eq!(update.ingredients_list, vec!["Oats", "Honey"]);
        assert_eq!(update.hfs, crate::score::HFS_SENTINEL);
    }

    #[test]
    fn mime_extension_table() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }
}
