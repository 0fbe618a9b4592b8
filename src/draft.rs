//! The editable draft of a food record, bridging the form and the
//! persistence payload.
//!
//! A draft is a working copy distinct from the last-persisted snapshot; the
//! dirty flag is a deep comparison between the two, blind to identity and
//! timestamp fields. Numeric sanitization happens here, at the boundary,
//! right before a payload goes to the datastore.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

/// Fields owned by the datastore or stamped per save; never part of the
/// dirty comparison.
pub const IGNORED_FIELDS: [&str; 3] = ["id", "created_at", "last_update"];

/// Numeric columns the datastore requires to be non-null. Empty form input
/// is coerced to zero for these; every other numeric field keeps its
/// null-ness (an undeclared price is not a free product).
pub const REQUIRED_NUMERIC_FIELDS: [&str; 9] = [
    "energy_kcal",
    "protein_g",
    "carbs_total_g",
    "fat_total_g",
    "sodium_mg",
    "fiber_g",
    "saturated_fat_g",
    "trans_fat_g",
    "serving_size_value",
];

/// Free-text extraction output. A rescan only replaces these when it actually
/// produced text, so a bad scan cannot wipe data a previous scan recovered.
pub const RAW_TEXT_FIELDS: [&str; 3] = [
    "ingredients_raw",
    "nutrition_raw",
    "declared_special_nutrients",
];

pub const SCORE_PLACEHOLDER: &str = "—";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftState {
    Clean,
    Dirty,
    Saving,
}

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("no unsaved changes to save")]
    NotDirty,
    #[error("a save is already in flight")]
    SaveInFlight,
}

/// Split a raw comma-separated ingredient string into trimmed, non-empty
/// entries. Order is preserved; duplicates are allowed.
pub fn split_ingredients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    }
}

/// Coerce the named fields to numbers: empty string, null, or a missing key
/// becomes `0`, numeric strings are parsed. Fields not named pass through
/// untouched, including intentionally-null optional numerics. Idempotent.
pub fn sanitize_numeric_fields(payload: &mut Map<String, Value>, fields: &[&str]) {
    for field in fields {
        let coerced = payload.get(*field).map(coerce_number).unwrap_or(0.0);
        payload.insert((*field).to_string(), Value::from(coerced));
    }
}

/// Key-wise comparison of serialized values over the draft's keys, skipping
/// identity and timestamp fields. A key missing on one side counts as a
/// difference.
pub fn is_dirty(current: &Map<String, Value>, original: &Map<String, Value>) -> bool {
    current.iter().any(|(key, value)| {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            return false;
        }
        original.get(key) != Some(value)
    })
}

/// Score text for a list or detail view. A dirty draft's stored score is
/// stale, and the sentinel was never a score; both render as the placeholder.
pub fn format_score_for_display(hfs: Option<f64>, dirty: bool) -> String {
    if dirty {
        return SCORE_PLACEHOLDER.to_string();
    }
    match hfs {
        Some(v) if v.is_finite() && v >= 0.0 => format!("{:.1}", v),
        _ => SCORE_PLACEHOLDER.to_string(),
    }
}

/// An in-memory editing session: the draft, the last-persisted snapshot, the
/// user's locked fields, and the save lifecycle.
#[derive(Debug, Clone)]
pub struct DraftSession {
    draft: Map<String, Value>,
    original: Map<String, Value>,
    locked: BTreeSet<String>,
    saving: bool,
}

impl DraftSession {
    pub fn new<T: Serialize>(record: &T) -> anyhow::Result<Self> {
        let value = serde_json::to_value(record)?;
        let map = value
            .as_object()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("record did not serialize to an object"))?;
        Ok(Self {
            draft: map.clone(),
            original: map,
            locked: BTreeSet::new(),
            saving: false,
        })
    }

    pub fn draft(&self) -> &Map<String, Value> {
        &self.draft
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        self.draft.insert(key.to_string(), value);
    }

    pub fn is_dirty(&self) -> bool {
        is_dirty(&self.draft, &self.original)
    }

    pub fn state(&self) -> DraftState {
        if self.saving {
            DraftState::Saving
        } else if self.is_dirty() {
            DraftState::Dirty
        } else {
            DraftState::Clean
        }
    }

    /// Lock or unlock a field against automated overwrites. A pure set
    /// membership flip.
    pub fn toggle_lock(&mut self, field: &str) {
        if !self.locked.remove(field) {
            self.locked.insert(field.to_string());
        }
    }

    pub fn is_locked(&self, field: &str) -> bool {
        self.locked.contains(field)
    }

    pub fn locked_fields(&self) -> &BTreeSet<String> {
        &self.locked
    }

    /// Enter the saving state. Rejected when nothing changed or another save
    /// is already in flight (no concurrent save per record from one client).
    pub fn begin_save(&mut self) -> Result<(), DraftError> {
        if self.saving {
            return Err(DraftError::SaveInFlight);
        }
        if !self.is_dirty() {
            return Err(DraftError::NotDirty);
        }
        self.saving = true;
        Ok(())
    }

    /// The draft becomes the new persisted snapshot.
    pub fn complete_save(&mut self) {
        self.original = self.draft.clone();
        self.saving = false;
    }

    /// Save failed: the draft is untouched and stays dirty.
    pub fn fail_save(&mut self) {
        self.saving = false;
    }

    /// Merge a re-extraction pass into the draft: locked fields resist the
    /// overwrite, and raw-text fields are only replaced by non-empty values.
    pub fn apply_rescan(&mut self, extracted: &Map<String, Value>) {
        merge_extracted(&mut self.draft, extracted, &self.locked);
    }

    pub fn score_display(&self) -> String {
        let hfs = self.draft.get("hfs").and_then(Value::as_f64);
        format_score_for_display(hfs, self.is_dirty())
    }
}

/// Field-by-field merge of extraction output into a draft. Locked fields and
/// datastore-owned fields are skipped; raw-text fields keep their previous
/// value unless the new one is non-empty.
pub fn merge_extracted(
    draft: &mut Map<String, Value>,
    extracted: &Map<String, Value>,
    locked: &BTreeSet<String>,
) {
    for (key, value) in extracted {
        if locked.contains(key) || IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        if RAW_TEXT_FIELDS.contains(&key.as_str()) {
            let empty = match value {
                Value::String(s) => s.trim().is_empty(),
                Value::Null => true,
                _ => false,
            };
            if empty {
                continue;
            }
        }
        draft.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_map() -> Map<String, Value> {
        json!({
            "id": "a3f7",
            "name": "Granola",
            "energy_kcal": 400.0,
            "price": null,
            "ingredients_list": ["Oats", "Honey"],
            "hfs": -1.0,
            "last_update": "2026-01-01T00:00:00Z",
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn ingredients_round_trip() {
        assert_eq!(
            split_ingredients("Water, Sugar,  Salt ,"),
            vec!["Water", "Sugar", "Salt"]
        );
        assert!(split_ingredients("  , ,").is_empty());
        // Order preserved, duplicates allowed.
        assert_eq!(split_ingredients("Salt,Salt"), vec!["Salt", "Salt"]);
    }

    #[test]
    fn dirty_is_reflexive_and_ignores_timestamps() {
        let a = sample_map();
        assert!(!is_dirty(&a, &a));

        let mut b = a.clone();
        b.insert("last_update".into(), json!("2026-02-02T00:00:00Z"));
        assert!(!is_dirty(&b, &a));

        b.insert("name".into(), json!("Muesli"));
        assert!(is_dirty(&b, &a));
    }

    #[test]
    fn dirty_compares_arrays_structurally() {
        let a = sample_map();
        let mut b = a.clone();
        b.insert("ingredients_list".into(), json!(["Honey", "Oats"]));
        assert!(is_dirty(&b, &a));
        b.insert("ingredients_list".into(), json!(["Oats", "Honey"]));
        assert!(!is_dirty(&b, &a));
    }

    #[test]
    fn sanitizer_coerces_required_fields_and_preserves_optional_nulls() {
        let mut payload = json!({
            "energy_kcal": "",
            "protein_g": "12.5",
            "sodium_mg": null,
            "price": null,
            "density": null,
        })
        .as_object()
        .cloned()
        .unwrap();

        sanitize_numeric_fields(&mut payload, &REQUIRED_NUMERIC_FIELDS);

        assert_eq!(payload["energy_kcal"], json!(0.0));
        assert_eq!(payload["protein_g"], json!(12.5));
        assert_eq!(payload["sodium_mg"], json!(0.0));
        // Missing required fields are filled in as zero.
        assert_eq!(payload["fat_total_g"], json!(0.0));
        // Optional numerics stay null.
        assert_eq!(payload["price"], Value::Null);
        assert_eq!(payload["density"], Value::Null);
    }

    #[test]
    fn sanitizer_is_idempotent() {
        let mut payload = json!({"energy_kcal": "250", "fiber_g": 3.2})
            .as_object()
            .cloned()
            .unwrap();
        sanitize_numeric_fields(&mut payload, &REQUIRED_NUMERIC_FIELDS);
        let once = payload.clone();
        sanitize_numeric_fields(&mut payload, &REQUIRED_NUMERIC_FIELDS);
        assert_eq!(payload, once);
    }

    #[test]
    fn score_display_placeholder_rules() {
        assert_eq!(format_score_for_display(Some(7.25), false), "7.2");
        assert_eq!(format_score_for_display(Some(7.25), true), "—");
        assert_eq!(format_score_for_display(Some(-1.0), false), "—");
        assert_eq!(format_score_for_display(None, false), "—");
        assert_eq!(format_score_for_display(Some(f64::NAN), false), "—");
    }

    #[test]
    fn lock_toggle_is_a_pure_membership_flip() {
        let mut session = DraftSession::new(&json!({"name": "x"})).unwrap();
        assert!(!session.is_locked("ingredients_raw"));
        session.toggle_lock("ingredients_raw");
        assert!(session.is_locked("ingredients_raw"));
        session.toggle_lock("ingredients_raw");
        assert!(!session.is_locked("ingredients_raw"));
    }

    #[test]
    fn save_lifecycle() {
        let mut session = DraftSession::new(&json!({"name": "Granola", "hfs": 6.0})).unwrap();
        assert_eq!(session.state(), DraftState::Clean);
        assert!(matches!(session.begin_save(), Err(DraftError::NotDirty)));

        session.set_field("name", json!("Muesli"));
        assert_eq!(session.state(), DraftState::Dirty);

        session.begin_save().unwrap();
        assert_eq!(session.state(), DraftState::Saving);
        assert!(matches!(session.begin_save(), Err(DraftError::SaveInFlight)));

        session.fail_save();
        assert_eq!(session.state(), DraftState::Dirty);

        session.begin_save().unwrap();
        session.complete_save();
        assert_eq!(session.state(), DraftState::Clean);
        assert_eq!(session.draft()["name"], json!("Muesli"));
    }

    #[test]
    fn dirty_draft_hides_the_stale_score() {
        let mut session = DraftSession::new(&json!({"name": "Granola", "hfs": 6.0})).unwrap();
        assert_eq!(session.score_display(), "6.0");
        session.set_field("name", json!("Muesli"));
        assert_eq!(session.score_display(), "—");
    }

    #[test]
    fn rescan_merge_respects_locks_and_empty_raw_text() {
        let mut session = DraftSession::new(&json!({
            "name": "Granola",
            "energy_kcal": 400.0,
            "ingredients_raw": "oats, honey",
            "nutrition_raw": "per 40g: 160kcal",
        }))
        .unwrap();
        session.toggle_lock("energy_kcal");

        let extracted = json!({
            "energy_kcal": 999.0,
            "name": "Granola Crunchy",
            "ingredients_raw": "",
            "nutrition_raw": "per 100g: 400kcal",
            "id": "should-not-overwrite",
        })
        .as_object()
        .cloned()
        .unwrap();

        session.apply_rescan(&extracted);

        let draft = session.draft();
        // Locked field resists the rescan.
        assert_eq!(draft["energy_kcal"], json!(400.0));
        assert_eq!(draft["name"], json!("Granola Crunchy"));
        // Empty raw text does not clobber previous extraction output.
        assert_eq!(draft["ingredients_raw"], json!("oats, honey"));
        assert_eq!(draft["nutrition_raw"], json!("per 100g: 400kcal"));
        assert!(!draft.contains_key("id"));
    }
}
