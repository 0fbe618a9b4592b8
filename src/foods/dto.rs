use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::foods::model::ImageSlot;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Name,
    Brand,
    Category,
    Hfs,
    EnergyKcal,
    LastUpdate,
    CreatedAt,
}

impl SortColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Brand => "brand",
            SortColumn::Category => "category",
            SortColumn::Hfs => "hfs",
            SortColumn::EnergyKcal => "energy_kcal",
            SortColumn::LastUpdate => "last_update",
            SortColumn::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub order_by: SortColumn,
    #[serde(default)]
    pub dir: SortDir,
}

#[derive(Debug, Deserialize)]
pub struct LangParams {
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LabelParams {
    /// Per-serving view when set (the default); per-100g otherwise.
    #[serde(default = "default_use_portion")]
    pub use_portion: bool,
    #[serde(default = "default_servings")]
    pub servings: f64,
}

fn default_use_portion() -> bool {
    true
}

fn default_servings() -> f64 {
    1.0
}

#[derive(Debug, Serialize)]
pub struct FoodListItem {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub hfs: f64,
    /// Rendered score: one decimal, or the placeholder for the sentinel.
    pub hfs_display: String,
    pub energy_kcal: f64,
    pub front_photo_url: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub hfs: f64,
    /// Localized eligibility warnings; empty when the record was scoreable.
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub path: String,
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct RescanRequest {
    pub slot: ImageSlot,
    /// Fields the user locked in the editor; the merge must not touch them.
    #[serde(default)]
    pub locked_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_params_parse_from_query_shape() {
        let p: ListParams = serde_json::from_str(r#"{"order_by": "energy_kcal", "dir": "desc"}"#)
            .unwrap();
        assert_eq!(p.order_by.as_sql(), "energy_kcal");
        assert_eq!(p.dir.as_sql(), "DESC");

        let p: ListParams = serde_json::from_str("{}").unwrap();
        assert_eq!(p.order_by.as_sql(), "name");
        assert_eq!(p.dir.as_sql(), "ASC");
    }

    #[test]
    fn label_params_default_to_one_serving_per_portion() {
        let p: LabelParams = serde_json::from_str("{}").unwrap();
        assert!(p.use_portion);
        assert_eq!(p.servings, 1.0);
    }
}
