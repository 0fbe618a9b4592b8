use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Score scale revision. New records default to v2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "hfs_version", rename_all = "lowercase")]
pub enum HfsVersion {
    V1,
    #[default]
    V2,
}

/// Structured nutrition extraction, as returned by the label scanner.
/// Sub-fields take precedence over the flat per-serving columns wherever a
/// derived value is computed; the flat columns are the fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionParsed {
    pub energy_kcal: Option<f64>,
    pub carbohydrates: CarbohydrateGroup,
    pub fats: FatGroup,
    pub proteins: ProteinGroup,
    pub fiber: FiberGroup,
    pub minerals_mg: MineralGroup,
    pub vitamins: VitaminGroup,
    pub metadata: ParsedMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbohydrateGroup {
    pub total_carbs_g: Option<f64>,
    pub sugars_total_g: Option<f64>,
    pub sugars_added_g: Option<f64>,
    pub polyols_g: Option<f64>,
    pub starch_g: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatGroup {
    pub total_fats_g: Option<f64>,
    pub saturated_fats_g: Option<f64>,
    pub trans_fats_g: Option<f64>,
    pub monounsaturated_fats_g: Option<f64>,
    pub polyunsaturated_fats_g: Option<f64>,
    pub cholesterol_mg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProteinGroup {
    pub total_proteins_g: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiberGroup {
    pub total_fiber_g: Option<f64>,
    pub soluble_fiber_g: Option<f64>,
    pub insoluble_fiber_g: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MineralGroup {
    pub sodium_mg: Option<f64>,
    pub calcium_mg: Option<f64>,
    pub iron_mg: Option<f64>,
    pub potassium_mg: Option<f64>,
    pub magnesium_mg: Option<f64>,
    pub zinc_mg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitaminGroup {
    pub vitamin_a_mcg: Option<f64>,
    pub vitamin_c_mg: Option<f64>,
    pub vitamin_d_mcg: Option<f64>,
    pub vitamin_e_mg: Option<f64>,
    pub vitamin_k_mcg: Option<f64>,
    pub vitamin_b12_mcg: Option<f64>,
    pub vitamin_b6_mg: Option<f64>,
    pub vitamin_b9_mcg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedMetadata {
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
}

/// A persisted food record, one row in `foods`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodRecord {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub certifications: Option<String>,

    // Flat nutrition columns, per declared serving. Required numerics: the
    // sanitization boundary guarantees these are never null in storage.
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbs_total_g: f64,
    pub fat_total_g: f64,
    pub saturated_fat_g: f64,
    pub trans_fat_g: f64,
    pub sodium_mg: f64,
    pub fiber_g: f64,

    // Optional numerics: null means "not declared", distinct from zero.
    pub abv_percentage: Option<f64>,
    pub density: Option<f64>,

    pub serving_size_value: Option<f64>,
    pub serving_size_unit: Option<String>,

    pub nutrition_parsed: Option<Json<NutritionParsed>>,
    pub ingredients_list: Vec<String>,
    pub ingredients_raw: Option<String>,
    pub nutrition_raw: Option<String>,
    pub declared_special_nutrients: Option<String>,
    pub declared_processes: Option<String>,
    pub declared_warnings: Option<String>,

    pub nova: Option<i16>,
    pub hfs: f64,
    pub hfs_version: HfsVersion,

    pub front_photo_url: Option<String>,
    pub back_photo_url: Option<String>,
    pub nutrition_label_url: Option<String>,
    pub ingredients_photo_url: Option<String>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

/// The editable draft shape, also the whole-field PATCH payload. Identity and
/// `created_at` are owned by the datastore and never part of a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodUpdate {
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub certifications: Option<String>,

    pub energy_kcal: f64,
    pub protein_g: f64,
    pub carbs_total_g: f64,
    pub fat_total_g: f64,
    pub saturated_fat_g: f64,
    pub trans_fat_g: f64,
    pub sodium_mg: f64,
    pub fiber_g: f64,

    pub abv_percentage: Option<f64>,
    pub density: Option<f64>,

    pub serving_size_value: Option<f64>,
    pub serving_size_unit: Option<String>,

    pub nutrition_parsed: Option<NutritionParsed>,
    pub ingredients_list: Vec<String>,
    pub ingredients_raw: Option<String>,
    pub nutrition_raw: Option<String>,
    pub declared_special_nutrients: Option<String>,
    pub declared_processes: Option<String>,
    pub declared_warnings: Option<String>,

    pub nova: Option<i16>,
    pub hfs: f64,
    pub hfs_version: HfsVersion,

    pub front_photo_url: Option<String>,
    pub back_photo_url: Option<String>,
    pub nutrition_label_url: Option<String>,
    pub ingredients_photo_url: Option<String>,

    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

impl Default for FoodUpdate {
    fn default() -> Self {
        Self {
            name: String::new(),
            brand: None,
            category: None,
            location: None,
            price: None,
            certifications: None,
            energy_kcal: 0.0,
            protein_g: 0.0,
            carbs_total_g: 0.0,
            fat_total_g: 0.0,
            saturated_fat_g: 0.0,
            trans_fat_g: 0.0,
            sodium_mg: 0.0,
            fiber_g: 0.0,
            abv_percentage: None,
            density: None,
            serving_size_value: None,
            serving_size_unit: None,
            nutrition_parsed: None,
            ingredients_list: Vec::new(),
            ingredients_raw: None,
            nutrition_raw: None,
            declared_special_nutrients: None,
            declared_processes: None,
            declared_warnings: None,
            nova: None,
            hfs: crate::score::HFS_SENTINEL,
            hfs_version: HfsVersion::default(),
            front_photo_url: None,
            back_photo_url: None,
            nutrition_label_url: None,
            ingredients_photo_url: None,
            last_update: None,
        }
    }
}

impl From<FoodRecord> for FoodUpdate {
    fn from(r: FoodRecord) -> Self {
        Self {
            name: r.name,
            brand: r.brand,
            category: r.category,
            location: r.location,
            price: r.price,
            certifications: r.certifications,
            energy_kcal: r.energy_kcal,
            protein_g: r.protein_g,
            carbs_total_g: r.carbs_total_g,
            fat_total_g: r.fat_total_g,
            saturated_fat_g: r.saturated_fat_g,
            trans_fat_g: r.trans_fat_g,
            sodium_mg: r.sodium_mg,
            fiber_g: r.fiber_g,
            abv_percentage: r.abv_percentage,
            density: r.density,
            serving_size_value: r.serving_size_value,
            serving_size_unit: r.serving_size_unit,
            nutrition_parsed: r.nutrition_parsed.map(|j| j.0),
            ingredients_list: r.ingredients_list,
            ingredients_raw: r.ingredients_raw,
            nutrition_raw: r.nutrition_raw,
            declared_special_nutrients: r.declared_special_nutrients,
            declared_processes: r.declared_processes,
            declared_warnings: r.declared_warnings,
            nova: r.nova,
            hfs: r.hfs,
            hfs_version: r.hfs_version,
            front_photo_url: r.front_photo_url,
            back_photo_url: r.back_photo_url,
            nutrition_label_url: r.nutrition_label_url,
            ingredients_photo_url: r.ingredients_photo_url,
            last_update: r.last_update,
        }
    }
}

/// The four label photos a record can carry, each independently replaceable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSlot {
    Front,
    Back,
    Nutrition,
    Ingredients,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 4] = [
        ImageSlot::Front,
        ImageSlot::Back,
        ImageSlot::Nutrition,
        ImageSlot::Ingredients,
    ];

    /// Column in `foods` holding this slot's public URL.
    pub fn column(self) -> &'static str {
        match self {
            ImageSlot::Front => "front_photo_url",
            ImageSlot::Back => "back_photo_url",
            ImageSlot::Nutrition => "nutrition_label_url",
            ImageSlot::Ingredients => "ingredients_photo_url",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageSlot::Front => "front",
            ImageSlot::Back => "back",
            ImageSlot::Nutrition => "nutrition",
            ImageSlot::Ingredients => "ingredients",
        }
    }

    pub fn url_of(self, record: &FoodRecord) -> Option<&str> {
        let url = match self {
            ImageSlot::Front => &record.front_photo_url,
            ImageSlot::Back => &record.back_photo_url,
            ImageSlot::Nutrition => &record.nutrition_label_url,
            ImageSlot::Ingredients => &record.ingredients_photo_url,
        };
        url.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hfs_version_defaults_to_v2() {
        assert_eq!(HfsVersion::default(), HfsVersion::V2);
        let v: HfsVersion = serde_json::from_str("\"v1\"").unwrap();
        assert_eq!(v, HfsVersion::V1);
    }

    #[test]
    fn nutrition_parsed_tolerates_missing_groups() {
        let parsed: NutritionParsed =
            serde_json::from_str(r#"{"carbohydrates":{"sugars_total_g":12.5}}"#).unwrap();
        assert_eq!(parsed.carbohydrates.sugars_total_g, Some(12.5));
        assert_eq!(parsed.fats.total_fats_g, None);
        assert_eq!(parsed.metadata.serving_size, None);
    }

    #[test]
    fn update_defaults_carry_the_score_sentinel() {
        let u = FoodUpdate::default();
        assert_eq!(u.hfs, -1.0);
        assert_eq!(u.hfs_version, HfsVersion::V2);
        assert!(u.price.is_none());
    }
}
