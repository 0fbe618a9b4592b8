//! Display-ready nutrient math for a food record.
//!
//! All quantities are stored per declared serving. The label can be rendered
//! either on a per-100g basis or per serving, scaled by how many servings the
//! consumer takes. Structured extraction (`nutrition_parsed`) wins over the
//! flat columns; the flat columns win over zero.

use serde::Serialize;

use crate::foods::model::FoodUpdate;

/// Servings are adjusted in half-serving steps and never drop below one half.
pub const MIN_SERVINGS: f64 = 0.5;
pub const SERVING_STEP: f64 = 0.5;

/// Reference daily values, in the row's native unit. These mirror the label
/// regulation table and must not drift: percentage parity depends on them.
pub mod daily_value {
    pub const TOTAL_FAT_G: f64 = 78.0;
    pub const SATURATED_FAT_G: f64 = 20.0;
    pub const CHOLESTEROL_MG: f64 = 300.0;
    pub const SODIUM_MG: f64 = 2300.0;
    pub const TOTAL_CARBS_G: f64 = 275.0;
    pub const FIBER_G: f64 = 28.0;
    pub const ADDED_SUGARS_G: f64 = 50.0;
    pub const CALCIUM_MG: f64 = 1300.0;
    pub const IRON_MG: f64 = 18.0;
    pub const POTASSIUM_MG: f64 = 4700.0;
    pub const MAGNESIUM_MG: f64 = 420.0;
    pub const ZINC_MG: f64 = 11.0;
    pub const VITAMIN_A_MCG: f64 = 900.0;
    pub const VITAMIN_C_MG: f64 = 90.0;
    pub const VITAMIN_D_MCG: f64 = 20.0;
    pub const VITAMIN_E_MG: f64 = 15.0;
    pub const VITAMIN_K_MCG: f64 = 120.0;
    pub const VITAMIN_B12_MCG: f64 = 2.4;
    pub const VITAMIN_B6_MG: f64 = 1.7;
    pub const VITAMIN_B9_MCG: f64 = 400.0;
}

/// One label row: the scaled amount plus, where a reference daily value
/// exists, the rounded percentage of it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroRow {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_value_pct: Option<i64>,
}

/// The derived nutrition facts panel. Primary macro rows are always present
/// (zero is shown); optional sub-nutrients are omitted when undeclared or
/// exactly zero.
#[derive(Debug, Clone, Serialize)]
pub struct NutritionFacts {
    pub serving_size: f64,
    pub serving_unit: String,
    /// What the serving line displays: `serving_size * servings` when viewing
    /// per portion, otherwise the fixed 100g basis.
    pub displayed_amount: f64,
    pub calories: i64,

    pub total_fat_g: MacroRow,
    pub saturated_fat_g: MacroRow,
    pub trans_fat_g: MacroRow,
    pub sodium_mg: MacroRow,
    pub total_carbs_g: MacroRow,
    pub fiber_g: MacroRow,
    pub protein_g: MacroRow,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub monounsaturated_fat_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyunsaturated_fat_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cholesterol_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugars_total_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sugars_added_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polyols_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starch_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soluble_fiber_g: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insoluble_fiber_g: Option<MacroRow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub calcium_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iron_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potassium_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnesium_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zinc_mg: Option<MacroRow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_a_mcg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_c_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_d_mcg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_e_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_k_mcg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_b12_mcg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_b6_mg: Option<MacroRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vitamin_b9_mcg: Option<MacroRow>,
}

/// Bump the serving count one step up or down, clamped at the floor.
pub fn step_servings(current: f64, up: bool) -> f64 {
    let next = if up {
        current + SERVING_STEP
    } else {
        current - SERVING_STEP
    };
    next.max(MIN_SERVINGS)
}

/// One-decimal string for gram rows, `toFixed(1)` parity.
pub fn format_grams(amount: f64) -> String {
    format!("{:.1}", amount)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn pct(v: f64, ratio: f64, dv: f64) -> i64 {
    ((v * ratio / dv) * 100.0).round() as i64
}

fn gram_row(v: f64, ratio: f64, dv: Option<f64>) -> MacroRow {
    MacroRow {
        amount: round1(v * ratio),
        daily_value_pct: dv.map(|d| pct(v, ratio, d)),
    }
}

fn milli_row(v: f64, ratio: f64, dv: Option<f64>) -> MacroRow {
    MacroRow {
        amount: (v * ratio).round(),
        daily_value_pct: dv.map(|d| pct(v, ratio, d)),
    }
}

/// Optional sub-nutrients are suppressed when undeclared or exactly zero.
fn opt_gram_row(v: Option<f64>, ratio: f64, dv: Option<f64>) -> Option<MacroRow> {
    v.filter(|v| *v > 0.0).map(|v| gram_row(v, ratio, dv))
}

fn opt_milli_row(v: Option<f64>, ratio: f64, dv: Option<f64>) -> Option<MacroRow> {
    v.filter(|v| *v > 0.0).map(|v| milli_row(v, ratio, dv))
}

/// Compute the facts panel for `food`, on the per-serving basis when
/// `use_portion` is set (otherwise per 100g), scaled by `servings`.
///
/// Pure and total: no inputs can make this panic, missing values are treated
/// as zero, and the serving count is clamped at the floor.
pub fn derive_label(food: &FoodUpdate, use_portion: bool, servings: f64) -> NutritionFacts {
    let parsed = food.nutrition_parsed.clone().unwrap_or_default();
    let servings = if servings.is_finite() {
        servings.max(MIN_SERVINGS)
    } else {
        1.0
    };

    let serving_size = parsed
        .metadata
        .serving_size
        .or(food.serving_size_value)
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(100.0);
    let serving_unit = parsed
        .metadata
        .serving_size_unit
        .clone()
        .or_else(|| food.serving_size_unit.clone())
        .unwrap_or_else(|| "g".to_string());

    let base_ratio = if use_portion { serving_size / 100.0 } else { 1.0 };
    let ratio = base_ratio * servings;

    let energy = parsed.energy_kcal.unwrap_or(food.energy_kcal);
    let total_fat = parsed.fats.total_fats_g.unwrap_or(food.fat_total_g);
    let saturated = parsed.fats.saturated_fats_g.unwrap_or(food.saturated_fat_g);
    let trans = parsed.fats.trans_fats_g.unwrap_or(food.trans_fat_g);
    let sodium = parsed.minerals_mg.sodium_mg.unwrap_or(food.sodium_mg);
    let carbs = parsed
        .carbohydrates
        .total_carbs_g
        .unwrap_or(food.carbs_total_g);
    let fiber = parsed.fiber.total_fiber_g.unwrap_or(food.fiber_g);
    let protein = parsed.proteins.total_proteins_g.unwrap_or(food.protein_g);

    NutritionFacts {
        serving_size,
        serving_unit,
        displayed_amount: if use_portion {
            (serving_size * servings).round()
        } else {
            100.0
        },
        calories: (energy * ratio).round() as i64,

        total_fat_g: gram_row(total_fat, ratio, Some(daily_value::TOTAL_FAT_G)),
        saturated_fat_g: gram_row(saturated, ratio, Some(daily_value::SATURATED_FAT_G)),
        trans_fat_g: gram_row(trans, ratio, None),
        sodium_mg: milli_row(sodium, ratio, Some(daily_value::SODIUM_MG)),
        total_carbs_g: gram_row(carbs, ratio, Some(daily_value::TOTAL_CARBS_G)),
        fiber_g: gram_row(fiber, ratio, Some(daily_value::FIBER_G)),
        protein_g: gram_row(protein, ratio, None),

        monounsaturated_fat_g: opt_gram_row(parsed.fats.monounsaturated_fats_g, ratio, None),
        polyunsaturated_fat_g: opt_gram_row(parsed.fats.polyunsaturated_fats_g, ratio, None),
        cholesterol_mg: opt_milli_row(
            parsed.fats.cholesterol_mg,
            ratio,
            Some(daily_value::CHOLESTEROL_MG),
        ),
        sugars_total_g: opt_gram_row(parsed.carbohydrates.sugars_total_g, ratio, None),
        sugars_added_g: opt_gram_row(
            parsed.carbohydrates.sugars_added_g,
            ratio,
            Some(daily_value::ADDED_SUGARS_G),
        ),
        polyols_g: opt_gram_row(parsed.carbohydrates.polyols_g, ratio, None),
        starch_g: opt_gram_row(parsed.carbohydrates.starch_g, ratio, None),
        soluble_fiber_g: opt_gram_row(parsed.fiber.soluble_fiber_g, ratio, None),
        insoluble_fiber_g: opt_gram_row(parsed.fiber.insoluble_fiber_g, ratio, None),

        calcium_mg: opt_milli_row(
            parsed.minerals_mg.calcium_mg,
            ratio,
            Some(daily_value::CALCIUM_MG),
        ),
        iron_mg: opt_milli_row(parsed.minerals_mg.iron_mg, ratio, Some(daily_value::IRON_MG)),
        potassium_mg: opt_milli_row(
            parsed.minerals_mg.potassium_mg,
            ratio,
            Some(daily_value::POTASSIUM_MG),
        ),
        magnesium_mg: opt_milli_row(
            parsed.minerals_mg.magnesium_mg,
            ratio,
            Some(daily_value::MAGNESIUM_MG),
        ),
        zinc_mg: opt_milli_row(parsed.minerals_mg.zinc_mg, ratio, Some(daily_value::ZINC_MG)),

        vitamin_a_mcg: opt_milli_row(
            parsed.vitamins.vitamin_a_mcg,
            ratio,
            Some(daily_value::VITAMIN_A_MCG),
        ),
        vitamin_c_mg: opt_milli_row(
            parsed.vitamins.vitamin_c_mg,
            ratio,
            Some(daily_value::VITAMIN_C_MG),
        ),
        vitamin_d_mcg: opt_milli_row(
            parsed.vitamins.vitamin_d_mcg,
            ratio,
            Some(daily_value::VITAMIN_D_MCG),
        ),
        vitamin_e_mg: opt_milli_row(
            parsed.vitamins.vitamin_e_mg,
            ratio,
            Some(daily_value::VITAMIN_E_MG),
        ),
        vitamin_k_mcg: opt_milli_row(
            parsed.vitamins.vitamin_k_mcg,
            ratio,
            Some(daily_value::VITAMIN_K_MCG),
        ),
        vitamin_b12_mcg: opt_milli_row(
            parsed.vitamins.vitamin_b12_mcg,
            ratio,
            Some(daily_value::VITAMIN_B12_MCG),
        ),
        vitamin_b6_mg: opt_milli_row(
            parsed.vitamins.vitamin_b6_mg,
            ratio,
            Some(daily_value::VITAMIN_B6_MG),
        ),
        vitamin_b9_mcg: opt_milli_row(
            parsed.vitamins.vitamin_b9_mcg,
            ratio,
            Some(daily_value::VITAMIN_B9_MCG),
        ),
    }
}
