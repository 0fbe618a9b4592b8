//! Sub-metric derivation and the score aggregation seam.
//!
//! Raw label values arrive per arbitrary serving sizes, so every per-mass
//! sub-metric is normalized to a 100g basis before anything else happens.
//! The aggregation itself is delegated to a [`ScoreProvider`]; the default
//! provider declines and returns the sentinel, which is what production runs
//! until the external scoring service is wired in.

use axum::async_trait;
use serde::Serialize;

use crate::foods::model::{FoodUpdate, HfsVersion};
use crate::i18n::{self, Lang};
use crate::score::HFS_SENTINEL;

/// The calculator hit malformed data (non-finite inputs, broken nested
/// structure). The message is localized and shown to the user; the record
/// must be persisted with the sentinel, never in a partially-scored state.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CalculationError {
    pub message: String,
}

impl CalculationError {
    fn malformed(lang: Lang) -> Self {
        Self {
            message: i18n::calculation_error(lang).to_string(),
        }
    }
}

/// Per-100g sub-metric breakdown. A metric is present only when its source
/// value is strictly positive; zero and undeclared both mean "omitted".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SubMetrics {
    /// S1, sugars (g/100g).
    #[serde(rename = "S1", skip_serializing_if = "Option::is_none")]
    pub sugars: Option<f64>,
    /// S2, fiber (g/100g).
    #[serde(rename = "S2", skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    /// S3, fat profile: saturated fat (g/100g).
    #[serde(rename = "S3", skip_serializing_if = "Option::is_none")]
    pub fat_profile: Option<f64>,
    /// S4, caloric density (kcal/100g).
    #[serde(rename = "S4", skip_serializing_if = "Option::is_none")]
    pub caloric_density: Option<f64>,
    /// S5, protein (g/100g).
    #[serde(rename = "S5", skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// S6, sodium (mg/100g).
    #[serde(rename = "S6", skip_serializing_if = "Option::is_none")]
    pub sodium: Option<f64>,
    /// S7, NOVA processing class. Not a per-mass quantity, never scaled.
    #[serde(rename = "S7", skip_serializing_if = "Option::is_none")]
    pub processing: Option<f64>,
    /// S8, ingredient count, a proxy for additive load. Never scaled.
    #[serde(rename = "S8", skip_serializing_if = "Option::is_none")]
    pub additives: Option<f64>,
}

/// What a provider returns for an eligible record.
#[derive(Debug, Clone)]
pub struct ScoreAggregate {
    pub hfs_score: f64,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// Result of a full calculation pass.
#[derive(Debug, Clone, Serialize)]
pub struct HfsOutcome {
    pub success: bool,
    pub hfs_score: f64,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub scores: SubMetrics,
}

/// Aggregation strategy. The production implementation will call the external
/// scoring service; swapping it in must not touch eligibility or derivation.
#[async_trait]
pub trait ScoreProvider: Send + Sync {
    async fn aggregate(
        &self,
        food: &FoodUpdate,
        version: HfsVersion,
        scores: &SubMetrics,
    ) -> anyhow::Result<ScoreAggregate>;
}

/// Default provider: declines to aggregate and reports the sentinel.
pub struct SentinelScoreProvider;

#[async_trait]
impl ScoreProvider for SentinelScoreProvider {
    async fn aggregate(
        &self,
        _food: &FoodUpdate,
        _version: HfsVersion,
        _scores: &SubMetrics,
    ) -> anyhow::Result<ScoreAggregate> {
        Ok(ScoreAggregate {
            hfs_score: HFS_SENTINEL,
            confidence: 1.0,
            reasoning: None,
        })
    }
}

/// Factor mapping per-serving values onto the 100g basis. Only gram-denominated
/// servings can be converted; a missing or zero serving size is treated as
/// 100g so the factor stays 1 and nothing divides by zero.
pub fn conversion_factor(serving_size_value: Option<f64>, serving_size_unit: Option<&str>) -> f64 {
    let grams = serving_size_unit
        .map(|u| u.trim().eq_ignore_ascii_case("g"))
        .unwrap_or(false);
    if !grams {
        return 1.0;
    }
    match serving_size_value {
        Some(v) if v.is_finite() && v > 0.0 => 100.0 / v,
        _ => 1.0,
    }
}

fn per_100g(source: Option<f64>, flat: f64, factor: f64, lang: Lang) -> Result<Option<f64>, CalculationError> {
    let v = source.unwrap_or(flat);
    if !v.is_finite() {
        return Err(CalculationError::malformed(lang));
    }
    Ok((v > 0.0).then_some(v * factor))
}

/// Derive the S1–S8 breakdown for an eligible record.
pub fn compute_sub_metrics(food: &FoodUpdate, lang: Lang) -> Result<SubMetrics, CalculationError> {
    let parsed = food.nutrition_parsed.clone().unwrap_or_default();

    if food
        .serving_size_value
        .is_some_and(|v| !v.is_finite())
    {
        return Err(CalculationError::malformed(lang));
    }
    let factor = conversion_factor(food.serving_size_value, food.serving_size_unit.as_deref());

    // Sugars and saturated fat have no flat fallback column of their own; the
    // structured extraction is their only source.
    let sugars = per_100g(parsed.carbohydrates.sugars_total_g, 0.0, factor, lang)?;
    let fiber = per_100g(parsed.fiber.total_fiber_g, food.fiber_g, factor, lang)?;
    let fat_profile = per_100g(
        parsed.fats.saturated_fats_g,
        food.saturated_fat_g,
        factor,
        lang,
    )?;
    let caloric_density = per_100g(parsed.energy_kcal, food.energy_kcal, factor, lang)?;
    let protein = per_100g(parsed.proteins.total_proteins_g, food.protein_g, factor, lang)?;
    let sodium = per_100g(parsed.minerals_mg.sodium_mg, food.sodium_mg, factor, lang)?;

    let processing = food.nova.filter(|n| *n > 0).map(f64::from);
    let additives = (!food.ingredients_list.is_empty()).then(|| food.ingredients_list.len() as f64);

    Ok(SubMetrics {
        sugars,
        fiber,
        fat_profile,
        caloric_density,
        protein,
        sodium,
        processing,
        additives,
    })
}

/// Full calculation pass over an eligible record: normalize, break down, then
/// let the provider aggregate. With the default provider the outcome carries
/// the sentinel score and the populated breakdown.
pub async fn calculate_hfs(
    food: &FoodUpdate,
    version: HfsVersion,
    provider: &dyn ScoreProvider,
    lang: Lang,
) -> Result<HfsOutcome, CalculationError> {
    let scores = compute_sub_metrics(food, lang)?;
    let aggregate = provider
        .aggregate(food, version, &scores)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "score provider failed");
            CalculationError::malformed(lang)
        })?;

    Ok(HfsOutcome {
        success: true,
        hfs_score: aggregate.hfs_score,
        confidence: aggregate.confidence,
        reasoning: aggregate.reasoning,
        scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::model::NutritionParsed;

    fn eligible_food() -> FoodUpdate {
        FoodUpdate {
            name: "Granola".into(),
            brand: Some("Acme".into()),
            energy_kcal: 400.0,
            protein_g: 8.0,
            sodium_mg: 120.0,
            fiber_g: 6.0,
            saturated_fat_g: 2.0,
            serving_size_value: Some(40.0),
            serving_size_unit: Some("g".into()),
            ingredients_list: vec!["Oats".into(), "Honey".into(), "Salt".into()],
            nova: Some(3),
            ..FoodUpdate::default()
        }
    }

    #[test]
    fn conversion_factor_table() {
        assert_eq!(conversion_factor(Some(50.0), Some("g")), 2.0);
        assert_eq!(conversion_factor(Some(200.0), Some("g")), 0.5);
        // Zero or absent gram servings behave like a 100g serving.
        assert_eq!(conversion_factor(Some(0.0), Some("g")), 1.0);
        assert_eq!(conversion_factor(None, Some("g")), 1.0);
        // Non-gram units cannot be converted.
        assert_eq!(conversion_factor(Some(330.0), Some("ml")), 1.0);
        assert_eq!(conversion_factor(Some(50.0), None), 1.0);
    }

    #[test]
    fn sub_metrics_are_normalized_to_100g() {
        let metrics = compute_sub_metrics(&eligible_food(), Lang::En).unwrap();
        // 40g serving: factor 2.5.
        assert_eq!(metrics.caloric_density, Some(1000.0));
        assert_eq!(metrics.protein, Some(20.0));
        assert_eq!(metrics.sodium, Some(300.0));
        assert_eq!(metrics.fiber, Some(15.0));
        assert_eq!(metrics.fat_profile, Some(5.0));
        assert_eq!(metrics.processing, Some(3.0));
        assert_eq!(metrics.additives, Some(3.0));
        // No sugars declared anywhere: omitted, not zero.
        assert_eq!(metrics.sugars, None);
    }

    #[test]
    fn structured_values_take_precedence() {
        let parsed: NutritionParsed = serde_json::from_str(
            r#"{"carbohydrates": {"sugars_total_g": 20.0}, "proteins": {"total_proteins_g": 4.0}}"#,
        )
        .unwrap();
        let food = FoodUpdate {
            nutrition_parsed: Some(parsed),
            ..eligible_food()
        };
        let metrics = compute_sub_metrics(&food, Lang::En).unwrap();
        assert_eq!(metrics.sugars, Some(50.0));
        assert_eq!(metrics.protein, Some(10.0));
    }

    #[test]
    fn zero_valued_sources_are_omitted() {
        let food = FoodUpdate {
            sodium_mg: 0.0,
            ..eligible_food()
        };
        let metrics = compute_sub_metrics(&food, Lang::En).unwrap();
        assert_eq!(metrics.sodium, None);
    }

    #[test]
    fn non_finite_input_is_a_calculation_error() {
        let food = FoodUpdate {
            energy_kcal: f64::NAN,
            ..eligible_food()
        };
        let err = compute_sub_metrics(&food, Lang::En).unwrap_err();
        assert!(!err.message.is_empty());

        let food = FoodUpdate {
            serving_size_value: Some(f64::INFINITY),
            ..eligible_food()
        };
        assert!(compute_sub_metrics(&food, Lang::Pt).is_err());
    }

    #[tokio::test]
    async fn default_provider_returns_the_sentinel_with_the_breakdown() {
        let food = eligible_food();
        let outcome = calculate_hfs(&food, HfsVersion::V2, &SentinelScoreProvider, Lang::En)
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.hfs_score, HFS_SENTINEL);
        assert_eq!(outcome.confidence, 1.0);
        assert!(outcome.reasoning.is_none());
        assert_eq!(outcome.scores.caloric_density, Some(1000.0));
        // Only strictly-positive sources appear in the breakdown.
        assert!(outcome.scores.sugars.is_none());
    }
}
