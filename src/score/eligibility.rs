//! Pre-flight checks a record must pass before its score can be computed.
//!
//! Every check runs regardless of earlier failures so the user sees all
//! missing prerequisites at once, not one per save attempt.

use serde::Serialize;

use crate::foods::model::{FoodUpdate, HfsVersion};
use crate::i18n::Lang;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityWarning {
    MissingIngredients,
    MissingEnergy,
    MissingNova,
}

impl EligibilityWarning {
    pub fn message(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (EligibilityWarning::MissingIngredients, Lang::En) => {
                "Ingredient list is missing; the score cannot be computed."
            }
            (EligibilityWarning::MissingIngredients, Lang::Pt) => {
                "Lista de ingredientes ausente; o score não pode ser calculado."
            }
            (EligibilityWarning::MissingEnergy, Lang::En) => {
                "Calorie count (kcal) is missing; the score cannot be computed."
            }
            (EligibilityWarning::MissingEnergy, Lang::Pt) => {
                "Valor calórico (kcal) ausente; o score não pode ser calculado."
            }
            (EligibilityWarning::MissingNova, Lang::En) => {
                "NOVA processing classification is missing; the score cannot be computed."
            }
            (EligibilityWarning::MissingNova, Lang::Pt) => {
                "Classificação NOVA ausente; o score não pode ser calculado."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EligibilityReport {
    pub success: bool,
    pub warnings: Vec<EligibilityWarning>,
}

impl EligibilityReport {
    pub fn messages(&self, lang: Lang) -> Vec<String> {
        self.warnings
            .iter()
            .map(|w| w.message(lang).to_string())
            .collect()
    }
}

/// Decide whether `food` carries enough data for scoring. Does not mutate the
/// record. When `success` is false the caller must persist the sentinel score
/// instead of invoking the calculator; the save itself is never blocked.
pub fn check_eligibility(food: &FoodUpdate, _version: HfsVersion) -> EligibilityReport {
    let mut warnings = Vec::new();

    let has_ingredients = !food.ingredients_list.is_empty()
        || food
            .ingredients_raw
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty());
    if !has_ingredients {
        warnings.push(EligibilityWarning::MissingIngredients);
    }

    if food.energy_kcal == 0.0 || !food.energy_kcal.is_finite() {
        warnings.push(EligibilityWarning::MissingEnergy);
    }

    if food.nova.is_none() {
        warnings.push(EligibilityWarning::MissingNova);
    }

    EligibilityReport {
        success: warnings.is_empty(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foods::model::FoodUpdate;

    #[test]
    fn empty_record_fails_all_three_checks_in_order() {
        let food = FoodUpdate::default();
        let report = check_eligibility(&food, HfsVersion::V2);
        assert!(!report.success);
        assert_eq!(
            report.warnings,
            vec![
                EligibilityWarning::MissingIngredients,
                EligibilityWarning::MissingEnergy,
                EligibilityWarning::MissingNova,
            ]
        );
        assert_eq!(report.messages(Lang::En).len(), 3);
    }

    #[test]
    fn raw_ingredients_text_satisfies_the_ingredient_check() {
        let food = FoodUpdate {
            ingredients_raw: Some("water, sugar".into()),
            energy_kcal: 120.0,
            nova: Some(4),
            ..FoodUpdate::default()
        };
        assert!(check_eligibility(&food, HfsVersion::V2).success);
    }

    #[test]
    fn whitespace_only_raw_text_does_not_count() {
        let food = FoodUpdate {
            ingredients_raw: Some("   ".into()),
            energy_kcal: 120.0,
            nova: Some(1),
            ..FoodUpdate::default()
        };
        let report = check_eligibility(&food, HfsVersion::V2);
        assert_eq!(report.warnings, vec![EligibilityWarning::MissingIngredients]);
    }

    #[test]
    fn each_check_is_independent() {
        let food = FoodUpdate {
            ingredients_list: vec!["Water".into()],
            energy_kcal: 0.0,
            nova: None,
            ..FoodUpdate::default()
        };
        let report = check_eligibility(&food, HfsVersion::V1);
        assert!(!report.success);
        assert_eq!(
            report.warnings,
            vec![
                EligibilityWarning::MissingEnergy,
                EligibilityWarning::MissingNova
            ]
        );
    }
}
