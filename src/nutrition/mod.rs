pub mod derive;

pub use derive::{derive_label, format_grams, step_servings, MacroRow, NutritionFacts};
