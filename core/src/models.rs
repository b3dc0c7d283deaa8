use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let lower = s.trim().to_lowercase();
                match lower.as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(ValidationError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        allowed: Self::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    }),
                }
            }
        }
    };
}

string_enum!(Gender, "gender" {
    Male => "male",
    Female => "female",
    Other => "other",
});

string_enum!(MealType, "meal type" {
    Breakfast => "breakfast",
    Lunch => "lunch",
    Dinner => "dinner",
    Snack => "snack",
});

string_enum!(TrainingType, "training type" {
    Grappling => "grappling",
    Sparring => "sparring",
    Strength => "strength",
    Cardio => "cardio",
});

string_enum!(TechniqueCategory, "technique category" {
    Takedown => "takedown",
    Submission => "submission",
    Sweep => "sweep",
    Defense => "defense",
    Control => "control",
});

string_enum!(
    /// Look-back window for weight history.
    TimePeriod, "time period" {
    Week => "week",
    Month => "month",
    ThreeMonths => "three_months",
    SixMonths => "six_months",
    Year => "year",
    All => "all",
});

impl TimePeriod {
    /// First day of the window ending at `today`. `All` reaches back ten years.
    #[must_use]
    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        let back = match self {
            TimePeriod::Week => return today - chrono::Duration::days(7),
            TimePeriod::Month => Months::new(1),
            TimePeriod::ThreeMonths => Months::new(3),
            TimePeriod::SixMonths => Months::new(6),
            TimePeriod::Year => Months::new(12),
            TimePeriod::All => Months::new(120),
        };
        today.checked_sub_months(back).unwrap_or(NaiveDate::MIN)
    }
}

pub(crate) fn is_positive(value: f64) -> bool {
    value > 0.0
}

// --- Profile ---

/// The key of the only profile row.
pub const PROFILE_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub weight_class: String,
    pub gender: Gender,
    pub daily_calories: i64,
    pub created_at: DateTime<Utc>,
}

/// User-entered profile fields. `daily_calories` is derived on save.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInput {
    pub name: String,
    pub age: i64,
    pub height_cm: f64,
    pub current_weight_kg: f64,
    pub target_weight_kg: f64,
    pub weight_class: String,
    pub gender: Gender,
}

pub fn validate_profile(input: &ProfileInput) -> Result<(), ValidationError> {
    if input.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if !is_positive(input.current_weight_kg) {
        return Err(ValidationError::NonPositiveCurrentWeight);
    }
    if !is_positive(input.target_weight_kg) {
        return Err(ValidationError::NonPositiveTargetWeight);
    }
    if !is_positive(input.height_cm) {
        return Err(ValidationError::NonPositiveHeight);
    }
    if !(1..=120).contains(&input.age) {
        return Err(ValidationError::AgeOutOfRange);
    }
    Ok(())
}

/// Estimated daily calorie need: body weight in kg times 30, rounded.
///
/// This is a flat placeholder multiplier, not a physiological model. It
/// ignores age, height, sex and activity level.
pub fn tdee(weight_kg: f64) -> Result<i64, ValidationError> {
    if !is_positive(weight_kg) {
        return Err(ValidationError::NonPositiveWeight);
    }
    Ok((weight_kg * 30.0).round() as i64)
}

// --- Weight ---

pub const MIN_WEIGHT_KG: f64 = 20.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub weight_kg: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWeightEntry {
    pub weight_kg: f64,
    pub date: NaiveDate,
    pub note: Option<String>,
}

pub fn validate_weight(weight_kg: f64) -> Result<(), ValidationError> {
    if !is_positive(weight_kg) {
        return Err(ValidationError::NonPositiveWeight);
    }
    if !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg) {
        return Err(ValidationError::WeightOutOfRange);
    }
    Ok(())
}

// --- Nutrition ---

pub const MAX_PORTION_G: f64 = 10_000.0;

/// A search candidate with per-100 g values. `fdc_id` 0 marks a custom food.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    pub fdc_id: i64,
    pub name: String,
    pub calories_per_100g: f64,
    pub protein_per_100g: f64,
    pub fat_per_100g: f64,
    pub carbs_per_100g: f64,
    #[serde(default)]
    pub is_custom: bool,
}

impl Food {
    /// A user-defined food that has no external reference.
    #[must_use]
    pub fn custom(name: &str, calories: f64, protein: f64, fat: f64, carbs: f64) -> Self {
        Self {
            fdc_id: 0,
            name: name.to_string(),
            calories_per_100g: calories,
            protein_per_100g: protein,
            fat_per_100g: fat,
            carbs_per_100g: carbs,
            is_custom: true,
        }
    }

    /// Absolute values for a portion of `grams`.
    #[must_use]
    pub fn portion(&self, grams: f64, meal_type: MealType, date: NaiveDate) -> NewFoodLog {
        let factor = grams / 100.0;
        NewFoodLog {
            fdc_id: self.fdc_id,
            name: self.name.clone(),
            calories: self.calories_per_100g * factor,
            protein: self.protein_per_100g * factor,
            fat: self.fat_per_100g * factor,
            carbs: self.carbs_per_100g * factor,
            grams,
            meal_type,
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodLog {
    pub id: i64,
    pub fdc_id: i64,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub grams: f64,
    pub meal_type: MealType,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFoodLog {
    pub fdc_id: i64,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub grams: f64,
    pub meal_type: MealType,
    pub date: NaiveDate,
}

impl FoodLog {
    #[must_use]
    pub fn to_new(&self) -> NewFoodLog {
        NewFoodLog {
            fdc_id: self.fdc_id,
            name: self.name.clone(),
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbs: self.carbs,
            grams: self.grams,
            meal_type: self.meal_type,
            date: self.date,
        }
    }
}

pub fn validate_grams(grams: f64) -> Result<(), ValidationError> {
    if !is_positive(grams) {
        return Err(ValidationError::NonPositiveGrams);
    }
    if grams > MAX_PORTION_G {
        return Err(ValidationError::TooManyGrams);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyNutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

// --- Training ---

pub const MAX_NOTES_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Training {
    pub id: i64,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub training_type: TrainingType,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTraining {
    pub date: DateTime<Utc>,
    pub training_type: TrainingType,
    pub duration_minutes: i64,
    pub notes: Option<String>,
}

pub fn validate_training(training: &NewTraining) -> Result<(), ValidationError> {
    if training.duration_minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    if training
        .notes
        .as_deref()
        .is_some_and(|n| n.chars().count() > MAX_NOTES_CHARS)
    {
        return Err(ValidationError::NotesTooLong);
    }
    Ok(())
}

// --- Techniques ---

pub const MAX_DESCRIPTION_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: i64,
    pub name: String,
    pub category: TechniqueCategory,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTechnique {
    pub name: String,
    pub category: TechniqueCategory,
    pub description: Option<String>,
}

pub fn validate_technique(technique: &NewTechnique) -> Result<(), ValidationError> {
    if technique.name.trim().is_empty() {
        return Err(ValidationError::BlankTechniqueName);
    }
    if technique
        .description
        .as_deref()
        .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_CHARS)
    {
        return Err(ValidationError::DescriptionTooLong);
    }
    Ok(())
}

// --- Search ---

pub const MIN_QUERY_CHARS: usize = 2;

/// `Ok(None)` for a blank query, which callers answer with an empty result.
pub fn validate_search_query(query: &str) -> Result<Option<&str>, ValidationError> {
    if query.trim().is_empty() {
        return Ok(None);
    }
    if query.chars().count() < MIN_QUERY_CHARS {
        return Err(ValidationError::QueryTooShort);
    }
    Ok(Some(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn profile_input() -> ProfileInput {
        ProfileInput {
            name: "Marcelo".to_string(),
            age: 30,
            height_cm: 178.0,
            current_weight_kg: 82.0,
            target_weight_kg: 76.0,
            weight_class: "Medio".to_string(),
            gender: Gender::Male,
        }
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("Breakfast".parse::<MealType>().unwrap(), MealType::Breakfast);
        assert_eq!(" SNACK ".parse::<MealType>().unwrap(), MealType::Snack);
        assert_eq!(
            "submission".parse::<TechniqueCategory>().unwrap(),
            TechniqueCategory::Submission
        );
        assert_eq!(
            "three_months".parse::<TimePeriod>().unwrap(),
            TimePeriod::ThreeMonths
        );
    }

    #[test]
    fn test_enum_parsing_rejects_unknown() {
        let err = "brunch".parse::<MealType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid meal type 'brunch'. Must be one of: breakfast, lunch, dinner, snack"
        );
    }

    #[test]
    fn test_enum_serde_uses_lowercase() {
        let json = serde_json::to_string(&TrainingType::Grappling).unwrap();
        assert_eq!(json, "\"grappling\"");
        let back: TrainingType = serde_json::from_str("\"cardio\"").unwrap();
        assert_eq!(back, TrainingType::Cardio);
    }

    #[test]
    fn test_valid_profile() {
        assert!(validate_profile(&profile_input()).is_ok());
    }

    #[test]
    fn test_profile_rejections() {
        let mut input = profile_input();
        input.name = "   ".to_string();
        assert_eq!(validate_profile(&input), Err(ValidationError::EmptyName));

        let mut input = profile_input();
        input.age = 0;
        assert_eq!(validate_profile(&input), Err(ValidationError::AgeOutOfRange));
        input.age = 121;
        assert_eq!(validate_profile(&input), Err(ValidationError::AgeOutOfRange));
        input.age = 120;
        assert!(validate_profile(&input).is_ok());

        let mut input = profile_input();
        input.height_cm = 0.0;
        assert_eq!(
            validate_profile(&input),
            Err(ValidationError::NonPositiveHeight)
        );

        let mut input = profile_input();
        input.current_weight_kg = -1.0;
        assert_eq!(
            validate_profile(&input),
            Err(ValidationError::NonPositiveCurrentWeight)
        );

        let mut input = profile_input();
        input.target_weight_kg = 0.0;
        assert_eq!(
            validate_profile(&input),
            Err(ValidationError::NonPositiveTargetWeight)
        );
    }

    #[test]
    fn test_tdee() {
        assert_eq!(tdee(80.0).unwrap(), 2400);
        assert_eq!(tdee(75.5).unwrap(), 2265);
        assert_eq!(tdee(0.0), Err(ValidationError::NonPositiveWeight));
        assert_eq!(tdee(-5.0), Err(ValidationError::NonPositiveWeight));
        assert_eq!(tdee(f64::NAN), Err(ValidationError::NonPositiveWeight));
    }

    #[test]
    fn test_weight_bounds() {
        assert!(validate_weight(20.0).is_ok());
        assert!(validate_weight(300.0).is_ok());
        assert_eq!(validate_weight(19.9), Err(ValidationError::WeightOutOfRange));
        assert_eq!(validate_weight(300.1), Err(ValidationError::WeightOutOfRange));
        assert_eq!(validate_weight(0.0), Err(ValidationError::NonPositiveWeight));
    }

    #[test]
    fn test_grams_bounds() {
        assert!(validate_grams(0.1).is_ok());
        assert!(validate_grams(10_000.0).is_ok());
        assert_eq!(validate_grams(0.0), Err(ValidationError::NonPositiveGrams));
        assert_eq!(validate_grams(-50.0), Err(ValidationError::NonPositiveGrams));
        assert_eq!(validate_grams(10_000.5), Err(ValidationError::TooManyGrams));
    }

    #[test]
    fn test_food_portion_scales_per_100g() {
        let food = Food::custom("Rice", 130.0, 2.7, 0.3, 28.0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let log = food.portion(250.0, MealType::Lunch, date);
        assert!((log.calories - 325.0).abs() < 0.01);
        assert!((log.protein - 6.75).abs() < 0.01);
        assert!((log.fat - 0.75).abs() < 0.01);
        assert!((log.carbs - 70.0).abs() < 0.01);
        assert_eq!(log.fdc_id, 0);
        assert_eq!(log.meal_type, MealType::Lunch);
        assert_eq!(log.date, date);
    }

    #[test]
    fn test_training_validation() {
        let mut training = NewTraining {
            date: Utc::now(),
            training_type: TrainingType::Sparring,
            duration_minutes: 60,
            notes: Some("x".repeat(1000)),
        };
        assert!(validate_training(&training).is_ok());

        training.notes = Some("x".repeat(1001));
        assert_eq!(
            validate_training(&training),
            Err(ValidationError::NotesTooLong)
        );

        training.notes = None;
        training.duration_minutes = 0;
        assert_eq!(
            validate_training(&training),
            Err(ValidationError::NonPositiveDuration)
        );
    }

    #[test]
    fn test_technique_validation() {
        let mut technique = NewTechnique {
            name: "Armbar".to_string(),
            category: TechniqueCategory::Submission,
            description: Some("d".repeat(2000)),
        };
        assert!(validate_technique(&technique).is_ok());

        technique.description = Some("d".repeat(2001));
        assert_eq!(
            validate_technique(&technique),
            Err(ValidationError::DescriptionTooLong)
        );

        technique.description = None;
        technique.name = "\t".to_string();
        assert_eq!(
            validate_technique(&technique),
            Err(ValidationError::BlankTechniqueName)
        );
    }

    #[test]
    fn test_search_query_validation() {
        assert_eq!(validate_search_query("ab"), Ok(Some("ab")));
        assert_eq!(validate_search_query("a"), Err(ValidationError::QueryTooShort));
        assert_eq!(validate_search_query(""), Ok(None));
        assert_eq!(validate_search_query("   "), Ok(None));
    }

    #[test]
    fn test_time_period_start_dates() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(
            TimePeriod::Week.start_date(today),
            NaiveDate::from_ymd_opt(2024, 3, 24).unwrap()
        );
        assert_eq!(
            TimePeriod::Month.start_date(today),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            TimePeriod::Year.start_date(today),
            NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()
        );
        assert_eq!(
            TimePeriod::All.start_date(today),
            NaiveDate::from_ymd_opt(2014, 3, 31).unwrap()
        );
    }

    proptest! {
        #[test]
        fn prop_tdee_is_rounded_thirty_times_weight(w in 0.001f64..1000.0) {
            prop_assert_eq!(tdee(w).unwrap(), (w * 30.0).round() as i64);
        }

        #[test]
        fn prop_tdee_rejects_non_positive(w in -1000.0f64..=0.0) {
            prop_assert!(tdee(w).is_err());
        }

        #[test]
        fn prop_portion_matches_per_100g(cal in 0.0f64..900.0, grams in 0.1f64..10_000.0) {
            let food = Food::custom("x", cal, 0.0, 0.0, 0.0);
            let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let log = food.portion(grams, MealType::Snack, date);
            prop_assert!((log.calories - cal * grams / 100.0).abs() < 1e-6);
        }
    }
}
