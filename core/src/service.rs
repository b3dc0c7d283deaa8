use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use crate::changes::Table;
use crate::dates::{SharedClock, month_bounds, today};
use crate::error::{UseCaseError, UseCaseResult, ValidationError};
use crate::live::{LiveQuery, Store};
use crate::models::{
    DailyNutrition, Food, FoodLog, MealType, NewTechnique, NewTraining, NewWeightEntry,
    PROFILE_ID, ProfileInput, Technique, TechniqueCategory, TimePeriod, Training, TrainingType,
    UserProfile, WeightEntry, is_positive, tdee, validate_grams, validate_profile, validate_search_query,
    validate_technique, validate_training, validate_weight,
};
use crate::repository::{
    NutritionRepository, SettingsRepository, TechniqueRepository, TrainingRepository,
    UPCOMING_LIMIT, UserRepository,
};

/// Remote food search.
///
/// The CLI implements this with reqwest; tests use canned results.
/// Called synchronously, so async callers should run it on a blocking thread.
pub trait FoodLookupProvider: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Food>>;
}

/// One day's food logs together with their totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyNutritionData {
    pub date: NaiveDate,
    pub logs: Vec<FoodLog>,
    pub totals: DailyNutrition,
}

fn storage<T>(result: Result<T>) -> UseCaseResult<T> {
    result.map_err(|e| {
        tracing::warn!(error = %format!("{e:#}"), "storage operation failed");
        UseCaseError::Storage(e)
    })
}

/// Validating entry point for every read and write the app performs.
#[derive(Clone)]
pub struct TrackerService {
    store: Store,
    clock: SharedClock,
    users: UserRepository,
    nutrition: NutritionRepository,
    trainings: TrainingRepository,
    techniques: TechniqueRepository,
    settings: SettingsRepository,
}

impl TrackerService {
    #[must_use]
    pub fn new(store: Store, clock: SharedClock, provider: Arc<dyn FoodLookupProvider>) -> Self {
        Self {
            users: UserRepository::new(store.clone(), Arc::clone(&clock)),
            nutrition: NutritionRepository::new(store.clone(), Arc::clone(&clock), provider),
            trainings: TrainingRepository::new(store.clone(), Arc::clone(&clock)),
            techniques: TechniqueRepository::new(store.clone(), Arc::clone(&clock)),
            settings: SettingsRepository::new(store.clone()),
            store,
            clock,
        }
    }

    pub fn open(
        db_path: &Path,
        clock: SharedClock,
        provider: Arc<dyn FoodLookupProvider>,
    ) -> Result<Self> {
        Ok(Self::new(Store::open(db_path)?, clock, provider))
    }

    pub fn open_in_memory(
        clock: SharedClock,
        provider: Arc<dyn FoodLookupProvider>,
    ) -> Result<Self> {
        Ok(Self::new(Store::open_in_memory()?, clock, provider))
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        today(self.clock.as_ref())
    }

    #[must_use]
    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    #[must_use]
    pub fn nutrition(&self) -> &NutritionRepository {
        &self.nutrition
    }

    #[must_use]
    pub fn trainings(&self) -> &TrainingRepository {
        &self.trainings
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    // --- Profile ---

    #[must_use]
    pub fn profile(&self) -> LiveQuery<Option<UserProfile>> {
        self.users.profile()
    }

    pub fn get_profile(&self) -> UseCaseResult<Option<UserProfile>> {
        storage(self.users.get_profile())
    }

    /// Validate and store the profile. Daily calories are derived from the
    /// current weight; the first creation time survives re-saves.
    pub fn save_profile(&self, input: ProfileInput) -> UseCaseResult<UserProfile> {
        validate_profile(&input)?;
        let daily_calories = tdee(input.current_weight_kg)?;
        let created_at = storage(self.users.get_profile())?
            .map_or_else(|| self.clock.utc(), |existing| existing.created_at);

        let profile = UserProfile {
            id: PROFILE_ID,
            name: input.name.trim().to_string(),
            age: input.age,
            height_cm: input.height_cm,
            current_weight_kg: input.current_weight_kg,
            target_weight_kg: input.target_weight_kg,
            weight_class: input.weight_class,
            gender: input.gender,
            daily_calories,
            created_at,
        };
        storage(self.users.save_profile(&profile))
    }

    pub fn delete_profile(&self) -> UseCaseResult<bool> {
        storage(self.users.delete_profile())
    }

    // --- Weight ---

    /// Record the weight for `date`, replacing any entry already on that day.
    pub fn add_weight_entry(
        &self,
        weight_kg: f64,
        date: NaiveDate,
        note: Option<String>,
    ) -> UseCaseResult<WeightEntry> {
        if !is_positive(weight_kg) {
            return Err(ValidationError::NonPositiveWeight.into());
        }
        if date > self.today() {
            return Err(ValidationError::FutureWeightDate.into());
        }
        validate_weight(weight_kg)?;

        let note = note.filter(|n| !n.trim().is_empty());
        storage(self.users.save_weight(&NewWeightEntry {
            weight_kg,
            date,
            note,
        }))
    }

    #[must_use]
    pub fn weight_history(&self, period: TimePeriod) -> LiveQuery<Vec<WeightEntry>> {
        self.users.weight_history(period)
    }

    #[must_use]
    pub fn all_weight_entries(&self) -> LiveQuery<Vec<WeightEntry>> {
        self.users.all_weight_entries()
    }

    pub fn delete_weight_entry(&self, id: i64) -> UseCaseResult<()> {
        storage(self.users.delete_weight(id))
    }

    // --- Nutrition ---

    /// Log `grams` of `food`. Stored values are per-100 g values scaled by
    /// `grams / 100`.
    pub fn add_food_log(
        &self,
        food: &Food,
        grams: f64,
        meal_type: MealType,
        date: NaiveDate,
    ) -> UseCaseResult<FoodLog> {
        validate_grams(grams)?;
        storage(
            self.nutrition
                .add_food_log(&food.portion(grams, meal_type, date)),
        )
    }

    /// Change the portion or meal of an existing log. Nutrition values are
    /// rescaled to the new weight.
    pub fn update_food_log(
        &self,
        id: i64,
        grams: f64,
        meal_type: MealType,
    ) -> UseCaseResult<FoodLog> {
        validate_grams(grams)?;
        let mut log = storage(self.nutrition.get_food_log(id))?;
        let factor = grams / log.grams;
        log.calories *= factor;
        log.protein *= factor;
        log.fat *= factor;
        log.carbs *= factor;
        log.grams = grams;
        log.meal_type = meal_type;
        storage(self.nutrition.update_food_log(&log))
    }

    pub fn delete_food_log(&self, id: i64) -> UseCaseResult<bool> {
        storage(self.nutrition.delete_food_log(id))
    }

    /// Drop food logs older than `keep_days` days before today.
    pub fn prune_food_logs(&self, keep_days: i64) -> UseCaseResult<usize> {
        let cutoff = self.today() - chrono::Duration::days(keep_days.max(0));
        storage(self.nutrition.delete_food_logs_before(cutoff))
    }

    #[must_use]
    pub fn daily_nutrition(&self, date: NaiveDate) -> LiveQuery<DailyNutritionData> {
        self.nutrition
            .food_logs_for_date(date)
            .then_read(move |db, logs| {
                Ok(DailyNutritionData {
                    date,
                    logs,
                    totals: db.get_daily_nutrition(date)?,
                })
            })
    }

    /// Search the remote food database. A blank query answers with nothing
    /// and does not touch the network.
    pub fn search_foods(&self, query: &str) -> UseCaseResult<Vec<Food>> {
        let Some(query) = validate_search_query(query)? else {
            return Ok(Vec::new());
        };
        self.nutrition.search_foods(query).map_err(|e| {
            tracing::warn!(error = %format!("{e:#}"), "food search failed");
            UseCaseError::Remote(e)
        })
    }

    // --- Training ---

    pub fn add_training(&self, training: &NewTraining) -> UseCaseResult<Training> {
        validate_training(training)?;
        storage(self.trainings.add_training(training))
    }

    pub fn update_training(&self, training: &Training) -> UseCaseResult<Training> {
        validate_training(&NewTraining {
            date: training.date,
            training_type: training.training_type,
            duration_minutes: training.duration_minutes,
            notes: training.notes.clone(),
        })?;
        storage(self.trainings.update_training(training))
    }

    pub fn delete_training(&self, id: i64) -> UseCaseResult<bool> {
        storage(self.trainings.delete_training(id))
    }

    pub fn get_training(&self, id: i64) -> UseCaseResult<Training> {
        storage(self.trainings.get_training(id))
    }

    /// Sessions in a calendar month, latest first.
    pub fn trainings_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> UseCaseResult<LiveQuery<Vec<Training>>> {
        let (first, last) =
            month_bounds(year, month).ok_or(ValidationError::InvalidMonth { year, month })?;
        Ok(self.trainings.trainings_on_days(first, last))
    }

    #[must_use]
    pub fn trainings_for_day(&self, date: NaiveDate) -> LiveQuery<Vec<Training>> {
        self.trainings.trainings_for_day(date)
    }

    #[must_use]
    pub fn upcoming_trainings(&self) -> LiveQuery<Vec<Training>> {
        self.trainings.upcoming_trainings(UPCOMING_LIMIT)
    }

    /// The next session, if any.
    #[must_use]
    pub fn upcoming_training(&self) -> LiveQuery<Option<Training>> {
        self.trainings
            .upcoming_trainings(1)
            .map(|trainings| trainings.into_iter().next())
    }

    #[must_use]
    pub fn trainings_by_type(&self, training_type: TrainingType) -> LiveQuery<Vec<Training>> {
        self.trainings.trainings_by_type(training_type)
    }

    #[must_use]
    pub fn all_trainings(&self) -> LiveQuery<Vec<Training>> {
        self.trainings.all_trainings()
    }

    // --- Techniques ---

    pub fn add_technique(&self, technique: &NewTechnique) -> UseCaseResult<Technique> {
        validate_technique(technique)?;
        let technique = NewTechnique {
            name: technique.name.trim().to_string(),
            category: technique.category,
            description: technique
                .description
                .clone()
                .filter(|d| !d.trim().is_empty()),
        };
        storage(self.techniques.add_technique(&technique))
    }

    pub fn update_technique(&self, technique: &Technique) -> UseCaseResult<Technique> {
        validate_technique(&NewTechnique {
            name: technique.name.clone(),
            category: technique.category,
            description: technique.description.clone(),
        })?;
        storage(self.techniques.update_technique(technique))
    }

    pub fn delete_technique(&self, id: i64) -> UseCaseResult<bool> {
        storage(self.techniques.delete_technique(id))
    }

    pub fn get_technique(&self, id: i64) -> UseCaseResult<Option<Technique>> {
        storage(self.techniques.get_technique(id))
    }

    /// All techniques, or one category, newest first.
    #[must_use]
    pub fn techniques(&self, category: Option<TechniqueCategory>) -> LiveQuery<Vec<Technique>> {
        match category {
            Some(category) => self.techniques.techniques_by_category(category),
            None => self.techniques.all_techniques(),
        }
    }

    /// Name or description search. A blank query lists everything.
    #[must_use]
    pub fn search_techniques(&self, query: &str) -> LiveQuery<Vec<Technique>> {
        if query.trim().is_empty() {
            self.techniques.all_techniques()
        } else {
            self.techniques.search_techniques(query.trim())
        }
    }

    // --- Settings ---

    #[must_use]
    pub fn is_dark_theme(&self) -> LiveQuery<bool> {
        self.settings.dark_theme()
    }

    pub fn set_dark_theme(&self, enabled: bool) -> UseCaseResult<()> {
        storage(self.settings.set_dark_theme(enabled))
    }

    /// Whether a profile exists, following writes to it.
    #[must_use]
    pub fn has_profile(&self) -> LiveQuery<bool> {
        LiveQuery::new(&self.store, &[Table::Profile], |db| {
            Ok(db.get_profile()?.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::test_support::{FakeProvider, FixedClock};
    use chrono::{Duration, Utc};
    use mockable::Clock;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn service_on(date: NaiveDate) -> (TrackerService, Arc<FakeProvider>) {
        let provider = Arc::new(FakeProvider::default());
        let clock = FixedClock::on(date);
        let svc = TrackerService::open_in_memory(clock.shared(), provider.clone()).unwrap();
        (svc, provider)
    }

    fn input() -> ProfileInput {
        ProfileInput {
            name: "  Ana  ".to_string(),
            age: 26,
            height_cm: 160.0,
            current_weight_kg: 58.3,
            target_weight_kg: 57.5,
            weight_class: "Pena".to_string(),
            gender: Gender::Female,
        }
    }

    fn chicken() -> Food {
        Food {
            fdc_id: 171_477,
            name: "Chicken breast".to_string(),
            calories_per_100g: 165.0,
            protein_per_100g: 31.0,
            fat_per_100g: 3.6,
            carbs_per_100g: 0.0,
            is_custom: false,
        }
    }

    #[test]
    fn test_save_profile_derives_calories_and_keeps_created_at() {
        let (svc, _) = service_on(day(2024, 1, 5));
        let first = svc.save_profile(input()).unwrap();
        assert_eq!(first.name, "Ana");
        assert_eq!(first.daily_calories, 1749);
        assert_eq!(first.id, PROFILE_ID);

        let mut changed = input();
        changed.current_weight_kg = 60.0;
        let second = svc.save_profile(changed).unwrap();
        assert_eq!(second.daily_calories, 1800);
        assert_eq!(second.created_at, first.created_at);
    }

    #[test]
    fn test_save_profile_rejects_before_writing() {
        let (svc, _) = service_on(day(2024, 1, 5));
        let mut bad = input();
        bad.age = 0;
        let err = svc.save_profile(bad).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::AgeOutOfRange));
        assert!(svc.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_weight_entry_rules() {
        let today = day(2024, 4, 10);
        let (svc, _) = service_on(today);

        let err = svc
            .add_weight_entry(80.0, today + Duration::days(1), None)
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::FutureWeightDate));

        let err = svc.add_weight_entry(0.0, today, None).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::NonPositiveWeight));

        let err = svc.add_weight_entry(301.0, today, None).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::WeightOutOfRange));

        let first = svc.add_weight_entry(80.0, today, None).unwrap();
        let second = svc
            .add_weight_entry(79.6, today, Some("after training".to_string()))
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(svc.all_weight_entries().get().unwrap().len(), 1);
    }

    #[test]
    fn test_add_food_log_scales_nutrition() {
        let (svc, _) = service_on(day(2024, 4, 10));
        let log = svc
            .add_food_log(&chicken(), 150.0, MealType::Dinner, day(2024, 4, 10))
            .unwrap();
        assert!((log.calories - 247.5).abs() < 0.01);
        assert!((log.protein - 46.5).abs() < 0.01);
        assert!((log.fat - 5.4).abs() < 0.01);
        assert!((log.grams - 150.0).abs() < f64::EPSILON);

        let err = svc
            .add_food_log(&chicken(), 0.0, MealType::Dinner, day(2024, 4, 10))
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::NonPositiveGrams));
        let err = svc
            .add_food_log(&chicken(), 10_001.0, MealType::Dinner, day(2024, 4, 10))
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::TooManyGrams));
    }

    #[test]
    fn test_update_food_log_rescales() {
        let (svc, _) = service_on(day(2024, 4, 10));
        let log = svc
            .add_food_log(&chicken(), 100.0, MealType::Lunch, day(2024, 4, 10))
            .unwrap();
        let updated = svc.update_food_log(log.id, 200.0, MealType::Dinner).unwrap();
        assert!((updated.calories - 330.0).abs() < 0.01);
        assert_eq!(updated.meal_type, MealType::Dinner);
        assert!(svc.update_food_log(9999, 100.0, MealType::Lunch).is_err());
    }

    #[test]
    fn test_prune_food_logs_keeps_recent_days() {
        let today = day(2024, 4, 10);
        let (svc, _) = service_on(today);
        svc.add_food_log(&chicken(), 100.0, MealType::Lunch, today - Duration::days(40))
            .unwrap();
        svc.add_food_log(&chicken(), 100.0, MealType::Lunch, today - Duration::days(30))
            .unwrap();
        svc.add_food_log(&chicken(), 100.0, MealType::Lunch, today)
            .unwrap();
        assert_eq!(svc.prune_food_logs(30).unwrap(), 1);
    }

    #[test]
    fn test_persistence_failures_surface_as_storage_errors() {
        let today = day(2024, 4, 10);
        let (svc, _) = service_on(today);

        let err = svc.delete_weight_entry(42).unwrap_err();
        assert!(matches!(err, UseCaseError::Storage(_)));
        let err = svc.update_food_log(9999, 100.0, MealType::Lunch).unwrap_err();
        assert!(matches!(err, UseCaseError::Storage(_)));

        svc.store()
            .with(|db| db.run_sql(Table::FoodLogs, "DROP TABLE food_logs"))
            .unwrap();
        let err = svc
            .add_food_log(&chicken(), 100.0, MealType::Lunch, today)
            .unwrap_err();
        assert!(matches!(err, UseCaseError::Storage(_)));
        assert!(err.to_string().starts_with("Storage error"));
    }

    #[test]
    fn test_daily_nutrition_bundles_logs_and_totals() {
        let today = day(2024, 4, 10);
        let (svc, _) = service_on(today);
        svc.add_food_log(&chicken(), 100.0, MealType::Lunch, today)
            .unwrap();
        svc.add_food_log(&chicken(), 50.0, MealType::Dinner, today)
            .unwrap();
        let data = svc.daily_nutrition(today).get().unwrap();
        assert_eq!(data.logs.len(), 2);
        assert!((data.totals.calories - 247.5).abs() < 0.01);
        assert_eq!(data.date, today);
    }

    #[test]
    fn test_search_foods_query_rules() {
        let (svc, provider) = service_on(day(2024, 4, 10));

        assert!(svc.search_foods("").unwrap().is_empty());
        assert!(svc.search_foods("   ").unwrap().is_empty());
        assert_eq!(provider.call_count(), 0);

        let err = svc.search_foods("a").unwrap_err();
        assert_eq!(err.to_string(), "Query must be at least 2 characters");
        assert_eq!(provider.call_count(), 0);

        let foods = svc.search_foods("ab").unwrap();
        assert_eq!(foods.len(), 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[test]
    fn test_search_foods_remote_failure() {
        let clock = FixedClock::on(day(2024, 4, 10));
        let svc =
            TrackerService::open_in_memory(clock.shared(), Arc::new(FakeProvider::failing()))
                .unwrap();
        let err = svc.search_foods("oats").unwrap_err();
        assert!(matches!(err, UseCaseError::Remote(_)));
    }

    #[test]
    fn test_training_rules_and_month_query() {
        let (svc, _) = service_on(day(2024, 4, 10));
        let when = Utc::now();
        let err = svc
            .add_training(&NewTraining {
                date: when,
                training_type: TrainingType::Cardio,
                duration_minutes: 0,
                notes: None,
            })
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::NonPositiveDuration));

        let april = FixedClock::on(day(2024, 4, 30)).utc();
        let may = FixedClock::on(day(2024, 5, 1)).utc();
        for date in [april, may] {
            svc.add_training(&NewTraining {
                date,
                training_type: TrainingType::Grappling,
                duration_minutes: 90,
                notes: None,
            })
            .unwrap();
        }
        let in_april = svc.trainings_for_month(2024, 4).unwrap().get().unwrap();
        assert_eq!(in_april.len(), 1);
        assert_eq!(in_april[0].date, april);

        let Err(err) = svc.trainings_for_month(2024, 0) else {
            panic!("month 0 accepted");
        };
        assert!(err.is_validation());

        let mut edited = in_april[0].clone();
        edited.notes = Some("n".repeat(1001));
        assert!(svc.update_training(&edited).unwrap_err().is_validation());
    }

    #[test]
    fn test_upcoming_training_is_soonest() {
        let (svc, _) = service_on(day(2024, 4, 10));
        let now = svc.clock().utc();
        for hours in [48, 2, 24] {
            svc.add_training(&NewTraining {
                date: now + Duration::hours(hours),
                training_type: TrainingType::Sparring,
                duration_minutes: 60,
                notes: None,
            })
            .unwrap();
        }
        let next = svc.upcoming_training().get().unwrap().unwrap();
        assert_eq!(next.date, now + Duration::hours(2));
        assert_eq!(svc.upcoming_trainings().get().unwrap().len(), 3);
    }

    #[test]
    fn test_technique_rules_and_search() {
        let (svc, _) = service_on(day(2024, 4, 10));
        let err = svc
            .add_technique(&NewTechnique {
                name: " ".to_string(),
                category: TechniqueCategory::Sweep,
                description: None,
            })
            .unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::BlankTechniqueName));

        svc.add_technique(&NewTechnique {
            name: "Kimura".to_string(),
            category: TechniqueCategory::Submission,
            description: Some("Figure-four shoulder lock".to_string()),
        })
        .unwrap();
        svc.add_technique(&NewTechnique {
            name: "Hip escape".to_string(),
            category: TechniqueCategory::Defense,
            description: Some(String::new()),
        })
        .unwrap();

        assert_eq!(svc.search_techniques("").get().unwrap().len(), 2);
        assert_eq!(svc.search_techniques("shoulder").get().unwrap().len(), 1);
        assert_eq!(
            svc.techniques(Some(TechniqueCategory::Defense))
                .get()
                .unwrap()[0]
                .description,
            None
        );
    }

    #[test]
    fn test_dark_theme_and_has_profile() {
        let (svc, _) = service_on(day(2024, 4, 10));
        assert!(!svc.is_dark_theme().get().unwrap());
        svc.set_dark_theme(true).unwrap();
        assert!(svc.is_dark_theme().get().unwrap());

        assert!(!svc.has_profile().get().unwrap());
        svc.save_profile(input()).unwrap();
        assert!(svc.has_profile().get().unwrap());
    }
}
