//! One repository per entity family. Each exposes live reads, one-shot reads
//! and writes over the shared [`Store`]. Writes go straight to the database
//! and wake every live read of the touched table.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::changes::Table;
use crate::dates::{SharedClock, day_span, today};
use crate::db::Database;
use crate::live::{LiveQuery, Store};
use crate::models::{
    DailyNutrition, Food, FoodLog, MealType, NewFoodLog, NewTechnique, NewTraining,
    NewWeightEntry, Technique, TechniqueCategory, TimePeriod, Training, TrainingType,
    UserProfile, WeightEntry,
};
use crate::service::FoodLookupProvider;

// --- Profile and weight ---

#[derive(Clone)]
pub struct UserRepository {
    store: Store,
    clock: SharedClock,
}

impl UserRepository {
    #[must_use]
    pub fn new(store: Store, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub fn profile(&self) -> LiveQuery<Option<UserProfile>> {
        LiveQuery::new(&self.store, &[Table::Profile], Database::get_profile)
    }

    pub fn get_profile(&self) -> Result<Option<UserProfile>> {
        self.store.with(Database::get_profile)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.store.with(|db| db.upsert_profile(profile))
    }

    pub fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.store.with(|db| db.update_profile(profile))
    }

    pub fn delete_profile(&self) -> Result<bool> {
        self.store.with(Database::delete_profile)
    }

    #[must_use]
    pub fn weight_entries_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LiveQuery<Vec<WeightEntry>> {
        LiveQuery::new(&self.store, &[Table::WeightEntries], move |db| {
            db.get_weight_range(start, end)
        })
    }

    /// Entries for the last `days` calendar days including today, oldest
    /// first. "Today" is read from the clock on every recomputation.
    #[must_use]
    pub fn recent_weight_entries(&self, days: i64) -> LiveQuery<Vec<WeightEntry>> {
        let clock = Arc::clone(&self.clock);
        LiveQuery::new(&self.store, &[Table::WeightEntries], move |db| {
            let end = today(clock.as_ref());
            let start = end - chrono::Duration::days(days - 1);
            db.get_weight_range(start, end)
        })
    }

    #[must_use]
    pub fn weight_history(&self, period: TimePeriod) -> LiveQuery<Vec<WeightEntry>> {
        let clock = Arc::clone(&self.clock);
        LiveQuery::new(&self.store, &[Table::WeightEntries], move |db| {
            let end = today(clock.as_ref());
            db.get_weight_range(period.start_date(end), end)
        })
    }

    #[must_use]
    pub fn all_weight_entries(&self) -> LiveQuery<Vec<WeightEntry>> {
        LiveQuery::new(
            &self.store,
            &[Table::WeightEntries],
            Database::get_weight_history,
        )
    }

    #[must_use]
    pub fn latest_weight(&self) -> LiveQuery<Option<WeightEntry>> {
        LiveQuery::new(
            &self.store,
            &[Table::WeightEntries],
            Database::get_latest_weight,
        )
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        self.store.with(|db| db.get_weight(date))
    }

    pub fn save_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        self.store.with(|db| db.upsert_weight(entry))
    }

    pub fn delete_weight(&self, id: i64) -> Result<()> {
        self.store.with(|db| db.delete_weight(id))
    }
}

// --- Nutrition ---

#[derive(Clone)]
pub struct NutritionRepository {
    store: Store,
    clock: SharedClock,
    provider: Arc<dyn FoodLookupProvider>,
}

impl NutritionRepository {
    #[must_use]
    pub fn new(store: Store, clock: SharedClock, provider: Arc<dyn FoodLookupProvider>) -> Self {
        Self {
            store,
            clock,
            provider,
        }
    }

    #[must_use]
    pub fn food_logs_for_date(&self, date: NaiveDate) -> LiveQuery<Vec<FoodLog>> {
        LiveQuery::new(&self.store, &[Table::FoodLogs], move |db| {
            db.get_food_logs_for_date(date)
        })
    }

    /// Logs for whatever day the clock says it is at each recomputation.
    #[must_use]
    pub fn food_logs_today(&self) -> LiveQuery<Vec<FoodLog>> {
        let clock = Arc::clone(&self.clock);
        LiveQuery::new(&self.store, &[Table::FoodLogs], move |db| {
            db.get_food_logs_for_date(today(clock.as_ref()))
        })
    }

    #[must_use]
    pub fn food_logs_for_meal(&self, date: NaiveDate, meal_type: MealType) -> LiveQuery<Vec<FoodLog>> {
        LiveQuery::new(&self.store, &[Table::FoodLogs], move |db| {
            db.get_food_logs_for_meal(date, meal_type)
        })
    }

    #[must_use]
    pub fn daily_nutrition_live(&self, date: NaiveDate) -> LiveQuery<DailyNutrition> {
        LiveQuery::new(&self.store, &[Table::FoodLogs], move |db| {
            db.get_daily_nutrition(date)
        })
    }

    pub fn daily_nutrition(&self, date: NaiveDate) -> Result<DailyNutrition> {
        self.store.with(|db| db.get_daily_nutrition(date))
    }

    pub fn get_food_log(&self, id: i64) -> Result<FoodLog> {
        self.store.with(|db| db.get_food_log(id))
    }

    pub fn add_food_log(&self, log: &NewFoodLog) -> Result<FoodLog> {
        self.store.with(|db| db.insert_food_log(log))
    }

    pub fn update_food_log(&self, log: &FoodLog) -> Result<FoodLog> {
        self.store.with(|db| db.update_food_log(log))
    }

    pub fn delete_food_log(&self, id: i64) -> Result<bool> {
        self.store.with(|db| db.delete_food_log(id))
    }

    pub fn delete_food_logs_before(&self, cutoff: NaiveDate) -> Result<usize> {
        self.store.with(|db| db.delete_food_logs_before(cutoff))
    }

    /// Query the remote food database. Blocks for the length of the request.
    pub fn search_foods(&self, query: &str) -> Result<Vec<Food>> {
        self.provider
            .search(query)
            .with_context(|| format!("Food search for '{query}' failed"))
    }
}

// --- Training ---

/// How many sessions the upcoming list holds.
pub const UPCOMING_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct TrainingRepository {
    store: Store,
    clock: SharedClock,
}

impl TrainingRepository {
    #[must_use]
    pub fn new(store: Store, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub fn trainings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> LiveQuery<Vec<Training>> {
        LiveQuery::new(&self.store, &[Table::Trainings], move |db| {
            db.get_trainings_between(start, end)
        })
    }

    /// Sessions on days `start..=end`, latest first.
    #[must_use]
    pub fn trainings_on_days(&self, start: NaiveDate, end: NaiveDate) -> LiveQuery<Vec<Training>> {
        let (from, until) = day_span(start, end);
        self.trainings_between(from, until)
    }

    #[must_use]
    pub fn trainings_for_day(&self, date: NaiveDate) -> LiveQuery<Vec<Training>> {
        LiveQuery::new(&self.store, &[Table::Trainings], move |db| {
            db.get_trainings_for_day(date)
        })
    }

    #[must_use]
    pub fn trainings_by_type(&self, training_type: TrainingType) -> LiveQuery<Vec<Training>> {
        LiveQuery::new(&self.store, &[Table::Trainings], move |db| {
            db.get_trainings_by_type(training_type)
        })
    }

    #[must_use]
    pub fn all_trainings(&self) -> LiveQuery<Vec<Training>> {
        LiveQuery::new(&self.store, &[Table::Trainings], Database::get_all_trainings)
    }

    /// The next `limit` sessions from the clock's "now", re-read on every
    /// recomputation.
    #[must_use]
    pub fn upcoming_trainings(&self, limit: i64) -> LiveQuery<Vec<Training>> {
        let clock = Arc::clone(&self.clock);
        LiveQuery::new(&self.store, &[Table::Trainings], move |db| {
            db.get_upcoming_trainings(clock.utc(), limit)
        })
    }

    pub fn get_training(&self, id: i64) -> Result<Training> {
        self.store.with(|db| db.get_training(id))
    }

    pub fn add_training(&self, training: &NewTraining) -> Result<Training> {
        self.store.with(|db| db.insert_training(training))
    }

    pub fn update_training(&self, training: &Training) -> Result<Training> {
        self.store.with(|db| db.update_training(training))
    }

    pub fn delete_training(&self, id: i64) -> Result<bool> {
        self.store.with(|db| db.delete_training(id))
    }
}

// --- Techniques ---

#[derive(Clone)]
pub struct TechniqueRepository {
    store: Store,
    clock: SharedClock,
}

impl TechniqueRepository {
    #[must_use]
    pub fn new(store: Store, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    #[must_use]
    pub fn all_techniques(&self) -> LiveQuery<Vec<Technique>> {
        LiveQuery::new(
            &self.store,
            &[Table::Techniques],
            Database::get_all_techniques,
        )
    }

    #[must_use]
    pub fn techniques_by_category(&self, category: TechniqueCategory) -> LiveQuery<Vec<Technique>> {
        LiveQuery::new(&self.store, &[Table::Techniques], move |db| {
            db.get_techniques_by_category(category)
        })
    }

    #[must_use]
    pub fn search_techniques(&self, query: &str) -> LiveQuery<Vec<Technique>> {
        let query = query.to_string();
        LiveQuery::new(&self.store, &[Table::Techniques], move |db| {
            db.search_techniques(&query)
        })
    }

    pub fn get_technique(&self, id: i64) -> Result<Option<Technique>> {
        self.store.with(|db| db.get_technique(id))
    }

    pub fn add_technique(&self, technique: &NewTechnique) -> Result<Technique> {
        let created_at = self.clock.utc();
        self.store
            .with(|db| db.insert_technique(technique, created_at))
    }

    pub fn update_technique(&self, technique: &Technique) -> Result<Technique> {
        self.store.with(|db| db.update_technique(technique))
    }

    pub fn delete_technique(&self, id: i64) -> Result<bool> {
        self.store.with(|db| db.delete_technique(id))
    }
}

// --- Settings ---

pub const DARK_THEME_KEY: &str = "dark_theme";

#[derive(Clone)]
pub struct SettingsRepository {
    store: Store,
}

impl SettingsRepository {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Dark theme flag, `false` until first set.
    #[must_use]
    pub fn dark_theme(&self) -> LiveQuery<bool> {
        LiveQuery::new(&self.store, &[Table::Settings], |db| {
            Ok(db.get_setting(DARK_THEME_KEY)?.as_deref() == Some("true"))
        })
    }

    pub fn set_dark_theme(&self, enabled: bool) -> Result<()> {
        let value = if enabled { "true" } else { "false" };
        self.store.with(|db| db.set_setting(DARK_THEME_KEY, value))
    }
}
