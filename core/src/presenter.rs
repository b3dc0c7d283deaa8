//! Screen state holders.
//!
//! Each presenter follows one or more live queries on background tokio tasks
//! and publishes an immutable state value through a [`watch`] channel.
//! Dropping the presenter aborts the tasks after [`TEARDOWN_GRACE`]; receivers
//! still held keep seeing recomputed values until then. A failed read turns
//! into an `error_message` and ends that subscription until `refresh()`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{Datelike, Local, Months, NaiveDate};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dashboard::{
    DashboardData, calories_progress, is_goal_achieved, remaining_kg, weight_progress,
};
use crate::error::UseCaseResult;
use crate::live::LiveQuery;
use crate::models::{
    DailyNutrition, Food, FoodLog, MealType, NewTechnique, Technique, TechniqueCategory,
    TimePeriod, Training, UserProfile, WeightEntry,
};
use crate::service::TrackerService;

pub const FOOD_SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);
pub const TECHNIQUE_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
/// How long a dropped presenter's subscriptions keep running.
pub const TEARDOWN_GRACE: Duration = Duration::from_secs(5);

/// Common surface of every presenter state.
pub trait UiState: Clone + Send + Sync + 'static {
    fn set_loading(&mut self, loading: bool);
    fn set_error(&mut self, message: Option<String>);
}

/// Background tasks of one presenter, keyed by purpose.
#[derive(Default)]
struct Tasks(Mutex<Vec<(&'static str, JoinHandle<()>)>>);

impl Tasks {
    /// Run `handle` as the only task named `name`.
    fn replace(&self, name: &'static str, handle: JoinHandle<()>) {
        let mut tasks = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|(n, h)| {
            if *n == name {
                h.abort();
                false
            } else {
                !h.is_finished()
            }
        });
        tasks.push((name, handle));
    }

    /// Track `handle` next to any running task with the same name.
    fn push(&self, name: &'static str, handle: JoinHandle<()>) {
        let mut tasks = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|(_, h)| !h.is_finished());
        tasks.push((name, handle));
    }

    fn abort_all(&self) {
        let mut tasks = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, handle) in tasks.drain(..) {
            handle.abort();
        }
    }
}

struct Shared<S> {
    service: TrackerService,
    state: watch::Sender<S>,
    tasks: Tasks,
}

impl<S: UiState> Shared<S> {
    fn update(&self, f: impl FnOnce(&mut S)) {
        self.state.send_modify(f);
    }

    fn fail(&self, message: String) {
        self.update(|s| {
            s.set_loading(false);
            s.set_error(Some(message));
        });
    }

    /// Surface a failed user action as the state's error and pass it on.
    fn report<T>(&self, result: UseCaseResult<T>) -> UseCaseResult<T> {
        if let Err(e) = &result {
            self.update(|s| s.set_error(Some(e.to_string())));
        }
        result
    }
}

/// Apply every value of `query` to the state on a task named `name`,
/// replacing whatever that task was following before.
fn follow<S: UiState, T: Send + 'static>(
    shared: &Arc<Shared<S>>,
    name: &'static str,
    mut query: LiveQuery<T>,
    apply: impl Fn(&mut S, T) + Send + 'static,
) {
    let target = Arc::clone(shared);
    let handle = tokio::spawn(async move {
        while let Some(next) = query.next().await {
            match next {
                Ok(value) => target.update(|s| {
                    s.set_loading(false);
                    apply(s, value);
                }),
                Err(e) => {
                    tracing::warn!(task = name, error = %format!("{e:#}"), "live read failed");
                    target.fail(e.to_string());
                    return;
                }
            }
        }
    });
    shared.tasks.replace(name, handle);
}

/// Owns the shared half and tears its tasks down on drop.
struct Core<S: UiState> {
    shared: Arc<Shared<S>>,
}

impl<S: UiState> Core<S> {
    fn new(service: TrackerService, initial: S) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                service,
                state,
                tasks: Tasks::default(),
            }),
        }
    }

    fn service(&self) -> &TrackerService {
        &self.shared.service
    }

    fn state(&self) -> S {
        self.shared.state.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<S> {
        self.shared.state.subscribe()
    }

    fn reloading(&self) {
        self.shared.update(|s| {
            s.set_loading(true);
            s.set_error(None);
        });
    }
}

impl<S: UiState> Drop for Core<S> {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.shared.tasks.abort_all();
            return;
        };
        let shared = Arc::clone(&self.shared);
        runtime.spawn(async move {
            tokio::time::sleep(TEARDOWN_GRACE).await;
            tracing::debug!("presenter tasks stopped");
            shared.tasks.abort_all();
        });
    }
}

macro_rules! ui_state {
    ($name:ident, $error:ident) => {
        impl UiState for $name {
            fn set_loading(&mut self, loading: bool) {
                self.is_loading = loading;
            }

            fn set_error(&mut self, message: Option<String>) {
                self.$error = message;
            }
        }
    };
}

macro_rules! presenter_access {
    ($name:ident, $state:ident) => {
        impl $name {
            /// Snapshot of the current state.
            #[must_use]
            pub fn state(&self) -> $state {
                self.core.state()
            }

            /// Receiver that sees every published state.
            #[must_use]
            pub fn subscribe(&self) -> watch::Receiver<$state> {
                self.core.subscribe()
            }
        }
    };
}

// --- Dashboard ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardUiState {
    pub data: DashboardData,
    pub weight_progress: f64,
    pub calories_target: i64,
    pub calories_remaining: i64,
    pub calories_progress: f64,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(DashboardUiState, error_message);

impl DashboardUiState {
    fn from_data(data: DashboardData) -> Self {
        Self {
            weight_progress: data.weight_progress(),
            calories_target: data.calories_target(),
            calories_remaining: data.calories_remaining(),
            calories_progress: data.calories_progress(),
            data,
            is_loading: false,
            error_message: None,
        }
    }

    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.data.profile.as_ref().map_or("User", |p| p.name.as_str())
    }

    /// Target minus current weight, 0 when either is unknown.
    #[must_use]
    pub fn weight_difference(&self) -> f64 {
        match (self.data.current_weight, self.data.target_weight()) {
            (Some(current), Some(target)) => target - current,
            _ => 0.0,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_over_calories(&self) -> bool {
        self.data.nutrition.calories > self.calories_target as f64
    }

    #[must_use]
    pub fn has_weight_data(&self) -> bool {
        !self.data.recent_weights.is_empty()
    }

    #[must_use]
    pub fn has_nutrition_data(&self) -> bool {
        self.data.food_log_count > 0
    }

    #[must_use]
    pub fn has_training_data(&self) -> bool {
        self.data.next_training.is_some()
    }
}

pub struct DashboardPresenter {
    core: Core<DashboardUiState>,
}

presenter_access!(DashboardPresenter, DashboardUiState);

impl DashboardPresenter {
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        let presenter = Self {
            core: Core::new(
                service,
                DashboardUiState {
                    is_loading: true,
                    ..DashboardUiState::default()
                },
            ),
        };
        presenter.start();
        presenter
    }

    fn start(&self) {
        follow(
            &self.core.shared,
            "dashboard",
            self.core.service().dashboard(),
            |s, data| *s = DashboardUiState::from_data(data),
        );
    }

    pub fn refresh(&self) {
        self.core.reloading();
        self.start();
    }
}

// --- Nutrition ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionUiState {
    pub date: NaiveDate,
    pub logs: Vec<FoodLog>,
    pub nutrition: DailyNutrition,
    pub calories_target: i64,
    pub search_query: String,
    pub search_results: Vec<Food>,
    pub is_searching: bool,
    pub search_error: Option<String>,
    pub selected_food: Option<Food>,
    pub selected_meal: MealType,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(NutritionUiState, error_message);

impl NutritionUiState {
    fn on(date: NaiveDate) -> Self {
        Self {
            date,
            logs: Vec::new(),
            nutrition: DailyNutrition::default(),
            calories_target: 0,
            search_query: String::new(),
            search_results: Vec::new(),
            is_searching: false,
            search_error: None,
            selected_food: None,
            selected_meal: MealType::Breakfast,
            is_loading: true,
            error_message: None,
        }
    }

    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.logs.is_empty()
    }

    /// Negative once the target is exceeded.
    #[must_use]
    pub fn calories_remaining(&self) -> i64 {
        self.calories_target - self.nutrition.calories.trunc() as i64
    }

    #[must_use]
    pub fn calories_percentage(&self) -> f64 {
        calories_progress(self.nutrition.calories, self.calories_target)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn is_over_calories(&self) -> bool {
        self.nutrition.calories > self.calories_target as f64
    }

    pub fn logs_for(&self, meal_type: MealType) -> impl Iterator<Item = &FoodLog> {
        self.logs.iter().filter(move |l| l.meal_type == meal_type)
    }
}

pub struct NutritionPresenter {
    core: Core<NutritionUiState>,
    debounce: Duration,
    /// Number of the newest food search issued. Results of older ones are dropped.
    search_seq: Arc<AtomicU64>,
}

presenter_access!(NutritionPresenter, NutritionUiState);

impl NutritionPresenter {
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        Self::with_debounce(service, FOOD_SEARCH_DEBOUNCE)
    }

    #[must_use]
    pub fn with_debounce(service: TrackerService, debounce: Duration) -> Self {
        let date = service.today();
        let presenter = Self {
            core: Core::new(service, NutritionUiState::on(date)),
            debounce,
            search_seq: Arc::new(AtomicU64::new(0)),
        };
        presenter.start(date);
        presenter
    }

    fn start(&self, date: NaiveDate) {
        let service = self.core.service();
        follow(
            &self.core.shared,
            "day",
            service.profile().zip(service.daily_nutrition(date)),
            |s, (profile, day)| {
                s.calories_target = profile.map_or(0, |p| p.daily_calories);
                s.logs = day.logs;
                s.nutrition = day.totals;
            },
        );
    }

    pub fn refresh(&self) {
        self.core.reloading();
        self.start(self.core.state().date);
    }

    pub fn select_date(&self, date: NaiveDate) {
        self.core.shared.update(|s| {
            s.date = date;
            s.is_loading = true;
        });
        self.start(date);
    }

    /// Record a keystroke. The search runs once no further keystroke has
    /// arrived for the debounce period; a blank query clears the results.
    pub fn on_search_query_changed(&self, query: &str) {
        let query = query.to_string();
        self.core.shared.update(|s| {
            s.search_query.clone_from(&query);
            s.search_error = None;
        });

        let shared = Arc::clone(&self.core.shared);
        let seq = Arc::clone(&self.search_seq);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let ticket = seq.fetch_add(1, Ordering::SeqCst) + 1;
            if query.trim().is_empty() {
                shared.update(|s| {
                    s.search_results.clear();
                    s.is_searching = false;
                });
                return;
            }
            shared.update(|s| s.is_searching = true);
            let search = tokio::spawn(run_food_search(Arc::clone(&shared), seq, ticket, query));
            shared.tasks.push("search", search);
        });
        self.core.shared.tasks.replace("debounce", handle);
    }

    pub fn select_food(&self, food: Option<Food>) {
        self.core.shared.update(|s| s.selected_food = food);
    }

    pub fn select_meal_type(&self, meal_type: MealType) {
        self.core.shared.update(|s| s.selected_meal = meal_type);
    }

    /// Log `grams` of `food` for the selected meal on the shown day.
    pub fn add_food_log(&self, food: &Food, grams: f64) -> UseCaseResult<FoodLog> {
        let (meal, date) = {
            let state = self.core.shared.state.borrow();
            (state.selected_meal, state.date)
        };
        let result = self
            .core
            .service()
            .add_food_log(food, grams, meal, date);
        if result.is_ok() {
            self.core.shared.update(|s| {
                s.selected_food = None;
                s.error_message = None;
            });
        }
        self.core.shared.report(result)
    }

    pub fn delete_food_log(&self, id: i64) -> UseCaseResult<bool> {
        let result = self.core.service().delete_food_log(id);
        self.core.shared.report(result)
    }
}

async fn run_food_search(
    shared: Arc<Shared<NutritionUiState>>,
    seq: Arc<AtomicU64>,
    ticket: u64,
    query: String,
) {
    let service = shared.service.clone();
    let result = tokio::task::spawn_blocking(move || service.search_foods(&query)).await;
    if seq.load(Ordering::SeqCst) != ticket {
        tracing::debug!(ticket, "dropping stale food search result");
        return;
    }
    shared.update(|s| {
        s.is_searching = false;
        match result {
            Ok(Ok(foods)) => {
                s.search_results = foods;
                s.search_error = None;
            }
            Ok(Err(e)) => {
                s.search_results.clear();
                s.search_error = Some(e.to_string());
            }
            Err(e) => {
                s.search_results.clear();
                s.search_error = Some(format!("Food search did not finish: {e}"));
            }
        }
    });
}

// --- Techniques ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechniquesUiState {
    pub techniques: Vec<Technique>,
    pub selected_category: Option<TechniqueCategory>,
    pub search_query: String,
    pub selected_technique: Option<Technique>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(TechniquesUiState, error_message);

pub struct TechniquesPresenter {
    core: Core<TechniquesUiState>,
    debounce: Duration,
    /// Query the list currently follows, after debouncing.
    applied_query: Arc<Mutex<String>>,
}

presenter_access!(TechniquesPresenter, TechniquesUiState);

fn follow_techniques(
    shared: &Arc<Shared<TechniquesUiState>>,
    query: &str,
    category: Option<TechniqueCategory>,
) {
    let source = if query.trim().is_empty() {
        shared.service.techniques(category)
    } else {
        shared.service.search_techniques(query)
    };
    follow(shared, "techniques", source, |s, techniques| {
        s.techniques = techniques;
        s.error_message = None;
    });
}

impl TechniquesPresenter {
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        Self::with_debounce(service, TECHNIQUE_SEARCH_DEBOUNCE)
    }

    #[must_use]
    pub fn with_debounce(service: TrackerService, debounce: Duration) -> Self {
        let presenter = Self {
            core: Core::new(
                service,
                TechniquesUiState {
                    is_loading: true,
                    ..TechniquesUiState::default()
                },
            ),
            debounce,
            applied_query: Arc::new(Mutex::new(String::new())),
        };
        follow_techniques(&presenter.core.shared, "", None);
        presenter
    }

    fn applied_query(&self) -> String {
        self.applied_query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn on_search_query_changed(&self, query: &str) {
        let query = query.to_string();
        self.core
            .shared
            .update(|s| s.search_query.clone_from(&query));

        let shared = Arc::clone(&self.core.shared);
        let applied = Arc::clone(&self.applied_query);
        let debounce = self.debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            applied
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone_from(&query);
            let category = shared.state.borrow().selected_category;
            follow_techniques(&shared, &query, category);
        });
        self.core.shared.tasks.replace("debounce", handle);
    }

    /// Takes effect immediately. Ignored while a search query is active.
    pub fn select_category(&self, category: Option<TechniqueCategory>) {
        self.core.shared.update(|s| s.selected_category = category);
        follow_techniques(&self.core.shared, &self.applied_query(), category);
    }

    pub fn select_technique(&self, technique: Option<Technique>) {
        self.core.shared.update(|s| s.selected_technique = technique);
    }

    pub fn add_technique(&self, technique: &NewTechnique) -> UseCaseResult<Technique> {
        let result = self.core.service().add_technique(technique);
        self.core.shared.report(result)
    }

    pub fn delete_technique(&self, id: i64) -> UseCaseResult<bool> {
        let result = self.core.service().delete_technique(id);
        if matches!(result, Ok(true)) {
            self.core.shared.update(|s| {
                if s.selected_technique.as_ref().is_some_and(|t| t.id == id) {
                    s.selected_technique = None;
                }
            });
        }
        self.core.shared.report(result)
    }

    pub fn refresh(&self) {
        self.core.reloading();
        let category = self.core.state().selected_category;
        follow_techniques(&self.core.shared, &self.applied_query(), category);
    }
}

// --- Progress ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUiState {
    /// Oldest first.
    pub weight_history: Vec<WeightEntry>,
    pub selected_period: TimePeriod,
    pub current_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub starting_weight: Option<f64>,
    pub progress_percentage: f64,
    pub remaining_kg: f64,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(ProgressUiState, error_message);

impl Default for ProgressUiState {
    fn default() -> Self {
        Self {
            weight_history: Vec::new(),
            selected_period: TimePeriod::Month,
            current_weight: None,
            target_weight: None,
            starting_weight: None,
            progress_percentage: 0.0,
            remaining_kg: 0.0,
            is_loading: true,
            error_message: None,
        }
    }
}

impl ProgressUiState {
    #[must_use]
    pub fn has_data(&self) -> bool {
        !self.weight_history.is_empty()
    }

    #[must_use]
    pub fn is_goal_achieved(&self) -> bool {
        is_goal_achieved(self.current_weight, self.target_weight)
    }

    fn apply(&mut self, profile: Option<UserProfile>, history: Vec<WeightEntry>) {
        self.current_weight = history.iter().max_by_key(|e| e.date).map(|e| e.weight_kg);
        self.starting_weight = history.iter().min_by_key(|e| e.date).map(|e| e.weight_kg);
        self.target_weight = profile.map(|p| p.target_weight_kg);
        self.progress_percentage =
            weight_progress(self.current_weight, self.target_weight, self.starting_weight);
        self.remaining_kg = remaining_kg(self.current_weight, self.target_weight);
        self.weight_history = history;
    }
}

pub struct ProgressPresenter {
    core: Core<ProgressUiState>,
}

presenter_access!(ProgressPresenter, ProgressUiState);

impl ProgressPresenter {
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        let presenter = Self {
            core: Core::new(service, ProgressUiState::default()),
        };
        presenter.start(TimePeriod::Month);
        presenter
    }

    fn start(&self, period: TimePeriod) {
        let service = self.core.service();
        follow(
            &self.core.shared,
            "history",
            service.profile().zip(service.weight_history(period)),
            |s, (profile, history)| s.apply(profile, history),
        );
    }

    pub fn select_period(&self, period: TimePeriod) {
        self.core.shared.update(|s| {
            s.selected_period = period;
            s.is_loading = true;
        });
        self.start(period);
    }

    /// Record today's weight.
    pub fn add_weight_entry(&self, weight_kg: f64) -> UseCaseResult<WeightEntry> {
        let service = self.core.service();
        let result = service.add_weight_entry(weight_kg, service.today(), None);
        if result.is_ok() {
            self.core.shared.update(|s| s.error_message = None);
        }
        self.core.shared.report(result)
    }

    pub fn refresh(&self) {
        self.core.reloading();
        self.start(self.core.state().selected_period);
    }
}

// --- Training calendar ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingCalendarUiState {
    /// First day of the shown month.
    pub month: NaiveDate,
    /// Sessions in the shown month, latest first.
    pub trainings: Vec<Training>,
    pub selected_date: Option<NaiveDate>,
    pub selected_date_trainings: Vec<Training>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(TrainingCalendarUiState, error_message);

fn trainings_on(trainings: &[Training], date: NaiveDate) -> Vec<Training> {
    trainings
        .iter()
        .filter(|t| t.date.with_timezone(&Local).date_naive() == date)
        .cloned()
        .collect()
}

pub struct TrainingCalendarPresenter {
    core: Core<TrainingCalendarUiState>,
}

presenter_access!(TrainingCalendarPresenter, TrainingCalendarUiState);

impl TrainingCalendarPresenter {
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        let today = service.today();
        let month = today.with_day(1).unwrap_or(today);
        let presenter = Self {
            core: Core::new(
                service,
                TrainingCalendarUiState {
                    month,
                    trainings: Vec::new(),
                    selected_date: None,
                    selected_date_trainings: Vec::new(),
                    is_loading: true,
                    error_message: None,
                },
            ),
        };
        presenter.start(month);
        presenter
    }

    fn start(&self, month: NaiveDate) {
        let query = match self
            .core
            .service()
            .trainings_for_month(month.year(), month.month())
        {
            Ok(query) => query,
            Err(e) => {
                self.core.shared.fail(e.to_string());
                return;
            }
        };
        follow(&self.core.shared, "month", query, |s, trainings| {
            if let Some(date) = s.selected_date {
                s.selected_date_trainings = trainings_on(&trainings, date);
            }
            s.trainings = trainings;
            s.error_message = None;
        });
    }

    fn show(&self, month: Option<NaiveDate>) {
        let Some(month) = month else {
            return;
        };
        self.core.shared.update(|s| {
            s.month = month;
            s.selected_date = None;
            s.selected_date_trainings.clear();
            s.is_loading = true;
        });
        self.start(month);
    }

    pub fn previous_month(&self) {
        let month = self.core.state().month;
        self.show(month.checked_sub_months(Months::new(1)));
    }

    pub fn next_month(&self) {
        let month = self.core.state().month;
        self.show(month.checked_add_months(Months::new(1)));
    }

    pub fn select_date(&self, date: NaiveDate) {
        self.core.shared.update(|s| {
            s.selected_date_trainings = trainings_on(&s.trainings, date);
            s.selected_date = Some(date);
        });
    }

    pub fn clear_selection(&self) {
        self.core.shared.update(|s| {
            s.selected_date = None;
            s.selected_date_trainings.clear();
        });
    }

    pub fn refresh(&self) {
        self.core.reloading();
        self.start(self.core.state().month);
    }
}

// --- Settings ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettingsUiState {
    pub profile: Option<UserProfile>,
    pub is_dark_theme: bool,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

ui_state!(SettingsUiState, error_message);

impl SettingsUiState {
    #[must_use]
    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }
}

pub struct SettingsPresenter {
    core: Core<SettingsUiState>,
}

presenter_access!(SettingsPresenter, SettingsUiState);

impl SettingsPresenter {
    #[must_use]
    pub fn new(service: TrackerService) -> Self {
        let presenter = Self {
            core: Core::new(
                service,
                SettingsUiState {
                    is_loading: true,
                    ..SettingsUiState::default()
                },
            ),
        };
        presenter.start();
        presenter
    }

    fn start(&self) {
        let service = self.core.service();
        follow(&self.core.shared, "profile", service.profile(), |s, profile| {
            s.profile = profile;
        });
        follow(&self.core.shared, "theme", service.is_dark_theme(), |s, dark| {
            s.is_dark_theme = dark;
        });
    }

    pub fn set_dark_theme(&self, enabled: bool) -> UseCaseResult<()> {
        let result = self.core.service().set_dark_theme(enabled);
        if result.is_ok() {
            self.core.shared.update(|s| s.is_dark_theme = enabled);
        }
        self.core.shared.report(result)
    }

    pub fn toggle_theme(&self) -> UseCaseResult<()> {
        self.set_dark_theme(!self.core.state().is_dark_theme)
    }

    pub fn refresh(&self) {
        self.core.reloading();
        self.start();
    }
}
