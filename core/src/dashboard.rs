//! The dashboard read model: profile, the last week of weigh-ins, today's
//! food and the next training session, recomputed as one snapshot whenever
//! any of them changes.

use std::sync::Arc;

use serde::Serialize;

use crate::dates::today;
use crate::live::LiveQuery;
use crate::models::{DailyNutrition, FoodLog, Training, UserProfile, WeightEntry};
use crate::repository::UPCOMING_LIMIT;
use crate::service::TrackerService;

/// Days of weigh-ins the dashboard looks back over, today included.
pub const WEIGHT_WINDOW_DAYS: i64 = 7;

/// Within this many kg of the target counts as reached.
pub const GOAL_TOLERANCE_KG: f64 = 0.5;

pub const MAX_CALORIES_PROGRESS: f64 = 150.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardData {
    pub profile: Option<UserProfile>,
    /// Newest first.
    pub recent_weights: Vec<WeightEntry>,
    pub current_weight: Option<f64>,
    pub starting_weight: Option<f64>,
    pub food_log_count: usize,
    pub nutrition: DailyNutrition,
    pub next_training: Option<Training>,
}

impl DashboardData {
    /// Build a snapshot from the raw source values.
    #[must_use]
    pub fn assemble(
        profile: Option<UserProfile>,
        mut weights: Vec<WeightEntry>,
        food_logs: &[FoodLog],
        upcoming: Vec<Training>,
        nutrition: DailyNutrition,
    ) -> Self {
        weights.sort_by(|a, b| b.date.cmp(&a.date));
        weights.truncate(WEIGHT_WINDOW_DAYS as usize);
        Self {
            profile,
            current_weight: weights.first().map(|e| e.weight_kg),
            starting_weight: weights.last().map(|e| e.weight_kg),
            recent_weights: weights,
            food_log_count: food_logs.len(),
            nutrition,
            next_training: upcoming.into_iter().next(),
        }
    }

    #[must_use]
    pub fn target_weight(&self) -> Option<f64> {
        self.profile.as_ref().map(|p| p.target_weight_kg)
    }

    #[must_use]
    pub fn calories_target(&self) -> i64 {
        self.profile.as_ref().map_or(0, |p| p.daily_calories)
    }

    #[must_use]
    pub fn weight_progress(&self) -> f64 {
        weight_progress(
            self.current_weight,
            self.target_weight(),
            self.starting_weight,
        )
    }

    #[must_use]
    pub fn calories_remaining(&self) -> i64 {
        calories_remaining(self.calories_target(), self.nutrition.calories)
    }

    #[must_use]
    pub fn calories_progress(&self) -> f64 {
        calories_progress(self.nutrition.calories, self.calories_target())
    }
}

impl TrackerService {
    /// The live dashboard snapshot.
    ///
    /// Watches profile, weight entries, food logs and trainings. Today's
    /// nutrition totals are read in the same pass rather than watched on
    /// their own.
    #[must_use]
    pub fn dashboard(&self) -> LiveQuery<DashboardData> {
        let clock = Arc::clone(self.clock());
        self.users()
            .profile()
            .zip(self.users().recent_weight_entries(WEIGHT_WINDOW_DAYS))
            .zip(self.nutrition().food_logs_today())
            .zip(self.trainings().upcoming_trainings(UPCOMING_LIMIT))
            .then_read(move |db, (((profile, weights), logs), upcoming)| {
                let nutrition = db.get_daily_nutrition(today(clock.as_ref()))?;
                Ok(DashboardData::assemble(
                    profile, weights, &logs, upcoming, nutrition,
                ))
            })
    }
}

/// Share of the way from `starting` to `target`, 0 to 100.
///
/// Any missing input gives 0. A start equal to the target counts as done.
#[must_use]
pub fn weight_progress(current: Option<f64>, target: Option<f64>, starting: Option<f64>) -> f64 {
    let (Some(current), Some(target), Some(starting)) = (current, target, starting) else {
        return 0.0;
    };
    let total = target - starting;
    if total.abs() < f64::EPSILON {
        return 100.0;
    }
    ((current - starting) / total * 100.0).clamp(0.0, 100.0)
}

/// Calories left for the day, never negative. Fractions of consumed
/// calories are dropped.
#[must_use]
pub fn calories_remaining(target: i64, consumed: f64) -> i64 {
    (target - consumed.trunc() as i64).max(0)
}

/// Consumed as a percentage of target, capped at 150. A zero target gives 0.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calories_progress(consumed: f64, target: i64) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (consumed / target as f64 * 100.0).clamp(0.0, MAX_CALORIES_PROGRESS)
}

/// Distance to the target weight in kg, 0 when either is unknown.
#[must_use]
pub fn remaining_kg(current: Option<f64>, target: Option<f64>) -> f64 {
    match (current, target) {
        (Some(current), Some(target)) => (target - current).abs(),
        _ => 0.0,
    }
}

#[must_use]
pub fn is_goal_achieved(current: Option<f64>, target: Option<f64>) -> bool {
    matches!((current, target), (Some(c), Some(t)) if (c - t).abs() < GOAL_TOLERANCE_KG)
}
