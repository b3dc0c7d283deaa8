use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, params};

use crate::changes::{ChangeFeed, Table};
use crate::dates::{date_from_millis, day_millis, day_span, instant_from_millis};
use crate::error::ValidationError;
use crate::models::{
    DailyNutrition, FoodLog, MealType, NewFoodLog, NewTechnique, NewTraining, NewWeightEntry,
    PROFILE_ID, Technique, TechniqueCategory, Training, TrainingType, UserProfile, WeightEntry,
};

const PROFILE_COLUMNS: &str = "id, name, age, height_cm, current_weight_kg, target_weight_kg,
     weight_class, gender, daily_calories, created_at";
const WEIGHT_COLUMNS: &str = "id, weight_kg, date, note";
const FOOD_LOG_COLUMNS: &str =
    "id, fdc_id, name, calories, protein, fat, carbs, grams, meal_type, date";
const TRAINING_COLUMNS: &str = "id, date, type, duration_minutes, notes";
const TECHNIQUE_COLUMNS: &str = "id, name, category, description, created_at";

// Breakfast through snack, in the order a day is eaten.
const MEAL_ORDER: &str = "CASE meal_type
        WHEN 'breakfast' THEN 0
        WHEN 'lunch' THEN 1
        WHEN 'dinner' THEN 2
        WHEN 'snack' THEN 3
        ELSE 4 END";

pub struct Database {
    conn: Connection,
    changes: ChangeFeed,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database {
            conn,
            changes: ChangeFeed::new(),
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database {
            conn,
            changes: ChangeFeed::new(),
        };
        db.migrate()?;
        Ok(db)
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            tracing::info!("creating schema v1");
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS user_profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    name TEXT NOT NULL,
                    age INTEGER NOT NULL,
                    height_cm REAL NOT NULL,
                    current_weight_kg REAL NOT NULL,
                    target_weight_kg REAL NOT NULL,
                    weight_class TEXT NOT NULL,
                    gender TEXT NOT NULL,
                    daily_calories INTEGER NOT NULL,
                    created_at INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    weight_kg REAL NOT NULL,
                    date INTEGER NOT NULL,
                    note TEXT
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_weight_entries_date ON weight_entries(date);

                CREATE TABLE IF NOT EXISTS food_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    fdc_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL NOT NULL,
                    fat REAL NOT NULL,
                    carbs REAL NOT NULL,
                    grams REAL NOT NULL,
                    meal_type TEXT NOT NULL,
                    date INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_food_logs_date ON food_logs(date);
                CREATE INDEX IF NOT EXISTS idx_food_logs_fdc_id ON food_logs(fdc_id);

                CREATE TABLE IF NOT EXISTS trainings (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    date INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    duration_minutes INTEGER NOT NULL,
                    notes TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_trainings_date ON trainings(date);

                CREATE TABLE IF NOT EXISTS techniques (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    category TEXT NOT NULL,
                    description TEXT,
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_techniques_created_at ON techniques(created_at);
                CREATE INDEX IF NOT EXISTS idx_techniques_category ON techniques(category);

                CREATE TABLE IF NOT EXISTS user_settings (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn committed(&self, table: Table, id: i64) {
        tracing::debug!(table = table.name(), id, "write committed");
        self.changes.notify(table);
    }

    // --- Profile ---

    pub fn get_profile(&self) -> Result<Option<UserProfile>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profile WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![PROFILE_ID])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::profile_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Insert the profile or replace every field of the existing one.
    pub fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        self.conn.execute(
            "INSERT INTO user_profile (id, name, age, height_cm, current_weight_kg, target_weight_kg,
                                       weight_class, gender, daily_calories, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                height_cm = excluded.height_cm,
                current_weight_kg = excluded.current_weight_kg,
                target_weight_kg = excluded.target_weight_kg,
                weight_class = excluded.weight_class,
                gender = excluded.gender,
                daily_calories = excluded.daily_calories,
                created_at = excluded.created_at",
            params![
                PROFILE_ID,
                profile.name,
                profile.age,
                profile.height_cm,
                profile.current_weight_kg,
                profile.target_weight_kg,
                profile.weight_class,
                profile.gender.as_str(),
                profile.daily_calories,
                profile.created_at.timestamp_millis(),
            ],
        )?;
        self.committed(Table::Profile, PROFILE_ID);
        self.get_profile()?
            .context("Profile not found after upsert")
    }

    pub fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile> {
        let rows = self.conn.execute(
            "UPDATE user_profile SET name = ?1, age = ?2, height_cm = ?3, current_weight_kg = ?4,
                    target_weight_kg = ?5, weight_class = ?6, gender = ?7, daily_calories = ?8
             WHERE id = ?9",
            params![
                profile.name,
                profile.age,
                profile.height_cm,
                profile.current_weight_kg,
                profile.target_weight_kg,
                profile.weight_class,
                profile.gender.as_str(),
                profile.daily_calories,
                PROFILE_ID,
            ],
        )?;
        if rows == 0 {
            anyhow::bail!("Profile not found");
        }
        self.committed(Table::Profile, PROFILE_ID);
        self.get_profile()?.context("Profile not found")
    }

    pub fn delete_profile(&self) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_profile WHERE id = ?1", params![PROFILE_ID])?;
        if rows > 0 {
            self.committed(Table::Profile, PROFILE_ID);
        }
        Ok(rows > 0)
    }

    // --- Weight Entries ---

    /// One entry per day: a second entry for the same date replaces the first.
    pub fn upsert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        self.conn.execute(
            "INSERT INTO weight_entries (weight_kg, date, note)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                note = excluded.note",
            params![entry.weight_kg, day_millis(entry.date), entry.note],
        )?;
        let saved = self
            .get_weight(entry.date)?
            .context("Weight entry not found after upsert")?;
        self.committed(Table::WeightEntries, saved.id);
        Ok(saved)
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEIGHT_COLUMNS} FROM weight_entries WHERE date = ?1"
        ))?;
        let mut rows = stmt.query(params![day_millis(date)])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::weight_entry_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Entries for `start..=end`, oldest first.
    pub fn get_weight_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEIGHT_COLUMNS} FROM weight_entries
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date ASC"
        ))?;
        let entries = stmt
            .query_map(
                params![day_millis(start), day_millis(end)],
                Self::weight_entry_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn get_latest_weight(&self) -> Result<Option<WeightEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEIGHT_COLUMNS} FROM weight_entries ORDER BY date DESC LIMIT 1"
        ))?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::weight_entry_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Every entry, newest first.
    pub fn get_weight_history(&self) -> Result<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {WEIGHT_COLUMNS} FROM weight_entries ORDER BY date DESC"
        ))?;
        let entries = stmt
            .query_map([], Self::weight_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn delete_weight(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM weight_entries WHERE id = ?1", params![id])?;
        if rows == 0 {
            anyhow::bail!("Weight entry not found");
        }
        self.committed(Table::WeightEntries, id);
        Ok(())
    }

    // --- Food Logs ---

    pub fn insert_food_log(&self, log: &NewFoodLog) -> Result<FoodLog> {
        self.conn
            .execute(
                "INSERT INTO food_logs (fdc_id, name, calories, protein, fat, carbs, grams, meal_type, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    log.fdc_id,
                    log.name,
                    log.calories,
                    log.protein,
                    log.fat,
                    log.carbs,
                    log.grams,
                    log.meal_type.as_str(),
                    day_millis(log.date),
                ],
            )
            .context("Failed to insert food log")?;
        let id = self.conn.last_insert_rowid();
        self.committed(Table::FoodLogs, id);
        self.get_food_log(id)
    }

    pub fn get_food_log(&self, id: i64) -> Result<FoodLog> {
        self.conn
            .query_row(
                &format!("SELECT {FOOD_LOG_COLUMNS} FROM food_logs WHERE id = ?1"),
                params![id],
                Self::food_log_from_row,
            )
            .context("Food log not found")
    }

    pub fn update_food_log(&self, log: &FoodLog) -> Result<FoodLog> {
        let rows = self.conn.execute(
            "UPDATE food_logs SET fdc_id = ?1, name = ?2, calories = ?3, protein = ?4, fat = ?5,
                    carbs = ?6, grams = ?7, meal_type = ?8, date = ?9
             WHERE id = ?10",
            params![
                log.fdc_id,
                log.name,
                log.calories,
                log.protein,
                log.fat,
                log.carbs,
                log.grams,
                log.meal_type.as_str(),
                day_millis(log.date),
                log.id,
            ],
        )?;
        if rows == 0 {
            anyhow::bail!("Food log not found");
        }
        self.committed(Table::FoodLogs, log.id);
        self.get_food_log(log.id)
    }

    pub fn delete_food_log(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_logs WHERE id = ?1", params![id])?;
        if rows > 0 {
            self.committed(Table::FoodLogs, id);
        }
        Ok(rows > 0)
    }

    pub fn get_food_logs_for_date(&self, date: NaiveDate) -> Result<Vec<FoodLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_LOG_COLUMNS} FROM food_logs
             WHERE date = ?1
             ORDER BY {MEAL_ORDER}, id"
        ))?;
        let logs = stmt
            .query_map(params![day_millis(date)], Self::food_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn get_food_logs_for_meal(
        &self,
        date: NaiveDate,
        meal_type: MealType,
    ) -> Result<Vec<FoodLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FOOD_LOG_COLUMNS} FROM food_logs
             WHERE date = ?1 AND meal_type = ?2
             ORDER BY id"
        ))?;
        let logs = stmt
            .query_map(
                params![day_millis(date), meal_type.as_str()],
                Self::food_log_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn get_daily_nutrition(&self, date: NaiveDate) -> Result<DailyNutrition> {
        let totals = self.conn.query_row(
            "SELECT COALESCE(SUM(calories), 0), COALESCE(SUM(protein), 0),
                    COALESCE(SUM(fat), 0), COALESCE(SUM(carbs), 0)
             FROM food_logs WHERE date = ?1",
            params![day_millis(date)],
            |row| {
                Ok(DailyNutrition {
                    calories: row.get(0)?,
                    protein: row.get(1)?,
                    fat: row.get(2)?,
                    carbs: row.get(3)?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Remove every food log dated before `cutoff`. Returns the number removed.
    pub fn delete_food_logs_before(&self, cutoff: NaiveDate) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM food_logs WHERE date < ?1",
            params![day_millis(cutoff)],
        )?;
        if rows > 0 {
            tracing::debug!(rows, %cutoff, "pruned food logs");
            self.changes.notify(Table::FoodLogs);
        }
        Ok(rows)
    }

    // --- Trainings ---

    pub fn insert_training(&self, training: &NewTraining) -> Result<Training> {
        self.conn.execute(
            "INSERT INTO trainings (date, type, duration_minutes, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                training.date.timestamp_millis(),
                training.training_type.as_str(),
                training.duration_minutes,
                training.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.committed(Table::Trainings, id);
        self.get_training(id)
    }

    pub fn get_training(&self, id: i64) -> Result<Training> {
        self.conn
            .query_row(
                &format!("SELECT {TRAINING_COLUMNS} FROM trainings WHERE id = ?1"),
                params![id],
                Self::training_from_row,
            )
            .context("Training not found")
    }

    pub fn update_training(&self, training: &Training) -> Result<Training> {
        let rows = self.conn.execute(
            "UPDATE trainings SET date = ?1, type = ?2, duration_minutes = ?3, notes = ?4
             WHERE id = ?5",
            params![
                training.date.timestamp_millis(),
                training.training_type.as_str(),
                training.duration_minutes,
                training.notes,
                training.id,
            ],
        )?;
        if rows == 0 {
            anyhow::bail!("Training not found");
        }
        self.committed(Table::Trainings, training.id);
        self.get_training(training.id)
    }

    pub fn delete_training(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM trainings WHERE id = ?1", params![id])?;
        if rows > 0 {
            self.committed(Table::Trainings, id);
        }
        Ok(rows > 0)
    }

    /// Sessions with `start <= date <= end`, latest first.
    pub fn get_trainings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Training>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings
             WHERE date BETWEEN ?1 AND ?2
             ORDER BY date DESC"
        ))?;
        let trainings = stmt
            .query_map(
                params![start.timestamp_millis(), end.timestamp_millis()],
                Self::training_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trainings)
    }

    pub fn get_trainings_by_type(&self, training_type: TrainingType) -> Result<Vec<Training>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings WHERE type = ?1 ORDER BY date DESC"
        ))?;
        let trainings = stmt
            .query_map(params![training_type.as_str()], Self::training_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trainings)
    }

    pub fn get_all_trainings(&self) -> Result<Vec<Training>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings ORDER BY date DESC"
        ))?;
        let trainings = stmt
            .query_map([], Self::training_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trainings)
    }

    /// The next `limit` sessions at or after `now`, soonest first.
    pub fn get_upcoming_trainings(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Training>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TRAINING_COLUMNS} FROM trainings
             WHERE date >= ?1
             ORDER BY date ASC
             LIMIT ?2"
        ))?;
        let trainings = stmt
            .query_map(
                params![now.timestamp_millis(), limit],
                Self::training_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trainings)
    }

    pub fn get_trainings_for_day(&self, date: NaiveDate) -> Result<Vec<Training>> {
        let (start, end) = day_span(date, date);
        let mut trainings = self.get_trainings_between(start, end)?;
        trainings.reverse();
        Ok(trainings)
    }

    // --- Techniques ---

    pub fn insert_technique(
        &self,
        technique: &NewTechnique,
        created_at: DateTime<Utc>,
    ) -> Result<Technique> {
        self.conn.execute(
            "INSERT INTO techniques (name, category, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                technique.name,
                technique.category.as_str(),
                technique.description,
                created_at.timestamp_millis(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.committed(Table::Techniques, id);
        self.get_technique(id)?
            .context("Technique not found after insert")
    }

    pub fn get_technique(&self, id: i64) -> Result<Option<Technique>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TECHNIQUE_COLUMNS} FROM techniques WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![id])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::technique_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn update_technique(&self, technique: &Technique) -> Result<Technique> {
        let rows = self.conn.execute(
            "UPDATE techniques SET name = ?1, category = ?2, description = ?3 WHERE id = ?4",
            params![
                technique.name,
                technique.category.as_str(),
                technique.description,
                technique.id,
            ],
        )?;
        if rows == 0 {
            anyhow::bail!("Technique not found");
        }
        self.committed(Table::Techniques, technique.id);
        self.get_technique(technique.id)?
            .context("Technique not found")
    }

    pub fn delete_technique(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM techniques WHERE id = ?1", params![id])?;
        if rows > 0 {
            self.committed(Table::Techniques, id);
        }
        Ok(rows > 0)
    }

    /// Newest first.
    pub fn get_all_techniques(&self) -> Result<Vec<Technique>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TECHNIQUE_COLUMNS} FROM techniques ORDER BY created_at DESC, id DESC"
        ))?;
        let techniques = stmt
            .query_map([], Self::technique_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(techniques)
    }

    pub fn get_techniques_by_category(
        &self,
        category: TechniqueCategory,
    ) -> Result<Vec<Technique>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TECHNIQUE_COLUMNS} FROM techniques
             WHERE category = ?1
             ORDER BY created_at DESC, id DESC"
        ))?;
        let techniques = stmt
            .query_map(params![category.as_str()], Self::technique_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(techniques)
    }

    /// Substring match on name or description.
    pub fn search_techniques(&self, query: &str) -> Result<Vec<Technique>> {
        let escaped = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let pattern = format!("%{escaped}%");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TECHNIQUE_COLUMNS} FROM techniques
             WHERE name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\'
             ORDER BY created_at DESC, id DESC"
        ))?;
        let techniques = stmt
            .query_map(params![pattern], Self::technique_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(techniques)
    }

    // --- User Settings ---

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO user_settings (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp_millis()],
        )?;
        tracing::debug!(table = Table::Settings.name(), key, "write committed");
        self.changes.notify(Table::Settings);
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM user_settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }

    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM user_settings WHERE key = ?1", params![key])?;
        if rows > 0 {
            self.changes.notify(Table::Settings);
        }
        Ok(rows > 0)
    }

    // --- Row mapping helpers ---

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<UserProfile> {
        Ok(UserProfile {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            height_cm: row.get(3)?,
            current_weight_kg: row.get(4)?,
            target_weight_kg: row.get(5)?,
            weight_class: row.get(6)?,
            gender: enum_column(row, 7)?,
            daily_calories: row.get(8)?,
            created_at: instant_column(row, 9)?,
        })
    }

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        Ok(WeightEntry {
            id: row.get(0)?,
            weight_kg: row.get(1)?,
            date: day_column(row, 2)?,
            note: row.get(3)?,
        })
    }

    fn food_log_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodLog> {
        Ok(FoodLog {
            id: row.get(0)?,
            fdc_id: row.get(1)?,
            name: row.get(2)?,
            calories: row.get(3)?,
            protein: row.get(4)?,
            fat: row.get(5)?,
            carbs: row.get(6)?,
            grams: row.get(7)?,
            meal_type: enum_column(row, 8)?,
            date: day_column(row, 9)?,
        })
    }

    fn training_from_row(row: &rusqlite::Row) -> rusqlite::Result<Training> {
        Ok(Training {
            id: row.get(0)?,
            date: instant_column(row, 1)?,
            training_type: enum_column(row, 2)?,
            duration_minutes: row.get(3)?,
            notes: row.get(4)?,
        })
    }

    fn technique_from_row(row: &rusqlite::Row) -> rusqlite::Result<Technique> {
        Ok(Technique {
            id: row.get(0)?,
            name: row.get(1)?,
            category: enum_column(row, 2)?,
            description: row.get(3)?,
            created_at: instant_column(row, 4)?,
        })
    }
}

fn enum_column<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ValidationError>,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn day_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let millis: i64 = row.get(idx)?;
    date_from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn instant_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    instant_from_millis(millis).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

#[cfg(test)]
impl Database {
    /// Run a raw statement and announce it as a write to `table`.
    pub(crate) fn run_sql(&self, table: Table, sql: &str) -> Result<usize> {
        let rows = self.conn.execute(sql, [])?;
        self.committed(table, 0);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Food, Gender};
    use chrono::{Duration, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_profile() -> UserProfile {
        UserProfile {
            id: PROFILE_ID,
            name: "Helena".to_string(),
            age: 28,
            height_cm: 165.0,
            current_weight_kg: 64.0,
            target_weight_kg: 61.5,
            weight_class: "Leve".to_string(),
            gender: Gender::Female,
            daily_calories: 1920,
            created_at: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        }
    }

    fn training_at(date: DateTime<Utc>, kind: TrainingType) -> NewTraining {
        NewTraining {
            date,
            training_type: kind,
            duration_minutes: 90,
            notes: None,
        }
    }

    #[test]
    fn test_profile_singleton() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_profile().unwrap().is_none());

        let saved = db.upsert_profile(&sample_profile()).unwrap();
        assert_eq!(saved, sample_profile());

        let mut changed = sample_profile();
        changed.id = 42;
        changed.name = "Helena G".to_string();
        db.upsert_profile(&changed).unwrap();

        let count: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM user_profile", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        let profile = db.get_profile().unwrap().unwrap();
        assert_eq!(profile.id, PROFILE_ID);
        assert_eq!(profile.name, "Helena G");
    }

    #[test]
    fn test_update_and_delete_profile() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.update_profile(&sample_profile()).is_err());

        db.upsert_profile(&sample_profile()).unwrap();
        let mut profile = sample_profile();
        profile.target_weight_kg = 60.0;
        let updated = db.update_profile(&profile).unwrap();
        assert!((updated.target_weight_kg - 60.0).abs() < f64::EPSILON);

        assert!(db.delete_profile().unwrap());
        assert!(!db.delete_profile().unwrap());
        assert!(db.get_profile().unwrap().is_none());
    }

    #[test]
    fn test_weight_same_day_replaces() {
        let db = Database::open_in_memory().unwrap();
        let date = day(2024, 4, 2);
        let first = db
            .upsert_weight(&NewWeightEntry {
                weight_kg: 80.0,
                date,
                note: Some("morning".to_string()),
            })
            .unwrap();
        let second = db
            .upsert_weight(&NewWeightEntry {
                weight_kg: 79.4,
                date,
                note: None,
            })
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.get_weight_history().unwrap().len(), 1);
        let stored = db.get_weight(date).unwrap().unwrap();
        assert!((stored.weight_kg - 79.4).abs() < f64::EPSILON);
        assert!(stored.note.is_none());
    }

    #[test]
    fn test_weight_range_and_latest() {
        let db = Database::open_in_memory().unwrap();
        for (d, w) in [(1, 81.0), (3, 80.5), (5, 80.0), (9, 79.0)] {
            db.upsert_weight(&NewWeightEntry {
                weight_kg: w,
                date: day(2024, 6, d),
                note: None,
            })
            .unwrap();
        }

        let range = db.get_weight_range(day(2024, 6, 3), day(2024, 6, 5)).unwrap();
        let dates: Vec<_> = range.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(2024, 6, 3), day(2024, 6, 5)]);

        let latest = db.get_latest_weight().unwrap().unwrap();
        assert_eq!(latest.date, day(2024, 6, 9));

        let history = db.get_weight_history().unwrap();
        assert_eq!(history.first().unwrap().date, day(2024, 6, 9));
        assert_eq!(history.last().unwrap().date, day(2024, 6, 1));

        db.delete_weight(latest.id).unwrap();
        assert!(db.delete_weight(latest.id).is_err());
        assert_eq!(db.get_weight_history().unwrap().len(), 3);
    }

    #[test]
    fn test_food_logs_for_date_ordered_by_meal() {
        let db = Database::open_in_memory().unwrap();
        let date = day(2024, 2, 14);
        let oats = Food::custom("Oats", 389.0, 16.9, 6.9, 66.3);
        let chicken = Food {
            fdc_id: 171_477,
            name: "Chicken breast".to_string(),
            calories_per_100g: 165.0,
            protein_per_100g: 31.0,
            fat_per_100g: 3.6,
            carbs_per_100g: 0.0,
            is_custom: false,
        };
        db.insert_food_log(&chicken.portion(200.0, MealType::Dinner, date))
            .unwrap();
        db.insert_food_log(&oats.portion(80.0, MealType::Breakfast, date))
            .unwrap();
        db.insert_food_log(&oats.portion(40.0, MealType::Breakfast, day(2024, 2, 13)))
            .unwrap();

        let logs = db.get_food_logs_for_date(date).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].meal_type, MealType::Breakfast);
        assert_eq!(logs[1].meal_type, MealType::Dinner);
        assert_eq!(logs[1].fdc_id, 171_477);

        let dinner = db.get_food_logs_for_meal(date, MealType::Dinner).unwrap();
        assert_eq!(dinner.len(), 1);
        assert!((dinner[0].protein - 62.0).abs() < 0.01);
    }

    #[test]
    fn test_daily_nutrition_sums_and_defaults_to_zero() {
        let db = Database::open_in_memory().unwrap();
        let date = day(2024, 2, 14);
        assert_eq!(db.get_daily_nutrition(date).unwrap(), DailyNutrition::default());

        let food = Food::custom("Rice", 130.0, 2.7, 0.3, 28.0);
        db.insert_food_log(&food.portion(100.0, MealType::Lunch, date))
            .unwrap();
        db.insert_food_log(&food.portion(200.0, MealType::Dinner, date))
            .unwrap();

        let totals = db.get_daily_nutrition(date).unwrap();
        assert!((totals.calories - 390.0).abs() < 0.01);
        assert!((totals.carbs - 84.0).abs() < 0.01);
    }

    #[test]
    fn test_update_delete_and_prune_food_logs() {
        let db = Database::open_in_memory().unwrap();
        let food = Food::custom("Banana", 89.0, 1.1, 0.3, 22.8);
        let old = db
            .insert_food_log(&food.portion(120.0, MealType::Snack, day(2024, 1, 1)))
            .unwrap();
        let recent = db
            .insert_food_log(&food.portion(120.0, MealType::Snack, day(2024, 3, 1)))
            .unwrap();

        let mut edited = recent.clone();
        edited.meal_type = MealType::Breakfast;
        let edited = db.update_food_log(&edited).unwrap();
        assert_eq!(edited.meal_type, MealType::Breakfast);

        assert_eq!(db.delete_food_logs_before(day(2024, 2, 1)).unwrap(), 1);
        assert!(db.get_food_log(old.id).is_err());

        assert!(db.delete_food_log(recent.id).unwrap());
        assert!(!db.delete_food_log(recent.id).unwrap());
    }

    #[test]
    fn test_training_queries() {
        let db = Database::open_in_memory().unwrap();
        let base = Utc.with_ymd_and_hms(2024, 5, 10, 18, 0, 0).unwrap();
        db.insert_training(&training_at(base - Duration::days(2), TrainingType::Strength))
            .unwrap();
        db.insert_training(&training_at(base + Duration::hours(1), TrainingType::Grappling))
            .unwrap();
        db.insert_training(&training_at(base + Duration::days(3), TrainingType::Grappling))
            .unwrap();

        let upcoming = db.get_upcoming_trainings(base, 5).unwrap();
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming[0].date < upcoming[1].date);

        let limited = db.get_upcoming_trainings(base, 1).unwrap();
        assert_eq!(limited.len(), 1);

        let all = db.get_all_trainings().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].date > all[2].date);

        let grappling = db.get_trainings_by_type(TrainingType::Grappling).unwrap();
        assert_eq!(grappling.len(), 2);

        let between = db
            .get_trainings_between(base - Duration::days(3), base + Duration::days(1))
            .unwrap();
        assert_eq!(between.len(), 2);
    }

    #[test]
    fn test_training_keeps_time_of_day() {
        let db = Database::open_in_memory().unwrap();
        let when = Utc.with_ymd_and_hms(2024, 5, 10, 19, 30, 15).unwrap();
        let saved = db
            .insert_training(&training_at(when, TrainingType::Sparring))
            .unwrap();
        assert_eq!(saved.date, when);

        let mut edited = saved.clone();
        edited.duration_minutes = 45;
        edited.notes = Some("drilled berimbolo".to_string());
        let edited = db.update_training(&edited).unwrap();
        assert_eq!(edited.duration_minutes, 45);

        assert!(db.delete_training(saved.id).unwrap());
        assert!(db.get_training(saved.id).is_err());
    }

    #[test]
    fn test_technique_queries() {
        let db = Database::open_in_memory().unwrap();
        let t0 = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        db.insert_technique(
            &NewTechnique {
                name: "Double leg".to_string(),
                category: TechniqueCategory::Takedown,
                description: Some("Level change, penetration step".to_string()),
            },
            t0,
        )
        .unwrap();
        let armbar = db
            .insert_technique(
                &NewTechnique {
                    name: "Armbar".to_string(),
                    category: TechniqueCategory::Submission,
                    description: Some("From closed guard, 100% hips".to_string()),
                },
                t0 + Duration::minutes(5),
            )
            .unwrap();

        let all = db.get_all_techniques().unwrap();
        assert_eq!(all[0].name, "Armbar");

        let subs = db
            .get_techniques_by_category(TechniqueCategory::Submission)
            .unwrap();
        assert_eq!(subs.len(), 1);

        assert_eq!(db.search_techniques("step").unwrap().len(), 1);
        assert_eq!(db.search_techniques("ARM").unwrap().len(), 1);
        assert_eq!(db.search_techniques("100%").unwrap().len(), 1);
        assert_eq!(db.search_techniques("_").unwrap().len(), 0);

        let mut edited = armbar.clone();
        edited.category = TechniqueCategory::Control;
        db.update_technique(&edited).unwrap();
        assert_eq!(
            db.get_technique(armbar.id).unwrap().unwrap().category,
            TechniqueCategory::Control
        );
        assert_eq!(edited.created_at, armbar.created_at);

        assert!(db.delete_technique(armbar.id).unwrap());
        assert!(db.get_technique(armbar.id).unwrap().is_none());
    }

    #[test]
    fn test_settings() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_setting("dark_theme").unwrap().is_none());
        db.set_setting("dark_theme", "true").unwrap();
        db.set_setting("dark_theme", "false").unwrap();
        assert_eq!(db.get_setting("dark_theme").unwrap().as_deref(), Some("false"));
        assert!(db.delete_setting("dark_theme").unwrap());
        assert!(!db.delete_setting("dark_theme").unwrap());
    }

    #[test]
    fn test_writes_notify_their_table() {
        let db = Database::open_in_memory().unwrap();
        let watch = db.changes().subscribe(&[Table::WeightEntries]);
        db.set_setting("dark_theme", "true").unwrap();
        assert!(!watch.has_changed());
        db.upsert_weight(&NewWeightEntry {
            weight_kg: 70.0,
            date: day(2024, 1, 1),
            note: None,
        })
        .unwrap();
        assert!(watch.has_changed());
    }

    #[test]
    fn test_reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matlog.db");
        {
            let db = Database::open(&path).unwrap();
            db.upsert_profile(&sample_profile()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_profile().unwrap().unwrap().name, "Helena");
    }
}
