use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;

use crate::dates::SharedClock;
use crate::models::Food;
use crate::service::FoodLookupProvider;

/// Clock pinned to an instant that tests can move.
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self(Mutex::new(instant)))
    }

    /// Noon local time on `date`.
    pub fn on(date: NaiveDate) -> Arc<Self> {
        let noon = Local
            .from_local_datetime(&date.and_hms_opt(12, 0, 0).expect("valid time"))
            .earliest()
            .expect("noon exists");
        Self::at(noon.with_timezone(&Utc))
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.0.lock().expect("clock mutex") = instant;
    }

    pub fn shared(self: &Arc<Self>) -> SharedClock {
        Arc::clone(self) as SharedClock
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

/// Canned food search results, with an optional per-query delay.
#[derive(Default)]
pub struct FakeProvider {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub delays: Mutex<Vec<(String, Duration)>>,
}

impl FakeProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn delay(&self, query: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("delays mutex")
            .push((query.to_string(), delay));
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FoodLookupProvider for FakeProvider {
    fn search(&self, query: &str) -> Result<Vec<Food>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .delays
            .lock()
            .expect("delays mutex")
            .iter()
            .find(|(q, _)| q == query)
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            anyhow::bail!("service unavailable");
        }
        Ok(vec![Food {
            fdc_id: 1000 + query.len() as i64,
            name: format!("{query} result"),
            calories_per_100g: 100.0,
            protein_per_100g: 10.0,
            fat_per_100g: 5.0,
            carbs_per_100g: 12.0,
            is_custom: false,
        }])
    }
}
