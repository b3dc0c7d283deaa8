//! Per-table change notification. Every committed write bumps a version
//! counter for its table; watchers wake when any table they read from moves.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Profile,
    WeightEntries,
    FoodLogs,
    Trainings,
    Techniques,
    Settings,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Profile,
        Table::WeightEntries,
        Table::FoodLogs,
        Table::Trainings,
        Table::Techniques,
        Table::Settings,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Table::Profile => "user_profile",
            Table::WeightEntries => "weight_entries",
            Table::FoodLogs => "food_logs",
            Table::Trainings => "trainings",
            Table::Techniques => "techniques",
            Table::Settings => "user_settings",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Versions([u64; Table::ALL.len()]);

impl Versions {
    #[must_use]
    pub fn get(&self, table: Table) -> u64 {
        self.0[table.index()]
    }

    fn bump(&mut self, table: Table) {
        self.0[table.index()] = self.0[table.index()].wrapping_add(1);
    }

    fn differs(&self, other: &Versions, tables: &[Table]) -> bool {
        tables.iter().any(|t| self.get(*t) != other.get(*t))
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: Arc<watch::Sender<Versions>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Versions::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn notify(&self, table: Table) {
        self.tx.send_modify(|v| v.bump(table));
        tracing::trace!(table = table.name(), "table changed");
    }

    #[must_use]
    pub fn versions(&self) -> Versions {
        *self.tx.borrow()
    }

    /// Start watching `tables` from their current versions.
    #[must_use]
    pub fn subscribe(&self, tables: &[Table]) -> TableWatch {
        let mut rx = self.tx.subscribe();
        let seen = *rx.borrow_and_update();
        TableWatch {
            rx,
            tables: tables.to_vec(),
            seen,
        }
    }
}

/// A receiver filtered to a set of tables.
#[derive(Debug)]
pub struct TableWatch {
    rx: watch::Receiver<Versions>,
    tables: Vec<Table>,
    seen: Versions,
}

impl TableWatch {
    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Resolve once any watched table has changed since the last call.
    /// Several writes in between coalesce into a single wake-up.
    pub async fn changed(&mut self) -> Result<()> {
        loop {
            let current = *self.rx.borrow_and_update();
            if current.differs(&self.seen, &self.tables) {
                self.seen = current;
                return Ok(());
            }
            self.rx.changed().await.context("Change feed closed")?;
        }
    }

    /// Non-blocking check used by callers that poll.
    pub fn has_changed(&self) -> bool {
        self.rx.borrow().differs(&self.seen, &self.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_notify_bumps_only_that_table() {
        let feed = ChangeFeed::new();
        feed.notify(Table::FoodLogs);
        feed.notify(Table::FoodLogs);
        let v = feed.versions();
        assert_eq!(v.get(Table::FoodLogs), 2);
        assert_eq!(v.get(Table::Profile), 0);
    }

    #[test]
    fn test_has_changed_ignores_other_tables() {
        let feed = ChangeFeed::new();
        let watch = feed.subscribe(&[Table::Trainings]);
        feed.notify(Table::Techniques);
        assert!(!watch.has_changed());
        feed.notify(Table::Trainings);
        assert!(watch.has_changed());
    }

    #[tokio::test]
    async fn test_changed_coalesces_writes() {
        let feed = ChangeFeed::new();
        let mut watch = feed.subscribe(&[Table::WeightEntries, Table::Profile]);
        feed.notify(Table::WeightEntries);
        feed.notify(Table::Profile);
        feed.notify(Table::WeightEntries);

        tokio::time::timeout(Duration::from_secs(1), watch.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!watch.has_changed());

        let pending = tokio::time::timeout(Duration::from_millis(50), watch.changed()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_changed_wakes_on_later_write() {
        let feed = ChangeFeed::new();
        let mut watch = feed.subscribe(&[Table::Settings]);
        let writer = feed.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            writer.notify(Table::Settings);
        });
        tokio::time::timeout(Duration::from_secs(1), watch.changed())
            .await
            .unwrap()
            .unwrap();
        handle.await.unwrap();
    }
}
