//! Shared database handle and queries that re-run whenever the tables they
//! read from are written.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};

use crate::changes::{ChangeFeed, Table, TableWatch};
use crate::db::Database;

/// Cloneable handle to the single database connection.
#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Database>>,
    changes: ChangeFeed,
}

impl Store {
    #[must_use]
    pub fn new(db: Database) -> Self {
        let changes = db.changes().clone();
        Self {
            db: Arc::new(Mutex::new(db)),
            changes,
        }
    }

    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Run `f` with exclusive access to the connection. Writers are
    /// serialized here. Fails once a holder of the lock has panicked.
    pub fn with<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow!("Database lock poisoned"))?;
        f(&db)
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    #[must_use]
    pub fn subscribe(&self, tables: &[Table]) -> TableWatch {
        self.changes.subscribe(tables)
    }
}

type Fetch<T> = Arc<dyn Fn(&Database) -> Result<T> + Send + Sync>;

/// A read that can be taken once with [`LiveQuery::get`] or followed with
/// [`LiveQuery::next`], which yields a fresh value after every relevant write.
pub struct LiveQuery<T> {
    store: Store,
    tables: Vec<Table>,
    fetch: Fetch<T>,
    watch: Option<TableWatch>,
}

impl<T> Clone for LiveQuery<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            tables: self.tables.clone(),
            fetch: Arc::clone(&self.fetch),
            watch: None,
        }
    }
}

impl<T: 'static> LiveQuery<T> {
    pub fn new(
        store: &Store,
        tables: &[Table],
        fetch: impl Fn(&Database) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            store: store.clone(),
            tables: tables.to_vec(),
            fetch: Arc::new(fetch),
            watch: None,
        }
    }

    #[must_use]
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self) -> Result<T> {
        self.store.with(|db| (self.fetch)(db))
    }

    /// The current value on the first call; afterwards waits for a write to
    /// one of the tables and returns the recomputed value. `None` once the
    /// change feed is gone.
    pub async fn next(&mut self) -> Option<Result<T>> {
        match self.watch.as_mut() {
            None => self.watch = Some(self.store.subscribe(&self.tables)),
            Some(watch) => {
                if watch.changed().await.is_err() {
                    return None;
                }
                tracing::debug!(tables = ?self.tables, "recomputing live query");
            }
        }
        Some(self.get())
    }

    #[must_use]
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> LiveQuery<U> {
        let fetch = self.fetch;
        LiveQuery {
            store: self.store,
            tables: self.tables,
            fetch: Arc::new(move |db: &Database| fetch(db).map(&f)),
            watch: None,
        }
    }

    /// Extra synchronous read done in the same recomputation, without
    /// watching any further tables.
    #[must_use]
    pub fn then_read<U: 'static>(
        self,
        f: impl Fn(&Database, T) -> Result<U> + Send + Sync + 'static,
    ) -> LiveQuery<U> {
        let fetch = self.fetch;
        LiveQuery {
            store: self.store,
            tables: self.tables,
            fetch: Arc::new(move |db: &Database| f(db, fetch(db)?)),
            watch: None,
        }
    }

    /// Both values, recomputed together when either side's tables change.
    #[must_use]
    pub fn zip<U: 'static>(self, other: LiveQuery<U>) -> LiveQuery<(T, U)> {
        let mut tables = self.tables;
        for table in other.tables {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
        let left = self.fetch;
        let right = other.fetch;
        LiveQuery {
            store: self.store,
            tables,
            fetch: Arc::new(move |db: &Database| Ok((left(db)?, right(db)?))),
            watch: None,
        }
    }
}
