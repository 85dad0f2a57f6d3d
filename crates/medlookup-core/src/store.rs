//! Medicine store seam.
//!
//! The resolver only sees [`MedicineStore`]; [`SqliteMedicineStore`] runs the
//! blocking SQLite calls on tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

use crate::db::{Database, DbError, DbResult};
use crate::models::MedicineRecord;

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// The store could not be reached at all (worker died, lock poisoned).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Whether the same call might succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Searchable record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Manufacturer,
    DosageForm,
    ShortComposition1,
    ShortComposition2,
    SaltComposition,
}

impl Field {
    /// Column holding the value as stored.
    pub fn column(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Manufacturer => "manufacturer_name",
            Field::DosageForm => "type",
            Field::ShortComposition1 => "short_composition1",
            Field::ShortComposition2 => "short_composition2",
            Field::SaltComposition => "salt_composition",
        }
    }

    /// Column used for pattern matching; the lowercase projection when one exists.
    pub fn search_column(&self) -> &'static str {
        match self {
            Field::Name => "name_lc",
            Field::Manufacturer => "manufacturer_name_lc",
            Field::DosageForm => "type_lc",
            other => other.column(),
        }
    }
}

/// A single predicate on a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive regex match; NULL never matches
    Matches { field: Field, pattern: String },
    /// Exact equality
    Equals { field: Field, value: String },
    /// Inequality; NULL counts as different. With `value: None`, the field must be set.
    NotEquals { field: Field, value: Option<String> },
    IdNot(i64),
    Discontinued(bool),
}

impl Condition {
    pub fn matches(field: Field, pattern: impl Into<String>) -> Self {
        Condition::Matches {
            field,
            pattern: pattern.into(),
        }
    }

    pub fn equals(field: Field, value: impl Into<String>) -> Self {
        Condition::Equals {
            field,
            value: value.into(),
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Catalog id order
    #[default]
    Id,
    /// Name, case-insensitive
    Name,
    /// Cheapest first; records without a price last
    PriceAsc,
}

/// AND of `conditions`, AND (any of `any_of`), sorted and limited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicineQuery {
    pub conditions: Vec<Condition>,
    /// Empty means no OR group
    pub any_of: Vec<Condition>,
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl MedicineQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn or(mut self, condition: Condition) -> Self {
        self.any_of.push(condition);
        self
    }

    pub fn sort_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Read access to the medicine catalog.
#[async_trait]
pub trait MedicineStore: Send + Sync {
    async fn find(&self, query: &MedicineQuery) -> StoreResult<Vec<MedicineRecord>>;

    async fn find_one(&self, id: i64) -> StoreResult<Option<MedicineRecord>>;

    /// Total number of records.
    async fn count(&self) -> StoreResult<u64>;
}

/// [`MedicineStore`] backed by a SQLite [`Database`].
#[derive(Clone)]
pub struct SqliteMedicineStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteMedicineStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(Database::open_in_memory()?))
    }

    /// Replace the whole catalog in one transaction. Returns the number stored.
    pub async fn replace_catalog(&self, records: Vec<MedicineRecord>) -> StoreResult<usize> {
        self.with_db_mut(move |db| db.replace_catalog(&records)).await
    }

    async fn with_db<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    {
        self.with_db_mut(move |db| f(db)).await
    }

    async fn with_db_mut<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> DbResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| StoreError::Unavailable("database lock poisoned".into()))?;
            f(&mut guard).map_err(StoreError::from)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("database task failed: {}", e)))?
    }
}

#[async_trait]
impl MedicineStore for SqliteMedicineStore {
    async fn find(&self, query: &MedicineQuery) -> StoreResult<Vec<MedicineRecord>> {
        let query = query.clone();
        self.with_db(move |db| db.query_medicines(&query)).await
    }

    async fn find_one(&self, id: i64) -> StoreResult<Option<MedicineRecord>> {
        self.with_db(move |db| db.get_medicine(id)).await
    }

    async fn count(&self) -> StoreResult<u64> {
        self.with_db(|db| db.count_medicines()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded_store() -> SqliteMedicineStore {
        let store = SqliteMedicineStore::open_in_memory().unwrap();

        let mut dolo = MedicineRecord::new(1, "Dolo 650 Tablet");
        dolo.manufacturer_name = Some("Micro Labs Ltd".into());
        dolo.price = Some(30.0);

        let mut crocin = MedicineRecord::new(2, "Crocin Advance Tablet");
        crocin.manufacturer_name = Some("GSK".into());
        crocin.price = Some(20.0);

        store.replace_catalog(vec![dolo, crocin]).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_find_and_find_one() {
        let store = seeded_store().await;

        let query = MedicineQuery::new().and(Condition::matches(Field::Name, "^dolo"));
        let found = store.find(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 1);

        assert_eq!(store.find_one(2).await.unwrap().unwrap().name, "Crocin Advance Tablet");
        assert!(store.find_one(99).await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_sort_by_price() {
        let store = seeded_store().await;

        let query = MedicineQuery::new().sort_by(SortKey::PriceAsc);
        let found = store.find(&query).await.unwrap();
        assert_eq!(found.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_store_error_kinds() {
        assert!(StoreError::Unavailable("gone".into()).is_transient());
        assert!(!StoreError::Database(DbError::NotFound("x".into())).is_transient());
    }

    #[test]
    fn test_field_columns() {
        assert_eq!(Field::Name.search_column(), "name_lc");
        assert_eq!(Field::DosageForm.column(), "type");
        assert_eq!(Field::SaltComposition.search_column(), "salt_composition");
    }
}
