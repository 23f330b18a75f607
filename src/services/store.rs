//! The persistence boundary services talk to.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;

use super::model::Model;

/// Failure reported by a [`Repository`].
///
/// Store errors are runtime failures: services log them and then raise or
/// suppress them according to their error policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No row matched.
    #[error("{model} matching query does not exist")]
    DoesNotExist {
        /// Model that was queried
        model: &'static str,
    },
    /// More than one row matched a query expecting exactly one.
    #[error("get() returned more than one {model} -- it returned {count}!")]
    MultipleObjectsReturned {
        /// Model that was queried
        model: &'static str,
        /// Number of rows that matched
        count: usize,
    },
    /// A constraint was violated.
    #[error("integrity error: {0}")]
    Integrity(String),
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for one model.
///
/// Implementations do no logging; the service wrapping them does.
pub trait Repository<M: Model>: fmt::Debug + Send + Sync {
    /// Every stored row in primary key order.
    fn fetch_all(&self) -> Result<Vec<M>, StoreError>;

    /// Stores a new row and returns it with its primary key assigned.
    fn insert(&self, instance: M) -> Result<M, StoreError>;

    /// Writes an existing row. With `update_fields`, only those fields are
    /// written and the rest of the stored row is kept.
    fn save(&self, instance: &M, update_fields: Option<&[String]>) -> Result<M, StoreError>;

    /// Deletes a row.
    fn remove(&self, instance: &M) -> Result<(), StoreError>;

    /// Returns the stored version of `instance`.
    fn reload(&self, instance: &M) -> Result<M, StoreError>;

    /// Stores many new rows at once.
    fn bulk_insert(&self, instances: Vec<M>) -> Result<Vec<M>, StoreError> {
        instances.into_iter().map(|i| self.insert(i)).collect()
    }

    /// Writes many existing rows at once, as [`Repository::save`] does for
    /// one. Implementations should write all rows or none.
    fn bulk_save(
        &self,
        instances: &[M],
        update_fields: Option<&[String]>,
    ) -> Result<Vec<M>, StoreError> {
        instances
            .iter()
            .map(|i| self.save(i, update_fields))
            .collect()
    }
}

#[derive(Debug)]
struct Table<M> {
    rows: BTreeMap<i64, M>,
    next_pk: i64,
    fail_next: Option<StoreError>,
}

/// A [`Repository`] kept in memory.
///
/// Primary keys are assigned from 1 upwards. Fields listed as unique are
/// checked on every write.
///
/// ```
/// use heaven::services::{InMemoryStore, Repository, StoreError};
/// # use heaven::services::Model;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// # #[serde(default)]
/// # struct Tag { id: Option<i64>, name: String }
/// # impl Model for Tag {
/// #     const NAME: &'static str = "Tag";
/// #     const FIELDS: &'static [&'static str] = &["id", "name"];
/// #     fn pk(&self) -> Option<i64> { self.id }
/// #     fn set_pk(&mut self, pk: i64) { self.id = Some(pk) }
/// # }
///
/// let store = InMemoryStore::<Tag>::new().unique(&["name"]);
/// let rust = store.insert(Tag { id: None, name: "rust".into() }).unwrap();
/// assert_eq!(rust.id, Some(1));
///
/// let duplicate = store.insert(Tag { id: None, name: "rust".into() });
/// assert!(matches!(duplicate, Err(StoreError::Integrity(_))));
/// ```
#[derive(Debug)]
pub struct InMemoryStore<M> {
    table: Mutex<Table<M>>,
    unique: &'static [&'static str],
}

impl<M: Model> Default for InMemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> InMemoryStore<M> {
    /// An empty store.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(Table {
                rows: BTreeMap::new(),
                next_pk: 1,
                fail_next: None,
            }),
            unique: &[],
        }
    }

    /// Declares fields whose values must be unique across rows.
    pub fn unique(mut self, fields: &'static [&'static str]) -> Self {
        self.unique = fields;
        self
    }

    /// Makes the next operation fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.table.lock().fail_next = Some(error);
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.table.lock().rows.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<parking_lot::MutexGuard<'_, Table<M>>, StoreError> {
        let mut table = self.table.lock();
        match table.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(table),
        }
    }

    fn check_unique(&self, table: &Table<M>, candidate: &M) -> Result<(), StoreError> {
        for &field in self.unique {
            let value = candidate.field(field).map_err(integrity)?;
            if value.is_null() {
                continue;
            }
            for row in table.rows.values() {
                if row.pk() != candidate.pk() && row.field(field).map_err(integrity)? == value {
                    return Err(StoreError::Integrity(format!(
                        "UNIQUE constraint failed: {}.{field}",
                        M::NAME
                    )));
                }
            }
        }
        Ok(())
    }

    fn insert_locked(&self, table: &mut Table<M>, mut instance: M) -> Result<M, StoreError> {
        match instance.pk() {
            Some(pk) if table.rows.contains_key(&pk) => {
                return Err(StoreError::Integrity(format!(
                    "UNIQUE constraint failed: {}.{}",
                    M::NAME,
                    M::PK
                )));
            }
            Some(pk) => {
                let next = pk.checked_add(1).ok_or_else(|| {
                    StoreError::Integrity(format!("{} primary key {pk} is out of range", M::NAME))
                })?;
                table.next_pk = table.next_pk.max(next);
            }
            None => {
                instance.set_pk(table.next_pk);
                table.next_pk += 1;
            }
        }
        self.check_unique(table, &instance)?;
        if let Some(pk) = instance.pk() {
            table.rows.insert(pk, instance.clone());
        }
        Ok(instance)
    }

    fn save_locked(
        &self,
        table: &mut Table<M>,
        instance: &M,
        update_fields: Option<&[String]>,
    ) -> Result<M, StoreError> {
        let pk = stored_pk(instance)?;
        let stored = table
            .rows
            .get(&pk)
            .cloned()
            .ok_or(StoreError::DoesNotExist { model: M::NAME })?;

        let updated = match update_fields {
            None => instance.clone(),
            Some(fields) => {
                let mut row = stored;
                for field in fields {
                    let value = instance.field(field).map_err(integrity)?;
                    row.set_field(field, value).map_err(integrity)?;
                }
                row
            }
        };
        self.check_unique(table, &updated)?;
        table.rows.insert(pk, updated.clone());
        Ok(updated)
    }
}

fn integrity(err: crate::error::ServiceProgrammingError) -> StoreError {
    StoreError::Integrity(err.to_string())
}

fn stored_pk<M: Model>(instance: &M) -> Result<i64, StoreError> {
    instance
        .pk()
        .ok_or(StoreError::DoesNotExist { model: M::NAME })
}

impl<M: Model> Repository<M> for InMemoryStore<M> {
    fn fetch_all(&self) -> Result<Vec<M>, StoreError> {
        Ok(self.lock()?.rows.values().cloned().collect())
    }

    fn insert(&self, instance: M) -> Result<M, StoreError> {
        let mut table = self.lock()?;
        self.insert_locked(&mut table, instance)
    }

    fn save(&self, instance: &M, update_fields: Option<&[String]>) -> Result<M, StoreError> {
        let mut table = self.lock()?;
        self.save_locked(&mut table, instance, update_fields)
    }

    fn remove(&self, instance: &M) -> Result<(), StoreError> {
        let pk = stored_pk(instance)?;
        self.lock()?
            .rows
            .remove(&pk)
            .map(|_| ())
            .ok_or(StoreError::DoesNotExist { model: M::NAME })
    }

    fn reload(&self, instance: &M) -> Result<M, StoreError> {
        let pk = stored_pk(instance)?;
        self.lock()?
            .rows
            .get(&pk)
            .cloned()
            .ok_or(StoreError::DoesNotExist { model: M::NAME })
    }

    fn bulk_insert(&self, instances: Vec<M>) -> Result<Vec<M>, StoreError> {
        let mut table = self.lock()?;
        let snapshot = (table.rows.clone(), table.next_pk);
        let mut inserted = Vec::with_capacity(instances.len());
        for instance in instances {
            match self.insert_locked(&mut table, instance) {
                Ok(instance) => inserted.push(instance),
                Err(err) => {
                    (table.rows, table.next_pk) = snapshot;
                    return Err(err);
                }
            }
        }
        Ok(inserted)
    }

    fn bulk_save(
        &self,
        instances: &[M],
        update_fields: Option<&[String]>,
    ) -> Result<Vec<M>, StoreError> {
        let mut table = self.lock()?;
        let snapshot = table.rows.clone();
        let mut saved = Vec::with_capacity(instances.len());
        for instance in instances {
            match self.save_locked(&mut table, instance, update_fields) {
                Ok(row) => saved.push(row),
                Err(err) => {
                    table.rows = snapshot;
                    return Err(err);
                }
            }
        }
        Ok(saved)
    }
}
