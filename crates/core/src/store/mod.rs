//! Document store.
//!
//! Every entity lives as a JSON document in a named collection. The [`Store`] trait is the only
//! seam between services and persistence; it is object safe so services hold an
//! `Arc<dyn Store>` and never know which backend they run against.
//!
//! Writes that touch more than one document are grouped into a [`UnitOfWork`] and applied by
//! [`Store::commit`] all-or-nothing. Counters for generated codes come from
//! [`Store::next_sequence`], which increments atomically.

mod filter;
mod memory;
mod postgres;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value violates unique index {0}")]
    Duplicate(String),
    #[error("document {id} not found in {collection}")]
    Missing { collection: String, id: Uuid },
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document from {collection}: {source}")]
    Deserialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid index definition: {0}")]
    InvalidIndex(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A record type persisted in its own collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name. Must be a plain lowercase identifier.
    const COLLECTION: &'static str;

    /// Unique keys, each a list of top-level field names. A key is not enforced for documents
    /// where any of its fields is missing or `null`.
    const UNIQUE: &'static [&'static [&'static str]] = &[];

    fn id(&self) -> Uuid;
}

/// Collection name plus unique keys, handed to [`Store::migrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub unique: &'static [&'static [&'static str]],
}

impl CollectionSpec {
    pub fn of<T: Document>() -> Self {
        Self {
            name: T::COLLECTION,
            unique: T::UNIQUE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            descending: false,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_owned(),
            descending: true,
        }
    }
}

/// Filter, ordering and window for [`Store::find`].
///
/// Ties in the sort keys (and documents with no sort at all) come back in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub sort: Vec<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One pending change inside a [`UnitOfWork`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert {
        collection: &'static str,
        id: Uuid,
        doc: Value,
    },
    Replace {
        collection: &'static str,
        id: Uuid,
        doc: Value,
    },
    Delete {
        collection: &'static str,
        id: Uuid,
    },
}

impl Write {
    pub fn collection(&self) -> &'static str {
        match self {
            Write::Insert { collection, .. }
            | Write::Replace { collection, .. }
            | Write::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Write::Insert { id, .. } | Write::Replace { id, .. } | Write::Delete { id, .. } => *id,
        }
    }
}

/// An ordered batch of writes that either all apply or none do.
///
/// Replacing or deleting a document that does not exist fails the whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert of `doc`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the document cannot be turned into JSON.
    pub fn insert<T: Document>(&mut self, doc: &T) -> StoreResult<&mut Self> {
        let value = serde_json::to_value(doc).map_err(StoreError::Serialization)?;
        self.writes.push(Write::Insert {
            collection: T::COLLECTION,
            id: doc.id(),
            doc: value,
        });
        Ok(self)
    }

    /// Queue a full replacement of `doc`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialization` if the document cannot be turned into JSON.
    pub fn replace<T: Document>(&mut self, doc: &T) -> StoreResult<&mut Self> {
        let value = serde_json::to_value(doc).map_err(StoreError::Serialization)?;
        self.writes.push(Write::Replace {
            collection: T::COLLECTION,
            id: doc.id(),
            doc: value,
        });
        Ok(self)
    }

    pub fn delete<T: Document>(&mut self, id: Uuid) -> &mut Self {
        self.writes.push(Write::Delete {
            collection: T::COLLECTION,
            id,
        });
        self
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

impl From<Write> for UnitOfWork {
    fn from(write: Write) -> Self {
        Self {
            writes: vec![write],
        }
    }
}

/// Backend-neutral document persistence.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Create tables and unique indexes for `specs`. Safe to run repeatedly.
    async fn migrate(&self, specs: &[CollectionSpec]) -> StoreResult<()>;

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Value>>;

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>>;

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    /// Atomically increment the counter `key` and return its new value. Counters start at 1.
    async fn next_sequence(&self, key: &str) -> StoreResult<u64>;

    /// Apply every write in `unit`, or none of them.
    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()>;

    /// Round-trip to the backend to prove it is reachable.
    async fn ping(&self) -> StoreResult<()>;

    async fn insert(&self, collection: &'static str, id: Uuid, doc: Value) -> StoreResult<()> {
        self.commit(Write::Insert { collection, id, doc }.into()).await
    }

    async fn replace(&self, collection: &'static str, id: Uuid, doc: Value) -> StoreResult<()> {
        self.commit(Write::Replace { collection, id, doc }.into()).await
    }

    async fn delete(&self, collection: &'static str, id: Uuid) -> StoreResult<()> {
        self.commit(Write::Delete { collection, id }.into()).await
    }
}

/// Typed view of one collection.
pub struct Collection<T> {
    store: Arc<dyn Store>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    fn decode(value: Value) -> StoreResult<T> {
        serde_json::from_value(value).map_err(|source| StoreError::Deserialization {
            collection: T::COLLECTION.to_owned(),
            source,
        })
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Self::decode)
            .transpose()
    }

    pub async fn find(&self, query: &Query) -> StoreResult<Vec<T>> {
        self.store
            .find(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(Self::decode)
            .collect()
    }

    pub async fn find_one(&self, filter: Filter) -> StoreResult<Option<T>> {
        let query = Query::new(filter).limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    /// Fetch every document whose id is in `ids`, keyed by id. Unknown ids are skipped.
    pub async fn get_many(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> StoreResult<HashMap<Uuid, T>> {
        let mut ids: Vec<Uuid> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let filter = Filter::one_of("id", ids.iter().map(|id| id.to_string()));
        let docs = self.find(&Query::new(filter)).await?;
        Ok(docs.into_iter().map(|doc| (doc.id(), doc)).collect())
    }

    pub async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        self.store.count(T::COLLECTION, filter).await
    }

    pub async fn exists(&self, filter: Filter) -> StoreResult<bool> {
        Ok(self.count(&filter).await? > 0)
    }

    pub async fn insert(&self, doc: &T) -> StoreResult<()> {
        let value = serde_json::to_value(doc).map_err(StoreError::Serialization)?;
        self.store.insert(T::COLLECTION, doc.id(), value).await
    }

    pub async fn replace(&self, doc: &T) -> StoreResult<()> {
        let value = serde_json::to_value(doc).map_err(StoreError::Serialization)?;
        self.store.replace(T::COLLECTION, doc.id(), value).await
    }

    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }
}
