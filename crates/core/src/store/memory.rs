//! In-memory store.
//!
//! Backs the test suites and local development when no `DATABASE_URL` is configured. All state
//! sits behind one `tokio::sync::RwLock`; a commit stages copies of the collections it touches,
//! checks unique keys against the staged copies, and only then swaps them in, so a failed commit
//! leaves nothing behind.

use super::filter::{compare_values, lookup};
use super::{CollectionSpec, Filter, Query, Store, StoreError, StoreResult, UnitOfWork, Write};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    doc: Value,
}

type Documents = HashMap<Uuid, Entry>;
type UniqueKeys = &'static [&'static [&'static str]];

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Documents>,
    unique: HashMap<String, UniqueKeys>,
    counters: HashMap<String, u64>,
    last_seq: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn index_name(collection: &str, fields: &[&str]) -> String {
    format!("{collection}_{}_key", fields.join("_"))
}

/// Fails if two documents share a value for any unique key.
fn check_unique(collection: &str, docs: &Documents, keys: UniqueKeys) -> StoreResult<()> {
    for fields in keys {
        let mut seen = HashSet::new();
        for entry in docs.values() {
            let values: Vec<&Value> = fields.iter().map(|f| lookup(&entry.doc, f)).collect();
            if values.iter().any(|v| v.is_null()) {
                continue;
            }
            let key = serde_json::to_string(&values).map_err(StoreError::Serialization)?;
            if !seen.insert(key) {
                return Err(StoreError::Duplicate(index_name(collection, fields)));
            }
        }
    }
    Ok(())
}

fn sorted_matches<'a>(docs: &'a Documents, query: &Query) -> Vec<&'a Entry> {
    let mut hits: Vec<&Entry> = docs
        .values()
        .filter(|entry| query.filter.matches(&entry.doc))
        .collect();

    hits.sort_by(|a, b| {
        query
            .sort
            .iter()
            .map(|sort| {
                let ord = compare_values(lookup(&a.doc, &sort.field), lookup(&b.doc, &sort.field));
                if sort.descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or_else(|| a.seq.cmp(&b.seq))
    });
    hits
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn migrate(&self, specs: &[CollectionSpec]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        for spec in specs {
            state.collections.entry(spec.name.to_owned()).or_default();
            state.unique.insert(spec.name.to_owned(), spec.unique);
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Value>> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|entry| entry.doc.clone()))
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>> {
        let state = self.state.read().await;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(sorted_matches(docs, query)
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|entry| entry.doc.clone())
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let state = self.state.read().await;
        let count = state
            .collections
            .get(collection)
            .map(|docs| docs.values().filter(|e| filter.matches(&e.doc)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn next_sequence(&self, key: &str) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let counter = state.counters.entry(key.to_owned()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn commit(&self, unit: UnitOfWork) -> StoreResult<()> {
        if unit.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().await;
        let mut staged: HashMap<&'static str, Documents> = HashMap::new();
        let mut last_seq = state.last_seq;

        for write in unit.into_writes() {
            let collection = write.collection();
            let docs = match staged.entry(collection) {
                MapEntry::Occupied(e) => e.into_mut(),
                MapEntry::Vacant(e) => {
                    e.insert(state.collections.get(collection).cloned().unwrap_or_default())
                }
            };
            let missing = |id| StoreError::Missing {
                collection: collection.to_owned(),
                id,
            };

            match write {
                Write::Insert { id, doc, .. } => {
                    if docs.contains_key(&id) {
                        return Err(StoreError::Duplicate(format!("{collection}_pkey")));
                    }
                    last_seq += 1;
                    docs.insert(id, Entry { seq: last_seq, doc });
                }
                Write::Replace { id, doc, .. } => {
                    docs.get_mut(&id).ok_or_else(|| missing(id))?.doc = doc;
                }
                Write::Delete { id, .. } => {
                    docs.remove(&id).ok_or_else(|| missing(id))?;
                }
            }
        }

        for (collection, docs) in &staged {
            if let Some(keys) = state.unique.get(*collection) {
                check_unique(collection, docs, keys)?;
            }
        }

        state.last_seq = last_seq;
        for (collection, docs) in staged {
            state.collections.insert(collection.to_owned(), docs);
        }
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
