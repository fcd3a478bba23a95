//! In-memory storage implementation.
//!
//! Documents live in per-collection `BTreeMap`s keyed by their object id, behind an async-aware
//! read-write lock. Storage order is identifier order, which makes unsorted reads stable.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, oid::ObjectId};
use tracing::trace;

use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RepositoryError, RepositoryResult},
    id::{ID_KEY, document_id},
    query::{Expr, Query, SortDirection},
};

use crate::evaluator::{DocumentEvaluator, sort_key};

type CollectionMap = BTreeMap<ObjectId, Document>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable; clones share the same data. Queries scan the whole collection,
/// which is fine for tests and small data sets.
///
/// # Example
///
/// ```ignore
/// use docrepo_memory::InMemoryStore;
/// use docrepo::{backend::StoreBackend, query::Query};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let id = store.insert_document("users", doc! { "name": "Alice", "age": 30 }).await?;
/// let docs = store.query_documents("users", Query::new()).await?;
/// assert_eq!(docs[0].get_object_id("_id")?, id);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> (document id -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    /// Creates a builder for an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn matching_ids(collection: &CollectionMap, filter: &Expr) -> RepositoryResult<Vec<ObjectId>> {
    DocumentEvaluator::filter_documents(collection.values(), filter)?
        .into_iter()
        .map(|doc| match doc.get(ID_KEY) {
            Some(bson::Bson::ObjectId(id)) => Ok(*id),
            _ => Err(RepositoryError::Persistence(format!("stored document without `{ID_KEY}`"))),
        })
        .collect()
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_document(&self, collection: &str, mut document: Document) -> RepositoryResult<ObjectId> {
        let id = document_id(&document)?.unwrap_or_else(ObjectId::new);
        document.insert(ID_KEY, id);

        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        if collection_map.contains_key(&id) {
            return Err(RepositoryError::DocumentAlreadyExists(id.to_hex(), collection.to_string()));
        }

        collection_map.insert(id, document);
        trace!(collection, %id, "inserted document");

        Ok(id)
    }

    async fn update_document(&self, collection: &str, filter: Expr, fields: Document) -> RepositoryResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(0);
        };

        let Some(id) = matching_ids(collection_map, &filter)?.into_iter().next() else {
            return Ok(0);
        };

        if document_id(&fields)?.is_some_and(|new| new != id) {
            return Err(RepositoryError::Persistence(format!("`{ID_KEY}` of {id} is immutable")));
        }

        if let Some(stored) = collection_map.get_mut(&id) {
            for (key, value) in fields {
                stored.insert(key, value);
            }
        }
        trace!(collection, %id, "updated document");

        Ok(1)
    }

    async fn delete_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        let mut store = self.store.write().await;
        let Some(collection_map) = store.get_mut(collection) else {
            return Ok(0);
        };

        let ids = matching_ids(collection_map, &filter)?;
        for id in &ids {
            collection_map.remove(id);
        }
        trace!(collection, deleted = ids.len(), "deleted documents");

        Ok(ids.len() as u64)
    }

    async fn count_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(0);
        };

        Ok(DocumentEvaluator::filter_documents(collection_map.values(), &filter)?.len() as u64)
    }

    async fn query_documents(&self, collection: &str, query: Query) -> RepositoryResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(collection_map) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut documents = match &query.filter {
            Some(filter) => DocumentEvaluator::filter_documents(collection_map.values(), filter)?,
            None => collection_map.values().collect(),
        };

        if let Some(sort) = &query.sort {
            // Stable, so ties keep identifier order.
            documents.sort_by(|a, b| {
                let ordering = sort_key(a, &sort.field).sort_cmp(&sort_key(b, &sort.field));

                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(
            documents
                .into_iter()
                .take(query.limit.unwrap_or(usize::MAX))
                .cloned()
                .collect()
        )
    }
}


/// Builder for [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds a new, empty [`InMemoryStore`]. Never fails.
    async fn build(self) -> RepositoryResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
