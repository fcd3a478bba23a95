//! Typed repositories: the operation surface applications use.
//!
//! A [`Repository`] binds one entity type to its collection on a backend and provides save,
//! update, delete, find, paginate and count without any per-entity code. It resolves
//! identifiers, compiles filter maps and converts between entities and documents; the backend
//! only ever sees documents and query expressions.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//! use docrepo::{prelude::*, memory::InMemoryStore};
//!
//! let users = Repository::<_, User>::new(InMemoryStore::new());
//!
//! users.save(&User { id: None, name: "Ann".into(), status: "active".into() }).await?;
//!
//! let active = users.count(&doc! { "status": "active" }, &OrFilters::new()).await?;
//! let ann = users.find_one(&doc! { "name": "ann" }, &OrFilters::new()).await?;
//! ```
//!
//! # Failure semantics
//!
//! Nothing is retried. Reads, counts and deletes are idempotent and safe for callers to retry;
//! [`save`](Repository::save) and [`update`](Repository::update) are not, a `save` of an entity
//! without identifier inserts a new document every time it runs.

use bson::{Document, oid::ObjectId};
use std::marker::PhantomData;
use tracing::{debug, warn};

use crate::{
    backend::StoreBackend,
    entity::{Entity, EntityExt},
    error::{RepositoryError, RepositoryResult},
    filter::{CURSOR_KEY, OrFilters, compile},
    id::{ID_KEY, entity_id},
    page::PageRequest,
    query::{Filter, Query},
};

/// Repository for the entity type `E` on the backend `B`.
///
/// The collection is [`E::collection_name()`](Entity::collection_name). The repository holds no
/// state besides the backend handle and never retains entities beyond a call.
#[derive(Debug)]
pub struct Repository<B: StoreBackend, E: Entity> {
    backend: B,
    collection: String,
    _marker: PhantomData<E>,
}

impl<B: StoreBackend, E: Entity> Repository<B, E> {
    /// Creates a repository for `E` on the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            collection: E::collection_name().to_string(),
            _marker: PhantomData,
        }
    }

    /// Returns the name of the collection this repository reads and writes.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the backend handle.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Inserts the entity if it has no identifier, updates it otherwise.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`update`](Self::update) for entities with an identifier, an
    /// encoding error, or the backend's insert error.
    pub async fn save(&self, entity: &E) -> RepositoryResult<()> {
        if entity_id(entity).is_some() {
            return self.update(entity).await;
        }

        let mut document = entity.to_document()?;
        // An unsaved entity may still encode `_id: null`.
        document.remove(ID_KEY);

        let id = self
            .backend
            .insert_document(&self.collection, document)
            .await?;
        debug!(collection = %self.collection, %id, "inserted entity");

        Ok(())
    }

    /// Overwrites the stored fields of an existing entity.
    ///
    /// The identifier itself is never part of the written fields.
    ///
    /// # Errors
    ///
    /// - [`RepositoryError::MissingIdentifier`] if the entity has no identifier.
    /// - [`RepositoryError::NoRecordUpdated`] if no stored document has its identifier; nothing
    ///   is inserted in that case.
    pub async fn update(&self, entity: &E) -> RepositoryResult<()> {
        let id = self.require_id(entity)?;

        let mut fields = entity.to_document()?;
        fields.remove(ID_KEY);

        let matched = self
            .backend
            .update_document(&self.collection, Filter::eq(ID_KEY, id), fields)
            .await?;

        if matched == 0 {
            return Err(RepositoryError::NoRecordUpdated {
                id,
                collection: self.collection.clone(),
            });
        }
        debug!(collection = %self.collection, %id, "updated entity");

        Ok(())
    }

    /// Deletes the stored document of the entity.
    ///
    /// Deleting an identifier that is not stored succeeds, and so does deleting an entity that
    /// was never saved: nothing can match it, so no request is issued.
    pub async fn delete(&self, entity: &E) -> RepositoryResult<()> {
        let Some(id) = entity_id(entity) else {
            debug!(collection = %self.collection, "delete of unsaved entity skipped");
            return Ok(());
        };

        let deleted = self
            .backend
            .delete_documents(&self.collection, Filter::eq(ID_KEY, id))
            .await?;
        debug!(collection = %self.collection, %id, deleted, "deleted entity");

        Ok(())
    }

    /// Returns every entity of the collection in storage order.
    pub async fn find_all(&self) -> RepositoryResult<Vec<E>> {
        self.query(Query::new()).await
    }

    /// Returns one page of entities matching `and_filters`.
    ///
    /// Pages are ordered by [`PageRequest::sort`]. For `page > 0` with a last entity, only
    /// entities whose identifier is strictly greater than that entity's are considered.
    /// `or_filters` is accepted but not applied.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidCursor`] if `and_filters` carries an unparsable value
    /// under [`CURSOR_KEY`], a decoding error, or the backend's query error.
    pub async fn paginate(
        &self,
        request: &PageRequest<'_, E>,
        and_filters: &Document,
        or_filters: &OrFilters,
    ) -> RepositoryResult<Vec<E>> {
        self.ignore_or_filters("paginate", or_filters);

        if request.page_size == 0 {
            return Ok(Vec::new());
        }

        let mut filters = and_filters.clone();
        if let Some(after) = request.cursor().and_then(entity_id) {
            filters.insert(CURSOR_KEY, after);
        }

        let sort = request.sort();
        let query = Query::builder()
            .filter(compile(&filters)?)
            .limit(request.page_size)
            .sort(sort.field, sort.direction)
            .build();

        self.query(query).await
    }

    /// Counts the entities matching `and_filters`. `or_filters` is accepted but not applied.
    pub async fn count(&self, and_filters: &Document, or_filters: &OrFilters) -> RepositoryResult<u64> {
        self.ignore_or_filters("count", or_filters);

        self.backend
            .count_documents(&self.collection, compile(and_filters)?)
            .await
    }

    /// Returns the first entity, in storage order, matching `and_filters`, or `None`.
    /// `or_filters` is accepted but not applied.
    pub async fn find_one(
        &self,
        and_filters: &Document,
        or_filters: &OrFilters,
    ) -> RepositoryResult<Option<E>> {
        self.ignore_or_filters("find_one", or_filters);

        let query = Query::builder()
            .filter(compile(and_filters)?)
            .limit(1)
            .build();

        Ok(self.query(query).await?.into_iter().next())
    }

    async fn query(&self, query: Query) -> RepositoryResult<Vec<E>> {
        self.backend
            .query_documents(&self.collection, query)
            .await?
            .into_iter()
            .map(E::from_document)
            .collect()
    }

    fn require_id(&self, entity: &E) -> RepositoryResult<ObjectId> {
        entity_id(entity).ok_or_else(|| RepositoryError::MissingIdentifier(self.collection.clone()))
    }

    fn ignore_or_filters(&self, operation: &'static str, or_filters: &OrFilters) {
        if !or_filters.is_empty() {
            warn!(
                collection = %self.collection,
                operation,
                fields = ?or_filters.keys().collect::<Vec<_>>(),
                "or-filters are not applied",
            );
        }
    }
}
