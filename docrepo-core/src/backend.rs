//! Storage backend abstraction.
//!
//! A [`StoreBackend`] is the handle a [`Repository`](crate::repository::Repository) issues its
//! requests through. It works on raw [`Document`]s keyed by collection name and knows nothing
//! about entity types. Each method is one request/response round trip; concurrency safety and
//! connection pooling are the backend's own business.
//!
//! ```ignore
//! use bson::doc;
//! use docrepo::{backend::StoreBackend, query::Query};
//!
//! let id = backend.insert_document("users", doc! { "name": "Alice" }).await?;
//! let users = backend.query_documents("users", Query::new()).await?;
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use std::fmt::Debug;

use crate::{
    error::RepositoryResult,
    query::{Expr, Query},
};

/// Abstract interface for document storage backends.
///
/// Implementations must be usable from concurrent tasks. Failures of the underlying store are
/// reported as [`RepositoryError::Persistence`](crate::error::RepositoryError::Persistence).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a new document and returns its identifier.
    ///
    /// The store assigns the identifier when the document has no `_id`.
    async fn insert_document(
        &self,
        collection: &str,
        document: Document,
    ) -> RepositoryResult<ObjectId>;

    /// Sets `fields` on the first document matching `filter`, leaving its other fields as they
    /// are.
    ///
    /// Returns the number of matched documents, `0` or `1`.
    async fn update_document(
        &self,
        collection: &str,
        filter: Expr,
        fields: Document,
    ) -> RepositoryResult<u64>;

    /// Deletes every document matching `filter` and returns how many were removed.
    ///
    /// Matching nothing is not an error.
    async fn delete_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64>;

    /// Counts the documents matching `filter`.
    async fn count_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64>;

    /// Runs a query: filter, then sort, then limit.
    ///
    /// Without a sort, documents come back in storage order.
    async fn query_documents(
        &self,
        collection: &str,
        query: Query,
    ) -> RepositoryResult<Vec<Document>>;

    /// Shuts the backend down, releasing its resources.
    async fn shutdown(self) -> RepositoryResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn insert_document(
        &self,
        collection: &str,
        document: Document,
    ) -> RepositoryResult<ObjectId> {
        (*self)
            .insert_document(collection, document)
            .await
    }

    async fn update_document(
        &self,
        collection: &str,
        filter: Expr,
        fields: Document,
    ) -> RepositoryResult<u64> {
        (*self)
            .update_document(collection, filter, fields)
            .await
    }

    async fn delete_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        (*self)
            .delete_documents(collection, filter)
            .await
    }

    async fn count_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        (*self)
            .count_documents(collection, filter)
            .await
    }

    async fn query_documents(
        &self,
        collection: &str,
        query: Query,
    ) -> RepositoryResult<Vec<Document>> {
        (*self)
            .query_documents(collection, query)
            .await
    }
}

/// Factory for backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> RepositoryResult<Self::Backend>;
}
