//! Document store owning a backend and handing out repositories.
//!
//! ```ignore
//! use docrepo::store::DocumentStore;
//!
//! let store = DocumentStore::new(backend);
//! let users = store.repository::<User>();
//! let orders = store.repository::<Order>();
//! ```

use crate::{
    backend::StoreBackend,
    entity::Entity,
    error::RepositoryResult,
    repository::Repository,
};

/// A document store bound to one backend.
///
/// Every entity type gets its own [`Repository`], reading and writing the collection named by
/// [`Entity::collection_name`]. All repositories share the store's backend.
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a repository for the entity type `E` borrowing this store's backend.
    pub fn repository<E: Entity>(&self) -> Repository<&B, E> {
        Repository::new(&self.backend)
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Shuts down the store and releases backend resources.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down.
    pub async fn shutdown(self) -> RepositoryResult<()> {
        self.backend.shutdown().await
    }
}
