//! Main docrepo crate: typed repositories over document stores.
//!
//! This crate is the entry point of the docrepo project. It re-exports the core types, the
//! `Entity` derive macro and the storage backends.
//!
//! # Features
//!
//! - **No per-entity boilerplate** - derive `Entity`, get save, update, delete, find, paginate and count
//! - **Insert-or-update dispatch** - `save` inserts entities without identifier and updates the rest
//! - **Filter maps** - `doc! { "name": "ann", "age": 30 }` compiles to "contains" and equality conditions
//! - **Keyset pagination** - pages advance past the last seen identifier, not by offset
//! - **Multiple backends** - in-memory and MongoDB behind one trait
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore};
//! use bson::{doc, oid::ObjectId};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
//! pub struct User {
//!     #[entity(id)]
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//!     pub status: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.repository::<User>();
//!
//!     // No identifier yet: inserted.
//!     users.save(&User { id: None, name: "Ann".into(), status: "active".into() }).await?;
//!
//!     // Loaded entities carry their identifier: updated.
//!     let mut ann = users
//!         .find_one(&doc! { "name": "ann" }, &OrFilters::new())
//!         .await?
//!         .expect("saved above");
//!     ann.status = "inactive".into();
//!     users.save(&ann).await?;
//!
//!     // First page of ten, by identifier.
//!     let page = users
//!         .paginate(&PageRequest::new(0, 10), &doc! {}, &OrFilters::new())
//!         .await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - [`mongodb`] - MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use docrepo_core::{backend, entity, error, filter, id, page, query, repository, store};
pub use docrepo_macros::Entity;

// Re-export BSON types for convenience; derived `Entity` impls refer to them through here.
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrepo_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrepo_mongodb::{MongoDbConfig, MongoDbStore, MongoDbStoreBuilder};
}
