//! In-memory storage backend for docrepo.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait. It
//! evaluates query expressions itself, with the same semantics the MongoDB backend gets from the
//! server for the filters docrepo compiles: exact integer comparison, numeric equality across
//! integer and double representations, case-insensitive unanchored pattern matching for
//! "contains", element-wise matching on array fields, identifier order for keyset pagination.
//! Dotted paths do not descend into arrays.
//! It is the backend used for development and tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use docrepo::{prelude::*, memory::InMemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//!     let users = store.repository::<User>();
//!
//!     users.save(&User { id: None, name: "Alice".into() }).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
