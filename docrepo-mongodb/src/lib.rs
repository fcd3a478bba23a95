//! MongoDB backend implementation for docrepo.
//!
//! This crate implements `StoreBackend` on top of the official MongoDB driver. Filters compiled
//! by docrepo are translated into MongoDB filter documents and evaluated by the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docrepo = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! The store is built from a connection string and a database name, either directly or from a
//! deserialized [`MongoDbConfig`]:
//!
//! ```ignore
//! use docrepo::{backend::StoreBackendBuilder, mongodb::{MongoDbConfig, MongoDbStoreBuilder}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MongoDbConfig::from_json(&std::fs::read_to_string("mongodb.json")?)?;
//!     let store = MongoDbStoreBuilder::from_config(config)
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_mongodb;

pub mod store;
pub mod query;

pub use store::{MongoDbConfig, MongoDbStore, MongoDbStoreBuilder};
