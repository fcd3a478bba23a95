//! A generic typed repository layer over schema-less document stores.
//!
//! This crate is the core of the docrepo project and provides:
//!
//! - **Entities** ([`entity`]) - The entity trait and the entity ↔ document codec
//! - **Identifiers** ([`id`]) - Identifier resolution for entities and raw documents
//! - **Filters** ([`filter`]) - Compilation of field/value maps into query expressions
//! - **Queries** ([`query`]) - The expression AST and the visitor backends evaluate it with
//! - **Pagination** ([`page`]) - Keyset pagination requests
//! - **Repositories** ([`repository`]) - save, update, delete, find, paginate and count
//! - **Backends** ([`backend`]) - The storage handle abstraction
//! - **Document store** ([`store`]) - One backend, one repository per entity type
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use bson::oid::ObjectId;
//! use docrepo::Entity;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize, Entity)]
//! #[entity(collection = "users")]
//! pub struct User {
//!     #[entity(id)]
//!     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
//!     pub id: Option<ObjectId>,
//!     pub name: String,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_core;

pub mod backend;
pub mod entity;
pub mod error;
pub mod filter;
pub mod id;
pub mod page;
pub mod query;
pub mod repository;
pub mod store;

// Re-exported so derived `Entity` impls can name `ObjectId`.
pub use bson;
