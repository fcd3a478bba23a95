//! Convenient re-exports of commonly used types from docrepo.
//!
//! ```ignore
//! use docrepo::prelude::*;
//! ```

pub use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    entity::{Entity, EntityExt},
    error::{RepositoryError, RepositoryResult},
    filter::{CURSOR_KEY, OrFilters},
    page::{PageRequest, PageRequestBuilder},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    repository::Repository,
    store::DocumentStore,
};
pub use docrepo_macros::Entity;
