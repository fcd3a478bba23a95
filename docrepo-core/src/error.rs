//! Error types and result types for repository operations.
//!
//! Every fallible operation in this crate returns [`RepositoryResult<T>`]. Errors fall into three
//! families: conversion errors ([`Encoding`](RepositoryError::Encoding),
//! [`Decoding`](RepositoryError::Decoding)), persistence errors raised by or about the storage
//! backend, and caller errors detected before any request is issued.

use bson::oid::ObjectId;
use thiserror::Error;

/// Represents all possible errors that can occur when going through a repository.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The entity could not be represented as a document.
    #[error("Encoding error: {0}")]
    Encoding(String),
    /// A stored document could not be converted into the target entity type.
    #[error("Decoding error: {0}")]
    Decoding(String),
    /// The storage backend failed to carry out an operation.
    #[error("Persistence error: {0}")]
    Persistence(String),
    /// An update matched no stored document, the entity is stale or was deleted.
    #[error("No record updated: {id} in collection {collection}")]
    NoRecordUpdated {
        /// Identifier the update was filtered on.
        id: ObjectId,
        /// Collection the update was issued against.
        collection: String,
    },
    /// The operation needs an identifier but the entity has none.
    /// The argument is the collection name.
    #[error("Missing identifier for entity in collection {0}")]
    MissingIdentifier(String),
    /// A pagination cursor could not be parsed as an identifier.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),
    /// A filter value was rejected by the backend evaluating it.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    /// A document with the given ID already exists in the collection.
    /// The first argument is the document ID, the second is the collection name.
    #[error("Document {0} already exists in collection {1}")]
    DocumentAlreadyExists(String, String),
    /// Error during backend construction or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl RepositoryError {
    /// Returns `true` for errors raised by, or about the outcome of, a storage operation.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            RepositoryError::Persistence(_)
                | RepositoryError::NoRecordUpdated { .. }
                | RepositoryError::MissingIdentifier(_)
                | RepositoryError::DocumentAlreadyExists(..)
        )
    }

    /// Returns `true` for errors caused by the arguments of a call rather than by the store.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            RepositoryError::MissingIdentifier(_)
                | RepositoryError::InvalidCursor(_)
                | RepositoryError::InvalidFilter(_)
        )
    }
}

/// A specialized `Result` type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
