//! Identifier resolution for entities and raw documents.
//!
//! Entities expose their identifier through [`Entity::id`](crate::entity::Entity::id); raw
//! documents carry it under the reserved [`ID_KEY`]. For any entity `e`,
//! `document_id(&e.to_document()?)` equals `entity_id(&e)`, the codec refuses to encode entities
//! for which that does not hold.

use bson::{Bson, Document, oid::ObjectId};

use crate::{
    entity::Entity,
    error::{RepositoryError, RepositoryResult},
};

/// Reserved document key holding the identifier.
pub const ID_KEY: &str = "_id";

/// Returns the identifier of an entity, or `None` if it has not been persisted yet.
pub fn entity_id<E: Entity>(entity: &E) -> Option<ObjectId> {
    entity.id().copied()
}

/// Reads the identifier of a raw document.
///
/// A missing or `null` identifier yields `None`. A string identifier is accepted in its
/// 24-character hex form.
///
/// # Errors
///
/// Returns [`RepositoryError::Decoding`] if the identifier holds any other kind of value.
pub fn document_id(document: &Document) -> RepositoryResult<Option<ObjectId>> {
    match document.get(ID_KEY) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::ObjectId(id)) => Ok(Some(*id)),
        Some(Bson::String(hex)) => ObjectId::parse_str(hex)
            .map(Some)
            .map_err(|e| RepositoryError::Decoding(format!("invalid `{ID_KEY}` {hex:?}: {e}"))),
        Some(other) => Err(RepositoryError::Decoding(format!(
            "`{ID_KEY}` holds {:?}, expected an object id",
            other.element_type(),
        ))),
    }
}

/// Parses a caller-supplied value as an identifier.
///
/// Accepts an object id or its hex string form.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidCursor`] for anything else.
pub fn parse_id(value: &Bson) -> RepositoryResult<ObjectId> {
    match value {
        Bson::ObjectId(id) => Ok(*id),
        Bson::String(hex) => ObjectId::parse_str(hex)
            .map_err(|e| RepositoryError::InvalidCursor(format!("{hex:?}: {e}"))),
        other => Err(RepositoryError::InvalidCursor(format!(
            "{:?} is not an identifier",
            other.element_type(),
        ))),
    }
}
