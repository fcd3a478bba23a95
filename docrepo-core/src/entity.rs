//! Core traits for entities and their conversion to and from documents.
//!
//! An [`Entity`] is an application type persisted as one document in one collection. The
//! [`EntityExt`] extension trait is the entity codec: a direct structural mapping between the
//! entity and a [`bson::Document`], without an intermediate text form.

use bson::{Bson, Document, de::deserialize_from_bson, oid::ObjectId, ser::serialize_to_bson};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{RepositoryError, RepositoryResult},
    id::{ID_KEY, document_id},
};

/// Core trait that all entities handled by a repository must implement.
///
/// Every entity designates exactly one identifier field of type `Option<ObjectId>`. The field
/// must serialize under the reserved document key [`ID_KEY`](crate::id::ID_KEY) (`_id`), which is
/// what `#[serde(rename = "_id")]` achieves. It stays `None` until the store assigns an
/// identifier on first insert.
///
/// The `Default` value supplies the fields a stored document lacks when it is decoded.
///
/// # Deriving
///
/// `#[derive(Entity)]` from the `docrepo` crate generates this impl from an `#[entity(id)]`
/// field tag. Hand-written impls are equivalent:
///
/// ```ignore
/// use bson::oid::ObjectId;
/// use docrepo::entity::Entity;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
///     pub id: Option<ObjectId>,
///     pub name: String,
/// }
///
/// impl Entity for User {
///     fn id(&self) -> Option<&ObjectId> {
///         self.id.as_ref()
///     }
///
///     fn collection_name() -> &'static str {
///         "User"
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Returns the identifier of this entity, or `None` if it was never persisted.
    fn id(&self) -> Option<&ObjectId>;

    /// Returns the name of the collection this entity type is stored in.
    fn collection_name() -> &'static str;
}

/// Extension trait converting entities to and from documents.
///
/// Automatically implemented for every [`Entity`]. Unknown document fields are dropped on
/// decode; fields absent from the document take their value from the entity's `Default`.
pub trait EntityExt: Entity {
    /// Encodes this entity into a document.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Encoding`] if the entity does not serialize to a document, or
    /// if its identifier field is not serialized under `_id`.
    fn to_document(&self) -> RepositoryResult<Document>;

    /// Decodes an entity from a stored document.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Decoding`] if a stored value does not fit the target field.
    fn from_document(document: Document) -> RepositoryResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_document(&self) -> RepositoryResult<Document> {
        let document = match serialize_to_bson(self)
            .map_err(|e| RepositoryError::Encoding(e.to_string()))?
        {
            Bson::Document(document) => document,
            other => {
                return Err(RepositoryError::Encoding(format!(
                    "{} encoded to {:?}, expected a document",
                    E::collection_name(),
                    other.element_type(),
                )));
            }
        };

        let encoded = document_id(&document).map_err(|e| RepositoryError::Encoding(e.to_string()))?;
        if encoded.as_ref() != self.id() {
            return Err(RepositoryError::Encoding(format!(
                "identifier of {} is not serialized under `{}`",
                E::collection_name(),
                ID_KEY,
            )));
        }

        Ok(document)
    }

    fn from_document(document: Document) -> RepositoryResult<Self> {
        let mut filled = match serialize_to_bson(&E::default())
            .map_err(|e| RepositoryError::Decoding(e.to_string()))?
        {
            Bson::Document(defaults) => defaults,
            _ => Document::new(),
        };
        // Stored values win; the defaults only cover fields the document lacks.
        for (key, value) in document {
            filled.insert(key, value);
        }

        deserialize_from_bson(Bson::Document(filled))
            .map_err(|e| RepositoryError::Decoding(e.to_string()))
    }
}
