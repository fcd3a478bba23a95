use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc, oid::ObjectId};
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use serde::Deserialize;
use tracing::{debug, trace};
use docrepo_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{RepositoryError, RepositoryResult},
    query::{Expr, Query, QueryVisitor, SortDirection},
};

use crate::query::MongoQueryTranslator;


fn persistence(err: mongodb::error::Error) -> RepositoryError {
    RepositoryError::Persistence(err.to_string())
}

/// Server-side limit for a page size. Sizes beyond `i64::MAX` saturate; a negative limit
/// would ask the server for a single batch.
fn find_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(uri: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(uri, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn translate(filter: &Expr) -> RepositoryResult<Document> {
        MongoQueryTranslator.visit_expr(filter)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_document(&self, collection: &str, document: Document) -> RepositoryResult<ObjectId> {
        let result = self.get_collection(collection)
            .insert_one(document)
            .await
            .map_err(persistence)?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| RepositoryError::Persistence(format!(
                "inserted `_id` {} is not an object id",
                result.inserted_id,
            )))?;
        trace!(collection, %id, "inserted document");

        Ok(id)
    }

    async fn update_document(&self, collection: &str, filter: Expr, fields: Document) -> RepositoryResult<u64> {
        let filter = Self::translate(&filter)?;

        // Servers before 5.0 reject an empty `$set`; matching is all that is left to report.
        if fields.is_empty() {
            let matched = self.get_collection(collection)
                .count_documents(filter)
                .await
                .map_err(persistence)?;

            return Ok(matched.min(1));
        }

        let result = self.get_collection(collection)
            .update_one(filter, doc! { "$set": fields })
            .await
            .map_err(persistence)?;
        trace!(collection, matched = result.matched_count, "updated document");

        Ok(result.matched_count)
    }

    async fn delete_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_many(Self::translate(&filter)?)
                .await
                .map_err(persistence)?
                .deleted_count
        )
    }

    async fn count_documents(&self, collection: &str, filter: Expr) -> RepositoryResult<u64> {
        self.get_collection(collection)
            .count_documents(Self::translate(&filter)?)
            .await
            .map_err(persistence)
    }

    async fn query_documents(&self, collection: &str, query: Query) -> RepositoryResult<Vec<Document>> {
        let mut options = FindOptions::default();

        if let Some(limit) = query.limit {
            options.limit = Some(find_limit(limit));
        }
        if let Some(sort) = &query.sort {
            options.sort = Some(doc! {
                sort.field.clone(): match sort.direction {
                    SortDirection::Asc => 1,
                    SortDirection::Desc => -1,
                }
            })
        }

        let filter = match &query.filter {
            Some(expr) => Self::translate(expr)?,
            None => doc! {},
        };

        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(persistence)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(persistence)
    }

    async fn shutdown(self) -> RepositoryResult<()> {
        debug!(database = %self.database, "shutting down mongodb client");
        self.client.shutdown().await;

        Ok(())
    }
}

/// Connection settings for a [`MongoDbStore`].
///
/// Deserializable, so it can be embedded in an application's configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MongoDbConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Database holding the entity collections.
    pub database: String,
    /// Name reported to the server in the connection handshake.
    #[serde(default)]
    pub app_name: Option<String>,
}

impl MongoDbConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Initialization`] if the JSON does not describe a configuration.
    pub fn from_json(json: &str) -> RepositoryResult<Self> {
        serde_json::from_str(json).map_err(|e| RepositoryError::Initialization(e.to_string()))
    }
}

pub struct MongoDbStoreBuilder {
    config: MongoDbConfig,
}

impl MongoDbStoreBuilder {
    pub fn new(uri: &str, database: &str) -> Self {
        Self::from_config(MongoDbConfig {
            uri: uri.to_string(),
            database: database.to_string(),
            app_name: None,
        })
    }

    pub fn from_config(config: MongoDbConfig) -> Self {
        Self { config }
    }

    pub fn with_app_name(mut self, app_name: &str) -> Self {
        self.config.app_name = Some(app_name.to_string());
        self
    }

    pub fn config(&self) -> &MongoDbConfig {
        &self.config
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> RepositoryResult<Self::Backend> {
        let mut options = ClientOptions::parse(&self.config.uri)
            .await
            .map_err(|e| RepositoryError::Initialization(e.to_string()))?;
        options.app_name = self.config.app_name;

        debug!(database = %self.config.database, "connecting to mongodb");

        Ok(MongoDbStore::new(
            Client::with_options(options)
                .map_err(|e| RepositoryError::Initialization(e.to_string()))?,
            self.config.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_limits_saturate_instead_of_wrapping() {
        assert_eq!(find_limit(10), 10);
        assert_eq!(find_limit(usize::MAX), i64::MAX);
    }

    #[test]
    fn config_from_json() {
        let config = MongoDbConfig::from_json(
            r#"{ "uri": "mongodb://localhost:27017", "database": "app", "app_name": "api" }"#,
        )
        .unwrap();

        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "app");
        assert_eq!(config.app_name.as_deref(), Some("api"));
    }

    #[test]
    fn app_name_is_optional() {
        let config =
            MongoDbConfig::from_json(r#"{ "uri": "mongodb://db", "database": "app" }"#).unwrap();

        assert_eq!(config.app_name, None);
    }

    #[test]
    fn malformed_config_is_an_initialization_error() {
        let err = MongoDbConfig::from_json(r#"{ "uri": 1 }"#).unwrap_err();

        assert!(matches!(err, RepositoryError::Initialization(_)));
    }

    #[test]
    fn builder_overrides_app_name() {
        let builder = MongoDbStore::builder("mongodb://db", "app").with_app_name("worker");

        assert_eq!(
            builder.config(),
            &MongoDbConfig {
                uri: "mongodb://db".into(),
                database: "app".into(),
                app_name: Some("worker".into()),
            }
        );
    }
}
