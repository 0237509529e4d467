//! MongoDB client and collection wrapper
//!
//! Typed collections apply schema-declared indexes on creation and stamp
//! document metadata timestamps on insert.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::BeaconError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas carrying mutable metadata timestamps
pub trait Timestamped {
    fn metadata_mut(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, BeaconError> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| BeaconError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify connection with timeout
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BeaconError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, BeaconError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Timestamped,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Cheap connectivity probe for the health endpoint
    pub async fn ping(&self) -> Result<(), BeaconError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BeaconError::Database(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + Timestamped,
{
    /// Create a new collection and apply indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, BeaconError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        // Apply indexes
        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> Result<(), BeaconError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| BeaconError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, BeaconError> {
        let metadata = item.metadata_mut();
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| BeaconError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| BeaconError::Database("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, BeaconError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| BeaconError::Database(format!("Find failed: {}", e)))
    }

    /// Find many documents by filter, unordered
    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, BeaconError> {
        let cursor = self
            .inner
            .find(filter)
            .await
            .map_err(|e| BeaconError::Database(format!("Find failed: {}", e)))?;

        collect_cursor(cursor).await
    }

    /// Find documents by filter with a sort order and optional limit
    pub async fn find_sorted(
        &self,
        filter: Document,
        sort: Document,
        limit: Option<i64>,
    ) -> Result<Vec<T>, BeaconError> {
        let options = FindOptions::builder().sort(sort).limit(limit).build();

        let cursor = self
            .inner
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| BeaconError::Database(format!("Find failed: {}", e)))?;

        collect_cursor(cursor).await
    }

    /// Count documents matching a filter
    pub async fn count(&self, filter: Document) -> Result<u64, BeaconError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| BeaconError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult, BeaconError> {
        self.inner
            .update_one(filter, update.into())
            .await
            .map_err(|e| BeaconError::Database(format!("Update failed: {}", e)))
    }

    /// Update one document and return the post-update state
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<Option<T>, BeaconError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.inner
            .find_one_and_update(filter, update.into())
            .with_options(options)
            .await
            .map_err(|e| BeaconError::Database(format!("Update failed: {}", e)))
    }

    /// Get the underlying collection for advanced operations
    pub fn inner(&self) -> &Collection<T> {
        &self.inner
    }
}

/// Drain a cursor, skipping documents that fail to decode
async fn collect_cursor<T>(cursor: mongodb::Cursor<T>) -> Result<Vec<T>, BeaconError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    use futures_util::StreamExt;

    let results: Vec<T> = cursor
        .filter_map(|doc| async {
            match doc {
                Ok(d) => Some(d),
                Err(e) => {
                    error!("Error reading document: {}", e);
                    None
                }
            }
        })
        .collect()
        .await;

    Ok(results)
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance
}
