use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::TryStreamExt;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::join::{join_assignments, AssignmentView};
use super::keys::AssignmentId;
use super::payload::{encode_document, read_document};
use crate::error::AssignmentError;
use crate::models::AssignmentRecord;
use crate::repository::{AssignmentRepository, RepositoryError};
use crate::storage::{ObjectDescriptor, ObjectStorage, StorageError};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Upper bounds on collaborator calls. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeouts {
    pub storage: Option<Duration>,
    pub database: Option<Duration>,
}

/// Serves assignment listings and payloads from the metadata repository and
/// the payload bucket. Holds no per-request state; every call re-reads both
/// sources.
pub struct AssignmentCoordinator {
    repository: Arc<dyn AssignmentRepository>,
    storage: Arc<dyn ObjectStorage>,
    timeouts: Timeouts,
}

impl AssignmentCoordinator {
    pub fn new(repository: Arc<dyn AssignmentRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            repository,
            storage,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn bucket(&self) -> &str {
        self.storage.bucket()
    }

    /// Every object in the bucket, or an error. Never a truncated listing.
    pub async fn enumerate_bucket(&self) -> Result<Vec<ObjectDescriptor>, AssignmentError> {
        let listing = self.storage.list_objects("").try_collect::<Vec<_>>();
        let objects = bounded(self.timeouts.storage, listing, |timeout| {
            StorageError::TimedOut {
                operation: "list objects",
                timeout,
            }
        })
        .await
        .map_err(|source| AssignmentError::BucketUnavailable {
            bucket: self.bucket().to_string(),
            source,
        })?;

        debug!(bucket = %self.bucket(), objects = objects.len(), "enumerated bucket");
        Ok(objects)
    }

    async fn load_records(&self) -> Result<Vec<AssignmentRecord>, AssignmentError> {
        let records = bounded(
            self.timeouts.database,
            self.repository.select_all_assignments(),
            RepositoryError::TimedOut,
        )
        .await?;
        Ok(records)
    }

    /// Joins every record with its bucket object. Both sources are read
    /// concurrently and must both succeed.
    pub async fn list_assignments(&self) -> Result<Vec<AssignmentView>, AssignmentError> {
        let (records, objects) = tokio::join!(self.load_records(), self.enumerate_bucket());
        let records = records.map_err(|err| AssignmentError::ListFailed(Box::new(err)))?;
        let objects = objects.map_err(|err| AssignmentError::ListFailed(Box::new(err)))?;

        let views = join_assignments(records, objects);
        debug!(
            assignments = views.len(),
            dangling = views
                .iter()
                .filter(|view| view.bucket_file_details.is_none())
                .count(),
            "joined assignment listing"
        );
        Ok(views)
    }

    pub async fn fetch_assignment(&self, id: &AssignmentId) -> Result<Value, AssignmentError> {
        let key = id.object_key();
        let read_error = |source: StorageError| AssignmentError::ObjectReadError {
            key: key.clone(),
            source,
        };

        let body = bounded(
            self.timeouts.storage,
            self.storage.get_object(&key),
            |timeout| StorageError::TimedOut {
                operation: "get object",
                timeout,
            },
        )
        .await
        .map_err(|err| match err {
            StorageError::NotFound { key } => AssignmentError::ObjectNotFound { key },
            other => read_error(other),
        })?;

        bounded(self.timeouts.storage, read_document(&key, body), |timeout| {
            read_error(StorageError::TimedOut {
                operation: "read object stream",
                timeout,
            })
        })
        .await
    }

    /// Unconditional put: an existing object under the same key is replaced.
    pub async fn create_assignment(
        &self,
        id: &AssignmentId,
        file: &Value,
    ) -> Result<(), AssignmentError> {
        let key = id.object_key();
        self.write_document(&key, file).await?;
        info!(assignment_id = %id, key = %key, "assignment payload saved");
        Ok(())
    }

    /// Writes only when the object already exists. The check and the write
    /// are separate calls, so a concurrent delete or create in between is
    /// not detected.
    pub async fn update_assignment(
        &self,
        id: &AssignmentId,
        file: &Value,
    ) -> Result<(), AssignmentError> {
        let key = id.object_key();
        let exists = bounded(
            self.timeouts.storage,
            self.storage.object_exists(&key),
            |timeout| StorageError::TimedOut {
                operation: "check object",
                timeout,
            },
        )
        .await
        .map_err(|source| AssignmentError::BucketUnavailable {
            bucket: self.bucket().to_string(),
            source,
        })?;

        if !exists {
            warn!(assignment_id = %id, key = %key, "update rejected: object does not exist");
            return Err(AssignmentError::AssignmentNotFound {
                id: id.to_string(),
            });
        }

        self.write_document(&key, file).await?;
        info!(assignment_id = %id, key = %key, "assignment payload updated");
        Ok(())
    }

    async fn write_document(&self, key: &str, file: &Value) -> Result<(), AssignmentError> {
        let bytes = encode_document(key, file)?;
        bounded(
            self.timeouts.storage,
            self.storage
                .put_object(key, bytes, Some(JSON_CONTENT_TYPE.to_string())),
            |timeout| StorageError::TimedOut {
                operation: "put object",
                timeout,
            },
        )
        .await
        .map_err(|source| AssignmentError::WriteFailed {
            key: key.to_string(),
            source,
        })
    }
}

async fn bounded<T, E>(
    limit: Option<Duration>,
    operation: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(Duration) -> E,
) -> Result<T, E> {
    match limit {
        None => operation.await,
        Some(limit) => match tokio::time::timeout(limit, operation).await {
            Ok(result) => result,
            Err(_) => Err(on_timeout(limit)),
        },
    }
}
