use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::Object;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Serialize;
use thiserror::Error;

/// Metadata about one stored object, as reported by bucket enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDescriptor {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub content_hash: String,
    pub size_bytes: i64,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object {key} not found")]
    NotFound { key: String },
    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} timed out after {}s", .timeout.as_secs())]
    TimedOut {
        operation: &'static str,
        timeout: Duration,
    },
}

impl StorageError {
    pub fn transport(operation: &'static str, error: impl Display) -> Self {
        Self::Transport {
            operation,
            message: error.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Objects in listing order. The stream ends after the last object or at the first error.
pub type ObjectListing = BoxStream<'static, StorageResult<ObjectDescriptor>>;

/// Body chunks of one object, in arbitrary sizes.
pub type ObjectBody = BoxStream<'static, StorageResult<Bytes>>;

/// A single flat, key-addressed bucket.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    fn bucket(&self) -> &str;

    /// Lists every object whose key starts with `prefix`, with no delimiter.
    fn list_objects(&self, prefix: &str) -> ObjectListing;

    /// Opens a read stream. Fails with [`StorageError::NotFound`] before any
    /// chunk is produced when the key does not exist.
    async fn get_object(&self, key: &str) -> StorageResult<ObjectBody>;

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> StorageResult<()>;

    /// Enumerates the whole bucket and scans for an exact key match.
    /// Backends with a point lookup should override this.
    async fn object_exists(&self, key: &str) -> StorageResult<bool> {
        let mut listing = self.list_objects("");
        let mut found = false;
        while let Some(descriptor) = listing.try_next().await? {
            if descriptor.key == key {
                found = true;
            }
        }
        Ok(found)
    }
}

pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn descriptor_from_object(object: Object) -> Option<ObjectDescriptor> {
    let key = object.key()?.to_string();
    Some(ObjectDescriptor {
        key,
        last_modified: object
            .last_modified()
            .and_then(|value| DateTime::from_timestamp(value.secs(), value.subsec_nanos())),
        content_hash: object.e_tag().unwrap_or_default().trim_matches('"').to_string(),
        size_bytes: object.size().unwrap_or_default(),
    })
}

#[async_trait]
impl ObjectStorage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn list_objects(&self, prefix: &str) -> ObjectListing {
        let pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        stream::unfold(pages, |mut pages| async move {
            let page = pages.next().await?;
            let mapped = page
                .map(|page| {
                    // Entries without a key carry nothing to join on.
                    let descriptors: Vec<StorageResult<ObjectDescriptor>> = page
                        .contents()
                        .iter()
                        .cloned()
                        .filter_map(descriptor_from_object)
                        .map(Ok)
                        .collect();
                    stream::iter(descriptors)
                })
                .map_err(|err| StorageError::transport("list objects", DisplayErrorContext(err)));
            Some((mapped, pages))
        })
        .try_flatten()
        .boxed()
    }

    async fn get_object(&self, key: &str) -> StorageResult<ObjectBody> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|service_error| service_error.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    return Err(StorageError::NotFound {
                        key: key.to_string(),
                    });
                }
                return Err(StorageError::transport(
                    "get object",
                    DisplayErrorContext(err),
                ));
            }
        };

        let body = stream::unfold(response.body, |mut body| async move {
            let chunk = body.next().await?;
            let mapped = chunk.map_err(|err| StorageError::transport("read object stream", err));
            Some((mapped, body))
        });

        Ok(body.boxed())
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> StorageResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));

        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }

        request
            .send()
            .await
            .map_err(|err| StorageError::transport("put object", DisplayErrorContext(err)))?;

        Ok(())
    }

    async fn object_exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                let missing = err
                    .as_service_error()
                    .map(|service_error| service_error.is_not_found())
                    .unwrap_or(false);
                if missing {
                    Ok(false)
                } else {
                    Err(StorageError::transport(
                        "head object",
                        DisplayErrorContext(err),
                    ))
                }
            }
        }
    }
}
