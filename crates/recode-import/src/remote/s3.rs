//! S3 object store

use super::{GetObject, ListObjects, ListPage, ObjectStore, ObjectSummary};
use crate::error::RemoteError;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// [`ObjectStore`] backed by `aws-sdk-s3`
///
/// Listing uses `ListObjectsV2` pages; gets honor the requested version.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Wrap an existing client
    #[inline]
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Client from the standard AWS environment (profile, env vars, IMDS)
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, request: &GetObject) -> Result<Bytes, RemoteError> {
        let output = self
            .client
            .get_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_version_id(request.version.clone())
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().is_some_and(|e| e.is_no_such_key()) {
                    RemoteError::NotFound {
                        bucket: request.bucket.clone(),
                        key: request.key.clone(),
                    }
                } else {
                    RemoteError::transport(err)
                }
            })?;

        let body = output.body.collect().await.map_err(RemoteError::transport)?;
        Ok(body.into_bytes())
    }

    async fn list_objects(&self, request: &ListObjects) -> Result<ListPage, RemoteError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&request.bucket)
            .prefix(&request.prefix)
            .set_continuation_token(request.continuation_token.clone())
            .send()
            .await
            .map_err(RemoteError::transport)?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| ObjectSummary {
                    key: key.to_string(),
                    size: object.size().and_then(|s| u64::try_from(s).ok()),
                    version: None,
                })
            })
            .collect();

        Ok(ListPage {
            objects,
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    fn supports_listing(&self) -> bool {
        true
    }
}
