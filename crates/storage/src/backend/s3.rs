//! S3-compatible object store.
//!
//! This module provides an [`ObjectStore`] implementation for S3-compatible
//! services including AWS S3, Backblaze B2, Tigris (Fly.io), MinIO and
//! others.
//!
//! # Credentials
//!
//! Credentials come from the standard AWS provider chain (environment,
//! `~/.aws/credentials`, SSO, instance metadata...). A named profile can be
//! selected explicitly, in which case it is resolved eagerly so that a typo
//! fails the run before any work starts instead of failing every file.

use crate::backend::ObjectInfoStream;
use crate::error::{ErrorKind, Result};
use crate::models::content_type_for;
use crate::{ObjectInfo, ObjectStore, ObjectTags, RemoteMetadata};
use async_stream::stream;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_s3::{
    Client,
    config::{Region, retry::RetryConfig},
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
};
use exn::{OptionExt, ResultExt};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Generous default for concurrent S3 requests.
const DEFAULT_CONCURRENT_REQUESTS: usize = 100;

/// Client selectors, usually straight from the command line.
#[derive(Debug, Clone, Default)]
pub struct S3Options {
    /// Named profile from the shared AWS config/credentials files
    pub profile: Option<String>,
    /// AWS region or provider-specific region (e.g., "us-west-004" for Backblaze)
    pub region: Option<String>,
    /// Custom endpoint URL for S3-compatible services
    pub endpoint: Option<String>,
}

/// S3-compatible object store.
///
/// # Examples
///
/// ```no_run
/// use photosync_storage::backend::{S3Options, S3Store};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = S3Options {
///     profile: Some("photos".to_string()),
///     region: Some("us-west-004".to_string()),
///     endpoint: Some("https://s3.us-west-004.backblazeb2.com".to_string()),
/// };
/// let store = S3Store::connect("b2", &options).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Store {
    name: String,
    client: Client,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl S3Store {
    /// Build a client from the AWS provider chain and the given selectors.
    ///
    /// # Errors
    /// Returns [`ErrorKind::Credentials`] if a profile was requested and its
    /// credentials cannot be resolved.
    pub async fn connect(name: impl Into<String>, options: &S3Options) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &options.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;
        if let Some(profile) = &options.profile {
            let provider =
                sdk_config.credentials_provider().ok_or_raise(|| ErrorKind::Credentials(profile.clone()))?;
            provider.provide_credentials().await.or_raise(|| ErrorKind::Credentials(profile.clone()))?;
        }
        let mut config_builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            // Configure retry policy with exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4));
        if let Some(endpoint_url) = &options.endpoint {
            // Use path-style addressing for better compatibility with
            // S3-compatible services (Backblaze, MinIO, etc.)
            config_builder = config_builder.endpoint_url(endpoint_url).force_path_style(true);
        }
        Ok(Self::from_client(name, Client::from_conf(config_builder.build())))
    }

    /// Wrap an already-configured client.
    pub fn from_client(name: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            client,
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    /// Acquire a rate limiter permit before making an S3 API call. The
    /// semaphore is never closed, so the error arm is unreachable.
    async fn acquire_permit(&self) -> Option<SemaphorePermit<'_>> {
        self.rate_limiter.acquire().await.ok()
    }

    /// Map an SDK failure onto something the caller can act on. Anything that
    /// isn't clearly about permissions or throttling is a network error.
    fn classify<E>(err: SdkError<E>, subject: &str) -> ErrorKind
    where
        E: std::error::Error + 'static,
    {
        match err.raw_response().map(|response| response.status().as_u16()) {
            Some(401 | 403) => ErrorKind::PermissionDenied(subject.to_string()),
            Some(429 | 503) => ErrorKind::Throttled(subject.to_string()),
            _ => ErrorKind::Network(DisplayErrorContext(&err).to_string()),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &str {
        &self.name
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<Option<RemoteMetadata>> {
        let _permit = self.acquire_permit().await;
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(output) => Ok(Some(output.metadata().cloned().unwrap_or_default())),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(None),
            Err(err) => exn::bail!(Self::classify(err, key)),
        }
    }

    fn list_stream<'a>(&'a self, bucket: &'a str, prefix: &'a str) -> ObjectInfoStream<'a> {
        Box::pin(stream! {
            let mut continuation: Option<String> = None;
            loop {
                let permit = self.acquire_permit().await;
                let response = self
                    .client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(continuation.take())
                    .send()
                    .await;
                drop(permit);
                let response = match response {
                    Ok(response) => response,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::classify(err, prefix)));
                        return;
                    },
                };
                for object in response.contents() {
                    let Some(key) = object.key() else { continue };
                    let size = object.size().and_then(|s| u64::try_from(s).ok()).unwrap_or(0);
                    let info = ObjectInfo::new(key, size);
                    yield Ok(match object.last_modified() {
                        Some(modified) => info.with_last_modified(modified.secs()),
                        None => info,
                    });
                }
                match (response.is_truncated(), response.next_continuation_token()) {
                    (Some(true), Some(token)) => continuation = Some(token.to_string()),
                    _ => break,
                }
            }
        })
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path, tags: &ObjectTags) -> Result<()> {
        let body = ByteStream::from_path(path).await.map_err(|e| ErrorKind::Io(std::io::Error::other(e)))?;
        let mut request =
            self.client.put_object().bucket(bucket).key(key).body(body).set_metadata(Some(tags.to_metadata()));
        if let Some(content_type) = content_type_for(path) {
            request = request.content_type(content_type);
        }
        let _permit = self.acquire_permit().await;
        request.send().await.map_err(|err| Self::classify(err, key))?;
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        let _permit = self.acquire_permit().await;
        self.client.delete_object().bucket(bucket).key(key).send().await.map_err(|err| Self::classify(err, key))?;
        Ok(())
    }
}
