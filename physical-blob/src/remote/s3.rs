/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::types::BucketCannedAcl;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use super::{
    BlobStore, ContainerProperties, ListPage, Marker, PublicAccess, RemoteError, RemoteErrorKind,
};
use crate::config::Config;
use crate::error;
use crate::types::ContainerHandle;

/// Region used to sign requests against S3 compatible endpoints.
const SIGNING_REGION: &str = "us-east-1";

/// Name reported as the source of the static credentials.
const CREDENTIALS_PROVIDER_NAME: &str = "physical-blob";

/// A [`BlobStore`] speaking the S3 API.
///
/// The container maps to a bucket and the account name/key pair to a static access key.
/// Requests use path style addressing against the configured endpoint.
///
/// NOTE: S3 has no container level public access setting or metadata on `HeadBucket`, so
/// [`BlobStore::container_properties`] only reports existence.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    container: ContainerHandle,
}

impl S3BlobStore {
    /// Create a store using an explicit S3 client.
    pub fn new(client: aws_sdk_s3::Client, container: ContainerHandle) -> Self {
        Self { client, container }
    }

    /// Create a store with a client built from the resolved backend configuration.
    ///
    /// Fails if the configuration has no explicit endpoint. Endpoints derived from a cloud
    /// environment point at a blob service that does not speak the S3 API.
    pub async fn from_config(config: &Config) -> Result<Self, error::Error> {
        if !config.has_explicit_endpoint() {
            return Err(error::invalid_config(format!(
                "an S3 compatible 'arm_endpoint' must be set, {} derived from {} is not one",
                config.endpoint(),
                config.environment()
            )));
        }

        let credentials = aws_sdk_s3::config::Credentials::new(
            config.container().account(),
            config.account_key(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );
        let shared_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::from_static(SIGNING_REGION))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint())
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(true)
            .build();
        tracing::debug!(
            "created S3 client for container {} at {}",
            config.container(),
            config.endpoint()
        );
        Ok(Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            config.container().clone(),
        ))
    }

    fn bucket(&self) -> &str {
        self.container.name()
    }
}

/// Classify an SDK error.
///
/// `modeled` gets the first chance to recognize a modeled service error, after that the
/// service reason code decides.
fn classify<E>(
    err: SdkError<E, HttpResponse>,
    modeled: impl FnOnce(&E) -> Option<RemoteErrorKind>,
) -> RemoteError
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
{
    let kind = match &err {
        SdkError::ServiceError(context) => {
            modeled(context.err()).unwrap_or_else(|| kind_from_code(context.err().code()))
        }
        SdkError::ConstructionFailure(_) => {
            RemoteErrorKind::Service("ConstructionFailure".to_owned())
        }
        _ => RemoteErrorKind::Transport,
    };
    RemoteError::new(kind, err)
}

fn kind_from_code(code: Option<&str>) -> RemoteErrorKind {
    match code {
        Some("NoSuchKey") => RemoteErrorKind::BlobNotFound,
        Some("NoSuchBucket") => RemoteErrorKind::ContainerNotFound,
        // `BucketAlreadyExists` means another account owns the name
        Some("BucketAlreadyOwnedByYou") => RemoteErrorKind::ContainerAlreadyExists,
        Some(code) => RemoteErrorKind::Service(code.to_owned()),
        None => RemoteErrorKind::Service("Unknown".to_owned()),
    }
}

fn get_object_kind(err: &GetObjectError) -> Option<RemoteErrorKind> {
    err.is_no_such_key().then_some(RemoteErrorKind::BlobNotFound)
}

fn head_bucket_kind(err: &HeadBucketError) -> Option<RemoteErrorKind> {
    err.is_not_found().then_some(RemoteErrorKind::ContainerNotFound)
}

fn create_bucket_kind(err: &CreateBucketError) -> Option<RemoteErrorKind> {
    err.is_bucket_already_owned_by_you()
        .then_some(RemoteErrorKind::ContainerAlreadyExists)
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn container(&self) -> &ContainerHandle {
        &self.container
    }

    async fn upload(&self, name: &str, data: Bytes) -> Result<(), RemoteError> {
        let content_length = data.len() as i64;
        self.client
            .put_object()
            .bucket(self.bucket())
            .key(name)
            .content_length(content_length)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| classify(err, |_| None))?;
        Ok(())
    }

    async fn download(&self, name: &str) -> Result<ByteStream, RemoteError> {
        let output = self
            .client
            .get_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|err| classify(err, get_object_kind))?;
        Ok(output.body)
    }

    async fn delete(&self, name: &str) -> Result<(), RemoteError> {
        // S3 deletes are idempotent, there are no snapshots to include
        self.client
            .delete_object()
            .bucket(self.bucket())
            .key(name)
            .send()
            .await
            .map_err(|err| classify(err, |_| None))?;
        Ok(())
    }

    async fn container_properties(&self) -> Result<ContainerProperties, RemoteError> {
        self.client
            .head_bucket()
            .bucket(self.bucket())
            .send()
            .await
            .map_err(|err| classify(err, head_bucket_kind))?;
        Ok(ContainerProperties::default())
    }

    async fn create_container(
        &self,
        access: PublicAccess,
        metadata: HashMap<String, String>,
    ) -> Result<(), RemoteError> {
        let acl = match access {
            PublicAccess::None => BucketCannedAcl::Private,
            PublicAccess::Blob | PublicAccess::Container => BucketCannedAcl::PublicRead,
        };
        if !metadata.is_empty() {
            tracing::debug!(
                "ignoring {} container metadata entries, not supported by S3 buckets",
                metadata.len()
            );
        }
        self.client
            .create_bucket()
            .bucket(self.bucket())
            .acl(acl)
            .send()
            .await
            .map_err(|err| classify(err, create_bucket_kind))?;
        Ok(())
    }

    async fn list_page(
        &self,
        prefix: &str,
        marker: Marker,
        max_results: i32,
    ) -> Result<ListPage, RemoteError> {
        if !marker.not_done() {
            return Ok(ListPage::default());
        }

        let output = self
            .client
            .list_objects_v2()
            .bucket(self.bucket())
            .prefix(prefix)
            .max_keys(max_results)
            .set_continuation_token(marker.token().map(str::to_owned))
            .send()
            .await
            .map_err(|err| classify(err, |_| None))?;

        let names = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_owned))
            .collect();
        let is_truncated =
            output.is_truncated().unwrap_or(false) && output.next_continuation_token().is_some();
        let next_marker = match output.next_continuation_token {
            Some(token) if is_truncated => Marker::Token(token),
            _ => Marker::Done,
        };

        Ok(ListPage { names, next_marker })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_s3::error::{ErrorMetadata, SdkError};
    use aws_sdk_s3::operation::create_bucket::{CreateBucketError, CreateBucketOutput};
    use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
    use aws_sdk_s3::operation::head_bucket::HeadBucketError;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::operation::put_object::PutObjectError;
    use aws_sdk_s3::primitives::ByteStream;
    use aws_sdk_s3::types::error::{
        BucketAlreadyExists, BucketAlreadyOwnedByYou, NoSuchKey, NotFound,
    };
    use aws_sdk_s3::types::{BucketCannedAcl, Object};
    use aws_smithy_mocks_experimental::{mock, mock_client, RuleMode};
    use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
    use aws_smithy_runtime_api::http::StatusCode;
    use aws_smithy_types::body::SdkBody;

    use super::{
        classify, create_bucket_kind, get_object_kind, head_bucket_kind, kind_from_code,
        S3BlobStore,
    };
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::remote::{BlobStore, Marker, PublicAccess, RemoteErrorKind};
    use crate::types::ContainerHandle;

    fn container() -> ContainerHandle {
        ContainerHandle::new("account", "test-bucket")
    }

    fn service_error<E>(err: E, status: u16) -> SdkError<E, HttpResponse> {
        let response = HttpResponse::new(StatusCode::try_from(status).unwrap(), SdkBody::empty());
        SdkError::service_error(err, response)
    }

    fn meta(code: &str) -> ErrorMetadata {
        ErrorMetadata::builder().code(code).message(code).build()
    }

    #[test]
    fn test_classify_missing_key() {
        let err = service_error(
            GetObjectError::NoSuchKey(NoSuchKey::builder().meta(meta("NoSuchKey")).build()),
            404,
        );
        let err = classify(err, get_object_kind);
        assert_eq!(&RemoteErrorKind::BlobNotFound, err.kind());
    }

    #[test]
    fn test_classify_keeps_reason_code() {
        let err = service_error(GetObjectError::generic(meta("AccessDenied")), 403);
        let err = classify(err, get_object_kind);
        assert_eq!(
            &RemoteErrorKind::Service("AccessDenied".to_owned()),
            err.kind()
        );
    }

    #[test]
    fn test_classify_missing_bucket() {
        let err = service_error(
            HeadBucketError::NotFound(NotFound::builder().build()),
            404,
        );
        let err = classify(err, head_bucket_kind);
        assert_eq!(&RemoteErrorKind::ContainerNotFound, err.kind());
    }

    #[test]
    fn test_classify_bucket_owned_by_us() {
        let err = service_error(
            CreateBucketError::BucketAlreadyOwnedByYou(
                BucketAlreadyOwnedByYou::builder()
                    .meta(meta("BucketAlreadyOwnedByYou"))
                    .build(),
            ),
            409,
        );
        let err = classify(err, create_bucket_kind);
        assert_eq!(&RemoteErrorKind::ContainerAlreadyExists, err.kind());
    }

    #[test]
    fn test_classify_bucket_owned_by_someone_else() {
        let err = service_error(
            CreateBucketError::BucketAlreadyExists(
                BucketAlreadyExists::builder()
                    .meta(meta("BucketAlreadyExists"))
                    .build(),
            ),
            409,
        );
        let err = classify(err, create_bucket_kind);
        assert_eq!(
            &RemoteErrorKind::Service("BucketAlreadyExists".to_owned()),
            err.kind()
        );
    }

    #[test]
    fn test_classify_transport_failure() {
        let err: SdkError<PutObjectError, HttpResponse> =
            SdkError::timeout_error("connection timed out");
        let err = classify(err, |_| None);
        assert_eq!(&RemoteErrorKind::Transport, err.kind());
    }

    #[tokio::test]
    async fn test_download_body() {
        let get_object = mock!(aws_sdk_s3::Client::get_object)
            .match_requests(|r| r.bucket() == Some("test-bucket") && r.key() == Some("k"))
            .then_output(|| {
                GetObjectOutput::builder()
                    .body(ByteStream::from_static(b"every adolescent dog goes bonkers early"))
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
        let store = S3BlobStore::new(client, container());

        let body = store.download("k").await.unwrap();
        let data = body.collect().await.unwrap().into_bytes();
        assert_eq!(&b"every adolescent dog goes bonkers early"[..], &data[..]);
    }

    #[tokio::test]
    async fn test_create_bucket_private() {
        let create_bucket = mock!(aws_sdk_s3::Client::create_bucket)
            .match_requests(|r| {
                r.bucket() == Some("test-bucket") && r.acl() == Some(&BucketCannedAcl::Private)
            })
            .then_output(|| CreateBucketOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&create_bucket]);
        let store = S3BlobStore::new(client, container());

        store
            .create_container(PublicAccess::None, HashMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_pages() {
        let page1 = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| {
                r.prefix() == Some("b/") && r.continuation_token().is_none() && r.max_keys() == Some(2)
            })
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("b/c").build())
                    .contents(Object::builder().key("b/d").build())
                    .is_truncated(true)
                    .next_continuation_token("token1")
                    .build()
            });
        let page2 = mock!(aws_sdk_s3::Client::list_objects_v2)
            .match_requests(|r| r.continuation_token() == Some("token1"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(Object::builder().key("b/e/f").build())
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&page1, &page2]);
        let store = S3BlobStore::new(client, container());

        let first = store.list_page("b/", Marker::Start, 2).await.unwrap();
        assert_eq!(vec!["b/c", "b/d"], first.names);
        assert_eq!(Marker::Token("token1".to_owned()), first.next_marker);

        let second = store.list_page("b/", first.next_marker, 2).await.unwrap();
        assert_eq!(vec!["b/e/f"], second.names);
        assert_eq!(Marker::Done, second.next_marker);

        // no request for an exhausted cursor
        let done = store.list_page("b/", Marker::Done, 2).await.unwrap();
        assert!(done.names.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_requires_explicit_endpoint() {
        let builder = Config::builder()
            .container("test-bucket")
            .account_name("account")
            .account_key("key");

        let derived = builder.clone().build().unwrap();
        let err = S3BlobStore::from_config(&derived).await.unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());

        let explicit = builder.endpoint("http://127.0.0.1:9000").build().unwrap();
        let store = S3BlobStore::from_config(&explicit).await.unwrap();
        assert_eq!("test-bucket", store.container().name());
    }

    #[test]
    fn test_kind_from_code() {
        assert_eq!(RemoteErrorKind::BlobNotFound, kind_from_code(Some("NoSuchKey")));
        assert_eq!(
            RemoteErrorKind::ContainerNotFound,
            kind_from_code(Some("NoSuchBucket"))
        );
        assert_eq!(
            RemoteErrorKind::ContainerAlreadyExists,
            kind_from_code(Some("BucketAlreadyOwnedByYou"))
        );
        assert_eq!(
            RemoteErrorKind::Service("BucketAlreadyExists".to_owned()),
            kind_from_code(Some("BucketAlreadyExists"))
        );
        assert_eq!(
            RemoteErrorKind::Service("SlowDown".to_owned()),
            kind_from_code(Some("SlowDown"))
        );
        assert_eq!(
            RemoteErrorKind::Service("Unknown".to_owned()),
            kind_from_code(None)
        );
    }
}
