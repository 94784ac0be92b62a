use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    /// Public URL an uploaded object is served from.
    fn object_url(&self, key: &str) -> String;
    /// Inverse of `object_url`; `None` for URLs this store did not hand out.
    fn key_from_url(&self, url: &str) -> Option<String>;
}

/// Shared `object_url`/`key_from_url` logic for stores addressed by a base URL.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

pub(crate) fn strip_base(base: &str, url: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    url.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|key| !key.is_empty())
        .map(|key| key.split(['?', '#']).next().unwrap_or(key).to_string())
}

#[derive(Clone)]
pub struct Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl Storage {
    pub async fn new(cfg: &StorageConfig, region: &str) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            public_url: cfg.public_url.clone(),
        })
    }
}

#[async_trait]
impl StorageClient for Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .context("s3 delete_object")?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        strip_base(&self.public_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_and_key_are_inverse() {
        let base = "https://cdn.example.com/toolstack/";
        let url = join_url(base, "tool-logos/1700000000000_ripgrep");
        assert_eq!(url, "https://cdn.example.com/toolstack/tool-logos/1700000000000_ripgrep");
        assert_eq!(
            strip_base(base, &url).as_deref(),
            Some("tool-logos/1700000000000_ripgrep")
        );
    }

    #[test]
    fn foreign_urls_have_no_key() {
        let base = "https://cdn.example.com/toolstack";
        assert_eq!(strip_base(base, "https://elsewhere.org/logo.png"), None);
        assert_eq!(strip_base(base, "https://cdn.example.com/toolstack/"), None);
    }

    #[test]
    fn query_string_is_dropped_from_key() {
        let base = "https://cdn.example.com/b";
        assert_eq!(
            strip_base(base, "https://cdn.example.com/b/users_avatar/x.svg?v=2").as_deref(),
            Some("users_avatar/x.svg")
        );
    }
}
