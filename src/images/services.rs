use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::{error::AppError, state::AppState};

/// Logos larger than this are refused.
pub const MAX_LOGO_BYTES: usize = 5 * 1024 * 1024;

pub struct FetchedImage {
    pub body: Bytes,
    pub content_type: String,
}

/// Downloads an image hosted elsewhere so it can be re-uploaded to our store.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedImage>;
}

#[derive(Clone)]
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<FetchedImage> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetch {}", url))?
            .error_for_status()
            .with_context(|| format!("fetch {} status", url))?;

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
            .unwrap_or_else(|| "application/octet-stream".into());

        if resp.content_length().is_some_and(|len| len as usize > MAX_LOGO_BYTES) {
            anyhow::bail!("image larger than {} bytes", MAX_LOGO_BYTES);
        }
        let body = resp.bytes().await.context("read image body")?;
        if body.len() > MAX_LOGO_BYTES {
            anyhow::bail!("image larger than {} bytes", MAX_LOGO_BYTES);
        }
        Ok(FetchedImage { body, content_type })
    }
}

pub(crate) fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// Lowercase, whitespace runs collapsed to '-', anything unsafe for a key dropped.
pub fn slugify(name: &str) -> String {
    lazy_static! {
        static ref WS_RE: Regex = Regex::new(r"\s+").unwrap();
        static ref UNSAFE_RE: Regex = Regex::new(r"[^a-z0-9_.-]").unwrap();
    }
    let lowered = name.trim().to_lowercase();
    let dashed = WS_RE.replace_all(&lowered, "-");
    let slug = UNSAFE_RE.replace_all(&dashed, "").to_string();
    if slug.is_empty() {
        "logo".into()
    } else {
        slug
    }
}

pub fn logo_key(name: &str, at: OffsetDateTime) -> String {
    let millis = at.unix_timestamp_nanos() / 1_000_000;
    format!("tool-logos/{}_{}", millis, slugify(name))
}

/// Download the image at `source_url`, store it under `tool-logos/` and return its store URL.
pub async fn rehost_logo(st: &AppState, tool_name: &str, source_url: &str) -> Result<String, AppError> {
    let image = st.images.fetch(source_url).await.map_err(|e| {
        warn!(error = %e, source_url, "logo fetch failed");
        AppError::field("logo_url", "Could not fetch an image from this URL")
    })?;

    if ext_from_mime(&image.content_type).is_none() {
        warn!(content_type = %image.content_type, source_url, "logo is not an image");
        return Err(AppError::field("logo_url", "URL does not point to a supported image"));
    }

    let key = logo_key(tool_name, OffsetDateTime::now_utc());
    st.storage
        .put_object(&key, image.body, &image.content_type)
        .await
        .map_err(|e| {
            error!(error = %e, %key, "logo upload failed");
            AppError::Upstream("logo upload failed".into())
        })?;

    let url = st.storage.object_url(&key);
    info!(%key, source_url, "logo re-hosted");
    Ok(url)
}

/// Remove a logo we host. Failures are logged and swallowed.
pub async fn delete_logo_best_effort(st: &AppState, logo_url: &str) {
    let Some(key) = st.storage.key_from_url(logo_url) else {
        debug!(logo_url, "logo not hosted by us; nothing to delete");
        return;
    };
    if let Err(e) = st.storage.delete_object(&key).await {
        error!(error = %e, %key, "logo delete failed; continuing");
    }
}
