//! Photo hosting.
//!
//! Catch photos are uploaded to Cloudinary with an unsigned upload preset;
//! the public HTTPS URL that comes back is what the log stores.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::http::{build_client, join_url, read_json, HttpSettings};

const SERVICE: &str = "cloudinary";

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudinary.com";

/// Number of digest hex characters appended to a public id.
const DIGEST_LEN: usize = 12;

/// A place photos can be uploaded to.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `bytes` under `public_id` and return the public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not configured or the upload fails.
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, public_id: &str) -> Result<String>;
}

/// Cloudinary unsigned-upload client.
#[derive(Debug, Clone)]
pub struct CloudinaryHost {
    client: reqwest::Client,
    base_url: String,
    cloud_name: Option<String>,
    upload_preset: Option<String>,
    folder: Option<String>,
}

impl CloudinaryHost {
    /// Create a host client.
    ///
    /// Missing `cloud_name` or `upload_preset` are only reported when an
    /// upload is attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        cloud_name: Option<String>,
        upload_preset: Option<String>,
        folder: Option<String>,
        settings: &HttpSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(SERVICE, settings)?,
            base_url: base_url.into(),
            cloud_name,
            upload_preset,
            folder,
        })
    }

    /// Whether enough settings are present to upload.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.cloud_name.is_some() && self.upload_preset.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    secure_url: Option<String>,
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, bytes: Vec<u8>, file_name: &str, public_id: &str) -> Result<String> {
        let cloud_name = self
            .cloud_name
            .as_deref()
            .ok_or_else(|| Error::not_configured(SERVICE, "images.cloud_name is not set"))?;
        let preset = self
            .upload_preset
            .clone()
            .ok_or_else(|| Error::not_configured(SERVICE, "images.upload_preset is not set"))?;

        let url = join_url(&self.base_url, &format!("v1_1/{cloud_name}/image/upload"));
        let size = bytes.len();
        let mut form = Form::new()
            .text("upload_preset", preset)
            .text("public_id", public_id.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()));
        if let Some(folder) = &self.folder {
            form = form.text("folder", folder.clone());
        }

        debug!(public_id, size, "uploading photo");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| Error::Request {
                service: SERVICE,
                source,
            })?;

        let body: UploadResponse = read_json(SERVICE, response).await?;
        let secure_url = body
            .secure_url
            .ok_or_else(|| Error::missing(SERVICE, "secure_url"))?;
        info!(public_id, url = %secure_url, "photo uploaded");
        Ok(secure_url)
    }
}

/// Stable public id: a sanitised `prefix` plus a digest of the content.
///
/// Uploading the same photo twice under the same prefix yields the same id,
/// so the host overwrites instead of piling up copies.
#[must_use]
pub fn public_id(prefix: &str, bytes: &[u8]) -> String {
    let clean: String = prefix
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let digest = blake3::hash(bytes).to_hex();
    format!("{clean}_{}", &digest[..DIGEST_LEN])
}
