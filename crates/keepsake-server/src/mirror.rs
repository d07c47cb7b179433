//! Client for the optional external mirror sink.
//!
//! The sink accepts a multipart upload plus a resource-type hint and
//! answers with a publicly addressable URL.  It is best-effort and never
//! authoritative: the local blob store is the source of truth, and a
//! mirror failure must not block local persistence.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Mirror request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Mirror sink answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct MirrorUploadResponse {
    url: String,
}

/// Thin client around the sink's upload endpoint.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MirrorClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Upload a copy of the bytes, returning the sink's public URL.
    pub async fn upload(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, MirrorError> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;

        let form = Form::new()
            .part("file", part)
            .text("resource_type", resource_type(content_type));

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;

        if !response.status().is_success() {
            return Err(MirrorError::Status(response.status()));
        }

        let body: MirrorUploadResponse = response.json().await?;

        debug!(name = %file_name, url = %body.url, "Mirrored upload");
        Ok(body.url)
    }
}

/// The sink only distinguishes images from videos; anything else never
/// reaches the pipeline.
fn resource_type(content_type: &str) -> &'static str {
    if content_type.starts_with("video/") {
        "video"
    } else {
        "image"
    }
}
