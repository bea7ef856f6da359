//! envs.sh adapter.
//!
//! envs.sh answers with a plain-text URL. The link handed to the user gets a
//! synthesized `IMG<date><n><ext>` file name appended so chat clients render
//! it as an image.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use url::Url;

use super::{absolute_link, excerpt, file_name, mime_for, read_asset, ImageHost, UploadError};

pub const DEFAULT_ENDPOINT: &str = "https://envs.sh/";

pub struct EnvsHost {
    client: reqwest::Client,
    endpoint: String,
}

impl EnvsHost {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

/// `IMG<YYYYMMDD><0..999><ext>`, keeping the source extension (default `.jpg`)
pub fn synthesize_file_name(location: &Path) -> String {
    let date = chrono::Local::now().format("%Y%m%d");
    let suffix = rand::random::<u32>() % 1000;
    let ext = location
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| ".jpg".to_string());
    format!("IMG{date}{suffix}{ext}")
}

#[async_trait]
impl ImageHost for EnvsHost {
    fn tag(&self) -> &str {
        "envs"
    }

    fn display_name(&self) -> &str {
        "Envs.sh"
    }

    async fn try_upload(&self, location: &Path) -> Result<Url, UploadError> {
        let bytes = read_asset(location).await?;
        let part = Part::bytes(bytes)
            .file_name(file_name(location))
            .mime_str(mime_for(location))?;
        let form = Form::new().part("file", part);

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let base = body.trim();
        if !base.starts_with("http") {
            return Err(UploadError::MalformedResponse(format!(
                "expected a URL, got {:?}",
                excerpt(base)
            )));
        }
        // Validate what the host issued before decorating it.
        absolute_link(base)?;

        let link = format!("{}/{}", base.trim_end_matches('/'), synthesize_file_name(location));
        absolute_link(&link)
    }
}
