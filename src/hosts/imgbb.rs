//! ImgBB adapter (`api.imgbb.com/1/upload`)

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::{absolute_link, excerpt, file_name, mime_for, read_asset, ImageHost, UploadError};

pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    success: bool,
    data: Option<ImgbbData>,
    error: Option<ImgbbErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ImgbbData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImgbbErrorBody {
    message: Option<String>,
}

pub struct ImgbbHost {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
}

impl ImgbbHost {
    pub fn new(client: reqwest::Client, api_key: Option<SecretString>) -> Self {
        Self::with_endpoint(client, api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(client: reqwest::Client, api_key: Option<SecretString>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgbbHost {
    fn tag(&self) -> &str {
        "imgbb"
    }

    fn display_name(&self) -> &str {
        "ImgBB"
    }

    async fn try_upload(&self, location: &Path) -> Result<Url, UploadError> {
        let key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
            .ok_or(UploadError::MissingCredentials("IMGBB_API_KEY"))?;

        let bytes = read_asset(location).await?;
        let part = Part::bytes(bytes)
            .file_name(file_name(location))
            .mime_str(mime_for(location))?;
        let form = Form::new().part("image", part);

        // The key travels in the query string, so strip URLs from transport errors.
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Transport(e.without_url()))?;
        let parsed = serde_json::from_str::<ImgbbResponse>(&body);

        if !status.is_success() {
            let message = parsed
                .ok()
                .and_then(|r| r.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| excerpt(&body));
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let parsed = parsed.map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        if !parsed.success {
            let message = parsed
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(UploadError::Rejected(message));
        }

        let url = parsed
            .data
            .and_then(|data| data.url)
            .ok_or_else(|| UploadError::MalformedResponse("success without data.url".to_string()))?;
        absolute_link(&url)
    }
}
