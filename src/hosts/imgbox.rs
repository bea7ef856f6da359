//! imgbox.com adapter.
//!
//! imgbox has no public API key. An upload is a three step session:
//! 1. `GET /` for the CSRF meta tag and the session cookie
//! 2. `POST /ajax/token/generate` for an upload token and a gallery
//! 3. multipart `POST /upload/process` with the file under `files[]`

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use url::Url;

use super::{absolute_link, excerpt, file_name, mime_for, read_asset, ImageHost, UploadError};

pub const DEFAULT_BASE_URL: &str = "https://imgbox.com";

#[allow(clippy::expect_used)]
static CSRF_META: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<meta\s+[^>]*name="csrf-token"[^>]*content="([^"]+)""#).expect("valid csrf regex"));

#[derive(Debug, Deserialize)]
struct UploadToken {
    token_id: serde_json::Value,
    token_secret: String,
    gallery_id: String,
    gallery_secret: String,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    #[serde(default)]
    files: Vec<ProcessedFile>,
}

#[derive(Debug, Deserialize)]
struct ProcessedFile {
    original_url: Option<String>,
    url: Option<String>,
}

struct Session {
    csrf_token: String,
    cookie: String,
}

pub struct ImgboxHost {
    client: reqwest::Client,
    base_url: String,
}

impl ImgboxHost {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_endpoint(client, DEFAULT_BASE_URL)
    }

    pub fn with_endpoint(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn open_session(&self) -> Result<Session, UploadError> {
        let response = self.client.get(format!("{}/", self.base_url)).send().await?;
        let status = response.status();
        let cookie = session_cookie(response.headers());
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let csrf_token = extract_csrf_token(&body)
            .ok_or_else(|| UploadError::MalformedResponse("csrf-token meta tag not found".to_string()))?;
        Ok(Session { csrf_token, cookie })
    }

    async fn generate_token(&self, session: &Session) -> Result<UploadToken, UploadError> {
        let response = self
            .client
            .post(format!("{}/ajax/token/generate", self.base_url))
            .header("X-CSRF-Token", &session.csrf_token)
            .header(COOKIE, &session.cookie)
            .form(&[("gallery", "true"), ("gallery_title", ""), ("comments_enabled", "0")])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse(format!("token: {e}")))
    }
}

/// Pulls the token out of `<meta name="csrf-token" content="...">`
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_META
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Folds every `Set-Cookie` into a single `Cookie` header value
fn session_cookie(headers: &HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn token_id_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ImageHost for ImgboxHost {
    fn tag(&self) -> &str {
        "imgbox"
    }

    fn display_name(&self) -> &str {
        "Imgbox"
    }

    async fn try_upload(&self, location: &Path) -> Result<Url, UploadError> {
        let bytes = read_asset(location).await?;
        let session = self.open_session().await?;
        let token = self.generate_token(&session).await?;

        let part = Part::bytes(bytes)
            .file_name(file_name(location))
            .mime_str(mime_for(location))?;
        let form = Form::new()
            .text("token_id", token_id_text(&token.token_id))
            .text("token_secret", token.token_secret)
            .text("content_type", "1")
            .text("thumbnail_size", "100c")
            .text("gallery_id", token.gallery_id)
            .text("gallery_secret", token.gallery_secret)
            .text("comments_enabled", "0")
            .part("files[]", part);

        let response = self
            .client
            .post(format!("{}/upload/process", self.base_url))
            .header("X-CSRF-Token", &session.csrf_token)
            .header(COOKIE, &session.cookie)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let processed: ProcessResponse =
            serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse(format!("upload: {e}")))?;
        let file = processed
            .files
            .into_iter()
            .next()
            .ok_or_else(|| UploadError::MalformedResponse("no files in upload response".to_string()))?;

        let link = file
            .original_url
            .or(file.url)
            .ok_or_else(|| UploadError::MalformedResponse("uploaded file has no URL".to_string()))?;
        absolute_link(&link)
    }
}
