use log::debug;
use reqwest::multipart::Form;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::forms::{BannerInput, BannerPatch, VideoInput};
use crate::models::{Banner, MediaFolder, MediaVideo, Photo};

pub const BASE_URL_ENV: &str = "MEDIADESK_API_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:5010/api/v1";

/// Base URL for the content API. The environment variable wins so a dev
/// build can point at a local server without touching stored settings.
pub fn default_base_url() -> String {
    std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response missing data payload")]
    MissingData,
}

/// Every success response wraps its payload in `{ "data": ... }`; error
/// responses carry a human-readable `message`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared connection pool, also used by the editor upload adapter.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::Server {
                status,
                message: error_message(&body, status),
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        envelope.data.ok_or(ApiError::MissingData)
    }

    /// Like [`send`](Self::send) but for endpoints whose success body has
    /// no payload worth keeping (deletes).
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(ApiError::Server {
                status,
                message: error_message(&body, status),
            });
        }
        Ok(())
    }

    // ---- banners ----

    pub async fn list_banners(&self) -> Result<Vec<Banner>, ApiError> {
        debug!("GET /banners");
        self.send(self.http.get(self.url("banners"))).await
    }

    pub async fn create_banner(&self, input: &BannerInput) -> Result<Banner, ApiError> {
        self.send(self.http.post(self.url("banners")).json(input)).await
    }

    pub async fn patch_banner(&self, id: &str, patch: &BannerPatch) -> Result<Banner, ApiError> {
        self.send(
            self.http
                .patch(self.url(&format!("banners/{id}")))
                .json(patch),
        )
        .await
    }

    pub async fn delete_banner(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(&format!("banners/{id}"))))
            .await
    }

    // ---- videos ----

    pub async fn list_videos(&self) -> Result<Vec<MediaVideo>, ApiError> {
        debug!("GET /videos");
        self.send(self.http.get(self.url("videos"))).await
    }

    pub async fn get_video(&self, id: &str) -> Result<MediaVideo, ApiError> {
        self.send(self.http.get(self.url(&format!("videos/{id}"))))
            .await
    }

    pub async fn create_video(&self, input: &VideoInput) -> Result<MediaVideo, ApiError> {
        self.send(self.http.post(self.url("videos")).json(input)).await
    }

    /// Full replacement, unlike banners which are patched field-wise.
    pub async fn put_video(&self, id: &str, input: &VideoInput) -> Result<MediaVideo, ApiError> {
        self.send(
            self.http
                .put(self.url(&format!("videos/{id}")))
                .json(input),
        )
        .await
    }

    pub async fn delete_video(&self, id: &str) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(&format!("videos/{id}"))))
            .await
    }

    // ---- photos ----

    pub async fn get_photo(&self, id: &str) -> Result<Photo, ApiError> {
        self.send(self.http.get(self.url(&format!("photos/{id}"))))
            .await
    }

    pub async fn list_photos(&self, folder: Option<MediaFolder>) -> Result<Vec<Photo>, ApiError> {
        let mut request = self.http.get(self.url("photos"));
        if let Some(folder) = folder {
            request = request.query(&[("folder", folder.to_string())]);
        }
        self.send(request).await
    }

    pub async fn upload_photos(&self, form: Form) -> Result<Vec<Photo>, ApiError> {
        self.send(self.http.post(self.url("photos/create-photo")).multipart(form))
            .await
    }
}

fn error_message(body: &[u8], status: StatusCode) -> String {
    serde_json::from_slice::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("server returned {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_doubling_slashes() {
        let api = ApiClient::new("http://localhost:5010/api/v1/");
        assert_eq!(api.url("/banners"), "http://localhost:5010/api/v1/banners");
        assert_eq!(api.url("videos/v9"), "http://localhost:5010/api/v1/videos/v9");
    }

    #[test]
    fn envelope_unwraps_data() {
        let body = r#"{"data": [{"_id": "b1", "thumbnailImage": "u", "toptitle": "t",
            "title": "m", "bottomtitle": "b", "isActive": false}]}"#;
        let envelope: Envelope<Vec<Banner>> = serde_json::from_str(body).unwrap();
        let banners = envelope.data.unwrap();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0].id, "b1");
    }

    #[test]
    fn error_message_prefers_server_text() {
        let body = br#"{"message": "Banner not found"}"#;
        assert_eq!(
            error_message(body, StatusCode::NOT_FOUND),
            "Banner not found"
        );
    }

    #[test]
    fn error_message_falls_back_to_status() {
        assert_eq!(
            error_message(b"<html>oops</html>", StatusCode::BAD_GATEWAY),
            "server returned 502 Bad Gateway"
        );
    }
}
