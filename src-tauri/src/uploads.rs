use std::path::Path;

use log::{error, warn};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::forms::{FormError, UploadRequest};
use crate::models::Photo;

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("upload rejected: {0}")]
    Rejected(String),
    #[error("could not resolve image reference {0}")]
    Resolve(String),
}

fn file_name_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

async fn file_part(path: &str) -> Result<Part, UploadError> {
    let data = tokio::fs::read(path).await.map_err(|source| UploadError::Read {
        path: path.to_string(),
        source,
    })?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Part::bytes(data)
        .file_name(file_name_of(path))
        .mime_str(mime.as_ref())
        .map_err(ApiError::Transport)
        .map_err(UploadError::from)
}

/// Ship a validated batch of images to the upload endpoint: one `file`
/// part per image plus a `data` part tagging the target folder, the shape
/// the endpoint's multipart parser expects.
pub async fn upload_photos(api: &ApiClient, request: &UploadRequest) -> Result<Vec<Photo>, UploadError> {
    request.validate()?;

    let mut form = Form::new();
    for path in &request.paths {
        form = form.part("file", file_part(path).await?);
    }
    form = form.text(
        "data",
        serde_json::json!({ "folder": request.folder }).to_string(),
    );

    Ok(api.upload_photos(form).await?)
}

/// Normalize an image reference to a final URL. Direct URLs pass through;
/// anything else is treated as a photo id and looked up on the server.
pub async fn resolve_image_reference(api: &ApiClient, reference: &str) -> Result<String, UploadError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(UploadError::Resolve(reference.to_string()));
    }
    if reference.starts_with("http") {
        return Ok(reference.to_string());
    }

    match api.get_photo(reference).await {
        Ok(photo) if !photo.image_url.is_empty() => Ok(photo.image_url),
        Ok(_) => Err(UploadError::Resolve(reference.to_string())),
        Err(e) => {
            warn!("photo lookup for {reference} failed: {e}");
            Err(UploadError::Resolve(reference.to_string()))
        }
    }
}

/// Third-party media host the rich-text editor uploads through. The host
/// takes an unsigned preset name with each file and answers with a hosted
/// `secure_url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorUploader {
    pub url: String,
    pub upload_preset: String,
}

impl Default for EditorUploader {
    fn default() -> Self {
        EditorUploader {
            url: "https://api.cloudinary.com/v1_1/demo/image/upload".into(),
            upload_preset: "mediadesk".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditorUploadResponse {
    secure_url: Option<String>,
    error: Option<EditorUploadFault>,
}

#[derive(Debug, Deserialize)]
struct EditorUploadFault {
    message: String,
}

pub async fn upload_editor_image(
    http: &reqwest::Client,
    uploader: &EditorUploader,
    path: &str,
) -> Result<String, UploadError> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() != mime_guess::mime::IMAGE {
        return Err(FormError::NotAnImage(path.to_string()).into());
    }

    let form = Form::new()
        .part("file", file_part(path).await?)
        .text("upload_preset", uploader.upload_preset.clone());

    let response = http
        .post(&uploader.url)
        .multipart(form)
        .send()
        .await
        .map_err(ApiError::Transport)?;
    let body: EditorUploadResponse = response.json().await.map_err(ApiError::Transport)?;

    match (body.secure_url, body.error) {
        (Some(url), _) => Ok(url),
        (None, Some(fault)) => {
            error!("editor upload failed: {}", fault.message);
            Err(UploadError::Rejected(fault.message))
        }
        (None, None) => Err(UploadError::Rejected("response carried no asset URL".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn direct_urls_pass_through_untouched() {
        let api = ApiClient::new("http://localhost:5010/api/v1");
        let url = resolve_image_reference(&api, " https://cdn.example.com/hero.jpg ")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/hero.jpg");
    }

    #[tokio::test]
    async fn blank_reference_is_a_resolution_failure() {
        let api = ApiClient::new("http://localhost:5010/api/v1");
        let err = resolve_image_reference(&api, "   ").await.unwrap_err();
        assert!(matches!(err, UploadError::Resolve(_)));
    }

    #[test]
    fn editor_response_parses_both_shapes() {
        let ok: EditorUploadResponse =
            serde_json::from_str(r#"{"secure_url": "https://res.example.com/x.jpg"}"#).unwrap();
        assert_eq!(ok.secure_url.as_deref(), Some("https://res.example.com/x.jpg"));

        let fault: EditorUploadResponse =
            serde_json::from_str(r#"{"error": {"message": "Invalid upload preset"}}"#).unwrap();
        assert_eq!(fault.error.unwrap().message, "Invalid upload preset");
    }

    #[tokio::test]
    async fn non_image_files_never_reach_the_editor_host() {
        let http = reqwest::Client::new();
        let uploader = EditorUploader::default();
        let err = upload_editor_image(&http, &uploader, "notes.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Form(FormError::NotAnImage(_))));
    }
}
