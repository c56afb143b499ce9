//! Input payloads for the create/update forms. Validation runs before any
//! network call; the server re-validates on its own.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Banner, MediaFolder, MediaVideo};

pub const MAX_UPLOAD_FILES: usize = 10;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be a date in YYYY-MM-DD form")]
    InvalidDate(&'static str),
    #[error("select between 1 and {MAX_UPLOAD_FILES} images")]
    BadFileCount,
    #[error("{0} is not an image file")]
    NotAnImage(String),
}

fn require(field: &'static str, value: &str) -> Result<(), FormError> {
    if value.trim().is_empty() {
        return Err(FormError::Required(field));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    pub thumbnail_image: String,
    pub toptitle: String,
    pub title: String,
    pub bottomtitle: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl BannerInput {
    pub fn validate(&self) -> Result<(), FormError> {
        require("banner image", &self.thumbnail_image)?;
        require("top title", &self.toptitle)?;
        require("main title", &self.title)?;
        require("bottom title", &self.bottomtitle)?;
        Ok(())
    }
}

/// Field-wise banner update; absent fields are left untouched by the
/// server. A patch carrying only `isActive` is the status toggle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toptitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottomtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl BannerPatch {
    pub fn toggle(is_active: bool) -> Self {
        BannerPatch {
            is_active: Some(is_active),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if let Some(v) = &self.thumbnail_image {
            require("banner image", v)?;
        }
        if let Some(v) = &self.toptitle {
            require("top title", v)?;
        }
        if let Some(v) = &self.title {
            require("main title", v)?;
        }
        if let Some(v) = &self.bottomtitle {
            require("bottom title", v)?;
        }
        Ok(())
    }

    /// The expected local effect of this patch, mirrored onto a cached row.
    pub fn apply_to(&self, banner: &mut Banner) {
        if let Some(v) = &self.thumbnail_image {
            banner.thumbnail_image = v.clone();
        }
        if let Some(v) = &self.toptitle {
            banner.toptitle = v.clone();
        }
        if let Some(v) = &self.title {
            banner.title = v.clone();
        }
        if let Some(v) = &self.bottomtitle {
            banner.bottomtitle = v.clone();
        }
        if let Some(v) = self.is_active {
            banner.is_active = v;
        }
    }
}

/// Used for both create and full update; the video endpoint replaces the
/// whole record on PUT.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInput {
    pub folder: MediaFolder,
    pub video_url: String,
    pub title: String,
    pub date: String,
}

impl VideoInput {
    pub fn validate(&self) -> Result<(), FormError> {
        require("video URL", &self.video_url)?;
        require("video title", &self.title)?;
        require("publish date", &self.date)?;
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| FormError::InvalidDate("publish date"))?;
        Ok(())
    }

    pub fn apply_to(&self, video: &mut MediaVideo) {
        video.folder = self.folder;
        video.video_url = self.video_url.clone();
        video.title = self.title.clone();
        video.date = self.date.clone();
    }
}

/// A batch of image files headed for the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub paths: Vec<String>,
    pub folder: MediaFolder,
}

impl UploadRequest {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.paths.is_empty() || self.paths.len() > MAX_UPLOAD_FILES {
            return Err(FormError::BadFileCount);
        }
        for path in &self.paths {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            if mime.type_() != mime_guess::mime::IMAGE {
                return Err(FormError::NotAnImage(path.clone()));
            }
        }
        Ok(())
    }
}
