use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Hero banner shown on the website landing page. Identifiers and
/// timestamps are assigned by the server and never written from here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    #[serde(rename = "_id")]
    pub id: String,
    pub thumbnail_image: String,
    pub toptitle: String,
    pub title: String,
    pub bottomtitle: String,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVideo {
    #[serde(rename = "_id")]
    pub id: String,
    pub folder: MediaFolder,
    pub video_url: String,
    pub title: String,
    /// Publish date, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// An image previously uploaded to the media host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(rename = "_id")]
    pub id: String,
    pub image_url: String,
    pub folder: MediaFolder,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub created_at: String,
}

/// Folders the website groups uploads and videos under. The set is fixed;
/// dropdowns are populated from `MediaFolder::iter()`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum MediaFolder {
    Banner,
    #[serde(rename = "Media Videos")]
    #[strum(serialize = "Media Videos")]
    MediaVideos,
    Gallery,
    Events,
    Notices,
}
