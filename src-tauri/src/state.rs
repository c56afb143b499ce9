use std::sync::{Arc, Mutex};

use crate::api::{self, ApiClient};
use crate::models::{Banner, MediaVideo};
use crate::store::ListStore;
use crate::uploads::EditorUploader;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<Mutex<ApiClient>>,
    pub banners: ListStore<Banner>,
    pub videos: ListStore<MediaVideo>,
    pub editor_uploader: Arc<Mutex<EditorUploader>>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            api: Arc::new(Mutex::new(ApiClient::new(api::default_base_url()))),
            banners: ListStore::new("banners"),
            videos: ListStore::new("videos"),
            editor_uploader: Arc::new(Mutex::new(EditorUploader::default())),
        }
    }
}
