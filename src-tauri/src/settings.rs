use log::info;
use tauri::Manager;
use tauri_plugin_store::StoreExt;

use crate::api::{self, ApiClient};
use crate::state::AppState;

pub const STORE_FILE: &str = "settings.json";
const API_BASE_URL_KEY: &str = "apiBaseUrl";
const EDITOR_UPLOAD_URL_KEY: &str = "editorUploadUrl";
const EDITOR_UPLOAD_PRESET_KEY: &str = "editorUploadPreset";

fn stored_string(store: &tauri_plugin_store::Store<tauri::Wry>, key: &str) -> Option<String> {
    store.get(key).and_then(|v| v.as_str().map(String::from))
}

/// Apply persisted settings on startup. The environment variable wins over
/// the stored API base URL.
pub fn load(app: &tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let store = app.store(STORE_FILE)?;
    let state = app.state::<AppState>();

    if std::env::var(api::BASE_URL_ENV).is_err() {
        if let Some(url) = stored_string(&store, API_BASE_URL_KEY) {
            info!("using stored API base URL {url}");
            let mut client = state.api.lock().map_err(|_| "state lock poisoned")?;
            *client = ApiClient::new(url);
        }
    }

    let mut uploader = state
        .editor_uploader
        .lock()
        .map_err(|_| "state lock poisoned")?;
    if let Some(url) = stored_string(&store, EDITOR_UPLOAD_URL_KEY) {
        uploader.url = url;
    }
    if let Some(preset) = stored_string(&store, EDITOR_UPLOAD_PRESET_KEY) {
        uploader.upload_preset = preset;
    }

    Ok(())
}

pub fn persist_base_url(app: &tauri::AppHandle, url: &str) -> Result<(), String> {
    let store = app.store(STORE_FILE).map_err(|e| e.to_string())?;
    store.set(API_BASE_URL_KEY, serde_json::json!(url));
    store.save().map_err(|e| e.to_string())
}
