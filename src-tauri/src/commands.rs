use log::{error, info};
use strum::IntoEnumIterator;
use tauri::{command, AppHandle, State};

use crate::api::ApiClient;
use crate::forms::{BannerInput, BannerPatch, UploadRequest, VideoInput};
use crate::models::{Banner, MediaFolder, MediaVideo, Photo};
use crate::settings;
use crate::state::AppState;
use crate::uploads::{self, EditorUploader};

fn api_client(app_state: &AppState) -> Result<ApiClient, String> {
    Ok(app_state.api.lock().map_err(|e| e.to_string())?.clone())
}

// ---- banners ----

#[command]
pub async fn list_banners(app_state: State<'_, AppState>) -> Result<Vec<Banner>, String> {
    let store = &app_state.banners;
    if store.is_fresh().map_err(|e| e.to_string())? {
        if let Some(items) = store.read().map_err(|e| e.to_string())? {
            return Ok(items);
        }
    }

    let api = api_client(&app_state)?;
    let ticket = store.begin_refresh().map_err(|e| e.to_string())?;
    let items = api.list_banners().await.map_err(|e| e.to_string())?;

    if !store
        .complete_refresh(ticket, items.clone())
        .map_err(|e| e.to_string())?
    {
        // A mutation landed while the fetch was in flight; its optimistic
        // view is newer than this response.
        if let Some(current) = store.read().map_err(|e| e.to_string())? {
            return Ok(current);
        }
    }
    Ok(items)
}

#[command]
pub async fn create_banner(
    app_state: State<'_, AppState>,
    input: BannerInput,
) -> Result<Banner, String> {
    input.validate().map_err(|e| e.to_string())?;

    let api = api_client(&app_state)?;
    let mut input = input;
    input.thumbnail_image = uploads::resolve_image_reference(&api, &input.thumbnail_image)
        .await
        .map_err(|e| e.to_string())?;

    let txn = app_state.banners.begin().map_err(|e| e.to_string())?;
    match api.create_banner(&input).await {
        Ok(created) => {
            // Newest banner goes to the top, with the id and timestamps the
            // server assigned.
            let row = created.clone();
            txn.apply(move |items| items.insert(0, row))
                .map_err(|e| e.to_string())?;
            txn.commit().map_err(|e| e.to_string())?;
            info!("banner {} created", created.id);
            Ok(created)
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("create banner failed: {e}");
            Err(e.to_string())
        }
    }
}

#[command]
pub async fn update_banner(
    app_state: State<'_, AppState>,
    id: String,
    patch: BannerPatch,
) -> Result<Banner, String> {
    patch.validate().map_err(|e| e.to_string())?;

    let api = api_client(&app_state)?;
    let mut patch = patch;
    if let Some(reference) = patch.thumbnail_image.take() {
        let url = uploads::resolve_image_reference(&api, &reference)
            .await
            .map_err(|e| e.to_string())?;
        patch.thumbnail_image = Some(url);
    }

    let txn = app_state.banners.begin().map_err(|e| e.to_string())?;
    let local = patch.clone();
    let target = id.clone();
    txn.apply(move |items| {
        if let Some(banner) = items.iter_mut().find(|b| b.id == target) {
            local.apply_to(banner);
        }
    })
    .map_err(|e| e.to_string())?;

    match api.patch_banner(&id, &patch).await {
        Ok(updated) => {
            // Adopt the server's copy; updatedAt diverges from the
            // optimistic row.
            let row = updated.clone();
            txn.apply(move |items| {
                if let Some(banner) = items.iter_mut().find(|b| b.id == row.id) {
                    *banner = row.clone();
                }
            })
            .map_err(|e| e.to_string())?;
            txn.commit().map_err(|e| e.to_string())?;
            Ok(updated)
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("update banner {id} failed: {e}");
            Err(e.to_string())
        }
    }
}

/// Flip a banner's visibility. `is_active` is the target value the row's
/// switch was flipped to, computed from the row the user acted on.
#[command]
pub async fn toggle_banner(
    app_state: State<'_, AppState>,
    id: String,
    is_active: bool,
) -> Result<(), String> {
    let api = api_client(&app_state)?;
    let txn = app_state.banners.begin().map_err(|e| e.to_string())?;
    let target = id.clone();
    txn.apply(move |items| {
        if let Some(banner) = items.iter_mut().find(|b| b.id == target) {
            banner.is_active = is_active;
        }
    })
    .map_err(|e| e.to_string())?;

    match api.patch_banner(&id, &BannerPatch::toggle(is_active)).await {
        Ok(_) => {
            txn.commit().map_err(|e| e.to_string())?;
            Ok(())
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("toggle banner {id} failed: {e}");
            Err(e.to_string())
        }
    }
}

#[command]
pub async fn delete_banner(app_state: State<'_, AppState>, id: String) -> Result<(), String> {
    let api = api_client(&app_state)?;
    let txn = app_state.banners.begin().map_err(|e| e.to_string())?;
    let target = id.clone();
    txn.apply(move |items| items.retain(|b| b.id != target))
        .map_err(|e| e.to_string())?;

    match api.delete_banner(&id).await {
        Ok(()) => {
            txn.commit().map_err(|e| e.to_string())?;
            info!("banner {id} deleted");
            Ok(())
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("delete banner {id} failed: {e}");
            Err(e.to_string())
        }
    }
}

// ---- media videos ----

#[command]
pub async fn list_videos(app_state: State<'_, AppState>) -> Result<Vec<MediaVideo>, String> {
    let store = &app_state.videos;
    if store.is_fresh().map_err(|e| e.to_string())? {
        if let Some(items) = store.read().map_err(|e| e.to_string())? {
            return Ok(items);
        }
    }

    let api = api_client(&app_state)?;
    let ticket = store.begin_refresh().map_err(|e| e.to_string())?;
    let items = api.list_videos().await.map_err(|e| e.to_string())?;

    if !store
        .complete_refresh(ticket, items.clone())
        .map_err(|e| e.to_string())?
    {
        if let Some(current) = store.read().map_err(|e| e.to_string())? {
            return Ok(current);
        }
    }
    Ok(items)
}

#[command]
pub async fn get_video(app_state: State<'_, AppState>, id: String) -> Result<MediaVideo, String> {
    let api = api_client(&app_state)?;
    api.get_video(&id).await.map_err(|e| e.to_string())
}

#[command]
pub async fn create_video(
    app_state: State<'_, AppState>,
    input: VideoInput,
) -> Result<MediaVideo, String> {
    input.validate().map_err(|e| e.to_string())?;

    let api = api_client(&app_state)?;
    let txn = app_state.videos.begin().map_err(|e| e.to_string())?;
    match api.create_video(&input).await {
        Ok(created) => {
            let row = created.clone();
            txn.apply(move |items| items.insert(0, row))
                .map_err(|e| e.to_string())?;
            txn.commit().map_err(|e| e.to_string())?;
            info!("video {} created", created.id);
            Ok(created)
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("create video failed: {e}");
            Err(e.to_string())
        }
    }
}

#[command]
pub async fn update_video(
    app_state: State<'_, AppState>,
    id: String,
    input: VideoInput,
) -> Result<MediaVideo, String> {
    input.validate().map_err(|e| e.to_string())?;

    let api = api_client(&app_state)?;
    let txn = app_state.videos.begin().map_err(|e| e.to_string())?;
    let local = input.clone();
    let target = id.clone();
    txn.apply(move |items| {
        if let Some(video) = items.iter_mut().find(|v| v.id == target) {
            local.apply_to(video);
        }
    })
    .map_err(|e| e.to_string())?;

    match api.put_video(&id, &input).await {
        Ok(updated) => {
            let row = updated.clone();
            txn.apply(move |items| {
                if let Some(video) = items.iter_mut().find(|v| v.id == row.id) {
                    *video = row.clone();
                }
            })
            .map_err(|e| e.to_string())?;
            txn.commit().map_err(|e| e.to_string())?;
            Ok(updated)
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("update video {id} failed: {e}");
            Err(e.to_string())
        }
    }
}

#[command]
pub async fn delete_video(app_state: State<'_, AppState>, id: String) -> Result<(), String> {
    let api = api_client(&app_state)?;
    let txn = app_state.videos.begin().map_err(|e| e.to_string())?;
    let target = id.clone();
    txn.apply(move |items| items.retain(|v| v.id != target))
        .map_err(|e| e.to_string())?;

    match api.delete_video(&id).await {
        Ok(()) => {
            txn.commit().map_err(|e| e.to_string())?;
            info!("video {id} deleted");
            Ok(())
        }
        Err(e) => {
            txn.rollback().map_err(|e| e.to_string())?;
            error!("delete video {id} failed: {e}");
            Err(e.to_string())
        }
    }
}

// ---- photos & uploads ----

#[command]
pub async fn upload_photos(
    app_state: State<'_, AppState>,
    paths: Vec<String>,
    folder: MediaFolder,
) -> Result<Vec<Photo>, String> {
    let api = api_client(&app_state)?;
    let request = UploadRequest { paths, folder };
    let photos = uploads::upload_photos(&api, &request)
        .await
        .map_err(|e| e.to_string())?;
    info!("uploaded {} photo(s) to {}", photos.len(), request.folder);
    Ok(photos)
}

#[command]
pub async fn list_photos(
    app_state: State<'_, AppState>,
    folder: Option<MediaFolder>,
) -> Result<Vec<Photo>, String> {
    let api = api_client(&app_state)?;
    api.list_photos(folder).await.map_err(|e| e.to_string())
}

#[command]
pub async fn resolve_image_reference(
    app_state: State<'_, AppState>,
    reference: String,
) -> Result<String, String> {
    let api = api_client(&app_state)?;
    uploads::resolve_image_reference(&api, &reference)
        .await
        .map_err(|e| e.to_string())
}

#[command]
pub async fn upload_editor_image(
    app_state: State<'_, AppState>,
    path: String,
) -> Result<String, String> {
    let api = api_client(&app_state)?;
    let uploader: EditorUploader = app_state
        .editor_uploader
        .lock()
        .map_err(|e| e.to_string())?
        .clone();
    uploads::upload_editor_image(api.http(), &uploader, &path)
        .await
        .map_err(|e| e.to_string())
}

// ---- settings & lookups ----

#[command]
pub fn folder_options() -> Vec<String> {
    MediaFolder::iter().map(|f| f.to_string()).collect()
}

#[command]
pub async fn get_api_base_url(app_state: State<'_, AppState>) -> Result<String, String> {
    Ok(api_client(&app_state)?.base_url().to_string())
}

#[command]
pub async fn set_api_base_url(
    app: AppHandle,
    app_state: State<'_, AppState>,
    url: String,
) -> Result<(), String> {
    let url = url.trim().to_string();
    if !url.starts_with("http") {
        return Err("API base URL must start with http(s)".to_string());
    }

    settings::persist_base_url(&app, &url)?;
    {
        let mut client = app_state.api.lock().map_err(|e| e.to_string())?;
        *client = ApiClient::new(url.clone());
    }

    // Everything cached came from the old server.
    app_state.banners.invalidate().map_err(|e| e.to_string())?;
    app_state.videos.invalidate().map_err(|e| e.to_string())?;
    info!("API base URL switched to {url}");
    Ok(())
}
