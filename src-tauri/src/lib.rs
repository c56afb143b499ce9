// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/
pub mod api;
pub mod commands;
pub mod forms;
pub mod models;
pub mod settings;
pub mod state;
pub mod store;
pub mod uploads;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(
            tauri_plugin_log::Builder::new()
                .level(log::LevelFilter::Info)
                .build(),
        )
        .plugin(tauri_plugin_store::Builder::default().build())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .manage(state::AppState::default())
        .setup(|app| {
            settings::load(app)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_banners,
            commands::create_banner,
            commands::update_banner,
            commands::toggle_banner,
            commands::delete_banner,
            commands::list_videos,
            commands::get_video,
            commands::create_video,
            commands::update_video,
            commands::delete_video,
            commands::upload_photos,
            commands::list_photos,
            commands::resolve_image_reference,
            commands::upload_editor_image,
            commands::folder_options,
            commands::get_api_base_url,
            commands::set_api_base_url
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
