// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod state;

use config::ClientConfig;
use state::AppState;

fn main() {
    let config = ClientConfig::from_env();
    let state = AppState::new(config).expect("failed to build HTTP client");

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_clipboard_manager::init())
        .manage(state)
        .invoke_handler(tauri::generate_handler![
            commands::login,
            commands::submit_task,
            commands::fetch_history,
            commands::history_next_page,
            commands::history_previous_page,
            commands::history_search,
            commands::fetch_thumbnail,
            commands::load_stats,
            commands::export_log,
            commands::publish_link,
            commands::delete_log,
            commands::open_link,
            commands::list_export_files,
            commands::read_export_file,
            commands::copy_to_clipboard,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
