#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use desktop_gpt::{config, host, logging, shell::ShellEvent};
use log::info;

fn main() {
    let dev_mode = config::is_dev_mode();

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_updater::Builder::new().build())
        .plugin(host::hotkeys::plugin())
        .plugin(logging::plugin(dev_mode))
        .menu(|app| host::menu::build_app_menu(app))
        .on_menu_event(host::menu::on_menu_event)
        .setup(move |app| {
            host::setup(app.handle(), dev_mode)?;
            Ok(())
        })
        .on_window_event(host::on_window_event)
        .build(tauri::generate_context!())
        .expect("failed to build Tauri application");

    app.run(|app_handle, event| match event {
        tauri::RunEvent::Exit => {
            info!("[desktop] Exiting");
            host::dispatch(app_handle, ShellEvent::Exit);
        }
        #[cfg(target_os = "macos")]
        tauri::RunEvent::Reopen { .. } => {
            host::dispatch(
                app_handle,
                ShellEvent::Action(desktop_gpt::shell::ShellAction::ShowWindow),
            );
        }
        _ => {}
    });
}
