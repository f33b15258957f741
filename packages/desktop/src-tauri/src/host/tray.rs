use tauri::{
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle,
};

use crate::{
    config::APP_NAME,
    shell::{ShellAction, ShellEvent},
};

const TRAY_ID: &str = "main";

/// Tray icon with the show/updates/logs/quit menu. A left click toggles the
/// window.
pub fn build(app: &AppHandle) -> tauri::Result<()> {
    let menu = super::menu::build_tray_menu(app)?;

    let mut builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip(APP_NAME)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_menu_event(super::menu::on_menu_event)
        .on_tray_icon_event(|tray, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                super::dispatch(
                    tray.app_handle(),
                    ShellEvent::Action(ShellAction::ToggleWindow),
                );
            }
        });

    if let Some(icon) = app.default_window_icon() {
        builder = builder.icon(icon.clone());
    }

    builder.build(app)?;
    Ok(())
}
