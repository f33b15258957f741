use tauri::{
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem, Submenu},
    AppHandle, Runtime,
};

use crate::{
    config::APP_NAME,
    shell::{ShellAction, ShellEvent},
};

const MENU_ITEM_SHOW_ID: &str = "menu:show";
const MENU_ITEM_NEW_CHAT_ID: &str = "menu:new-chat";
const MENU_ITEM_BACK_ID: &str = "menu:back";
const MENU_ITEM_FORWARD_ID: &str = "menu:forward";
const MENU_ITEM_RELOAD_ID: &str = "menu:reload";
const MENU_ITEM_FOCUS_MODE_ID: &str = "menu:focus-mode";
const MENU_ITEM_SHORTCUTS_ID: &str = "menu:shortcuts";
const MENU_ITEM_CHECK_FOR_UPDATES_ID: &str = "menu:check-for-updates";
const MENU_ITEM_OPEN_LOGS_ID: &str = "menu:open-logs";
const MENU_ITEM_QUIT_ID: &str = "menu:quit";

const MENU_ACTIONS: &[(&str, ShellAction)] = &[
    (MENU_ITEM_SHOW_ID, ShellAction::ShowWindow),
    (MENU_ITEM_NEW_CHAT_ID, ShellAction::NewChat),
    (MENU_ITEM_BACK_ID, ShellAction::GoBack),
    (MENU_ITEM_FORWARD_ID, ShellAction::GoForward),
    (MENU_ITEM_RELOAD_ID, ShellAction::Reload),
    (MENU_ITEM_FOCUS_MODE_ID, ShellAction::ToggleFullscreen),
    (MENU_ITEM_SHORTCUTS_ID, ShellAction::ShowShortcutsHelp),
    (MENU_ITEM_CHECK_FOR_UPDATES_ID, ShellAction::CheckForUpdates),
    (MENU_ITEM_OPEN_LOGS_ID, ShellAction::OpenLogs),
    (MENU_ITEM_QUIT_ID, ShellAction::Quit),
];

pub fn action_for(id: &str) -> Option<ShellAction> {
    MENU_ACTIONS
        .iter()
        .find(|(item_id, _)| *item_id == id)
        .map(|(_, action)| *action)
}

/// Shared by the app menu and the tray menu.
pub fn on_menu_event(app: &AppHandle, event: MenuEvent) {
    if let Some(action) = action_for(event.id().as_ref()) {
        super::dispatch(app, ShellEvent::Action(action));
    }
}

fn item<R: Runtime>(
    app: &AppHandle<R>,
    id: &str,
    action: ShellAction,
    accelerator: Option<&str>,
) -> tauri::Result<MenuItem<R>> {
    MenuItem::with_id(app, id, action.label(), true, accelerator)
}

// Keyboard chords for window actions are owned by the shortcut registry, so
// only Quit carries an accelerator here.
pub fn build_app_menu<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<Menu<R>> {
    let check_for_updates = item(
        app,
        MENU_ITEM_CHECK_FOR_UPDATES_ID,
        ShellAction::CheckForUpdates,
        None,
    )?;
    let quit = item(app, MENU_ITEM_QUIT_ID, ShellAction::Quit, Some("CmdOrCtrl+Q"))?;

    let new_chat = item(app, MENU_ITEM_NEW_CHAT_ID, ShellAction::NewChat, None)?;
    let back = item(app, MENU_ITEM_BACK_ID, ShellAction::GoBack, None)?;
    let forward = item(app, MENU_ITEM_FORWARD_ID, ShellAction::GoForward, None)?;
    let reload = item(app, MENU_ITEM_RELOAD_ID, ShellAction::Reload, None)?;
    let focus_mode = item(
        app,
        MENU_ITEM_FOCUS_MODE_ID,
        ShellAction::ToggleFullscreen,
        None,
    )?;

    let shortcuts = MenuItem::with_id(
        app,
        MENU_ITEM_SHORTCUTS_ID,
        "Keyboard Shortcuts",
        true,
        None::<&str>,
    )?;
    let open_logs = item(app, MENU_ITEM_OPEN_LOGS_ID, ShellAction::OpenLogs, None)?;

    Menu::with_items(
        app,
        &[
            &Submenu::with_items(
                app,
                APP_NAME,
                true,
                &[
                    &check_for_updates,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::hide(app, None)?,
                    &PredefinedMenuItem::separator(app)?,
                    &quit,
                ],
            )?,
            &Submenu::with_items(
                app,
                "Edit",
                true,
                &[
                    &PredefinedMenuItem::undo(app, None)?,
                    &PredefinedMenuItem::redo(app, None)?,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::cut(app, None)?,
                    &PredefinedMenuItem::copy(app, None)?,
                    &PredefinedMenuItem::paste(app, None)?,
                    &PredefinedMenuItem::select_all(app, None)?,
                ],
            )?,
            &Submenu::with_items(
                app,
                "View",
                true,
                &[
                    &new_chat,
                    &PredefinedMenuItem::separator(app)?,
                    &back,
                    &forward,
                    &reload,
                    &PredefinedMenuItem::separator(app)?,
                    &focus_mode,
                ],
            )?,
            &Submenu::with_items(
                app,
                "Window",
                true,
                &[
                    &PredefinedMenuItem::minimize(app, None)?,
                    &PredefinedMenuItem::maximize(app, None)?,
                    &PredefinedMenuItem::separator(app)?,
                    &PredefinedMenuItem::close_window(app, None)?,
                ],
            )?,
            &Submenu::with_items(app, "Help", true, &[&shortcuts, &open_logs])?,
        ],
    )
}

pub fn build_tray_menu<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<Menu<R>> {
    let show = MenuItem::with_id(
        app,
        MENU_ITEM_SHOW_ID,
        format!("Show {APP_NAME}"),
        true,
        None::<&str>,
    )?;
    let check_for_updates = item(
        app,
        MENU_ITEM_CHECK_FOR_UPDATES_ID,
        ShellAction::CheckForUpdates,
        None,
    )?;
    let open_logs = item(app, MENU_ITEM_OPEN_LOGS_ID, ShellAction::OpenLogs, None)?;
    let quit = item(app, MENU_ITEM_QUIT_ID, ShellAction::Quit, None)?;

    Menu::with_items(
        app,
        &[
            &show,
            &PredefinedMenuItem::separator(app)?,
            &check_for_updates,
            &open_logs,
            &PredefinedMenuItem::separator(app)?,
            &quit,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_ids_map_to_actions() {
        assert_eq!(action_for(MENU_ITEM_SHOW_ID), Some(ShellAction::ShowWindow));
        assert_eq!(action_for(MENU_ITEM_QUIT_ID), Some(ShellAction::Quit));
        assert_eq!(
            action_for(MENU_ITEM_SHORTCUTS_ID),
            Some(ShellAction::ShowShortcutsHelp)
        );
        assert_eq!(action_for("menu:unknown"), None);
    }

    #[test]
    fn menu_ids_are_unique() {
        for (index, (id, _)) in MENU_ACTIONS.iter().enumerate() {
            assert!(MENU_ACTIONS[index + 1..].iter().all(|(other, _)| other != id));
        }
    }
}
