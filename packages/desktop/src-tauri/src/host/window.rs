use anyhow::{anyhow, Result};
use log::debug;
use tauri::{
    webview::PageLoadEvent, AppHandle, WebviewUrl, WebviewWindow, WebviewWindowBuilder,
};
use url::Url;

use crate::{
    config::APP_NAME,
    controller::WindowHost,
    navigation::NavigationGuard,
    shell::ShellEvent,
    templates::{DESKTOP_STYLES_JS, NEW_WINDOW_SHIM_JS},
    window_state::{WindowState, MIN_HEIGHT, MIN_WIDTH},
};

pub const MAIN_WINDOW_LABEL: &str = "main";

// A saved position must leave this much of the title bar on some monitor.
const TITLE_BAR_PROBE: (f64, f64) = (120.0, 16.0);

pub struct TauriWindow {
    app: AppHandle,
    guard: NavigationGuard,
    entry_url: Url,
    #[cfg_attr(not(feature = "devtools"), allow(dead_code))]
    devtools: bool,
    window: Option<WebviewWindow>,
}

impl TauriWindow {
    pub fn new(app: AppHandle, guard: NavigationGuard, entry_url: Url, devtools: bool) -> Self {
        Self {
            app,
            guard,
            entry_url,
            devtools,
            window: None,
        }
    }

    fn window(&self) -> Result<&WebviewWindow> {
        self.window
            .as_ref()
            .ok_or_else(|| anyhow!("main window not created"))
    }

    fn query(&self, probe: impl FnOnce(&WebviewWindow) -> tauri::Result<bool>) -> bool {
        self.window
            .as_ref()
            .and_then(|window| probe(window).ok())
            .unwrap_or(false)
    }

    fn is_on_screen(&self, x: i32, y: i32) -> bool {
        let Ok(monitors) = self.app.available_monitors() else {
            return true;
        };
        let (px, py) = (x as f64 + TITLE_BAR_PROBE.0, y as f64 + TITLE_BAR_PROBE.1);
        monitors.iter().any(|monitor| {
            let scale = monitor.scale_factor();
            let origin = monitor.position().to_logical::<f64>(scale);
            let size = monitor.size().to_logical::<f64>(scale);
            px >= origin.x
                && py >= origin.y
                && px < origin.x + size.width
                && py < origin.y + size.height
        })
    }
}

impl WindowHost for TauriWindow {
    fn create(&mut self, initial: &WindowState) -> Result<()> {
        let guard = self.guard.clone();
        let app = self.app.clone();

        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            MAIN_WINDOW_LABEL,
            WebviewUrl::External(self.entry_url.clone()),
        )
        .title(APP_NAME)
        .inner_size(initial.width as f64, initial.height as f64)
        .min_inner_size(MIN_WIDTH as f64, MIN_HEIGHT as f64)
        .maximized(initial.is_maximized)
        .visible(false)
        .initialization_script(NEW_WINDOW_SHIM_JS)
        .initialization_script(DESKTOP_STYLES_JS)
        .on_navigation(move |url| guard.allow_navigation(url))
        .on_page_load(move |_window, payload| {
            let url = payload.url().clone();
            let event = match payload.event() {
                PageLoadEvent::Started => ShellEvent::PageLoadStarted(url),
                PageLoadEvent::Finished => ShellEvent::PageLoadFinished(url),
            };
            super::dispatch(&app, event);
        });

        builder = match initial.position() {
            Some((x, y)) if self.is_on_screen(x, y) => builder.position(x as f64, y as f64),
            Some((x, y)) => {
                debug!("[desktop:window] Saved position {x},{y} is off-screen; centering");
                builder.center()
            }
            None => builder.center(),
        };

        let window = builder.build()?;

        #[cfg(feature = "devtools")]
        if self.devtools {
            window.open_devtools();
        }

        self.window = Some(window);
        Ok(())
    }

    fn show(&self) -> Result<()> {
        Ok(self.window()?.show()?)
    }

    fn hide(&self) -> Result<()> {
        Ok(self.window()?.hide()?)
    }

    fn focus(&self) -> Result<()> {
        Ok(self.window()?.set_focus()?)
    }

    fn unminimize(&self) -> Result<()> {
        Ok(self.window()?.unminimize()?)
    }

    fn destroy(&self) -> Result<()> {
        if let Some(window) = &self.window {
            window.destroy()?;
        }
        Ok(())
    }

    fn is_visible(&self) -> bool {
        self.query(|window| window.is_visible())
    }

    fn is_focused(&self) -> bool {
        self.query(|window| window.is_focused())
    }

    fn is_minimized(&self) -> bool {
        self.query(|window| window.is_minimized())
    }

    fn is_fullscreen(&self) -> bool {
        self.query(|window| window.is_fullscreen())
    }

    fn set_fullscreen(&self, fullscreen: bool) -> Result<()> {
        Ok(self.window()?.set_fullscreen(fullscreen)?)
    }

    fn navigate(&self, url: &Url) -> Result<()> {
        Ok(self.window()?.navigate(url.clone())?)
    }

    fn reload(&self) -> Result<()> {
        self.eval("window.location.reload();")
    }

    fn go_back(&self) -> Result<()> {
        self.eval("window.history.back();")
    }

    fn go_forward(&self) -> Result<()> {
        self.eval("window.history.forward();")
    }

    fn eval(&self, script: &str) -> Result<()> {
        Ok(self.window()?.eval(script)?)
    }
}
