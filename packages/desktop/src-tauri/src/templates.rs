//! Static HTML and script resources rendered into the webview.

use serde_json::json;

const LOAD_ERROR_HTML: &str = include_str!("templates/load_error.html");
const SHORTCUTS_HELP_JS: &str = include_str!("templates/shortcuts_help.js");

/// Reroutes `window.open` and `target="_blank"` links into top-level
/// navigations so the navigation guard sees them.
pub const NEW_WINDOW_SHIM_JS: &str = include_str!("templates/new_window_shim.js");

/// Thin scrollbars, selectable text and visible focus outlines.
pub const DESKTOP_STYLES_JS: &str = include_str!("templates/desktop_styles.js");

pub struct LoadErrorPage<'a> {
    pub code: &'a str,
    pub description: &'a str,
    pub failed_url: &'a str,
    pub entry_url: &'a str,
}

impl LoadErrorPage<'_> {
    pub fn to_html(&self) -> String {
        fill(LOAD_ERROR_HTML, |name| match name {
            "code" => Some(self.code),
            "description" => Some(self.description),
            "failed_url" => Some(self.failed_url),
            "entry_url" => Some(self.entry_url),
            _ => None,
        })
    }

    /// Script that swaps the current document for the error page.
    pub fn to_script(&self) -> String {
        document_replace_script(&self.to_html())
    }
}

/// Replaces each `{{name}}` in `template` with the escaped value `lookup`
/// gives for it, in one pass. Substituted text is never rescanned; unknown
/// placeholders are kept verbatim.
fn fill<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        match lookup(&after[..end]) {
            Some(value) => out.push_str(&escape_html(value)),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Script that toggles the keyboard shortcut overlay on the current page.
pub fn shortcuts_help_script(entries: &[(String, &str)]) -> String {
    let rows: Vec<_> = entries
        .iter()
        .map(|(chord, label)| json!({ "chord": chord, "label": label }))
        .collect();
    SHORTCUTS_HELP_JS.replace("__SHORTCUTS__", &serde_json::Value::Array(rows).to_string())
}

pub fn document_replace_script(html: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    let literal = serde_json::Value::String(html.to_string()).to_string();
    format!("document.open();document.write({literal});document.close();")
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
