//! Decides where a navigation target is allowed to load.
//!
//! `classify` is a pure function of the target and the allowed domain set. The
//! [`NavigationGuard`] applies its verdict: in-scope targets load in the window,
//! everything else goes to the system browser.

use std::sync::Arc;

use log::{info, warn};
use url::Url;

const EXTERNAL_SCHEMES: &[&str] = &["http", "https", "mailto"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationVerdict {
    /// Load inside the primary window.
    Inline,
    /// Cancel the in-window load and open the target in the system browser.
    ExternalBrowser,
    /// Drop the request. `classify` never returns this: every target outside the
    /// allowlist is externalized instead of silently discarded.
    Blocked,
}

/// Host suffixes whose pages may load inside the window.
///
/// Entries are lower-cased with surrounding dots stripped, so `.OpenAI.com.`
/// and `openai.com` describe the same domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedDomains {
    domains: Vec<String>,
}

impl AllowedDomains {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        set.extend(domains);
        set
    }

    pub fn extend<I, S>(&mut self, domains: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for domain in domains {
            let normalized = normalize_host(domain.as_ref());
            if normalized.is_empty() || self.domains.contains(&normalized) {
                continue;
            }
            self.domains.push(normalized);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    /// True when `host` is one of the domains or a proper subdomain of one.
    pub fn matches(&self, host: &str) -> bool {
        let host = normalize_host(host);
        if host.is_empty() {
            return false;
        }
        self.domains.iter().any(|domain| {
            host == *domain
                || (host.len() > domain.len()
                    && host.ends_with(domain.as_str())
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        })
    }
}

fn normalize_host(raw: &str) -> String {
    raw.trim().trim_matches('.').to_ascii_lowercase()
}

/// Classifies a navigation target.
///
/// Unparseable targets fail open to the external browser, never to `Inline`.
pub fn classify(target: &str, allowed: &AllowedDomains) -> NavigationVerdict {
    let Ok(url) = Url::parse(target) else {
        warn!("[desktop:nav] Unparseable navigation target {target:?}; sending to browser");
        return NavigationVerdict::ExternalBrowser;
    };
    classify_url(&url, allowed)
}

pub fn classify_url(url: &Url, allowed: &AllowedDomains) -> NavigationVerdict {
    match url.host_str() {
        Some(host) if allowed.matches(host) => NavigationVerdict::Inline,
        _ => NavigationVerdict::ExternalBrowser,
    }
}

/// Opens a URL outside the application.
pub trait ExternalOpener: Send + Sync {
    fn open(&self, url: &str) -> anyhow::Result<()>;
}

/// Applies navigation verdicts for the primary window.
///
/// Immutable after construction, so navigation callbacks can consult it without
/// taking the shell lock.
#[derive(Clone)]
pub struct NavigationGuard {
    allowed: Arc<AllowedDomains>,
    opener: Arc<dyn ExternalOpener>,
}

impl NavigationGuard {
    pub fn new(allowed: AllowedDomains, opener: Arc<dyn ExternalOpener>) -> Self {
        Self {
            allowed: Arc::new(allowed),
            opener,
        }
    }

    pub fn verdict(&self, url: &Url) -> NavigationVerdict {
        classify_url(url, &self.allowed)
    }

    /// Returns whether the window may load `url` itself. Externalized targets are
    /// handed to the opener before returning `false`.
    pub fn allow_navigation(&self, url: &Url) -> bool {
        match self.verdict(url) {
            NavigationVerdict::Inline => true,
            NavigationVerdict::ExternalBrowser => {
                self.open_external(url.as_str());
                false
            }
            NavigationVerdict::Blocked => {
                warn!("[desktop:nav] Blocked navigation to {url}");
                false
            }
        }
    }

    pub fn open_external(&self, target: &str) {
        let scheme_ok = Url::parse(target)
            .map(|url| EXTERNAL_SCHEMES.contains(&url.scheme()))
            .unwrap_or(false);
        if !scheme_ok {
            warn!("[desktop:nav] Refusing to open {target:?} externally");
            return;
        }

        info!("[desktop:nav] Opening {target} in the system browser");
        if let Err(err) = self.opener.open(target) {
            warn!("[desktop:nav] Failed to open {target} externally: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn chat_domains() -> AllowedDomains {
        AllowedDomains::new(["openai.com", "chatgpt.com", "oaistatic.com"])
    }

    #[test]
    fn classifies_against_suffix_table() {
        let domains = chat_domains();
        let cases = [
            ("https://openai.com/", NavigationVerdict::Inline),
            ("https://chat.openai.com/c/123", NavigationVerdict::Inline),
            ("https://auth.openai.com/log-in?x=1", NavigationVerdict::Inline),
            ("https://CDN.OAISTATIC.COM/assets/app.js", NavigationVerdict::Inline),
            ("https://chatgpt.com./", NavigationVerdict::Inline),
            ("http://chatgpt.com:8080/path", NavigationVerdict::Inline),
            ("https://evil-openai.com.attacker.net/", NavigationVerdict::ExternalBrowser),
            ("https://chat.openai.com.attacker.net/", NavigationVerdict::ExternalBrowser),
            ("https://notopenai.com/", NavigationVerdict::ExternalBrowser),
            ("https://openai.co/", NavigationVerdict::ExternalBrowser),
            ("https://github.com/openai.com", NavigationVerdict::ExternalBrowser),
            ("https://example.com/?next=openai.com", NavigationVerdict::ExternalBrowser),
            ("mailto:support@openai.com", NavigationVerdict::ExternalBrowser),
            ("about:blank", NavigationVerdict::ExternalBrowser),
        ];

        for (target, expected) in cases {
            assert_eq!(classify(target, &domains), expected, "target {target}");
        }
    }

    #[test]
    fn unparseable_targets_fail_open_to_the_browser() {
        let domains = chat_domains();
        for target in ["", "not a url", "openai.com", "https://", "http://[::1"] {
            assert_eq!(
                classify(target, &domains),
                NavigationVerdict::ExternalBrowser,
                "target {target:?}"
            );
        }
    }

    #[test]
    fn empty_domain_set_externalizes_everything() {
        let domains = AllowedDomains::default();
        assert_eq!(
            classify("https://chat.openai.com/", &domains),
            NavigationVerdict::ExternalBrowser
        );
    }

    #[test]
    fn domain_entries_are_normalized_and_deduplicated() {
        let domains = AllowedDomains::new([".OpenAI.com.", "openai.com", "  ", "chatgpt.com"]);
        assert_eq!(domains.iter().collect::<Vec<_>>(), vec!["openai.com", "chatgpt.com"]);
        assert!(domains.matches("api.openai.com"));
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
    }

    impl ExternalOpener for RecordingOpener {
        fn open(&self, url: &str) -> anyhow::Result<()> {
            self.opened.lock().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn guard_externalizes_out_of_scope_targets() {
        let opener = Arc::new(RecordingOpener::default());
        let guard = NavigationGuard::new(chat_domains(), opener.clone());

        let inline = Url::parse("https://chat.openai.com/").unwrap();
        let external = Url::parse("https://docs.rs/url").unwrap();

        assert!(guard.allow_navigation(&inline));
        assert!(!guard.allow_navigation(&external));
        assert_eq!(*opener.opened.lock(), vec!["https://docs.rs/url".to_string()]);
    }

    #[test]
    fn guard_never_opens_non_web_schemes() {
        let opener = Arc::new(RecordingOpener::default());
        let guard = NavigationGuard::new(chat_domains(), opener.clone());

        let blank = Url::parse("about:blank").unwrap();
        let file = Url::parse("file:///etc/passwd").unwrap();

        assert!(!guard.allow_navigation(&blank));
        assert!(!guard.allow_navigation(&file));
        assert!(opener.opened.lock().is_empty());
    }
}
