// src/shell.rs
//
// The one decision the embedded-browser shell makes on its own:
// whether a navigation target stays inside the app or goes to the
// external browser. Connectivity and platform wiring live outside.
use reqwest::Url;

pub const ALLOWED_DOMAIN: &str = "tionlab.software";
pub const START_URL: &str = "https://tionlab.software/genlyz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    LoadInPlace,
    OpenExternally,
}

/// Registrable domain of a URL: the last two host labels, or three
/// when a two-letter country-code TLD follows a two-letter
/// second-level label (`example.co.uk`).
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let labels: Vec<&str> = host.split('.').rev().collect();
    if labels.len() > 2 {
        if labels[0].len() == 2 && labels[1].len() == 2 {
            return Some(format!("{}.{}.{}", labels[2], labels[1], labels[0]));
        }
        return Some(format!("{}.{}", labels[1], labels[0]));
    }
    Some(host.to_string())
}

/// Anything outside the single allow-listed domain is redirected to
/// the external browser; unparseable addresses never load in place.
pub fn navigation_action(url: &str, allowed_domain: &str) -> NavigationAction {
    match registrable_domain(url) {
        Some(domain) if domain == allowed_domain => NavigationAction::LoadInPlace,
        _ => NavigationAction::OpenExternally,
    }
}
