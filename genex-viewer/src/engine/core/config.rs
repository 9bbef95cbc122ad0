use bevy::prelude::*;
use constants::endpoints::{
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_URL, REQUEST_TIMEOUT_VAR, SERVER_URL_VAR,
    STARTUP_IMAGE_VAR,
};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for the viewer.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Base URL the stage endpoints are resolved against.
    pub server_url: String,
    /// Per-request timeout. Native builds only; browsers apply their own.
    pub request_timeout: Duration,
    /// Image selected on startup, native builds only.
    pub startup_image: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            startup_image: None,
        }
    }
}

impl ViewerConfig {
    /// Read configuration from the process environment.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The page that hosts the viewer also serves the stage endpoints.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let origin = web_sys::window().and_then(|window| window.location().origin().ok());
        match origin {
            Some(server_url) => Self {
                server_url,
                ..Self::default()
            },
            None => {
                warn!("Page origin unavailable, using {}", DEFAULT_SERVER_URL);
                Self::default()
            }
        }
    }

    /// Build configuration from any key lookup; unset or invalid keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(SERVER_URL_VAR).filter(|url| !url.trim().is_empty()) {
            config.server_url = url.trim().to_string();
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(
                    "Ignoring {}={:?}, expected a positive number of seconds",
                    REQUEST_TIMEOUT_VAR, raw
                ),
            }
        }

        config.startup_image = lookup(STARTUP_IMAGE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(ViewerConfig::from_lookup(|_| None), ViewerConfig::default());
    }

    #[test]
    fn reads_every_setting() {
        let config = ViewerConfig::from_lookup(lookup_from(&[
            (SERVER_URL_VAR, " http://genex.local:9000 "),
            (REQUEST_TIMEOUT_VAR, "30"),
            (STARTUP_IMAGE_VAR, "photos/photo.png"),
        ]));

        assert_eq!(config.server_url, "http://genex.local:9000");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.startup_image, Some(PathBuf::from("photos/photo.png")));
    }

    #[test]
    fn invalid_timeouts_keep_the_default() {
        for raw in ["0", "soon", "-5"] {
            let config = ViewerConfig::from_lookup(lookup_from(&[(REQUEST_TIMEOUT_VAR, raw)]));
            assert_eq!(
                config.request_timeout,
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
            );
        }
    }
}
