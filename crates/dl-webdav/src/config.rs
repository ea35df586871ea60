use serde::Deserialize;
use url::Url;

use crate::error::{DavError, DavResult};

/// Remote store connection settings, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DavConfig {
    /// URL of the log root, e.g. `https://host/on/demandware.servlet/webdav/Sites/Logs`.
    pub base_url: String,
    /// Basic auth user. None sends no credentials.
    #[serde(default)]
    pub username: Option<String>,
    /// Basic auth password (or access key).
    #[serde(default)]
    pub password: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl DavConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Build the absolute URL for a path relative to the log root.
    ///
    /// `path` holds decoded segments; each one is percent-encoded here, so
    /// names containing `#`, `?` or `%` stay inside the path. A trailing `/`
    /// addresses a collection.
    pub fn url_for(&self, path: &str) -> DavResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| DavError::Other(format!("base URL cannot hold a path: {}", self.base_url)))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if path.trim_start_matches('/').is_empty() || path.ends_with('/') {
                segments.push("");
            }
        }
        Ok(url)
    }
}
