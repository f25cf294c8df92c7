use std::fmt;

use url::Url;

use crate::{HperfError, Result};

/// A validated request destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target(Url);

impl Target {
    /// Parse `raw` as an HTTP(S) endpoint. A missing scheme defaults to `http`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(HperfError::EmptyTarget);
        }

        // A "://" after the first path, query or fragment delimiter is not a scheme.
        let has_scheme = raw
            .find("://")
            .is_some_and(|at| !raw[..at].contains(|c| matches!(c, '/' | '?' | '#')));
        let candidate = if has_scheme {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };

        let url = Url::parse(&candidate)
            .map_err(|e| HperfError::InvalidTarget(raw.to_string(), e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(HperfError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(HperfError::InvalidTarget(raw.to_string(), "missing host".to_string()));
        }

        Ok(Self(url))
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}
