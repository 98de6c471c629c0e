// SPDX-License-Identifier: GPL-3.0-or-later

use url::Url;

use crate::error::{HttpError, Result};

/// GET request addressed the way import servers are configured:
/// scheme, `host[:port]` and a path including the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn url(&self) -> Result<Url> {
        let scheme = if self.scheme.is_empty() {
            "http"
        } else {
            self.scheme.as_str()
        };
        let separator = if self.path.starts_with('/') { "" } else { "/" };
        let raw = format!("{}://{}{}{}", scheme, self.host, separator, self.path);
        Url::parse(&raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))
    }

    /// Response cache key: the URL followed by the headers sorted by
    /// lowercased name, so a token or user agent gets its own entry.
    pub fn cache_key(&self) -> Result<String> {
        let mut headers: Vec<(String, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.as_str()))
            .collect();
        headers.sort();
        let mut key = self.url()?.to_string();
        for (name, value) in headers {
            key.push('\n');
            key.push_str(&name);
            key.push_str(": ");
            key.push_str(value);
        }
        Ok(key)
    }
}

/// Downloaded picture with the MIME type reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub url: String,
}
