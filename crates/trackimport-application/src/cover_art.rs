// SPDX-License-Identifier: GPL-3.0-or-later

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::{debug, warn};
use trackimport_config::{CoverArtConfig, PictureUrlRule};

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// Converts cover page links reported by the sources into image URLs.
#[derive(Debug, Clone, Default)]
pub struct PictureUrlMapper {
    rules: Vec<(Regex, String)>,
}

impl PictureUrlMapper {
    /// Compile `rules`; a rule with an invalid pattern is skipped.
    pub fn new(rules: &[PictureUrlRule]) -> Self {
        let rules = rules
            .iter()
            .filter_map(|rule| match Regex::new(&format!("^(?:{})$", rule.pattern)) {
                Ok(regex) => Some((regex, rule.replacement.clone())),
                Err(e) => {
                    warn!(target: "batch", pattern = %rule.pattern, error = %e, "ignoring picture URL rule");
                    None
                }
            })
            .collect();
        Self { rules }
    }

    pub fn from_config(config: &CoverArtConfig) -> Self {
        Self::new(&config.picture_url_rules)
    }

    /// URL of the picture behind `url`, `None` when it cannot be derived.
    pub fn image_url(&self, url: &str) -> Option<String> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return None;
        }
        let lower = url.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Some(url.to_string());
        }

        let (regex, replacement) = self.rules.iter().find(|(regex, _)| regex.is_match(url))?;
        let mut image_url = regex.replace(url, replacement.as_str()).into_owned();
        // Redirect links carry the target URL encoded once or twice.
        if image_url.contains("%25") {
            image_url = decode(&image_url);
        }
        if image_url.contains("%2F") {
            image_url = decode(&image_url);
        }
        debug!(target: "batch", url, image_url = %image_url, "mapped cover art URL");
        Some(image_url)
    }
}

fn decode(url: &str) -> String {
    match percent_decode_str(url).decode_utf8_lossy() {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> PictureUrlMapper {
        PictureUrlMapper::from_config(&CoverArtConfig::default())
    }

    #[test]
    fn image_links_pass_through() {
        let url = "http://www.amazon.de/gp/product/B00008OUEN.jpg";
        assert_eq!(mapper().image_url(url).as_deref(), Some(url));
        let url = "https://api.discogs.com/image/R-2487778-1293847958.JPEG";
        assert_eq!(mapper().image_url(url).as_deref(), Some(url));
    }

    #[test]
    fn amazon_product_page_maps_to_image() {
        assert_eq!(
            mapper().image_url("http://www.amazon.com/dp/B00008OUEN").as_deref(),
            Some("http://images.amazon.com/images/P/B00008OUEN.01._SCLZZZZZZZ_.jpg")
        );
    }

    #[test]
    fn encoded_redirect_is_decoded() {
        let url = "http://images.google.com/imgres?imgurl=http%3A%2F%2Fexample.com%2Fcover.jpg&imgrefurl=x";
        assert_eq!(
            mapper().image_url(url).as_deref(),
            Some("http://example.com/cover.jpg")
        );
    }

    #[test]
    fn unknown_pages_have_no_image() {
        assert_eq!(mapper().image_url("http://example.com/album/7"), None);
        assert_eq!(mapper().image_url("ftp://example.com/cover.jpg"), None);

        let broken = PictureUrlMapper::new(&[PictureUrlRule {
            pattern: "([".to_string(),
            replacement: String::new(),
        }]);
        assert_eq!(broken.image_url("http://example.com/(["), None);
    }
}
