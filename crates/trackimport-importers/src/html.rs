// SPDX-License-Identifier: GPL-3.0-or-later

//! Helpers for scraping semi-structured responses.

use std::borrow::Cow;

use encoding_rs::WINDOWS_1252;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref HTML_TAG_RE: Regex = Regex::new(r"<[^>]+>").expect("html tag regex is valid");
    static ref NUMERIC_ENTITY_RE: Regex =
        Regex::new(r"&#(?:(\d+)|[xX]([0-9a-fA-F]+));").expect("numeric entity regex is valid");
}

/// Decode the named and numeric character references used by the scraped pages.
pub fn replace_html_entities(text: &str) -> String {
    let decoded = NUMERIC_ENTITY_RE.replace_all(text, |caps: &Captures| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
            (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
            _ => None,
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });
    decoded
        .replace("&quot;", "\"")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Strip tags, decode entities and trim.
pub fn remove_html(text: &str) -> String {
    let stripped = HTML_TAG_RE.replace_all(text, "");
    replace_html_entities(&stripped).trim().to_string()
}

/// Byte offset of `needle` in `haystack` at or after `from`.
pub(crate) fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)
        .and_then(|rest| rest.find(needle))
        .map(|pos| pos + from)
}

/// Text of a response which should be UTF-8 but may come from a server
/// still using a Western single-byte charset.
pub(crate) fn decode_with_fallback(data: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(data) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(data);
            text
        }
    }
}
