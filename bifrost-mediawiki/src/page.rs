//! Abstract and image derivation over `action=parse` payloads.

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// CDN base for derived image URLs.
pub const DEFAULT_CDN_URL: &str = "https://psychonautwiki.org/";

/// Default thumbnail width in pixels.
pub const DEFAULT_THUMB_SIZE: u32 = 100;

static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").expect("valid regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static REFERENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// A thumbnail/full-size URL pair for one page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstanceImage {
    /// Thumbnail URL through the wiki's `thumb.php`.
    pub thumb: String,
    /// Canonical hashed path under `w/images/`.
    pub image: String,
}

/// Extracts a two-paragraph abstract from a `prop=text` payload.
///
/// Returns `None` when the payload does not contain parsed HTML or no
/// paragraph text survives stripping.
pub fn extract_summary(payload: &Value) -> Option<String> {
    let html = parse_text(payload)?;

    let paragraphs: Vec<String> = PARAGRAPH
        .captures_iter(&html)
        .map(|caps| {
            let text = TAG.replace_all(&caps[1], "");
            decode_entities(text.trim())
        })
        .collect();
    if paragraphs.is_empty() {
        return None;
    }

    let joined = paragraphs.join("\n");
    let without_reference = REFERENCE.replace(joined.trim(), "");
    let summary = without_reference
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join(" ");
    let summary = WHITESPACE.replace_all(&summary, " ").trim().to_owned();

    (!summary.is_empty()).then_some(summary)
}

/// The parsed-HTML body of an `action=parse&prop=text` payload.
///
/// MediaWiki serializes it either as `parse.text.*` or as a plain string
/// depending on `formatversion`.
fn parse_text(payload: &Value) -> Option<String> {
    let text = payload.get("parse")?.get("text")?;
    text.get("*")
        .and_then(Value::as_str)
        .or_else(|| text.as_str())
        .map(str::to_owned)
}

/// Derives image URL pairs from a `prop=images` payload.
///
/// Returns `None` when the `images` field is absent or not an array.
pub fn derive_images(payload: &Value, cdn_url: &str, thumb_size: u32) -> Option<Vec<SubstanceImage>> {
    let images = payload.get("parse")?.get("images")?.as_array()?;
    Some(
        images
            .iter()
            .filter_map(Value::as_str)
            .map(|name| image_urls(name, cdn_url, thumb_size))
            .collect(),
    )
}

/// Computes the thumb/image URL pair for one file name.
///
/// The canonical path nests the file under the first one and two hex
/// digits of the MD5 of its name, the way MediaWiki lays out `w/images/`.
pub fn image_urls(name: &str, cdn_url: &str, thumb_size: u32) -> SubstanceImage {
    let digest = Md5::digest(name.as_bytes());
    let hash = format!("{digest:x}");
    SubstanceImage {
        thumb: format!("{cdn_url}w/thumb.php?f={name}&width={thumb_size}"),
        image: format!("{cdn_url}w/images/{}/{}/{name}", &hash[..1], &hash[..2]),
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}
