//! Wiki markup stripping helpers.
//!
//! Property values come back as raw wikitext. The sanitizer reduces link
//! and formatting markup to plain text; any string free of `[[`, `]]`,
//! `<sub>` and `<sup>` is a fixed point.

use once_cell::sync::Lazy;
use regex::Regex;

static LABELED_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[[^\]|]*\|([^\]]*)\]\]").expect("valid regex"));
static PLAIN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]]*)\]\]").expect("valid regex"));
static SUB_SUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?su[bp]>").expect("valid regex"));
static LINK_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\]|]*?)(?:\|[^\]]*)?\]\]").expect("valid regex"));

/// Strips link and sub/superscript markup, keeping the visible text.
///
/// `[[target|label]]` becomes `label`, `[[link]]` becomes `link`, and
/// `<sub>`/`<sup>` wrappers are removed while their inner text stays.
pub fn sanitize(input: &str) -> String {
    let text = LABELED_LINK.replace_all(input, "$1");
    let text = PLAIN_LINK.replace_all(&text, "$1");
    SUB_SUP.replace_all(&text, "").into_owned()
}

/// Collects the link targets of every `[[...]]` occurrence.
///
/// Returns an empty list when the input has no links at all.
pub fn link_targets(input: &str) -> Vec<String> {
    LINK_TARGET
        .captures_iter(input)
        .map(|caps| caps[1].to_owned())
        .collect()
}

/// Cleans an SMW class or common-name entry: the trailing `#` marker is
/// dropped and underscores become spaces.
pub fn clean_page_name(input: &str) -> String {
    input
        .trim_end_matches('#')
        .replace('_', " ")
        .trim()
        .to_owned()
}
