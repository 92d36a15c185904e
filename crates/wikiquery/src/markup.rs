//! Narrow regex extractions over raw wiki markup. These are deliberately not
//! a markup parser; they reproduce the exact splitting behavior downstream
//! consumers already depend on.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"==.*?==").unwrap());
static WIKI_LINK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[.*?\]\]").unwrap());
static WIKI_LINK_CAPTURE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[(.*?)\]\]").unwrap());
static BRACKET_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]").unwrap());
static EXTERNAL_LINK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());

/// Section headers and bodies split out of one page of markup.
///
/// `headers` and `contents` always have the same length. The first header is
/// the empty preamble header for the text before any `==` heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sections {
    pub headers: Vec<String>,
    pub contents: Vec<String>,
}

/// Splits markup into section headers and their contents.
///
/// Headers are whatever `==.*?==` matches on one line, with the surrounding
/// `==` pairs stripped and interior whitespace kept. The final section's
/// content drops the last character of the input.
pub fn sections(text: &str) -> Sections {
    let mut headers = Vec::new();
    let mut contents = Vec::new();
    let mut header = String::new();
    let mut content_start = 0;

    for found in SECTION_REGEX.find_iter(text) {
        headers.push(header);
        contents.push(text[content_start..found.start()].to_string());
        header = text[found.start() + 2..found.end() - 2].to_string();
        content_start = found.end();
    }
    headers.push(header);
    contents.push(trim_last_char(&text[content_start..]).to_string());

    Sections { headers, contents }
}

/// Extracts `[[target|display]]` links as a map of display text onto link
/// target. Links without a `|` use the target as display text; a repeated
/// display text keeps the last target seen.
pub fn wiki_links(text: &str) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for found in WIKI_LINK_REGEX.find_iter(text) {
        let interior = &text[found.start() + 2..found.end() - 2];
        let (target, display) = match interior.split_once('|') {
            Some((target, display)) => (target, display),
            None => (interior, interior),
        };
        links.insert(display.to_string(), target.to_string());
    }
    links
}

/// Extracts `[url display]` external links as a map of display text onto
/// URL. The display text is everything after the first space; without one
/// the URL doubles as its own display text.
pub fn external_links(text: &str) -> BTreeMap<String, String> {
    let mut links = BTreeMap::new();
    for found in EXTERNAL_LINK_REGEX.find_iter(text) {
        // A wiki link's interior would match too; skip spans followed by a
        // second closing bracket.
        if text.as_bytes().get(found.end()) == Some(&b']') {
            continue;
        }
        let interior = &text[found.start() + 1..found.end() - 1];
        let (url, display) = match interior.split_once(' ') {
            Some((url, display)) => (url, display),
            None => (interior, interior),
        };
        links.insert(display.to_string(), url.to_string());
    }
    links
}

/// Replaces wiki links with their display text, deletes remaining bracketed
/// spans and trims the result.
pub fn plain_text(text: &str) -> String {
    let wiki_stripped = WIKI_LINK_CAPTURE_REGEX.replace_all(text, |caps: &regex::Captures<'_>| {
        let interior = &caps[1];
        match interior.split_once('|') {
            Some((_, display)) => display.to_string(),
            None => interior.to_string(),
        }
    });
    let bracket_stripped = BRACKET_REGEX.replace_all(&wiki_stripped, "");
    bracket_stripped.trim().to_string()
}

fn trim_last_char(text: &str) -> &str {
    match text.char_indices().last() {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
