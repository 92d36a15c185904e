use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// Envelope for `action=query` responses. Every section is optional; the
/// API only sends the ones a request asked for.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) query: QueryBody,
}

impl QueryResponse {
    pub(crate) fn from_payload(payload: &Value) -> Result<QueryResponse> {
        Ok(serde_json::from_value(payload.clone())?)
    }
}

/// The `query` body. Pages arrive as a map keyed by the page id rendered as
/// a string, with `"-1"` marking a missing or invalid title.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct QueryBody {
    #[serde(default)]
    pub(crate) normalized: Vec<TitleMapping>,
    #[serde(default)]
    pub(crate) redirects: Vec<TitleMapping>,
    #[serde(default)]
    pub(crate) pages: BTreeMap<String, PageRecord>,
    #[serde(default)]
    pub(crate) categorymembers: Vec<PageStub>,
    #[serde(default)]
    pub(crate) random: Vec<PageStub>,
}

impl QueryBody {
    /// Applies the `normalized` substitutions reported for `title`.
    pub(crate) fn normalize_title(&self, title: &str) -> String {
        apply_mappings(title.to_string(), &self.normalized)
    }

    /// Applies `normalized` substitutions, then `redirects`. Each list is
    /// scanned in order against the current form of the title, so a
    /// normalization feeds the redirect lookup.
    pub(crate) fn resolve_title(&self, title: &str) -> String {
        let normalized = apply_mappings(title.to_string(), &self.normalized);
        apply_mappings(normalized, &self.redirects)
    }

    /// The page record for `title`, after normalization and redirect
    /// substitution.
    pub(crate) fn page_for(&self, title: &str) -> Option<&PageRecord> {
        let resolved = self.resolve_title(title);
        self.pages.values().find(|page| page.title == resolved)
    }

    pub(crate) fn page_id_for(&self, title: &str) -> Option<u64> {
        self.page_for(title).and_then(|page| page.pageid)
    }

    /// Whether any returned page is a real one. Missing and invalid titles
    /// come back under the `"-1"` key or carry a `missing` marker; an absent
    /// `pages` section (inter-wiki titles) means no page at all.
    pub(crate) fn has_existing_page(&self) -> bool {
        self.pages
            .iter()
            .any(|(id, page)| id != "-1" && page.missing.is_none())
    }

    /// First returned page that is not a missing stub.
    pub(crate) fn first_present_page(&self) -> Option<&PageRecord> {
        self.pages
            .iter()
            .find(|(id, page)| *id != "-1" && page.missing.is_none())
            .map(|(_, page)| page)
    }
}

fn apply_mappings(title: String, mappings: &[TitleMapping]) -> String {
    let mut resolved = title;
    for mapping in mappings {
        if mapping.from == resolved {
            resolved = mapping.to.clone();
        }
    }
    resolved
}

/// One `from`/`to` pair from the `normalized` or `redirects` sections.
#[derive(Debug, Deserialize, Default, Clone)]
pub(crate) struct TitleMapping {
    #[serde(default)]
    pub(crate) from: String,
    #[serde(default)]
    pub(crate) to: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PageRecord {
    #[serde(default)]
    pub(crate) pageid: Option<u64>,
    #[serde(default)]
    pub(crate) title: String,
    /// Present (as an empty string) on missing pages.
    #[serde(default)]
    pub(crate) missing: Option<String>,
    #[serde(default)]
    pub(crate) lastrevid: Option<u64>,
    #[serde(default)]
    pub(crate) revisions: Vec<RevisionRecord>,
    #[serde(default)]
    pub(crate) categories: Vec<TitleRecord>,
    #[serde(default)]
    pub(crate) links: Vec<TitleRecord>,
    #[serde(default)]
    pub(crate) langlinks: Vec<LanguageLink>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct RevisionRecord {
    #[serde(default)]
    pub(crate) revid: Option<u64>,
    #[serde(default)]
    pub(crate) parentid: Option<u64>,
    #[serde(default)]
    pub(crate) user: Option<String>,
    #[serde(default)]
    pub(crate) timestamp: Option<String>,
    #[serde(default)]
    pub(crate) comment: Option<String>,
    /// Present (as an empty string) on minor edits.
    #[serde(default)]
    pub(crate) minor: Option<String>,
    /// Revision content, keyed `*` on the wire.
    #[serde(default, rename = "*")]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) diff: Option<DiffRecord>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct DiffRecord {
    #[serde(default, rename = "*")]
    pub(crate) body: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct TitleRecord {
    #[serde(default)]
    pub(crate) title: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct LanguageLink {
    #[serde(default)]
    pub(crate) lang: String,
    #[serde(default, rename = "*")]
    pub(crate) title: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct PageStub {
    #[serde(default)]
    pub(crate) title: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalization_chains_into_redirects() {
        let body: QueryResponse = serde_json::from_value(json!({
            "query": {
                "normalized": [{"from": "einstein", "to": "Einstein"}],
                "redirects": [{"from": "Einstein", "to": "Albert Einstein"}],
                "pages": {}
            }
        }))
        .expect("envelope deserializes");

        assert_eq!(body.query.normalize_title("einstein"), "Einstein");
        assert_eq!(body.query.resolve_title("einstein"), "Albert Einstein");
        assert_eq!(body.query.resolve_title("Einstein"), "Albert Einstein");
        assert_eq!(body.query.resolve_title("Planck"), "Planck");
    }

    #[test]
    fn normalization_alone_resolves_to_the_normalized_form() {
        let body: QueryResponse = serde_json::from_value(json!({
            "query": {
                "normalized": [{"from": "main page", "to": "Main page"}],
                "pages": {}
            }
        }))
        .expect("envelope deserializes");

        assert_eq!(body.query.resolve_title("main page"), "Main page");
    }

    #[test]
    fn page_lookup_honors_normalization() {
        let body: QueryResponse = serde_json::from_value(json!({
            "query": {
                "normalized": [{"from": "main page", "to": "Main page"}],
                "pages": {
                    "217225": {"pageid": 217225, "ns": 0, "title": "Main page"}
                }
            }
        }))
        .expect("envelope deserializes");

        assert_eq!(body.query.page_id_for("main page"), Some(217225));
        assert_eq!(body.query.page_id_for("Other page"), None);
    }

    #[test]
    fn missing_markers_decide_existence() {
        let missing: QueryResponse = serde_json::from_value(json!({
            "query": {
                "pages": {
                    "-1": {"ns": 0, "title": "Xyzzyplugh", "missing": ""}
                }
            }
        }))
        .expect("envelope deserializes");
        assert!(!missing.query.has_existing_page());
        assert!(missing.query.first_present_page().is_none());

        let present: QueryResponse = serde_json::from_value(json!({
            "query": {
                "pages": {
                    "736": {"pageid": 736, "ns": 0, "title": "Albert Einstein"}
                }
            }
        }))
        .expect("envelope deserializes");
        assert!(present.query.has_existing_page());

        let empty = QueryResponse::default();
        assert!(!empty.query.has_existing_page());
    }

    #[test]
    fn revision_content_rides_under_the_star_key() {
        let body: QueryResponse = serde_json::from_value(json!({
            "query": {
                "pages": {
                    "736": {
                        "pageid": 736,
                        "title": "Albert Einstein",
                        "lastrevid": 31415,
                        "revisions": [{"revid": 31415, "minor": "", "*": "wiki text"}]
                    }
                }
            }
        }))
        .expect("envelope deserializes");

        let page = body.query.first_present_page().expect("page present");
        assert_eq!(page.lastrevid, Some(31415));
        let revision = &page.revisions[0];
        assert_eq!(revision.content.as_deref(), Some("wiki text"));
        assert!(revision.minor.is_some());
    }
}
