use serde::Deserialize;

use crate::client::{Transport, WikiClient};
use crate::error::{Error, Result};
use crate::response::{PageRecord, QueryResponse};

/// Raw wiki markup for a page.
///
/// `revision_id` is the page's latest revision id as reported alongside the
/// content, also for revision-addressed fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    pub text: String,
    pub revision_id: u64,
}

/// A page rendered to HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub html: String,
    pub revision_id: u64,
}

impl<T: Transport> WikiClient<T> {
    /// Current wiki markup of a page, following redirects. `None` when the
    /// page does not exist.
    pub fn text_raw(&self, title: &str) -> Result<Option<RawText>> {
        let params = [
            ("action", "query".to_string()),
            ("titles", title.to_string()),
            ("prop", "info|revisions".to_string()),
            ("rvprop", "content".to_string()),
            ("redirects", String::new()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.first_present_page().and_then(raw_text_of))
    }

    /// Wiki markup of one specific revision. `None` when the revision does
    /// not exist.
    pub fn text_raw_by_revision(&self, revision_id: u64) -> Result<Option<RawText>> {
        let params = [
            ("action", "query".to_string()),
            ("revids", revision_id.to_string()),
            ("prop", "info|revisions".to_string()),
            ("rvprop", "content".to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.pages.values().find_map(raw_text_of))
    }

    /// Rendered HTML of a page, following redirects.
    pub fn text_rendered(&self, page: &str) -> Result<RenderedText> {
        self.rendered_for(self.language(), page)
    }

    /// Rendered HTML of one specific revision.
    pub fn text_rendered_by_revision(&self, revision_id: u64) -> Result<RenderedText> {
        let params = [
            ("action", "parse".to_string()),
            ("oldid", revision_id.to_string()),
        ];
        let parse = self.parse_section(self.language(), &params)?;
        Ok(RenderedText {
            html: parse.text.html.unwrap_or_default(),
            revision_id,
        })
    }

    /// Rendered HTML of this title's counterpart in another language
    /// edition, located through the page's language links. Fails with
    /// [`Error::LanguageLinkMissing`] when the page offers no counterpart in
    /// that language.
    pub fn text_rendered_in(&self, title: &str, language: &str) -> Result<RenderedText> {
        let links = self.language_links(title)?;
        match links.get(language) {
            Some(foreign_title) => self.rendered_for(language, foreign_title),
            None => Err(Error::LanguageLinkMissing {
                title: title.to_string(),
                language: language.to_string(),
            }),
        }
    }

    /// Renders a fragment of wiki markup to HTML.
    pub fn parse_text(&self, wikitext: &str) -> Result<String> {
        let params = [
            ("action", "parse".to_string()),
            ("text", wikitext.to_string()),
        ];
        let parse = self.parse_section(self.language(), &params)?;
        Ok(parse.text.html.unwrap_or_default())
    }

    fn rendered_for(&self, language: &str, page: &str) -> Result<RenderedText> {
        let params = [
            ("action", "parse".to_string()),
            ("page", page.to_string()),
            ("redirects", String::new()),
        ];
        let parse = self.parse_section(language, &params)?;
        Ok(RenderedText {
            html: parse.text.html.unwrap_or_default(),
            revision_id: parse.revid.unwrap_or_default(),
        })
    }

    fn parse_section(&self, language: &str, params: &[(&str, String)]) -> Result<ParseSection> {
        let payload = self.request_json_for(language, params)?;
        let response: ParseResponse = serde_json::from_value(payload)?;
        Ok(response.parse)
    }
}

fn raw_text_of(page: &PageRecord) -> Option<RawText> {
    let revision = page.revisions.first()?;
    let text = revision.content.clone()?;
    Some(RawText {
        text,
        revision_id: page.lastrevid?,
    })
}

#[derive(Debug, Deserialize, Default)]
struct ParseResponse {
    #[serde(default)]
    parse: ParseSection,
}

#[derive(Debug, Deserialize, Default)]
struct ParseSection {
    #[serde(default)]
    revid: Option<u64>,
    #[serde(default)]
    text: ParseText,
}

#[derive(Debug, Deserialize, Default)]
struct ParseText {
    #[serde(default, rename = "*")]
    html: Option<String>,
}
