use std::collections::BTreeMap;

use serde_json::Value;

use crate::client::{Continuation, Transport, WikiClient};
use crate::error::Result;
use crate::markup;
use crate::response::QueryResponse;

const CATEGORY_CONTINUATION: Continuation = Continuation {
    section: "categories",
    param: "clcontinue",
};
const MEMBER_CONTINUATION: Continuation = Continuation {
    section: "categorymembers",
    param: "cmcontinue",
};
const LINK_CONTINUATION: Continuation = Continuation {
    section: "links",
    param: "plcontinue",
};

/// Largest member batch the API hands out per request.
const CATEGORY_MEMBER_BATCH_CAP: usize = 500;
const LANGUAGE_LINK_LIMIT: u32 = 250;
const RANDOM_BATCH: u32 = 10;

impl<T: Transport> WikiClient<T> {
    /// Every category of a page.
    pub fn categories(&self, title: &str) -> Result<Vec<String>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "categories".to_string()),
            ("titles", title.to_string()),
        ];
        self.paginate(&params, CATEGORY_CONTINUATION, None, page_categories)
    }

    /// Every category of one specific revision.
    pub fn categories_by_revision(&self, revision_id: u64) -> Result<Vec<String>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "categories".to_string()),
            ("revids", revision_id.to_string()),
        ];
        self.paginate(&params, CATEGORY_CONTINUATION, None, page_categories)
    }

    /// Member titles of a category, up to `limit`.
    pub fn category_members(&self, category: &str, limit: usize) -> Result<Vec<String>> {
        let batch = limit.min(CATEGORY_MEMBER_BATCH_CAP);
        let params = [
            ("action", "query".to_string()),
            ("list", "categorymembers".to_string()),
            ("cmtitle", category.to_string()),
            ("cmlimit", batch.to_string()),
        ];
        self.paginate(&params, MEMBER_CONTINUATION, Some(limit), member_titles)
    }

    /// Every internal link on a page.
    pub fn links(&self, title: &str) -> Result<Vec<String>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "links".to_string()),
            ("titles", title.to_string()),
        ];
        self.paginate(&params, LINK_CONTINUATION, None, page_links)
    }

    /// Link targets scraped from the raw markup of one revision. Empty when
    /// the revision does not exist.
    pub fn links_by_revision(&self, revision_id: u64) -> Result<Vec<String>> {
        let links = match self.text_raw_by_revision(revision_id)? {
            Some(raw) => markup::wiki_links(&raw.text).into_values().collect(),
            None => Vec::new(),
        };
        Ok(links)
    }

    /// Language links of a page: language code onto the counterpart title in
    /// that language. Empty for missing pages and pages without links.
    pub fn language_links(&self, title: &str) -> Result<BTreeMap<String, String>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "langlinks".to_string()),
            ("titles", title.to_string()),
            ("lllimit", LANGUAGE_LINK_LIMIT.to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        let links = response
            .query
            .page_for(title)
            .map(|page| {
                page.langlinks
                    .iter()
                    .map(|link| (link.lang.clone(), link.title.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(links)
    }

    /// Random main-namespace titles, gathered in batches until `count` is
    /// reached.
    pub fn random_titles(&self, count: usize) -> Result<Vec<String>> {
        let params = [
            ("action", "query".to_string()),
            ("list", "random".to_string()),
            ("rnnamespace", "0".to_string()),
            ("rnlimit", RANDOM_BATCH.to_string()),
        ];
        let mut titles = Vec::new();
        while titles.len() < count {
            let payload = self.request_json(&params)?;
            let response: QueryResponse = serde_json::from_value(payload)?;
            if response.query.random.is_empty() {
                break;
            }
            titles.extend(response.query.random.into_iter().map(|stub| stub.title));
        }
        titles.truncate(count);
        Ok(titles)
    }
}

fn page_categories(payload: &Value) -> Vec<String> {
    QueryResponse::from_payload(payload)
        .map(|response| {
            response
                .query
                .pages
                .values()
                .flat_map(|page| page.categories.iter().map(|category| category.title.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn page_links(payload: &Value) -> Vec<String> {
    QueryResponse::from_payload(payload)
        .map(|response| {
            response
                .query
                .pages
                .values()
                .flat_map(|page| page.links.iter().map(|link| link.title.clone()))
                .collect()
        })
        .unwrap_or_default()
}

fn member_titles(payload: &Value) -> Vec<String> {
    QueryResponse::from_payload(payload)
        .map(|response| {
            response
                .query
                .categorymembers
                .into_iter()
                .map(|member| member.title)
                .collect()
        })
        .unwrap_or_default()
}
