use serde_json::Value;

use crate::client::{Transport, WikiClient};
use crate::error::Result;
use crate::response::QueryResponse;

impl<T: Transport> WikiClient<T> {
    /// Title suggestions for a search fragment.
    pub fn opensearch(&self, search: &str) -> Result<Vec<String>> {
        let params = [
            ("action", "opensearch".to_string()),
            ("search", search.to_string()),
        ];
        let payload = self.request_json(&params)?;
        let titles = payload
            .get(1)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(titles)
    }

    /// Numeric id of the page with this title, `None` when no such page
    /// exists.
    pub fn page_id(&self, title: &str) -> Result<Option<u64>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "info".to_string()),
            ("titles", title.to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.page_id_for(title))
    }

    /// Whether a page with this title exists.
    pub fn exists(&self, title: &str) -> Result<bool> {
        let params = [
            ("action", "query".to_string()),
            ("titles", title.to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.has_existing_page())
    }

    /// The title after the server's normalization pass (capitalization,
    /// underscore handling and the like). Identity when nothing changed.
    pub fn normalized_title(&self, title: &str) -> Result<String> {
        let params = [
            ("action", "query".to_string()),
            ("titles", title.to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.normalize_title(title))
    }

    /// The title after normalization and one round of redirect resolution.
    pub fn resolved_title(&self, title: &str) -> Result<String> {
        let params = [
            ("action", "query".to_string()),
            ("titles", title.to_string()),
            ("redirects", String::new()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        Ok(response.query.resolve_title(title))
    }
}
