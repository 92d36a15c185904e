use std::collections::BTreeMap;

use crate::client::{Transport, WikiClient};
use crate::date::Date;
use crate::error::Result;
use crate::markup;

/// One bulleted entry from a daily events portal page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentEvent {
    /// The entry with markup stripped.
    pub text: String,
    /// Display text onto link target for the entry's wiki links.
    pub links: BTreeMap<String, String>,
    /// Display text onto URL for the entry's external links.
    pub external_links: BTreeMap<String, String>,
    /// Revision of the portal page the entry came from.
    pub revision_id: u64,
}

impl<T: Transport> WikiClient<T> {
    /// Bulleted entries of the daily events portal page for a date, `None`
    /// when no portal page exists for that day.
    pub fn current_events(&self, date: Date) -> Result<Option<Vec<CurrentEvent>>> {
        let title = format!(
            "Portal:Current_events/{}_{}_{}",
            date.year(),
            date.month_name(),
            date.day()
        );
        let Some(raw) = self.text_raw(&title)? else {
            return Ok(None);
        };

        let events = raw
            .text
            .lines()
            .filter(|line| line.starts_with('*'))
            .map(|line| CurrentEvent {
                text: markup::plain_text(line),
                links: markup::wiki_links(line),
                external_links: markup::external_links(line),
                revision_id: raw.revision_id,
            })
            .collect();
        Ok(Some(events))
    }
}
