use crate::client::{Transport, WikiClient};
use crate::date::Date;
use crate::error::Result;
use crate::response::{QueryResponse, RevisionRecord};

/// Number of redirect stubs the date fallback is willing to chase.
const MAX_REDIRECT_HOPS: usize = 10;

const END_OF_DAY: &str = "235959";

/// Search direction along a page's revision history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionOrder {
    Older,
    Newer,
}

impl RevisionOrder {
    fn as_param(self) -> &'static str {
        match self {
            RevisionOrder::Older => "older",
            RevisionOrder::Newer => "newer",
        }
    }
}

/// One revision from a page's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub revision_id: u64,
    pub parent_id: Option<u64>,
    pub user: Option<String>,
    pub timestamp: Option<String>,
    pub comment: Option<String>,
    pub minor: bool,
}

impl<T: Transport> WikiClient<T> {
    /// Id of the first revision on the given side of an instant. `time` is
    /// an `HHMMSS` string; `None` when the page has no revision there.
    pub fn revision_id_by_date(
        &self,
        title: &str,
        date: Date,
        time: &str,
        order: RevisionOrder,
    ) -> Result<Option<u64>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("rvprop", "ids".to_string()),
            ("titles", title.to_string()),
            ("rvdir", order.as_param().to_string()),
            ("rvlimit", "1".to_string()),
            ("rvstart", format!("{}{}", date.compact(), time)),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        let revision_id = response
            .query
            .pages
            .values()
            .next()
            .and_then(|page| page.revisions.first())
            .and_then(|revision| revision.revid);
        Ok(revision_id)
    }

    /// Id of the last revision on `date`, following pages that were renamed
    /// afterwards. A page moved after `date` leaves a redirect stub as its
    /// first revision under the new name; the stub's target is queried in
    /// turn, up to a bounded number of hops.
    pub fn revision_id_by_date_with_fallback(
        &self,
        title: &str,
        date: Date,
    ) -> Result<Option<u64>> {
        let mut title = title.to_string();
        for _ in 0..MAX_REDIRECT_HOPS {
            if let Some(id) =
                self.revision_id_by_date(&title, date, END_OF_DAY, RevisionOrder::Older)?
            {
                return Ok(Some(id));
            }
            // the page was moved later; chase the redirect stub
            let Some(first_id) =
                self.revision_id_by_date(&title, date, END_OF_DAY, RevisionOrder::Newer)?
            else {
                return Ok(None);
            };
            let Some(raw) = self.text_raw_by_revision(first_id)? else {
                return Ok(None);
            };
            let Some(target) = redirect_target(&raw.text) else {
                return Ok(None);
            };
            title = target;
        }
        Ok(None)
    }

    /// Revisions adjacent to an instant, in the given direction.
    pub fn revisions_by_date(
        &self,
        title: &str,
        date: Date,
        time: &str,
        order: RevisionOrder,
        limit: u32,
    ) -> Result<Vec<Revision>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("titles", title.to_string()),
            ("rvdir", order.as_param().to_string()),
            ("rvlimit", limit.to_string()),
            ("rvstart", format!("{}{}", date.compact(), time)),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        let revisions = response
            .query
            .pages
            .values()
            .flat_map(|page| page.revisions.iter().filter_map(revision_from))
            .collect();
        Ok(revisions)
    }

    /// Rendered diff between two revisions of a page, `None` when the server
    /// supplies no diff body.
    pub fn revision_diff(&self, first: u64, second: u64) -> Result<Option<String>> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("revids", first.min(second).to_string()),
            ("rvdiffto", first.max(second).to_string()),
        ];
        let payload = self.request_json(&params)?;
        let response: QueryResponse = serde_json::from_value(payload)?;
        let diff = response.query.pages.values().find_map(|page| {
            page.revisions
                .first()
                .and_then(|revision| revision.diff.as_ref())
                .and_then(|diff| diff.body.clone())
        });
        Ok(diff)
    }
}

fn revision_from(record: &RevisionRecord) -> Option<Revision> {
    Some(Revision {
        revision_id: record.revid?,
        parent_id: record.parentid,
        user: record.user.clone(),
        timestamp: record.timestamp.clone(),
        comment: record.comment.clone(),
        minor: record.minor.is_some(),
    })
}

/// Target of a `#REDIRECT [[...]]` stub, if the text is exactly one.
fn redirect_target(text: &str) -> Option<String> {
    let prefix_matches = text
        .get(..12)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("#redirect [["));
    if !prefix_matches || text.len() < 14 || !text.ends_with("]]") {
        return None;
    }
    Some(text[12..text.len() - 2].to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::testing::{ScriptedTransport, client_with};

    fn date() -> Date {
        Date::new(2010, 1, 5).expect("valid date")
    }

    fn revision_listing(revids: &[u64]) -> serde_json::Value {
        let revisions: Vec<serde_json::Value> =
            revids.iter().map(|revid| json!({"revid": revid})).collect();
        json!({
            "query": {
                "pages": {
                    "736": {"pageid": 736, "title": "Albert Einstein", "revisions": revisions}
                }
            }
        })
    }

    #[test]
    fn revision_lookup_concatenates_date_and_time() {
        let transport = ScriptedTransport::from_values(vec![revision_listing(&[31415])]);
        let client = client_with(transport);

        let id = client
            .revision_id_by_date("Albert Einstein", date(), "000000", RevisionOrder::Older)
            .expect("query succeeds");
        assert_eq!(id, Some(31415));

        let request = client.transport().request(0);
        assert!(request.contains("rvstart=20100105000000"));
        assert!(request.contains("rvdir=older"));
        assert!(request.contains("rvlimit=1"));
    }

    #[test]
    fn pages_without_revisions_yield_none() {
        let transport = ScriptedTransport::from_values(vec![json!({
            "query": {
                "pages": {
                    "736": {"pageid": 736, "title": "Albert Einstein"}
                }
            }
        })]);
        let client = client_with(transport);

        let id = client
            .revision_id_by_date("Albert Einstein", date(), "000000", RevisionOrder::Older)
            .expect("query succeeds");
        assert_eq!(id, None);
    }

    #[test]
    fn fallback_returns_a_direct_hit_without_extra_requests() {
        let transport = ScriptedTransport::from_values(vec![revision_listing(&[31415])]);
        let client = client_with(transport);

        let id = client
            .revision_id_by_date_with_fallback("Albert Einstein", date())
            .expect("query succeeds");
        assert_eq!(id, Some(31415));
        assert_eq!(client.transport().request_count(), 1);
    }

    #[test]
    fn fallback_chases_a_redirect_stub() {
        let transport = ScriptedTransport::from_values(vec![
            revision_listing(&[]),
            revision_listing(&[100]),
            json!({
                "query": {
                    "pages": {
                        "9": {
                            "pageid": 9,
                            "title": "Old name",
                            "lastrevid": 100,
                            "revisions": [{"*": "#REDIRECT [[New name]]"}]
                        }
                    }
                }
            }),
            json!({
                "query": {
                    "pages": {
                        "10": {"pageid": 10, "title": "New name", "revisions": [{"revid": 99}]}
                    }
                }
            }),
        ]);
        let client = client_with(transport);

        let id = client
            .revision_id_by_date_with_fallback("Old name", date())
            .expect("query succeeds");
        assert_eq!(id, Some(99));
        assert_eq!(client.transport().request_count(), 4);
        assert!(client.transport().request(1).contains("rvdir=newer"));
        assert!(client.transport().request(3).contains("titles=New+name"));
    }

    #[test]
    fn fallback_gives_up_on_ordinary_text() {
        let transport = ScriptedTransport::from_values(vec![
            revision_listing(&[]),
            revision_listing(&[100]),
            json!({
                "query": {
                    "pages": {
                        "9": {
                            "pageid": 9,
                            "title": "Old name",
                            "lastrevid": 100,
                            "revisions": [{"*": "Just an article body."}]
                        }
                    }
                }
            }),
        ]);
        let client = client_with(transport);

        let id = client
            .revision_id_by_date_with_fallback("Old name", date())
            .expect("query succeeds");
        assert_eq!(id, None);
        assert_eq!(client.transport().request_count(), 3);
    }

    #[test]
    fn redirect_stubs_parse_case_insensitively() {
        assert_eq!(
            redirect_target("#REDIRECT [[Albert Einstein]]").as_deref(),
            Some("Albert Einstein")
        );
        assert_eq!(
            redirect_target("#redirect [[Albert Einstein]]").as_deref(),
            Some("Albert Einstein")
        );
        assert_eq!(redirect_target("#REDIRECT [[A]] extra"), None);
        assert_eq!(redirect_target("plain text"), None);
        assert_eq!(redirect_target(""), None);
    }

    #[test]
    fn revision_listings_parse_the_server_defaults() {
        let transport = ScriptedTransport::from_values(vec![json!({
            "query": {
                "pages": {
                    "736": {
                        "pageid": 736,
                        "title": "Albert Einstein",
                        "revisions": [
                            {
                                "revid": 31415,
                                "parentid": 31414,
                                "user": "Example",
                                "timestamp": "2010-01-05T12:00:00Z",
                                "comment": "copyedit",
                                "minor": ""
                            },
                            {"revid": 31414, "parentid": 31410, "user": "Other"}
                        ]
                    }
                }
            }
        })]);
        let client = client_with(transport);

        let revisions = client
            .revisions_by_date("Albert Einstein", date(), "000000", RevisionOrder::Newer, 10)
            .expect("query succeeds");
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].revision_id, 31415);
        assert_eq!(revisions[0].comment.as_deref(), Some("copyedit"));
        assert!(revisions[0].minor);
        assert!(!revisions[1].minor);
        assert!(client.transport().request(0).contains("rvlimit=10"));
    }

    #[test]
    fn diffs_are_requested_oldest_to_newest() {
        let transport = ScriptedTransport::from_values(vec![json!({
            "query": {
                "pages": {
                    "736": {
                        "pageid": 736,
                        "title": "Albert Einstein",
                        "revisions": [
                            {"revid": 31414, "diff": {"to": 31415, "*": "<tr>changed line</tr>"}}
                        ]
                    }
                }
            }
        })]);
        let client = client_with(transport);

        let diff = client
            .revision_diff(31415, 31414)
            .expect("query succeeds")
            .expect("diff body present");
        assert_eq!(diff, "<tr>changed line</tr>");

        let request = client.transport().request(0);
        assert!(request.contains("revids=31414"));
        assert!(request.contains("rvdiffto=31415"));
    }
}
