use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Compact event row as returned by the event listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub address: String,
}

impl EventSummary {
    /// List-view date: "Jan 26, 2026", falling back to the raw prefix when
    /// the backend sends something unparseable.
    pub fn formatted_date(&self) -> String {
        format_wire_date(&self.date)
    }
}

/// Full event as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventId", default)]
    pub event_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "eventDate", default)]
    pub event_date: String,
    #[serde(rename = "eventAddress", default)]
    pub event_address: String,
    #[serde(rename = "creatorUserId", default)]
    pub creator_user_id: i64,
    #[serde(rename = "vkLink", default)]
    pub vk_link: String,
    #[serde(rename = "tgLink", default)]
    pub tg_link: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
}

impl Event {
    /// Detail-view date: "Feb 06, 2026 @ 07:00 PM".
    pub fn formatted_datetime(&self) -> String {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.event_date) {
            dt.format("%b %d, %Y @ %I:%M %p").to_string()
        } else {
            format_wire_date(&self.event_date)
        }
    }

    /// Whether `user_id` created this event (and may edit or delete it).
    pub fn is_owned_by(&self, user_id: Option<i64>) -> bool {
        self.creator_user_id > 0 && user_id == Some(self.creator_user_id)
    }
}

/// Create/edit payload. The backend wraps it as `{"event": {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    #[serde(rename = "eventDate")]
    pub event_date: String,
    #[serde(rename = "eventAddress")]
    pub event_address: String,
    #[serde(rename = "creatorUserId")]
    pub creator_user_id: i64,
    #[serde(rename = "vkLink")]
    pub vk_link: String,
    #[serde(rename = "tgLink")]
    pub tg_link: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Server-side listing filter, sent as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub search: String,
    pub date: String,
    pub address: String,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty() && self.date.is_empty() && self.address.is_empty()
    }

    /// Non-empty (name, value) pairs for the request URL.
    pub fn query_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push(("search", self.search.as_str()));
        }
        if !self.date.is_empty() {
            pairs.push(("date", self.date.as_str()));
        }
        if !self.address.is_empty() {
            pairs.push(("address", self.address.as_str()));
        }
        pairs
    }
}

// Sorting options for the events table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSortColumn {
    Name,
    #[default]
    Date,
    Address,
}

fn format_wire_date(date: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(d) = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        d.format("%b %d, %Y").to_string()
    } else if date.is_empty() {
        "TBD".to_string()
    } else {
        date.chars().take(16).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_detail_payload_from_the_wire() {
        let json = r#"{
            "eventId": 12,
            "title": "Rust Meetup",
            "description": "Talks and pizza",
            "eventDate": "2026-02-06T19:00:00Z",
            "eventAddress": "Main St 1",
            "creatorUserId": 42,
            "vkLink": "https://vk.com/rust",
            "tgLink": "https://t.me/rust",
            "imageUrl": "/img/12.png"
        }"#;

        let event: Event = serde_json::from_str(json).expect("parse event");
        assert_eq!(event.event_id, 12);
        assert_eq!(event.title, "Rust Meetup");
        assert_eq!(event.creator_user_id, 42);
        assert_eq!(event.formatted_datetime(), "Feb 06, 2026 @ 07:00 PM");
    }

    #[test]
    fn missing_optional_fields_default() {
        let event: Event =
            serde_json::from_str(r#"{"title": "Minimal"}"#).expect("parse minimal event");
        assert_eq!(event.event_id, 0);
        assert!(event.description.is_empty());
        assert!(!event.is_owned_by(Some(1)));
    }

    #[test]
    fn draft_serializes_camel_case() {
        let draft = EventDraft {
            title: "T".to_string(),
            event_date: "2026-03-01T10:00:00Z".to_string(),
            creator_user_id: 7,
            ..EventDraft::default()
        };

        let json = serde_json::to_value(&draft).expect("serialize draft");
        assert_eq!(json["eventDate"], "2026-03-01T10:00:00Z");
        assert_eq!(json["creatorUserId"], 7);
        assert!(json.get("event_date").is_none());
    }

    #[test]
    fn summary_date_formats_and_falls_back() {
        let mut summary = EventSummary {
            id: 1,
            name: "E".to_string(),
            date: "2026-01-26T17:00:00Z".to_string(),
            address: String::new(),
        };
        assert_eq!(summary.formatted_date(), "Jan 26, 2026");

        summary.date = "2026-01-26".to_string();
        assert_eq!(summary.formatted_date(), "Jan 26, 2026");

        summary.date = String::new();
        assert_eq!(summary.formatted_date(), "TBD");
    }

    #[test]
    fn filter_builds_only_set_query_pairs() {
        let filter = EventFilter {
            search: "meetup".to_string(),
            date: String::new(),
            address: "Main".to_string(),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![("search", "meetup"), ("address", "Main")]
        );
        assert!(EventFilter::default().is_empty());
    }

    #[test]
    fn ownership_requires_a_real_creator() {
        let mut event: Event = serde_json::from_str(r#"{"title": "x"}"#).expect("parse");
        assert!(!event.is_owned_by(Some(0)));

        event.creator_user_id = 5;
        assert!(event.is_owned_by(Some(5)));
        assert!(!event.is_owned_by(Some(6)));
        assert!(!event.is_owned_by(None));
    }
}
