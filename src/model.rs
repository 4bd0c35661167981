//! Event records and the session aggregation over them.
//!
//! Sessions are never persisted: a session is whatever set of event records
//! currently shares a `sessionId`. Everything here is pure data shaping over
//! the flat record lists the store returns.

use std::collections::HashMap;

use aws_sdk_dynamodb::model::AttributeValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ext::AttributeValuesExt;

/// One tracked user interaction, as stored in the table.
///
/// `pk`/`sk` identify the record for point deletes; `gsi_pk` keys the
/// page-level secondary index. `event_data` is a per-type payload that is
/// stored and replayed as-is, without validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub pk: String,
    pub sk: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsi_pk: Option<String>,
    pub session_id: String,
    pub page_url: String,
    pub event_type: String,
    #[serde(default)]
    pub event_data: Value,
    pub timestamp: String,
    pub relative_time: i64,
}

impl EventRecord {
    /// Map a raw DynamoDB item to a record.
    ///
    /// Items missing any required attribute are skipped by the caller rather
    /// than failing the whole query.
    pub fn from_item(item: &HashMap<String, AttributeValue>) -> Option<EventRecord> {
        Some(EventRecord {
            pk: item.get_s("pk")?,
            sk: item.get_s("sk")?,
            gsi_pk: item.get_s("gsiPk"),
            session_id: item.get_s("sessionId")?,
            page_url: item.get_s("pageUrl")?,
            event_type: item.get_s("eventType")?,
            event_data: item.get_json("eventData").unwrap_or(Value::Null),
            timestamp: item.get_s("timestamp")?,
            relative_time: item.get_ms("relativeTime")?,
        })
    }

    pub fn kind(&self) -> EventType {
        EventType::parse(&self.event_type)
    }
}

/// The fixed event vocabulary the tracking client emits.
///
/// `Other` keeps unknown types renderable instead of failing on them; the
/// raw string stays on the record for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    SessionStart,
    Scroll,
    Click,
    VideoPlay,
    VideoPause,
    VideoSeek,
    VideoDeparture,
    FormFocus,
    FormBlur,
    Departure,
    Other,
}

impl EventType {
    pub fn parse(raw: &str) -> EventType {
        match raw {
            "session-start" => EventType::SessionStart,
            "scroll" => EventType::Scroll,
            "click" => EventType::Click,
            "video-play" => EventType::VideoPlay,
            "video-pause" => EventType::VideoPause,
            "video-seek" => EventType::VideoSeek,
            "video-departure" => EventType::VideoDeparture,
            "form-focus" => EventType::FormFocus,
            "form-blur" => EventType::FormBlur,
            "departure" => EventType::Departure,
            _ => EventType::Other,
        }
    }
}

/// A session reassembled from the flat record list of a page query.
#[derive(Debug, Clone)]
pub struct SessionGroup {
    pub session_id: String,
    pub page_url: String,
    pub first_event: String,
    pub last_event: String,
    pub events: Vec<EventRecord>,
}

impl SessionGroup {
    /// Wall-clock session length in milliseconds, from the min/max event
    /// timestamps. Unparseable timestamps count as zero length.
    pub fn duration_ms(&self) -> i64 {
        let first = self.first_event.parse::<DateTime<Utc>>();
        let last = self.last_event.parse::<DateTime<Utc>>();
        match (first, last) {
            (Ok(first), Ok(last)) => (last - first).num_milliseconds(),
            _ => 0,
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            page_url: self.page_url.clone(),
            timestamp: self.first_event.clone(),
            duration: self.duration_ms(),
            event_count: self.events.len(),
        }
    }
}

/// List-view row: one session with its derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub page_url: String,
    pub timestamp: String,
    pub duration: i64,
    pub event_count: usize,
}

/// Detail-view payload: one session with its full ordered event log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session_id: String,
    pub page_url: String,
    pub duration: i64,
    pub event_count: usize,
    pub events: Vec<EventRecord>,
}

impl SessionDetail {
    /// Build the detail payload from an already `relative_time`-sorted event
    /// list. Must not be called with an empty list; the handlers turn that
    /// case into a 404 first.
    pub fn from_events(session_id: &str, events: Vec<EventRecord>) -> SessionDetail {
        let first = events.first();
        let last = events.last();
        let duration = match (first, last) {
            (Some(first), Some(last)) => last.relative_time - first.relative_time,
            _ => 0,
        };

        SessionDetail {
            session_id: session_id.to_owned(),
            page_url: first.map(|e| e.page_url.clone()).unwrap_or_default(),
            duration,
            event_count: events.len(),
            events,
        }
    }
}

/// Group a flat record list by `sessionId`.
///
/// Session order follows the first record seen for each id, which preserves
/// the secondary index's most-recent-first ordering. First/last event
/// timestamps compare lexicographically, which is ordering-correct for the
/// ISO-8601 strings the tracking client writes.
pub fn group_sessions(records: Vec<EventRecord>) -> Vec<SessionGroup> {
    let mut sessions: Vec<SessionGroup> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for record in records {
        let index = match by_id.get(&record.session_id) {
            Some(index) => *index,
            None => {
                by_id.insert(record.session_id.clone(), sessions.len());
                sessions.push(SessionGroup {
                    session_id: record.session_id.clone(),
                    page_url: record.page_url.clone(),
                    first_event: record.timestamp.clone(),
                    last_event: record.timestamp.clone(),
                    events: Vec::new(),
                });
                sessions.len() - 1
            }
        };

        let session = &mut sessions[index];
        if record.timestamp < session.first_event {
            session.first_event = record.timestamp.clone();
        }
        if record.timestamp > session.last_event {
            session.last_event = record.timestamp.clone();
        }
        session.events.push(record);
    }

    sessions
}

/// Order a session's events for replay. Stable, so records sharing a
/// `relative_time` keep their store order.
pub fn sort_by_relative_time(events: &mut [EventRecord]) {
    events.sort_by_key(|event| event.relative_time);
}
