//! HTML views: the session list, the replay timeline, and the per-event-type
//! formatting they share.

use chrono::{DateTime, Utc};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use serde_json::Value;

use crate::errors::Error;
use crate::model::{EventRecord, EventType, SessionGroup};

/// Route the service is mounted on; all self-links go through it.
pub const SESSIONS_ROUTE: &str = "/analytics/sessions";

const LIST_CSS: &str = include_str!("assets/list.css");
const TIMELINE_CSS: &str = include_str!("assets/timeline.css");
const PLAYER_JS: &str = include_str!("assets/player.js");

/// Format milliseconds as M:SS.
pub fn format_time(ms: i64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Format an ISO timestamp as a short readable date, falling back to the raw
/// string when it does not parse.
pub fn format_date(iso: &str) -> String {
    match iso.parse::<DateTime<Utc>>() {
        Ok(date) => date.format("%b %-d, %-I:%M:%S %p").to_string(),
        Err(_) => iso.to_owned(),
    }
}

/// Timeline accent color per event type. Unknown types fall back to gray.
pub fn event_color(kind: EventType) -> &'static str {
    match kind {
        EventType::SessionStart => "#22c55e",
        EventType::Scroll => "#3b82f6",
        EventType::Click => "#f59e0b",
        EventType::VideoPlay => "#a855f7",
        EventType::VideoPause => "#ec4899",
        EventType::VideoSeek => "#8b5cf6",
        EventType::VideoDeparture => "#ef4444",
        EventType::FormFocus => "#06b6d4",
        EventType::FormBlur => "#14b8a6",
        EventType::Departure => "#dc2626",
        EventType::Other => "#6b7280",
    }
}

pub fn event_emoji(kind: EventType) -> &'static str {
    match kind {
        EventType::SessionStart => "🚀",
        EventType::Scroll => "📜",
        EventType::Click => "👆",
        EventType::VideoPlay => "▶️",
        EventType::VideoPause => "⏸️",
        EventType::VideoSeek => "⏩",
        EventType::VideoDeparture => "📹",
        EventType::FormFocus => "✏️",
        EventType::FormBlur => "✅",
        EventType::Departure => "👋",
        EventType::Other => "•",
    }
}

fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "?".to_owned(),
    }
}

fn field_or(data: &Value, key: &str, fallback: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback.to_owned(),
    }
}

fn rounded_seconds(data: &Value, key: &str) -> String {
    match data.get(key).and_then(Value::as_f64) {
        Some(n) => format!("{}", n.round() as i64),
        None => "?".to_owned(),
    }
}

/// Human-readable detail block for one event, keyed on its type. Unknown
/// types produce an empty block.
pub fn format_event_data(event: &EventRecord) -> String {
    let data = &event.event_data;
    let mut output: Vec<String> = Vec::new();

    match event.kind() {
        EventType::SessionStart => {
            let viewport = data.get("viewport").cloned().unwrap_or(Value::Null);
            output.push(format!(
                "Viewport: {}x{}",
                field(&viewport, "width"),
                field(&viewport, "height")
            ));
            output.push(format!("Referrer: {}", field_or(data, "referrer", "direct")));
            output.push(format!("Language: {}", field(data, "language")));
        }
        EventType::Scroll => {
            output.push(format!("Scroll Y: {}px", field(data, "scrollY")));
            output.push(format!("Scroll %: {}%", field(data, "scrollPercentage")));
            output.push(format!("Page Height: {}px", field(data, "documentHeight")));
        }
        EventType::Click => {
            output.push(format!("Element: {}", field(data, "elementType")));
            let text: String = field_or(data, "elementText", "").chars().take(50).collect();
            output.push(format!("Text: \"{}\"", text));
            output.push(format!("Selector: {}", field(data, "selector")));
            output.push(format!(
                "Position: ({}, {})",
                field(data, "x"),
                field(data, "y")
            ));
        }
        EventType::VideoPlay
        | EventType::VideoPause
        | EventType::VideoSeek
        | EventType::VideoDeparture => {
            output.push(format!("Video: {}", field(data, "videoId")));
            output.push(format!(
                "Time: {}s of {}s",
                rounded_seconds(data, "currentTime"),
                rounded_seconds(data, "duration")
            ));
            output.push(format!("Watched: {}%", field(data, "percentWatched")));
        }
        EventType::FormFocus | EventType::FormBlur => {
            output.push(format!("Field: {}", field(data, "fieldName")));
            output.push(format!("Type: {}", field(data, "fieldType")));
        }
        EventType::Departure => {
            output.push(format!("Reason: {}", field(data, "reason")));
            let time_on_page = data.get("timeOnPage").and_then(Value::as_i64).unwrap_or(0);
            output.push(format!("Time on page: {}", format_time(time_on_page)));
            output.push(format!("Final scroll: {}px", field(data, "scrollY")));
        }
        EventType::Other => {}
    }

    output.join("\n")
}

/// The session list: one table row per session with a timeline link and a
/// confirm-guarded delete action that POSTs back to this route.
pub fn session_list_page(sessions: &[SessionGroup], key: &str) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Session Replay - All Sessions" }
                style { (PreEscaped(LIST_CSS)) }
            }
            body {
                h1 { "📊 Session Replay - Recent Sessions" }

                @if sessions.is_empty() {
                    div class="empty" {
                        p { "No sessions found yet." }
                        p { "Visit the tracked page to generate session data." }
                    }
                } @else {
                    table {
                        thead {
                            tr {
                                th { "Date" }
                                th { "Page URL" }
                                th { "Duration" }
                                th { "Events" }
                                th { "Actions" }
                            }
                        }
                        tbody {
                            @for session in sessions {
                                tr {
                                    td { (format_date(&session.first_event)) }
                                    td class="page-url" { (session.page_url) }
                                    td { (format_time(session.duration_ms())) }
                                    td { (session.events.len()) }
                                    td {
                                        a href=(format!("{}?key={}&id={}", SESSIONS_ROUTE, key, session.session_id)) {
                                            "View Timeline →"
                                        }
                                        a class="delete" href="#" title="Delete session"
                                            onclick=(format!("deleteSession('{}'); return false;", session.session_id)) {
                                            "🗑️"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                script { (PreEscaped(format!(
                    "function deleteSession(id) {{\n  if (!confirm('Delete this session?')) return;\n  fetch('{}?key={}&delete=' + id, {{ method: 'POST' }})\n    .then(function () {{ window.location.reload(); }});\n}}",
                    SESSIONS_ROUTE, key
                ))) }
            }
        }
    }
}

/// The two-pane replay view: sandboxed iframe of the tracked page on the
/// left, the formatted event timeline on the right, with the player script
/// driving both. Expects a non-empty, `relativeTime`-sorted event list.
pub fn session_timeline_page(
    session_id: &str,
    events: &[EventRecord],
    key: &str,
) -> Result<Markup, Error> {
    let first_relative = events.first().map(|e| e.relative_time).unwrap_or(0);
    let last_relative = events.last().map(|e| e.relative_time).unwrap_or(0);
    let duration = last_relative - first_relative;
    let page_url = events.first().map(|e| e.page_url.as_str()).unwrap_or("");
    let events_json = serde_json::to_string(events)?;

    Ok(html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Session Replay - " (session_id) }
                style { (PreEscaped(TIMELINE_CSS)) }
            }
            body {
                header {
                    h1 { "🎬 Session Replay" }
                    div class="meta" {
                        span class="session-id" { (session_id) }
                        " • " (format_time(duration))
                        " • " (events.len()) " events"
                        " • " (page_url)
                    }
                }

                div class="content" {
                    div class="replay-container" {
                        div class="iframe-container" {
                            iframe id="replay-iframe" src=(page_url) sandbox="allow-scripts allow-same-origin" {}
                            div class="click-overlay" id="click-overlay" {}
                        }

                        div class="controls" {
                            button class="play-pause-btn" id="play-pause-btn" { "▶️" }
                            div class="time-display" id="time-display" { "0:00 / " (format_time(duration)) }
                        }
                    }

                    div class="timeline-sidebar" {
                        div class="events-header" { "Event Timeline" }
                        div class="events-list" id="events-list" {
                            @for event in events {
                                div class="event" style=(format!("border-left: 4px solid {};", event_color(event.kind()))) {
                                    div class="event-header" {
                                        span class="emoji" { (event_emoji(event.kind())) }
                                        strong { (format_time(event.relative_time)) }
                                        " - " (event.event_type)
                                    }
                                    pre class="event-data" { (format_event_data(event)) }
                                }
                            }
                        }
                    }
                }

                a href=(format!("{}?key={}", SESSIONS_ROUTE, key)) class="back" { "← Back to all sessions" }

                script { (PreEscaped(format!(
                    "window.__REPLAY_EVENTS__ = {};\nwindow.__REPLAY_DURATION__ = {};",
                    events_json, duration
                ))) }
                script { (PreEscaped(PLAYER_JS)) }
            }
        }
    })
}

pub fn unauthorized_page() -> String {
    "<h1>401 Unauthorized</h1><p>Invalid access key. Add ?key=your-password to URL.</p>".to_owned()
}

pub fn not_found_page(message: &str) -> String {
    format!("<h1>Session Not Found</h1><p>{}</p>", message)
}

pub fn error_page(message: &str) -> String {
    format!("<h1>500 Error</h1><pre>{}</pre>", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group_sessions;
    use serde_json::json;

    fn record(event_type: &str, data: Value, relative_time: i64) -> EventRecord {
        EventRecord {
            pk: "analytics-session#abc123".to_owned(),
            sk: format!("event#{}", relative_time),
            gsi_pk: None,
            session_id: "abc123".to_owned(),
            page_url: "https://example.com/landing".to_owned(),
            event_type: event_type.to_owned(),
            event_data: data,
            timestamp: "2025-06-01T10:00:00Z".to_owned(),
            relative_time,
        }
    }

    #[test]
    fn format_time_renders_minutes_and_padded_seconds() {
        assert_eq!(format_time(65000), "1:05");
        assert_eq!(format_time(5000), "0:05");
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(60000), "1:00");
        assert_eq!(format_time(754321), "12:34");
    }

    #[test]
    fn format_date_falls_back_to_raw_input() {
        assert_eq!(format_date("2025-06-01T10:04:09Z"), "Jun 1, 10:04:09 AM");
        assert_eq!(format_date("not-a-date"), "not-a-date");
    }

    #[test]
    fn unknown_event_types_get_default_color_and_marker() {
        assert_eq!(event_color(EventType::parse("hover")), "#6b7280");
        assert_eq!(event_emoji(EventType::parse("hover")), "•");
        assert_eq!(event_color(EventType::Scroll), "#3b82f6");
    }

    #[test]
    fn scroll_details_name_each_measure() {
        let event = record(
            "scroll",
            json!({ "scrollY": 480, "scrollPercentage": 37, "documentHeight": 2900 }),
            1200,
        );

        let details = format_event_data(&event);
        assert!(details.contains("Scroll Y: 480px"));
        assert!(details.contains("Scroll %: 37%"));
        assert!(details.contains("Page Height: 2900px"));
    }

    #[test]
    fn click_details_truncate_element_text() {
        let long_text = "x".repeat(80);
        let event = record(
            "click",
            json!({
                "elementType": "button",
                "elementText": long_text,
                "selector": "#signup",
                "x": 10,
                "y": 20,
            }),
            0,
        );

        let details = format_event_data(&event);
        assert!(details.contains(&format!("Text: \"{}\"", "x".repeat(50))));
        assert!(details.contains("Position: (10, 20)"));
    }

    #[test]
    fn unknown_event_details_are_empty() {
        let event = record("hover", json!({ "anything": true }), 0);
        assert_eq!(format_event_data(&event), "");
    }

    #[test]
    fn empty_list_page_shows_placeholder() {
        let page = session_list_page(&[], "secret").into_string();
        assert!(page.contains("No sessions found yet."));
        assert!(!page.contains("<table>"));
    }

    #[test]
    fn list_page_links_each_session() {
        let sessions = group_sessions(vec![record("scroll", json!({}), 0)]);
        let page = session_list_page(&sessions, "secret").into_string();

        assert!(page.contains("View Timeline"));
        // maud escapes the ampersand in attribute values.
        assert!(page.contains("/analytics/sessions?key=secret&amp;id=abc123"));
        assert!(page.contains("deleteSession('abc123')"));
    }

    #[test]
    fn timeline_page_embeds_events_for_the_player() {
        let events = vec![
            record("session-start", json!({}), 0),
            record("scroll", json!({ "scrollY": 100 }), 1500),
        ];

        let page = session_timeline_page("abc123", &events, "secret")
            .unwrap()
            .into_string();

        assert!(page.contains("window.__REPLAY_EVENTS__"));
        assert!(page.contains("window.__REPLAY_DURATION__ = 1500;"));
        assert!(page.contains("replay-iframe"));
        assert!(page.contains("0:00 / 0:01"));
        assert!(page.contains("\"relativeTime\":1500"));
    }
}
