//! Request routing for the console variant: HTML views by default, JSON when
//! `format=json` is supplied.
//!
//! One route, four operations. The query parameters pick the operation:
//! `delete` + POST removes a session, `id` fetches one session, anything else
//! lists recent sessions for a page. `key` gates everything.

use http::{Method, StatusCode};
use lambda_http::{Request, RequestExt, Response};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::errors::Error;
use crate::model::{group_sessions, SessionDetail, SessionSummary};
use crate::render;
use crate::store::SessionStore;
use crate::utils::{html_response, json_response, redirect};

type E = Box<dyn std::error::Error + Sync + Send + 'static>;

#[instrument(skip(cfg, store))]
pub async fn handle(
    cfg: &Config,
    store: &SessionStore<'_>,
    event: Request,
) -> Result<Response<String>, E> {
    info!("event: {:?}", event);

    let params = event.query_string_parameters();
    let format = params.first("format").unwrap_or("html").to_owned();

    let key = params.first("key").unwrap_or("");
    if key != cfg.access_key {
        return Ok(unauthorized(&format));
    }
    let key = key.to_owned();

    let session_id = params.first("id").map(str::to_owned);
    let delete_target = params.first("delete").map(str::to_owned);
    let page = params.first("page").map(str::to_owned);

    let result = match delete_target {
        Some(target) if event.method() == Method::POST => {
            // The list page's delete action carries the session id as the
            // flag value; `id` stays the fallback for `delete=true` callers.
            let id = if target == "true" {
                session_id.unwrap_or_default()
            } else {
                target
            };
            delete_session(store, &id, &key, &format).await
        }
        _ => match session_id {
            Some(id) if format == "json" => session_json(store, &id).await,
            Some(id) => session_timeline(store, &id, &key).await,
            None if format == "json" => sessions_json(cfg, store, page.as_deref()).await,
            None => session_list(cfg, store, page.as_deref(), &key).await,
        },
    };

    Ok(result.unwrap_or_else(|err| {
        error!("unhandled error: {}", err);
        internal_error(&err.to_string(), &format)
    }))
}

async fn session_list(
    cfg: &Config,
    store: &SessionStore<'_>,
    page: Option<&str>,
    key: &str,
) -> Result<Response<String>, Error> {
    let page = page.unwrap_or(&cfg.default_page_url);
    let records = store.recent_page_events(page).await?;
    let sessions = group_sessions(records);

    Ok(html_response(
        StatusCode::OK,
        render::session_list_page(&sessions, key).into_string(),
    ))
}

async fn sessions_json(
    cfg: &Config,
    store: &SessionStore<'_>,
    page: Option<&str>,
) -> Result<Response<String>, Error> {
    let page = page.unwrap_or(&cfg.default_page_url);
    let records = store.recent_page_events(page).await?;
    let summaries: Vec<SessionSummary> = group_sessions(records)
        .iter()
        .map(|session| session.summary())
        .collect();

    Ok(json_response(
        StatusCode::OK,
        serde_json::to_string(&summaries)?,
    ))
}

async fn session_timeline(
    store: &SessionStore<'_>,
    session_id: &str,
    key: &str,
) -> Result<Response<String>, Error> {
    let events = store.session_events(session_id).await?;
    if events.is_empty() {
        return Ok(html_response(
            StatusCode::NOT_FOUND,
            render::not_found_page("No events found for this session ID."),
        ));
    }

    let page = render::session_timeline_page(session_id, &events, key)?;
    Ok(html_response(StatusCode::OK, page.into_string()))
}

async fn session_json(
    store: &SessionStore<'_>,
    session_id: &str,
) -> Result<Response<String>, Error> {
    let events = store.session_events(session_id).await?;
    if events.is_empty() {
        return Ok(json_response(
            StatusCode::NOT_FOUND,
            json!({
                "error": "Session not found",
                "message": "No events found for this session ID",
            })
            .to_string(),
        ));
    }

    let detail = SessionDetail::from_events(session_id, events);
    Ok(json_response(StatusCode::OK, serde_json::to_string(&detail)?))
}

async fn delete_session(
    store: &SessionStore<'_>,
    session_id: &str,
    key: &str,
    format: &str,
) -> Result<Response<String>, Error> {
    match store.delete_session(session_id).await {
        Ok(count) if format == "json" => Ok(json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "message": "Session deleted",
                "eventsDeleted": count,
            })
            .to_string(),
        )),
        // Back to the list view once the records are gone.
        Ok(_) => Ok(redirect(format!("{}?key={}", render::SESSIONS_ROUTE, key))),
        Err(Error::SessionNotFound(_)) if format == "json" => Ok(json_response(
            StatusCode::NOT_FOUND,
            json!({
                "error": "Session not found",
                "message": "No events found for this session",
            })
            .to_string(),
        )),
        Err(Error::SessionNotFound(_)) => Ok(html_response(
            StatusCode::NOT_FOUND,
            render::not_found_page("No events found for this session."),
        )),
        Err(err) => Err(err),
    }
}

fn unauthorized(format: &str) -> Response<String> {
    if format == "json" {
        json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Unauthorized", "message": "Invalid access key" }).to_string(),
        )
    } else {
        html_response(StatusCode::UNAUTHORIZED, render::unauthorized_page())
    }
}

fn internal_error(message: &str, format: &str) -> Response<String> {
    if format == "json" {
        json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal Server Error", "message": message }).to_string(),
        )
    } else {
        html_response(StatusCode::INTERNAL_SERVER_ERROR, render::error_page(message))
    }
}
