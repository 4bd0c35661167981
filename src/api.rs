//! Request routing for the JSON-only variant.
//!
//! Same table, same operations as the console, but every response is JSON,
//! the CORS preflight is answered, and the delete flag is the literal
//! `delete=true` with the session id in `id`.

use http::{Method, StatusCode};
use lambda_http::{Request, RequestExt, Response};
use serde_json::json;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::errors::Error;
use crate::model::{group_sessions, SessionDetail, SessionSummary};
use crate::store::SessionStore;
use crate::utils::json_response;

type E = Box<dyn std::error::Error + Sync + Send + 'static>;

#[instrument(skip(cfg, store))]
pub async fn handle(
    cfg: &Config,
    store: &SessionStore<'_>,
    event: Request,
) -> Result<Response<String>, E> {
    info!("event: {:?}", event);

    if event.method() == Method::OPTIONS {
        return Ok(json_response(StatusCode::OK, String::new()));
    }

    let params = event.query_string_parameters();
    if params.first("key").unwrap_or("") != cfg.access_key {
        return Ok(json_response(
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Unauthorized", "message": "Invalid access key" }).to_string(),
        ));
    }

    let session_id = params.first("id").map(str::to_owned);
    let wants_delete = params.first("delete") == Some("true");
    let page = params.first("page").map(str::to_owned);

    let result = if wants_delete && event.method() == Method::POST {
        delete_session(store, session_id.as_deref().unwrap_or_default()).await
    } else if let Some(id) = session_id {
        session_detail(store, &id).await
    } else {
        list_sessions(cfg, store, page.as_deref()).await
    };

    Ok(result.unwrap_or_else(|err| {
        error!("unhandled error: {}", err);
        json_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Internal Server Error", "message": err.to_string() }).to_string(),
        )
    }))
}

async fn list_sessions(
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

async fn session_detail(
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
) -> Result<Response<String>, Error> {
    match store.delete_session(session_id).await {
        Ok(count) => Ok(json_response(
            StatusCode::OK,
            json!({
                "success": true,
                "message": "Session deleted",
                "eventsDeleted": count,
            })
            .to_string(),
        )),
        Err(Error::SessionNotFound(_)) => Ok(json_response(
            StatusCode::NOT_FOUND,
            json!({
                "error": "Session not found",
                "message": "No events found for this session",
            })
            .to_string(),
        )),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use aws_sdk_dynamodb::{Client, Region};
    use lambda_http::Body;
    use query_map::QueryMap;

    fn test_config() -> Config {
        Config {
            table_name: "sessions-test".to_owned(),
            index_name: "page-analytics".to_owned(),
            access_key: "secret".to_owned(),
            default_page_url: "https://example.com/landing".to_owned(),
        }
    }

    async fn test_client() -> Client {
        let sdk = aws_config::from_env()
            .region(Region::new("us-east-1"))
            .load()
            .await;
        Client::new(&sdk)
    }

    fn request(method: &str, params: &[(&str, &str)]) -> Request {
        let map: HashMap<String, Vec<String>> = params
            .iter()
            .map(|(k, v)| ((*k).to_owned(), vec![(*v).to_owned()]))
            .collect();

        http::Request::builder()
            .method(method)
            .uri("/analytics/sessions")
            .body(Body::Empty)
            .unwrap()
            .with_query_string_parameters(QueryMap::from(map))
    }

    #[tokio::test]
    async fn answers_preflight_before_auth() {
        let cfg = test_config();
        let client = test_client().await;
        let store = SessionStore::new(&client, cfg.table_name.clone(), cfg.index_name.clone());

        let resp = handle(&cfg, &store, request("OPTIONS", &[])).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.body().is_empty());
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn rejects_bad_key_with_json() {
        let cfg = test_config();
        let client = test_client().await;
        let store = SessionStore::new(&client, cfg.table_name.clone(), cfg.index_name.clone());

        for params in [
            vec![("key", "wrong")],
            vec![("key", "wrong"), ("id", "abc123")],
            vec![("key", "wrong"), ("delete", "true"), ("id", "abc123")],
        ] {
            let resp = handle(&cfg, &store, request("GET", &params)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            assert!(resp.body().contains("Invalid access key"));
        }
    }
}
