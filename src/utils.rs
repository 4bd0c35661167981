use std::time;

use aws_config::{meta::region::RegionProviderChain, SdkConfig};
use aws_smithy_types::{timeout, tristate::TriState};
use lambda_http::{http::StatusCode, Response};

pub fn setup_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}

pub async fn setup_sdk_config() -> SdkConfig {
    let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
    let timeout_config = aws_config::timeout::Config::new()
        .with_api_timeouts(
            timeout::Api::new()
                .with_call_timeout(TriState::Set(time::Duration::from_secs(2)))
                .with_call_attempt_timeout(TriState::Set(time::Duration::from_secs(2))),
        )
        .with_http_timeouts(
            timeout::Http::new()
                .with_read_timeout(TriState::Set(time::Duration::from_secs(2)))
                .with_connect_timeout(TriState::Set(time::Duration::from_secs(2))),
        );

    aws_config::from_env()
        .region(region_provider)
        .timeout_config(timeout_config)
        .load()
        .await
}

/// JSON response with the permissive CORS headers every endpoint carries.
pub fn json_response(status_code: StatusCode, body: String) -> Response<String> {
    Response::builder()
        .status(status_code)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(body)
        .unwrap()
}

/// HTML response. Same wildcard origin; the HTML surface is read via GET only.
pub fn html_response(status_code: StatusCode, body: String) -> Response<String> {
    Response::builder()
        .status(status_code)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET,OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(body)
        .unwrap()
}

/// Empty-bodied redirect, used after an HTML-mode delete.
pub fn redirect(location: String) -> Response<String> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", location)
        .body(String::new())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_response_carries_cors_headers() {
        let resp = json_response(StatusCode::OK, "{}".to_owned());

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            resp.headers()["Access-Control-Allow-Methods"],
            "GET,POST,OPTIONS"
        );
    }

    #[test]
    fn html_response_sets_charset() {
        let resp = html_response(StatusCode::NOT_FOUND, "<h1>nope</h1>".to_owned());

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[test]
    fn redirect_points_at_location() {
        let resp = redirect("/analytics/sessions?key=k".to_owned());

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()["Location"], "/analytics/sessions?key=k");
        assert!(resp.body().is_empty());
    }
}
