use std::env;

use tracing::warn;

/// Stand-in secret for local runs. Anything deployed must set ACCESS_KEY.
pub const PLACEHOLDER_ACCESS_KEY: &str = "change-me";

const DEFAULT_INDEX_NAME: &str = "page-analytics";

/// Deploy-time settings, read once at startup and passed by reference into
/// the handlers.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_name: String,
    pub index_name: String,
    pub access_key: String,
    /// Page the list view queries when no `page` filter is supplied.
    pub default_page_url: String,
}

impl Config {
    pub fn from_env() -> Config {
        let access_key = match env::var("ACCESS_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                warn!("ACCESS_KEY is not set, using the placeholder key");
                PLACEHOLDER_ACCESS_KEY.to_owned()
            }
        };

        Config {
            table_name: env::var("TABLE_NAME").expect("TABLE_NAME must be set"),
            index_name: env::var("SESSIONS_INDEX")
                .unwrap_or_else(|_| DEFAULT_INDEX_NAME.to_owned()),
            access_key,
            default_page_url: env::var("DEFAULT_PAGE_URL")
                .expect("DEFAULT_PAGE_URL must be set"),
        }
    }
}
