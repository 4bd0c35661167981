//! DynamoDB-backed session repository.
//!
//! Event records live in one table: `pk = "analytics-session#" + sessionId`
//! with a per-event `sk`, and a page-level secondary index keyed by
//! `gsiPk = "page#" + pageUrl` for the list view.

use aws_sdk_dynamodb::model::{AttributeValue, DeleteRequest, WriteRequest};
use aws_sdk_dynamodb::Client;
use tracing::info;

use crate::errors::Error;
use crate::model::{self, EventRecord};

const SESSION_KEY_PREFIX: &str = "analytics-session#";
const PAGE_KEY_PREFIX: &str = "page#";

/// Most-recent-first cap on the page-level index query.
const PAGE_QUERY_LIMIT: i32 = 50;

/// DynamoDB caps BatchWriteItem at 25 requests per call.
const DELETE_BATCH_SIZE: usize = 25;

pub struct SessionStore<'a> {
    client: &'a Client,
    table_name: String,
    index_name: String,
}

impl<'a> SessionStore<'a> {
    pub fn new(client: &'a Client, table_name: String, index_name: String) -> Self {
        SessionStore {
            client,
            table_name,
            index_name,
        }
    }

    /// Latest event records for one page, via the secondary index.
    ///
    /// Single query, capped at 50 items; no pagination loop. Items that do
    /// not map to a full record are skipped.
    pub async fn recent_page_events(&self, page_url: &str) -> Result<Vec<EventRecord>, Error> {
        let resp = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(&self.index_name)
            .limit(PAGE_QUERY_LIMIT)
            .scan_index_forward(false)
            .key_condition_expression("gsiPk = :page")
            .expression_attribute_values(
                ":page",
                AttributeValue::S(format!("{}{}", PAGE_KEY_PREFIX, page_url)),
            )
            .send()
            .await?;

        let records = resp
            .items()
            .unwrap_or_default()
            .iter()
            .filter_map(EventRecord::from_item)
            .collect();

        Ok(records)
    }

    /// All event records for one session, sorted ascending by `relativeTime`.
    pub async fn session_events(&self, session_id: &str) -> Result<Vec<EventRecord>, Error> {
        let resp = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("pk = :pk")
            .expression_attribute_values(
                ":pk",
                AttributeValue::S(format!("{}{}", SESSION_KEY_PREFIX, session_id)),
            )
            .send()
            .await?;

        let mut records: Vec<EventRecord> = resp
            .items()
            .unwrap_or_default()
            .iter()
            .filter_map(EventRecord::from_item)
            .collect();

        model::sort_by_relative_time(&mut records);
        Ok(records)
    }

    /// Remove every event record of a session and return how many were
    /// deleted.
    ///
    /// Batches are issued one at a time; there is no rollback, so a failure
    /// partway through leaves the earlier batches deleted. A session with no
    /// events is reported as `SessionNotFound` without any write.
    pub async fn delete_session(&self, session_id: &str) -> Result<usize, Error> {
        let events = self.session_events(session_id).await?;
        if events.is_empty() {
            return Err(Error::SessionNotFound(session_id.to_owned()));
        }

        for batch in delete_batches(&events) {
            self.client
                .batch_write_item()
                .request_items(self.table_name.clone(), batch)
                .send()
                .await?;
        }

        info!(
            "deleted session {}: {} event records removed",
            session_id,
            events.len()
        );
        Ok(events.len())
    }
}

/// Split a session's records into BatchWriteItem-sized delete requests.
fn delete_batches(events: &[EventRecord]) -> Vec<Vec<WriteRequest>> {
    events
        .chunks(DELETE_BATCH_SIZE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|event| {
                    WriteRequest::builder()
                        .delete_request(
                            DeleteRequest::builder()
                                .key("pk", AttributeValue::S(event.pk.clone()))
                                .key("sk", AttributeValue::S(event.sk.clone()))
                                .build(),
                        )
                        .build()
                })
                .collect()
        })
        .collect()
}
