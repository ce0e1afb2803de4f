use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::upstream::{decode, Fetched};

/// Results requested per page (Notion's maximum).
const PAGE_SIZE: u32 = 100;

/// One page of a search or database query.
///
/// Results are kept as raw objects; their shape differs per object type and
/// per database schema.
#[derive(Debug, Deserialize)]
pub struct ResultsPage {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl ResultsPage {
    /// Cursor of the following page, absent on the last one.
    pub fn next(&self) -> Option<String> {
        if self.has_more {
            self.next_cursor.clone()
        } else {
            None
        }
    }
}

/// HTTP client for the Notion API.
///
/// Every request carries the bearer token and the pinned `Notion-Version`.
pub struct NotionClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    api_version: &'a str,
    token: &'a str,
}

impl<'a> NotionClient<'a> {
    pub fn new(http: &'a Client, base_url: &'a str, api_version: &'a str, token: &'a str) -> Self {
        Self {
            http,
            base_url,
            api_version,
            token,
        }
    }

    async fn post(&self, stage: &str, path: &str, body: Value) -> Fetched<ResultsPage> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.token)
            .header("Notion-Version", self.api_version)
            .json(&body)
            .send()
            .await?;

        decode(stage, response).await
    }

    /// Search the databases shared with the integration.
    pub async fn search_databases(&self, start_cursor: Option<&str>) -> Fetched<ResultsPage> {
        let mut body = json!({
            "filter": {"property": "object", "value": "database"},
            "page_size": PAGE_SIZE,
        });
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = json!(cursor);
        }
        self.post("search databases", "/search", body).await
    }

    /// Query the entries of one database.
    pub async fn query_database(
        &self,
        database_id: &str,
        start_cursor: Option<&str>,
    ) -> Fetched<ResultsPage> {
        let mut body = json!({ "page_size": PAGE_SIZE });
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = json!(cursor);
        }
        self.post(
            &format!("query database {}", database_id),
            &format!("/databases/{}/query", database_id),
            body,
        )
        .await
    }
}
