pub mod api;
pub mod transformer;

use async_trait::async_trait;
use integration_hub::pagination::CursorGuard;
use integration_hub::{Credentials, ItemListing, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::Connector;

use self::api::NotionClient;
use self::transformer::object_to_item;

/// Notion connector: emits every shared database and its entries.
pub struct NotionConnector {
    http: Client,
    base_url: String,
    api_version: String,
}

impl NotionConnector {
    pub fn new(http: Client, base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_version: api_version.into(),
        }
    }
}

/// Plain-text title of a database object.
fn database_title(database: &Value) -> Option<String> {
    let title: String = database
        .get("title")?
        .as_array()?
        .iter()
        .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
        .collect();
    Some(title).filter(|t| !t.is_empty())
}

#[async_trait]
impl Connector for NotionConnector {
    fn name(&self) -> &str {
        "notion"
    }

    async fn fetch_items(&self, credentials: &Credentials) -> Result<ItemListing> {
        let mut listing = ItemListing::new();
        if credentials.is_empty() {
            return Ok(listing);
        }
        let client = NotionClient::new(
            &self.http,
            &self.base_url,
            &self.api_version,
            credentials.bearer_token(),
        );

        let mut databases = Vec::new();
        let mut guard = CursorGuard::new("database search");
        let mut cursor: Option<String> = None;
        loop {
            let page = match client.search_databases(cursor.as_deref()).await? {
                Ok(page) => page,
                Err(failure) => {
                    listing.record_failure(failure);
                    break;
                }
            };
            cursor = guard.advance(page.next())?;
            databases.extend(page.results);
            if cursor.is_none() {
                break;
            }
        }

        for database in &databases {
            let Some(database_id) = database.get("id").and_then(Value::as_str) else {
                continue;
            };
            listing.items.extend(object_to_item(database, None));
            let title = database_title(database);

            let mut guard = CursorGuard::new(format!("entries of database {}", database_id));
            let mut cursor: Option<String> = None;
            loop {
                let page = match client.query_database(database_id, cursor.as_deref()).await? {
                    Ok(page) => page,
                    Err(failure) => {
                        listing.record_failure(failure);
                        break;
                    }
                };
                cursor = guard.advance(page.next())?;
                listing.items.extend(
                    page.results
                        .iter()
                        .filter_map(|entry| object_to_item(entry, title.as_deref())),
                );
                if cursor.is_none() {
                    break;
                }
            }
            debug!(database_id = %database_id, pages = guard.pages(), "Notion database queried");
        }

        Ok(listing)
    }
}
