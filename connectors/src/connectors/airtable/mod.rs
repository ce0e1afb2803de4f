pub mod api;
pub mod transformer;

use async_trait::async_trait;
use integration_hub::credentials::StaticToken;
use integration_hub::pagination::CursorGuard;
use integration_hub::{Credentials, IntegrationError, ItemListing, Result};
use reqwest::Client;
use tracing::debug;

use crate::Connector;

use self::api::AirtableClient;
use self::transformer::record_to_item;

/// Airtable connector: lists every table of the configured base and pages
/// through each table's records.
pub struct AirtableConnector {
    http: Client,
    base_url: String,
}

impl AirtableConnector {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Connector for AirtableConnector {
    fn name(&self) -> &str {
        "airtable"
    }

    async fn fetch_items(&self, credentials: &Credentials) -> Result<ItemListing> {
        let mut listing = ItemListing::new();
        if credentials.is_empty() {
            return Ok(listing);
        }

        let base_id = match credentials {
            Credentials::Static(StaticToken {
                base_id: Some(base_id),
                ..
            }) if !base_id.is_empty() => base_id.as_str(),
            _ => {
                return Err(IntegrationError::invalid_request(
                    "Airtable credentials carry no base_id",
                ))
            }
        };
        let client = AirtableClient::new(&self.http, &self.base_url, credentials.bearer_token());

        let tables = match client.list_tables(base_id).await? {
            Ok(tables) => tables,
            Err(failure) => {
                listing.record_failure(failure);
                return Ok(listing);
            }
        };

        // Tables are read one after another; a failed page ends that table only.
        for table in &tables {
            let mut guard = CursorGuard::new(format!("records of {}", table.name));
            let mut offset: Option<String> = None;
            loop {
                let page = match client.list_records(base_id, table, offset.as_deref()).await? {
                    Ok(page) => page,
                    Err(failure) => {
                        listing.record_failure(failure);
                        break;
                    }
                };
                listing.items.extend(
                    page.records
                        .into_iter()
                        .filter_map(|record| record_to_item(base_id, table, record)),
                );
                offset = guard.advance(page.offset)?;
                if offset.is_none() {
                    break;
                }
            }
            debug!(table = %table.name, pages = guard.pages(), "Airtable table listed");
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn credentials() -> Credentials {
        Credentials::Static(StaticToken {
            token: "pat_test".to_string(),
            base_id: Some("appBASE".to_string()),
        })
    }

    async fn mock_tables(server: &mut mockito::ServerGuard, body: &str) -> mockito::Mock {
        server
            .mock("GET", "/v0/meta/bases/appBASE/tables")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn test_connector_metadata() {
        let connector = AirtableConnector::new(Client::new(), "https://api.airtable.com");
        assert_eq!(connector.name(), "airtable");
    }

    #[tokio::test]
    async fn test_fetch_follows_offsets_across_tables() {
        let mut server = Server::new_async().await;
        let _tables = mock_tables(
            &mut server,
            r#"{"tables": [{"id": "tblA", "name": "Tasks"}, {"id": "tblB", "name": "People"}]}"#,
        )
        .await;
        let _page1 = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"records": [
                    {"id": "rec1", "fields": {"Name": "One"}},
                    {"id": "rec2", "fields": {"Name": "Two"}}
                ], "offset": "itr1"}"#,
            )
            .create_async()
            .await;
        let _page2 = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100&offset=itr1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec3", "fields": {}}]}"#)
            .create_async()
            .await;
        let _people = server
            .mock("GET", "/v0/appBASE/tblB?pageSize=100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec4", "fields": {"Name": "Ada"}}]}"#)
            .create_async()
            .await;

        let connector = AirtableConnector::new(Client::new(), server.url());
        let listing = connector.fetch_items(&credentials()).await.unwrap();

        assert!(listing.is_complete());
        let ids: Vec<&str> = listing.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec2", "rec3", "rec4"]);
        assert_eq!(listing.items[2].name, "Record rec3");
        assert_eq!(listing.items[2].parent_name.as_deref(), Some("Tasks"));
        assert_eq!(listing.items[3].parent_id.as_deref(), Some("tblB"));
    }

    #[tokio::test]
    async fn test_repeated_offset_is_pagination_error() {
        let mut server = Server::new_async().await;
        let _tables = mock_tables(&mut server, r#"{"tables": [{"id": "tblA", "name": "Tasks"}]}"#).await;
        let _first = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [], "offset": "itr1"}"#)
            .create_async()
            .await;
        let _loop = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100&offset=itr1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [], "offset": "itr1"}"#)
            .create_async()
            .await;

        let connector = AirtableConnector::new(Client::new(), server.url());
        let err = connector.fetch_items(&credentials()).await.unwrap_err();
        assert!(matches!(err, IntegrationError::PaginationError(_)));
    }

    #[tokio::test]
    async fn test_failed_table_is_reported_and_others_kept() {
        let mut server = Server::new_async().await;
        let _tables = mock_tables(
            &mut server,
            r#"{"tables": [{"id": "tblA", "name": "Tasks"}, {"id": "tblB", "name": "People"}]}"#,
        )
        .await;
        let _denied = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100")
            .with_status(403)
            .with_body(r#"{"error": "NOT_AUTHORIZED"}"#)
            .create_async()
            .await;
        let _people = server
            .mock("GET", "/v0/appBASE/tblB?pageSize=100")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"records": [{"id": "rec4", "fields": {"Name": "Ada"}}]}"#)
            .create_async()
            .await;

        let connector = AirtableConnector::new(Client::new(), server.url());
        let listing = connector.fetch_items(&credentials()).await.unwrap();

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.failures.len(), 1);
        assert_eq!(listing.failures[0].status, 403);
        assert_eq!(listing.failures[0].stage, "list records of Tasks");
    }

    #[tokio::test]
    async fn test_unauthorized_token_yields_empty_listing() {
        let mut server = Server::new_async().await;
        let _tables = server
            .mock("GET", "/v0/meta/bases/appBASE/tables")
            .with_status(401)
            .with_body(r#"{"error": {"type": "AUTHENTICATION_REQUIRED"}}"#)
            .create_async()
            .await;

        let connector = AirtableConnector::new(Client::new(), server.url());
        let listing = connector.fetch_items(&credentials()).await.unwrap();
        assert!(listing.items.is_empty());
        assert_eq!(listing.failures[0].status, 401);
    }

    #[tokio::test]
    async fn test_empty_credentials_skip_provider() {
        let connector = AirtableConnector::new(Client::new(), "http://127.0.0.1:9");
        let creds = Credentials::Static(StaticToken {
            token: String::new(),
            base_id: Some("appBASE".to_string()),
        });
        let listing = connector.fetch_items(&creds).await.unwrap();
        assert!(listing.items.is_empty());
        assert!(listing.is_complete());
    }

    #[tokio::test]
    async fn test_missing_base_id_is_invalid_request() {
        let connector = AirtableConnector::new(Client::new(), "http://127.0.0.1:9");
        let creds = Credentials::Static(StaticToken {
            token: "pat_test".to_string(),
            base_id: None,
        });
        let err = connector.fetch_items(&creds).await.unwrap_err();
        assert!(matches!(err, IntegrationError::InvalidRequest(_)));
    }
}
