pub mod api;
pub mod transformer;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use integration_hub::pagination::CursorGuard;
use integration_hub::{Credentials, ItemListing, Result};
use reqwest::Client;
use tracing::debug;

use crate::upstream;
use crate::Connector;

use self::api::{HubSpotClient, ObjectKind};
use self::transformer::object_to_item;

/// HubSpot connector: lists contacts and companies, then fetches each
/// object's details with bounded concurrency.
pub struct HubSpotConnector {
    http: Client,
    base_url: String,
    detail_concurrency: usize,
}

impl HubSpotConnector {
    pub fn new(http: Client, base_url: impl Into<String>, detail_concurrency: usize) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    /// Lists every object of `kind` and appends the detailed items.
    ///
    /// A failed list page ends the listing of that kind; a failed detail
    /// fetch skips that object only.
    async fn fetch_kind(
        &self,
        client: &HubSpotClient<'_>,
        kind: ObjectKind,
        listing: &mut ItemListing,
    ) -> Result<()> {
        let mut guard = CursorGuard::new(format!("{} listing", kind.path()));
        let mut after: Option<String> = None;

        loop {
            let page = match client.list_objects(kind, after.as_deref()).await? {
                Ok(page) => page,
                Err(failure) => {
                    listing.record_failure(failure);
                    break;
                }
            };
            let next = page.next_after();
            let ids: Vec<String> = page
                .results
                .into_iter()
                .filter(|object| !object.archived)
                .map(|object| object.id)
                .collect();

            // `buffered` keeps listing order while requests overlap.
            let details: Vec<_> = stream::iter(ids)
                .map(|id| async move {
                    let fetched = client.get_object(kind, &id).await;
                    (id, fetched)
                })
                .buffered(self.detail_concurrency)
                .collect()
                .await;

            for (id, fetched) in details {
                match fetched {
                    Ok(Ok(object)) => listing.items.extend(object_to_item(kind, object)),
                    Ok(Err(failure)) => listing.record_failure(failure),
                    Err(e) => listing.record_failure(upstream::failure(
                        &format!("get {} {}", kind.item_type(), id),
                        0,
                        &e.to_string(),
                    )),
                }
            }

            after = guard.advance(next)?;
            if after.is_none() {
                break;
            }
        }

        debug!(kind = kind.path(), pages = guard.pages(), "HubSpot objects listed");
        Ok(())
    }
}

#[async_trait]
impl Connector for HubSpotConnector {
    fn name(&self) -> &str {
        "hubspot"
    }

    async fn fetch_items(&self, credentials: &Credentials) -> Result<ItemListing> {
        let mut listing = ItemListing::new();
        if credentials.is_empty() {
            return Ok(listing);
        }

        let client = HubSpotClient::new(&self.http, &self.base_url, credentials.bearer_token());
        for kind in [ObjectKind::Contact, ObjectKind::Company] {
            self.fetch_kind(&client, kind, &mut listing).await?;
        }

        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use integration_hub::credentials::TokenCredentials;
    use integration_hub::IntegrationError;
    use mockito::Server;
    use serde_json::Map;

    const CONTACT_PROPS: &str = "firstname,lastname,email,phone,company,jobtitle,lifecyclestage";
    const COMPANY_PROPS: &str = "name,domain,industry,city,country,numberofemployees";

    fn credentials() -> Credentials {
        Credentials::OAuth(TokenCredentials {
            access_token: "hs_token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(1800),
            token_type: Some("bearer".to_string()),
            extra: Map::new(),
        })
    }

    async fn mock_json(server: &mut mockito::ServerGuard, path: &str, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn test_connector_metadata() {
        let connector = HubSpotConnector::new(Client::new(), "https://api.hubapi.com", 0);
        assert_eq!(connector.name(), "hubspot");
        assert_eq!(connector.detail_concurrency, 1);
    }

    #[tokio::test]
    async fn test_fetch_contacts_and_companies() {
        let mut server = Server::new_async().await;
        let _contacts1 = mock_json(
            &mut server,
            "/crm/v3/objects/contacts?limit=100",
            200,
            r#"{"results": [{"id": "1", "properties": {}}, {"id": "2", "properties": {}}],
                "paging": {"next": {"after": "2"}}}"#,
        )
        .await;
        let _contacts2 = mock_json(
            &mut server,
            "/crm/v3/objects/contacts?limit=100&after=2",
            200,
            r#"{"results": [{"id": "3", "properties": {}, "archived": true}]}"#,
        )
        .await;
        let _detail1 = mock_json(
            &mut server,
            &format!("/crm/v3/objects/contacts/1?properties={}", CONTACT_PROPS),
            200,
            r#"{"id": "1", "properties": {"firstname": "Ada", "lastname": "Lovelace"}}"#,
        )
        .await;
        let _detail2 = mock_json(
            &mut server,
            &format!("/crm/v3/objects/contacts/2?properties={}", CONTACT_PROPS),
            200,
            r#"{"id": "2", "properties": {"email": "grace@example.com"}}"#,
        )
        .await;
        let _companies = mock_json(
            &mut server,
            "/crm/v3/objects/companies?limit=100",
            200,
            r#"{"results": [{"id": "7", "properties": {}}]}"#,
        )
        .await;
        let _company = mock_json(
            &mut server,
            &format!("/crm/v3/objects/companies/7?properties={}", COMPANY_PROPS),
            200,
            r#"{"id": "7", "properties": {"name": "Acme"}}"#,
        )
        .await;

        let connector = HubSpotConnector::new(Client::new(), server.url(), 4);
        let listing = connector.fetch_items(&credentials()).await.unwrap();

        assert!(listing.is_complete());
        let names: Vec<&str> = listing.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Ada Lovelace", "grace@example.com", "Acme"]);
        assert_eq!(listing.items[2].item_type, "company");
    }

    #[tokio::test]
    async fn test_failed_detail_is_skipped() {
        let mut server = Server::new_async().await;
        let _contacts = mock_json(
            &mut server,
            "/crm/v3/objects/contacts?limit=100",
            200,
            r#"{"results": [{"id": "1", "properties": {}}, {"id": "2", "properties": {}}]}"#,
        )
        .await;
        let _gone = mock_json(
            &mut server,
            &format!("/crm/v3/objects/contacts/1?properties={}", CONTACT_PROPS),
            404,
            r#"{"status": "error", "message": "Object not found"}"#,
        )
        .await;
        let _detail2 = mock_json(
            &mut server,
            &format!("/crm/v3/objects/contacts/2?properties={}", CONTACT_PROPS),
            200,
            r#"{"id": "2", "properties": {"firstname": "Grace"}}"#,
        )
        .await;
        let _companies = mock_json(
            &mut server,
            "/crm/v3/objects/companies?limit=100",
            200,
            r#"{"results": []}"#,
        )
        .await;

        let connector = HubSpotConnector::new(Client::new(), server.url(), 2);
        let listing = connector.fetch_items(&credentials()).await.unwrap();

        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].id, "2");
        assert_eq!(listing.failures.len(), 1);
        assert_eq!(listing.failures[0].stage, "get contact 1");
        assert_eq!(listing.failures[0].status, 404);
    }

    #[tokio::test]
    async fn test_expired_token_yields_empty_listing() {
        let mut server = Server::new_async().await;
        let body = r#"{"status": "error", "category": "EXPIRED_AUTHENTICATION"}"#;
        let _contacts = mock_json(&mut server, "/crm/v3/objects/contacts?limit=100", 401, body).await;
        let _companies = mock_json(&mut server, "/crm/v3/objects/companies?limit=100", 401, body).await;

        let connector = HubSpotConnector::new(Client::new(), server.url(), 4);
        let listing = connector.fetch_items(&credentials()).await.unwrap();

        assert!(listing.items.is_empty());
        assert_eq!(listing.failures.len(), 2);
        assert!(listing.failures.iter().all(|f| f.status == 401));
    }

    #[tokio::test]
    async fn test_repeated_cursor_is_pagination_error() {
        let mut server = Server::new_async().await;
        let body = r#"{"results": [], "paging": {"next": {"after": "5"}}}"#;
        let _first = mock_json(&mut server, "/crm/v3/objects/contacts?limit=100", 200, body).await;
        let _again = mock_json(&mut server, "/crm/v3/objects/contacts?limit=100&after=5", 200, body).await;

        let connector = HubSpotConnector::new(Client::new(), server.url(), 4);
        let err = connector.fetch_items(&credentials()).await.unwrap_err();
        assert!(matches!(err, IntegrationError::PaginationError(_)));
    }
}
