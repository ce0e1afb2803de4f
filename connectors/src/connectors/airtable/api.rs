use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::upstream::{decode, Fetched};

/// Records requested per page (Airtable's maximum).
const PAGE_SIZE: &str = "100";

/// Table from the base schema.
#[derive(Debug, Clone, Deserialize)]
pub struct AirtableTable {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TablesResponse {
    #[serde(default)]
    pub tables: Vec<AirtableTable>,
}

/// Airtable record.
#[derive(Debug, Deserialize)]
pub struct AirtableRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
    #[serde(rename = "createdTime")]
    pub created_time: Option<String>,
}

/// One page of records; `offset` is absent on the last page.
#[derive(Debug, Deserialize)]
pub struct RecordsPage {
    #[serde(default)]
    pub records: Vec<AirtableRecord>,
    pub offset: Option<String>,
}

/// HTTP client for the Airtable Meta and record APIs.
///
/// Authenticates with the personal access token as a Bearer token.
pub struct AirtableClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    token: &'a str,
}

impl<'a> AirtableClient<'a> {
    pub fn new(http: &'a Client, base_url: &'a str, token: &'a str) -> Self {
        Self {
            http,
            base_url,
            token,
        }
    }

    /// List the tables of a base.
    pub async fn list_tables(&self, base_id: &str) -> Fetched<Vec<AirtableTable>> {
        let url = format!("{}/v0/meta/bases/{}/tables", self.base_url, base_id);
        let response = self.http.get(&url).bearer_auth(self.token).send().await?;

        Ok(decode::<TablesResponse>("list tables", response)
            .await?
            .map(|body| body.tables))
    }

    /// Fetch one page of records, starting at `offset` when given.
    pub async fn list_records(
        &self,
        base_id: &str,
        table: &AirtableTable,
        offset: Option<&str>,
    ) -> Fetched<RecordsPage> {
        let url = format!("{}/v0/{}/{}", self.base_url, base_id, table.id);
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(self.token)
            .query(&[("pageSize", PAGE_SIZE)]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset)]);
        }
        let response = request.send().await?;

        decode(&format!("list records of {}", table.name), response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_list_tables() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/meta/bases/appBASE/tables")
            .match_header("authorization", "Bearer pat_test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"tables": [
                    {"id": "tblA", "name": "Tasks", "primaryFieldId": "fld1", "fields": []},
                    {"id": "tblB", "name": "People", "primaryFieldId": "fld2", "fields": []}
                ]}"#,
            )
            .create_async()
            .await;

        let http = Client::new();
        let url = server.url();
        let client = AirtableClient::new(&http, &url, "pat_test");
        let tables = client.list_tables("appBASE").await.unwrap().unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].id, "tblA");
        assert_eq!(tables[1].name, "People");
    }

    #[tokio::test]
    async fn test_list_records_with_offset() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/appBASE/tblA?pageSize=100&offset=itr2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"records": [
                    {"id": "rec3", "createdTime": "2024-02-01T09:00:00.000Z", "fields": {"Name": "Third"}}
                ]}"#,
            )
            .create_async()
            .await;

        let http = Client::new();
        let url = server.url();
        let client = AirtableClient::new(&http, &url, "pat_test");
        let table = AirtableTable {
            id: "tblA".to_string(),
            name: "Tasks".to_string(),
        };
        let page = client
            .list_records("appBASE", &table, Some("itr2"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].id, "rec3");
        assert!(page.offset.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_failure_not_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v0/meta/bases/appBASE/tables")
            .with_status(401)
            .with_body(r#"{"error": {"type": "AUTHENTICATION_REQUIRED"}}"#)
            .create_async()
            .await;

        let http = Client::new();
        let url = server.url();
        let client = AirtableClient::new(&http, &url, "bad");
        let failure = client.list_tables("appBASE").await.unwrap().unwrap_err();

        assert_eq!(failure.status, 401);
        assert_eq!(failure.stage, "list tables");
        assert!(failure.message.contains("AUTHENTICATION_REQUIRED"));
    }
}
