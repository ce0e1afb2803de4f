use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::upstream::{decode, Fetched};

/// Objects requested per list page (CRM v3 maximum).
const PAGE_LIMIT: &str = "100";

/// CRM object types read by the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Contact,
    Company,
}

impl ObjectKind {
    /// Path segment under `/crm/v3/objects`.
    pub fn path(self) -> &'static str {
        match self {
            ObjectKind::Contact => "contacts",
            ObjectKind::Company => "companies",
        }
    }

    /// Item type of the normalized item.
    pub fn item_type(self) -> &'static str {
        match self {
            ObjectKind::Contact => "contact",
            ObjectKind::Company => "company",
        }
    }

    /// Properties requested on detail fetches.
    pub fn properties(self) -> &'static [&'static str] {
        match self {
            ObjectKind::Contact => &[
                "firstname",
                "lastname",
                "email",
                "phone",
                "company",
                "jobtitle",
                "lifecyclestage",
            ],
            ObjectKind::Company => &[
                "name",
                "domain",
                "industry",
                "city",
                "country",
                "numberofemployees",
            ],
        }
    }
}

/// CRM object as returned by list and detail endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct HubSpotObject {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Deserialize)]
pub struct NextPage {
    pub after: String,
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    pub next: Option<NextPage>,
}

/// One page of a CRM object listing.
#[derive(Debug, Deserialize)]
pub struct ObjectPage {
    #[serde(default)]
    pub results: Vec<HubSpotObject>,
    pub paging: Option<Paging>,
}

impl ObjectPage {
    /// Cursor of the following page, absent on the last one.
    pub fn next_after(&self) -> Option<String> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_ref())
            .map(|n| n.after.clone())
    }
}

/// HTTP client for the HubSpot CRM v3 object API.
pub struct HubSpotClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: &'a str,
}

impl<'a> HubSpotClient<'a> {
    pub fn new(http: &'a Client, base_url: &'a str, access_token: &'a str) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Fetch one page of objects of `kind`, starting after `after` when given.
    pub async fn list_objects(&self, kind: ObjectKind, after: Option<&str>) -> Fetched<ObjectPage> {
        let url = format!("{}/crm/v3/objects/{}", self.base_url, kind.path());
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .query(&[("limit", PAGE_LIMIT)]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }
        let response = request.send().await?;

        decode(&format!("list {}", kind.path()), response).await
    }

    /// Fetch a single object with the properties the normalizer reads.
    pub async fn get_object(&self, kind: ObjectKind, id: &str) -> Fetched<HubSpotObject> {
        let url = format!(
            "{}/crm/v3/objects/{}/{}?properties={}",
            self.base_url,
            kind.path(),
            id,
            kind.properties().join(",")
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.access_token)
            .send()
            .await?;

        decode(&format!("get {} {}", kind.item_type(), id), response).await
    }
}
