use async_trait::async_trait;
use integration_hub::{Credentials, ItemListing, Result};

/// Item fetcher for one provider.
///
/// Connectors are stateless: credentials come from the credential store on
/// every call and the shared HTTP client is injected at construction.
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use hub_connectors::Connector;
/// use integration_hub::{Credentials, IntegrationItem, ItemListing, Result};
///
/// struct StaticConnector;
///
/// #[async_trait]
/// impl Connector for StaticConnector {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     async fn fetch_items(&self, _credentials: &Credentials) -> Result<ItemListing> {
///         let mut listing = ItemListing::new();
///         listing.items.extend(IntegrationItem::new("1", "First", "record"));
///         Ok(listing)
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Provider identifier used in routes, store keys and logs
    /// (e.g. "airtable", "hubspot").
    fn name(&self) -> &str;

    /// Fetches every item reachable with `credentials`.
    ///
    /// # Returns
    /// * `Ok(listing)` - items plus any upstream calls that answered with a
    ///   non-success status; those contribute no items
    /// * `Err(...)` - transport errors, timeouts, a cursor that stops
    ///   advancing, or credentials unusable for this provider
    ///
    /// Empty credentials yield an empty listing without calling the provider.
    async fn fetch_items(&self, credentials: &Credentials) -> Result<ItemListing>;
}
