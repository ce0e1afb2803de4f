pub mod airtable;
pub mod hubspot;
pub mod notion;

pub use airtable::AirtableConnector;
pub use hubspot::HubSpotConnector;
pub use notion::NotionConnector;
