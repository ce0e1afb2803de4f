use integration_hub::IntegrationItem;
use serde_json::Value;

use super::api::{AirtableRecord, AirtableTable};

/// Web UI host for record links.
const WEB_URL: &str = "https://airtable.com";

/// Transform an Airtable record into an integration item.
///
/// Name: the `Name` field, or `Record {id}` when it is missing or blank.
/// Parent: the table the record was listed from.
pub fn record_to_item(
    base_id: &str,
    table: &AirtableTable,
    record: AirtableRecord,
) -> Option<IntegrationItem> {
    let name = record
        .fields
        .get("Name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Record {}", record.id));
    let url = format!("{}/{}/{}/{}", WEB_URL, base_id, table.id, record.id);

    IntegrationItem::new(record.id, name, "record").map(|item| {
        item.with_parent(Some(table.id.clone()), Some(table.name.clone()))
            .with_url(Some(url))
            .with_times(record.created_time.as_deref(), None)
            .with_properties(record.fields)
    })
}
