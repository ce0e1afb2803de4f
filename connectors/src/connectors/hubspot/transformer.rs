use integration_hub::IntegrationItem;
use serde_json::{Map, Value};

use super::api::{HubSpotObject, ObjectKind};

fn property<'a>(properties: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Display name of a CRM object.
///
/// Contacts: `firstname lastname`, then `email`, then `Contact {id}`.
/// Companies: `name`, then `Company {id}`.
pub fn display_name(kind: ObjectKind, object: &HubSpotObject) -> String {
    let props = &object.properties;
    match kind {
        ObjectKind::Contact => {
            let full = [property(props, "firstname"), property(props, "lastname")]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            if !full.is_empty() {
                full
            } else if let Some(email) = property(props, "email") {
                email.to_string()
            } else {
                format!("Contact {}", object.id)
            }
        }
        ObjectKind::Company => property(props, "name")
            .map(str::to_string)
            .unwrap_or_else(|| format!("Company {}", object.id)),
    }
}

/// Transform a CRM object into an integration item.
pub fn object_to_item(kind: ObjectKind, object: HubSpotObject) -> Option<IntegrationItem> {
    let name = display_name(kind, &object);
    IntegrationItem::new(object.id, name, kind.item_type()).map(|item| {
        item.with_times(object.created_at.as_deref(), object.updated_at.as_deref())
            .with_properties(object.properties)
    })
}
