use integration_hub::tree::{find_first_str, DEFAULT_MAX_DEPTH};
use integration_hub::IntegrationItem;
use serde_json::{Map, Value};

/// Name used when an object has no text content anywhere.
const FALLBACK_NAME: &str = "multi_select";

/// Text content naming a Notion object.
///
/// Searches `properties` for the first `content` string, then the whole
/// object (database titles live outside `properties`).
fn content_name(object: &Value) -> &str {
    object
        .get("properties")
        .and_then(|props| find_first_str(props, "content", DEFAULT_MAX_DEPTH))
        .or_else(|| find_first_str(object, "content", DEFAULT_MAX_DEPTH))
        .unwrap_or(FALLBACK_NAME)
}

/// Id of the object's parent; `None` for workspace-level objects.
///
/// The parent object is keyed by its own type, e.g.
/// `{"type": "database_id", "database_id": "..."}`.
fn parent_id(object: &Value) -> Option<String> {
    let parent = object.get("parent")?;
    let parent_type = parent.get("type")?.as_str()?;
    if parent_type == "workspace" {
        return None;
    }
    parent.get(parent_type)?.as_str().map(str::to_string)
}

/// Transform a raw Notion page or database object into an integration item.
///
/// The name is prefixed with the object type (`page Hello`). `parent_name`
/// is attached only when the object has a parent id.
pub fn object_to_item(object: &Value, parent_name: Option<&str>) -> Option<IntegrationItem> {
    let id = object.get("id").and_then(Value::as_str)?;
    let object_type = object.get("object").and_then(Value::as_str).unwrap_or("page");
    let name = format!("{} {}", object_type, content_name(object));
    let parent_id = parent_id(object);
    let parent_name = parent_id
        .as_ref()
        .and(parent_name)
        .map(str::to_string);
    let properties = object
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_else(Map::new);

    IntegrationItem::new(id, name, object_type).map(|item| {
        item.with_parent(parent_id, parent_name)
            .with_properties(properties)
            .with_url(object.get("url").and_then(Value::as_str).map(str::to_string))
            .with_times(
                object.get("created_time").and_then(Value::as_str),
                object.get("last_edited_time").and_then(Value::as_str),
            )
    })
}
