//! JSON:API document parsing.
//!
//! # Responsibilities
//! - Flatten primary resources into `{id, type, ...attributes, ...relationships}`
//! - Resolve relationships against `included` (cycles stop at identifiers)
//! - Extract top-level `links` as name → href pairs for binding
//!
//! Keys are camelCased on the way out; attribute values are untouched apart
//! from their own nested keys.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::http::case::{camel_case_deep, to_camel_case};

/// A parsed JSON:API document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    /// Flattened primary data (object, array or null).
    pub data: Value,
    /// Top-level meta, camelCased.
    pub meta: Value,
    /// Top-level links by name.
    pub links: BTreeMap<String, String>,
}

type ResourceKey = (String, String);

/// Parse a response body as a JSON:API document.
///
/// Bodies without a top-level `data` member are returned as camelCased data
/// with no links.
pub fn parse_document(body: Value) -> Document {
    let mut root = match body {
        Value::Object(map) if map.contains_key("data") => map,
        other => {
            return Document {
                data: camel_case_deep(other),
                ..Document::default()
            }
        }
    };

    let included_values = match root.remove("included") {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    let included: HashMap<ResourceKey, &Value> = included_values
        .iter()
        .filter_map(|resource| resource_key(resource).map(|key| (key, resource)))
        .collect();

    let mut visiting = Vec::new();
    let data = match root.remove("data").unwrap_or(Value::Null) {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| flatten_resource(item, &included, &mut visiting))
                .collect(),
        ),
        Value::Null => Value::Null,
        single => flatten_resource(&single, &included, &mut visiting),
    };

    Document {
        data,
        meta: root.remove("meta").map(camel_case_deep).unwrap_or(Value::Null),
        links: extract_links(root.get("links")),
    }
}

fn resource_key(resource: &Value) -> Option<ResourceKey> {
    let id = resource.get("id")?.as_str()?;
    let kind = resource.get("type")?.as_str()?;
    Some((kind.to_string(), id.to_string()))
}

fn flatten_resource(
    resource: &Value,
    included: &HashMap<ResourceKey, &Value>,
    visiting: &mut Vec<ResourceKey>,
) -> Value {
    let object = match resource.as_object() {
        Some(object) => object,
        None => return camel_case_deep(resource.clone()),
    };

    let mut out = Map::new();
    for field in ["id", "type"] {
        if let Some(value) = object.get(field) {
            out.insert(field.to_string(), value.clone());
        }
    }

    if let Some(Value::Object(attributes)) = object.get("attributes") {
        for (key, value) in attributes {
            out.insert(to_camel_case(key), camel_case_deep(value.clone()));
        }
    }

    if let Some(Value::Object(relationships)) = object.get("relationships") {
        for (name, relationship) in relationships {
            let resolved = match relationship.get("data") {
                Some(Value::Array(items)) => Value::Array(
                    items
                        .iter()
                        .map(|item| resolve(item, included, visiting))
                        .collect(),
                ),
                Some(Value::Null) => Value::Null,
                Some(identifier) => resolve(identifier, included, visiting),
                None => continue,
            };
            out.insert(to_camel_case(name), resolved);
        }
    }

    Value::Object(out)
}

fn resolve(
    identifier: &Value,
    included: &HashMap<ResourceKey, &Value>,
    visiting: &mut Vec<ResourceKey>,
) -> Value {
    let key = match resource_key(identifier) {
        Some(key) => key,
        None => return camel_case_deep(identifier.clone()),
    };

    match included.get(&key) {
        Some(resource) if !visiting.contains(&key) => {
            visiting.push(key);
            let flattened = flatten_resource(resource, included, visiting);
            visiting.pop();
            flattened
        }
        _ => {
            let mut stub = Map::new();
            stub.insert("id".to_string(), Value::String(key.1));
            stub.insert("type".to_string(), Value::String(key.0));
            Value::Object(stub)
        }
    }
}

fn extract_links(links: Option<&Value>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if let Some(Value::Object(map)) = links {
        for (name, link) in map {
            let href = match link {
                Value::String(href) => Some(href.clone()),
                Value::Object(object) => object.get("href").and_then(Value::as_str).map(str::to_string),
                _ => None,
            };
            if let Some(href) = href {
                out.insert(name.clone(), href);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattens_attributes_and_relationships() {
        let doc = parse_document(json!({
            "data": {
                "id": "GA1",
                "type": "accounts",
                "attributes": {"account_type": "general"},
                "relationships": {
                    "balances": {"data": [{"id": "B1", "type": "balances"}]},
                    "referrer": {"data": null},
                    "role": {"data": {"id": "1", "type": "roles"}}
                }
            },
            "included": [
                {"id": "B1", "type": "balances", "attributes": {"asset_code": "USD"}}
            ]
        }));

        assert_eq!(doc.data["id"], "GA1");
        assert_eq!(doc.data["accountType"], "general");
        assert_eq!(doc.data["balances"][0]["assetCode"], "USD");
        assert_eq!(doc.data["referrer"], Value::Null);
        assert_eq!(doc.data["role"], json!({"id": "1", "type": "roles"}));
        assert!(doc.links.is_empty());
    }

    #[test]
    fn test_cyclic_includes_terminate() {
        let doc = parse_document(json!({
            "data": {
                "id": "1", "type": "a",
                "relationships": {"peer": {"data": {"id": "2", "type": "b"}}}
            },
            "included": [
                {"id": "2", "type": "b", "relationships": {"peer": {"data": {"id": "3", "type": "a"}}}},
                {"id": "3", "type": "a", "relationships": {"peer": {"data": {"id": "2", "type": "b"}}}}
            ]
        }));

        assert_eq!(doc.data["peer"]["id"], "2");
        assert_eq!(doc.data["peer"]["peer"]["id"], "3");
        assert_eq!(doc.data["peer"]["peer"]["peer"], json!({"id": "2", "type": "b"}));
    }

    #[test]
    fn test_links_and_meta() {
        let doc = parse_document(json!({
            "data": [],
            "links": {
                "self": "/v3/accounts?page[number]=0",
                "next": {"href": "/v3/accounts?page[number]=1"},
                "prev": null
            },
            "meta": {"total_count": 3}
        }));

        assert_eq!(doc.data, json!([]));
        assert_eq!(doc.meta["totalCount"], 3);
        assert_eq!(doc.links.len(), 2);
        assert_eq!(doc.links["next"], "/v3/accounts?page[number]=1");
    }

    #[test]
    fn test_non_jsonapi_body() {
        let doc = parse_document(json!({"network_passphrase": "x"}));
        assert_eq!(doc.data, json!({"networkPassphrase": "x"}));
        assert_eq!(doc.meta, Value::Null);
    }
}
