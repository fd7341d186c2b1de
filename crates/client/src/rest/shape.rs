//! Structural validation of response bodies.
//!
//! Bodies are parsed as untyped JSON first so a wrong shape (an object where
//! an array belongs, a string element in a list) is reported as such rather
//! than as a generic decode error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Operation, Resource, RestError};

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn parse(resource: Resource, operation: Operation, body: &str) -> Result<Value, RestError> {
    serde_json::from_str(body).map_err(|e| RestError::InvalidResponseShape {
        resource,
        operation,
        reason: format!("body is not JSON: {e}"),
    })
}

/// Decode an array of objects.
pub(super) fn decode_collection<T: DeserializeOwned>(
    resource: Resource,
    operation: Operation,
    body: &str,
) -> Result<Vec<T>, RestError> {
    let invalid = |reason: String| RestError::InvalidResponseShape {
        resource,
        operation,
        reason,
    };

    let elements = match parse(resource, operation, body)? {
        Value::Array(elements) => elements,
        other => return Err(invalid(format!("expected an array, got {}", kind(&other)))),
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            if !element.is_object() {
                return Err(invalid(format!(
                    "element {index} is {} rather than an object",
                    kind(&element)
                )));
            }
            serde_json::from_value(element)
                .map_err(|e| invalid(format!("element {index} does not decode: {e}")))
        })
        .collect()
}

/// Decode a single object.
pub(super) fn decode_item<T: DeserializeOwned>(
    resource: Resource,
    operation: Operation,
    body: &str,
) -> Result<T, RestError> {
    let invalid = |reason: String| RestError::InvalidResponseShape {
        resource,
        operation,
        reason,
    };

    let value = parse(resource, operation, body)?;
    if !value.is_object() {
        return Err(invalid(format!("expected an object, got {}", kind(&value))));
    }

    serde_json::from_value(value).map_err(|e| invalid(format!("object does not decode: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shelf_core::{Category, CategoryId};

    use super::*;

    fn list(body: &str) -> Result<Vec<Category>, RestError> {
        decode_collection(Resource::Categories, Operation::List, body)
    }

    #[test]
    fn test_empty_array_is_valid() {
        assert!(list("[]").unwrap().is_empty());
    }

    #[test]
    fn test_array_of_objects() {
        let categories = list(r#"[{"id":1,"name":"Tools"},{"id":2,"name":"Toys"}]"#).unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].id, CategoryId::new(2));
    }

    #[test]
    fn test_object_instead_of_array() {
        let err = list(r#"{"id":1,"name":"Tools"}"#).unwrap_err();
        assert!(err.to_string().contains("expected an array, got object"));
    }

    #[test]
    fn test_non_object_element() {
        let err = list(r#"[{"id":1,"name":"Tools"}, "oops"]"#).unwrap_err();
        assert!(err.to_string().contains("element 1 is string"));
    }

    #[test]
    fn test_undecodable_element() {
        let err = list(r#"[{"id":"x"}]"#).unwrap_err();
        assert!(err.is_invalid_shape());
        assert!(err.to_string().contains("element 0 does not decode"));
    }

    #[test]
    fn test_not_json() {
        let err = list("<html>").unwrap_err();
        assert!(err.to_string().contains("body is not JSON"));
    }

    #[test]
    fn test_item_requires_object() {
        let err = decode_item::<Category>(Resource::Categories, Operation::Get, "[]").unwrap_err();
        assert!(err.to_string().contains("expected an object, got array"));

        let ok: Category =
            decode_item(Resource::Categories, Operation::Get, r#"{"id":3,"name":"Garden"}"#)
                .unwrap();
        assert_eq!(ok.name, "Garden");
    }
}
