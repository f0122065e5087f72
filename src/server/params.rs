//! Request body parameters
use crate::error::ApiError;
use serde_json::{Map, Value};
use tracing::info;

/// Parsed JSON object body of a request.
pub type Body = Map<String, Value>;

/// Parse a request body as a JSON object.
///
/// An empty body is an empty object.
pub fn parse_body(body: &str) -> Result<Body, ApiError> {
    if body.trim().is_empty() {
        return Ok(Body::new());
    }
    match serde_json::from_str(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => {
            info!("Request is not a valid json");
            Err(ApiError::InvalidJson)
        }
    }
}

/// Parameter values that count as not provided: `null`, `""` and `[]`.
fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// A parameter that must be provided.
pub fn required<'a>(body: &'a Body, name: &str) -> Result<&'a Value, ApiError> {
    match body.get(name) {
        Some(value) if !is_absent(value) => Ok(value),
        value => {
            info!(param = name, ?value, "required request parameter not provided");
            Err(ApiError::MissingParameter(name.to_string()))
        }
    }
}

/// A parameter that may be omitted.
pub fn optional<'a>(body: &'a Body, name: &str) -> Option<&'a Value> {
    match body.get(name) {
        Some(value) if !is_absent(value) => Some(value),
        Some(value) => {
            info!(param = name, %value, "optional request parameter replaced with its default");
            None
        }
        None => None,
    }
}

/// A non-negative integer given as a JSON number or a numeric string.
pub fn to_u64(name: &str, value: &Value) -> Result<u64, ApiError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|x| *x >= 0.0 && x.fract() == 0.0 && *x <= u64::MAX as f64)
                .map(|x| x as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        ApiError::invalid_parameter(name, format!("expected a non-negative integer, got {}", value))
    })
}

pub fn to_bool(name: &str, value: &Value) -> Result<bool, ApiError> {
    value
        .as_bool()
        .ok_or_else(|| {
            ApiError::invalid_parameter(name, format!("expected a boolean, got {}", value))
        })
}

pub fn to_object(name: &str, value: &Value) -> Result<Map<String, Value>, ApiError> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| {
            ApiError::invalid_parameter(name, format!("expected an object, got {}", value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn body(value: Value) -> Body {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(parse_body(""), Ok(Body::new()));
        assert_eq!(parse_body("  \n"), Ok(Body::new()));
    }

    #[rstest]
    #[case("not json")]
    #[case("[1, 2]")]
    #[case("null")]
    fn invalid_body(#[case] text: &str) {
        assert_eq!(parse_body(text), Err(ApiError::InvalidJson));
    }

    #[rstest]
    #[case(json!({}))]
    #[case(json!({"action": null}))]
    #[case(json!({"action": ""}))]
    #[case(json!({"action": []}))]
    fn required_missing(#[case] value: Value) {
        assert_eq!(
            required(&body(value), "action"),
            Err(ApiError::MissingParameter("action".into()))
        );
    }

    #[rstest]
    #[case(json!(0))]
    #[case(json!(false))]
    #[case(json!([0.5]))]
    fn required_present(#[case] value: Value) {
        let b = body(json!({ "action": value.clone() }));
        assert_eq!(required(&b, "action"), Ok(&value));
    }

    #[test]
    fn optional_absent_values() {
        let b = body(json!({"seed": "", "kwargs": [], "x": 1}));
        assert_eq!(optional(&b, "seed"), None);
        assert_eq!(optional(&b, "kwargs"), None);
        assert_eq!(optional(&b, "missing"), None);
        assert_eq!(optional(&b, "x"), Some(&json!(1)));
    }

    #[rstest]
    #[case(json!(3), Some(3))]
    #[case(json!("42"), Some(42))]
    #[case(json!(2.0), Some(2))]
    #[case(json!(-1), None)]
    #[case(json!(1.5), None)]
    #[case(json!("abc"), None)]
    #[case(json!(true), None)]
    fn integers(#[case] value: Value, #[case] expected: Option<u64>) {
        assert_eq!(to_u64("seed", &value).ok(), expected);
    }
}
