//! Raw feature values and their coercion to `f64`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw feature mapping as supplied by a caller.
pub type RawFeatureMap = BTreeMap<String, FeatureValue>;

/// One raw scalar from a request.
///
/// Anything that is not a boolean, number or string is kept as `Other` so a
/// single bad field is reported as missing instead of rejecting the whole map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Error type for value coercion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("not a decimal number: {0:?}")]
    Unparseable(String),

    #[error("unsupported value type: {0}")]
    UnsupportedType(&'static str),

    #[error("value is not finite")]
    NonFinite,
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Convert one raw value to a finite `f64`.
///
/// Booleans map to 1.0 / 0.0. Text is trimmed and a comma decimal separator
/// is accepted ("36,6" parses as 36.6).
///
/// # Errors
/// Returns `CoercionError` for unparseable text, non-scalar values, and
/// NaN or infinite results.
pub fn coerce(value: &FeatureValue) -> Result<f64, CoercionError> {
    let v = match value {
        FeatureValue::Bool(b) => return Ok(if *b { 1.0 } else { 0.0 }),
        FeatureValue::Number(n) => *n,
        FeatureValue::Text(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| CoercionError::Unparseable(s.clone()))?,
        FeatureValue::Other(other) => {
            return Err(CoercionError::UnsupportedType(json_type_name(other)))
        }
    };

    if !v.is_finite() {
        return Err(CoercionError::NonFinite);
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_scalars() {
        assert_eq!(coerce(&true.into()), Ok(1.0));
        assert_eq!(coerce(&false.into()), Ok(0.0));
        assert_eq!(coerce(&72.5.into()), Ok(72.5));
        assert_eq!(coerce(&FeatureValue::from(50_i64)), Ok(50.0));
    }

    #[test]
    fn test_coerce_locale_text() {
        assert_eq!(coerce(&"36,6".into()), Ok(36.6));
        assert_eq!(coerce(&"  120 ".into()), Ok(120.0));
        assert_eq!(coerce(&"-1.5".into()), Ok(-1.5));
    }

    #[test]
    fn test_coerce_rejects_garbage() {
        assert!(matches!(
            coerce(&"one hundred".into()),
            Err(CoercionError::Unparseable(_))
        ));
        assert!(coerce(&"".into()).is_err());
        assert_eq!(
            coerce(&FeatureValue::Other(serde_json::Value::Null)),
            Err(CoercionError::UnsupportedType("null"))
        );
    }

    #[test]
    fn test_coerce_rejects_non_finite() {
        assert_eq!(coerce(&"nan".into()), Err(CoercionError::NonFinite));
        assert_eq!(coerce(&"inf".into()), Err(CoercionError::NonFinite));
        assert_eq!(coerce(&f64::NAN.into()), Err(CoercionError::NonFinite));
    }

    #[test]
    fn test_feature_map_from_json() {
        let map: RawFeatureMap = serde_json::from_str(
            r#"{"age": 50, "smoke": false, "BMI": "27,4", "note": null, "tags": [1]}"#,
        )
        .expect("deserialize");

        assert_eq!(map["age"], FeatureValue::Number(50.0));
        assert_eq!(map["smoke"], FeatureValue::Bool(false));
        assert_eq!(coerce(&map["BMI"]), Ok(27.4));
        assert!(coerce(&map["note"]).is_err());
        assert_eq!(coerce(&map["tags"]), Err(CoercionError::UnsupportedType("array")));
    }
}
