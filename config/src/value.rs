//! Leaf values and their storage encoding.
//!
//! Values are stored as JSON text so that kind and shape survive a round
//! trip: the text `"true"` and the boolean `true` encode differently.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::error::CodecError;
use crate::registry::SystemConfigKey;
use crate::schema::{Leaf, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    Number(Number),
    Boolean(bool),
    TextList(Vec<String>),
}

impl ConfigValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Number(_) => ValueKind::Number,
            Self::Boolean(_) => ValueKind::Boolean,
            Self::TextList(_) => ValueKind::TextList,
        }
    }

    /// A finite float as a number value; `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        Number::from_f64(value).map(Self::Number)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::TextList(items) => Some(items),
            _ => None,
        }
    }

    /// Converts parsed JSON into a value. `null` is an explicit null and
    /// maps to `Ok(None)`.
    pub fn from_json(value: Value) -> Result<Option<Self>, CodecError> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Self::Boolean(b))),
            Value::Number(n) => Ok(Some(Self::Number(n))),
            Value::String(s) => Ok(Some(Self::Text(s))),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    _ => Err(CodecError::Unsupported {
                        found: "an array of non-strings",
                    }),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|items| Some(Self::TextList(items))),
            Value::Object(_) => Err(CodecError::Unsupported { found: "an object" }),
        }
    }
}

impl From<&ConfigValue> for Value {
    fn from(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Text(s) => Self::String(s.clone()),
            ConfigValue::Number(n) => Self::Number(n.clone()),
            ConfigValue::Boolean(b) => Self::Bool(*b),
            ConfigValue::TextList(items) => {
                Self::Array(items.iter().cloned().map(Self::String).collect())
            }
        }
    }
}

impl From<ConfigValue> for Value {
    fn from(value: ConfigValue) -> Self {
        Self::from(&value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        Self::Number(value.into())
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(value: Vec<String>) -> Self {
        Self::TextList(value)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(value: Vec<&str>) -> Self {
        Self::TextList(value.into_iter().map(str::to_string).collect())
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        Self::from_json(value)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::custom("expected a config value, found null"))
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

/// Encodes a value as JSON text for a text storage column.
pub fn encode(value: &ConfigValue) -> String {
    Value::from(value).to_string()
}

/// Decodes stored JSON text without any expectation about its kind.
pub fn decode(raw: &str) -> Result<Option<ConfigValue>, CodecError> {
    let json: Value = serde_json::from_str(raw).map_err(|e| CodecError::Malformed {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;
    ConfigValue::from_json(json)
}

/// Decodes a stored column for a known leaf. A missing column (`None`) is an
/// explicit null, legal only for nullable leaves.
pub fn decode_for(leaf: Leaf, raw: Option<&str>) -> Result<Option<ConfigValue>, CodecError> {
    let value = match raw {
        Some(raw) => decode(raw)?,
        None => None,
    };

    match value {
        None if leaf.nullable => Ok(None),
        None => Err(CodecError::NullNotAllowed {
            expected: leaf.kind,
        }),
        Some(value) if value.kind() == leaf.kind => Ok(Some(value)),
        Some(value) => Err(CodecError::KindMismatch {
            expected: leaf.kind,
            found: value.kind(),
        }),
    }
}

/// One persisted override: a joined path and its value. `value: None` is an
/// explicit null; a missing entry means "no override".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfigEntry {
    pub key: String,
    pub value: Option<ConfigValue>,
}

impl SystemConfigEntry {
    pub fn new(key: SystemConfigKey, value: impl Into<ConfigValue>) -> Self {
        Self {
            key: key.path().to_string(),
            value: Some(value.into()),
        }
    }

    pub fn null(key: SystemConfigKey) -> Self {
        Self {
            key: key.path().to_string(),
            value: None,
        }
    }

    /// The storage column for this entry's value.
    pub fn encoded_value(&self) -> Option<String> {
        self.value.as_ref().map(encode)
    }

    /// Rebuilds an entry from a storage row without checking its kind.
    pub fn from_encoded(key: impl Into<String>, raw: Option<&str>) -> Result<Self, CodecError> {
        let value = match raw {
            Some(raw) => decode(raw)?,
            None => None,
        };
        Ok(Self {
            key: key.into(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: ConfigValue) {
        let encoded = encode(&value);
        assert_eq!(decode(&encoded).unwrap(), Some(value), "via {encoded}");
    }

    #[test]
    fn every_kind_round_trips() {
        round_trip(ConfigValue::from("hello \"world\""));
        round_trip(ConfigValue::from(""));
        round_trip(ConfigValue::from(3));
        round_trip(ConfigValue::from(-1));
        round_trip(ConfigValue::from_f64(0.7).unwrap());
        round_trip(ConfigValue::from(u64::MAX));
        round_trip(ConfigValue::from(true));
        round_trip(ConfigValue::from(false));
        round_trip(ConfigValue::from(Vec::<String>::new()));
        round_trip(ConfigValue::from(vec!["h264", "hevc"]));
    }

    #[test]
    fn integers_encode_without_fraction() {
        assert_eq!(encode(&ConfigValue::from(3)), "3");
        let decoded = decode("3").unwrap().unwrap();
        assert_eq!(decoded.kind(), ValueKind::Number);
        assert_eq!(decoded.as_i64(), Some(3));
    }

    #[test]
    fn text_true_is_not_boolean_true() {
        let text = encode(&ConfigValue::from("true"));
        let boolean = encode(&ConfigValue::from(true));
        assert_eq!(text, "\"true\"");
        assert_eq!(boolean, "true");
        assert_eq!(decode(&text).unwrap().unwrap().kind(), ValueKind::Text);
        assert_eq!(decode(&boolean).unwrap().unwrap().kind(), ValueKind::Boolean);
    }

    #[test]
    fn list_keeps_order_and_length() {
        let decoded = decode(&encode(&ConfigValue::from(vec!["h264", "hevc"])))
            .unwrap()
            .unwrap();
        assert_eq!(decoded.as_list().unwrap(), ["h264", "hevc"]);
    }

    #[test]
    fn malformed_text_is_reported() {
        assert!(matches!(
            decode("not-json"),
            Err(CodecError::Malformed { raw, .. }) if raw == "not-json"
        ));
        assert!(matches!(decode(""), Err(CodecError::Malformed { .. })));
    }

    #[test]
    fn objects_and_mixed_arrays_are_unsupported() {
        assert!(matches!(
            decode(r#"{"a":1}"#),
            Err(CodecError::Unsupported { .. })
        ));
        assert!(matches!(
            decode(r#"["a",1]"#),
            Err(CodecError::Unsupported { .. })
        ));
    }

    #[test]
    fn json_null_is_explicit_null() {
        assert_eq!(decode("null").unwrap(), None);
    }

    #[test]
    fn decode_for_checks_kind() {
        let number = Leaf::new(ValueKind::Number);
        assert_eq!(
            decode_for(number, Some("3")).unwrap(),
            Some(ConfigValue::from(3))
        );
        assert_eq!(
            decode_for(number, Some("\"3\"")),
            Err(CodecError::KindMismatch {
                expected: ValueKind::Number,
                found: ValueKind::Text,
            })
        );
        assert_eq!(
            decode_for(number, None),
            Err(CodecError::NullNotAllowed {
                expected: ValueKind::Number
            })
        );
        assert_eq!(decode_for(number, Some("null")).unwrap_err(), CodecError::NullNotAllowed {
            expected: ValueKind::Number
        });
        assert_eq!(
            decode_for(Leaf::nullable(ValueKind::Number), None).unwrap(),
            None
        );
    }

    #[test]
    fn entry_distinguishes_null_from_value() {
        let set = SystemConfigEntry::new(SystemConfigKey::TrashDays, 3);
        let null = SystemConfigEntry::null(SystemConfigKey::OauthDefaultStorageQuota);
        assert_eq!(set.key, "trash.days");
        assert_eq!(set.encoded_value().as_deref(), Some("3"));
        assert_eq!(null.encoded_value(), None);

        let back = SystemConfigEntry::from_encoded("trash.days", Some("3")).unwrap();
        assert_eq!(back, set);
        let back = SystemConfigEntry::from_encoded("oauth.defaultStorageQuota", None).unwrap();
        assert_eq!(back, null);
    }

    #[test]
    fn serde_uses_bare_json() {
        let value: ConfigValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(value, ConfigValue::from(vec!["a", "b"]));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["a","b"]"#);
        assert!(serde_json::from_str::<ConfigValue>("null").is_err());
    }
}
