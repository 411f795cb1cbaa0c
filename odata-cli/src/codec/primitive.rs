//! Per-kind encode/decode of EDM primitive values

use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::edm::{CodecOptions, EdmKind};
use crate::error::{ODataError, Result};
use crate::resource::Literal;
use crate::value::{ODataValue, decimal_to_json, float_to_json};

static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$")
        .expect("duration pattern is valid")
});

static BASE64_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9+/_-]*={0,2}$").expect("base64 pattern is valid")
});

/// Codec for one EDM primitive kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimitiveCodec {
    kind: EdmKind,
}

impl PrimitiveCodec {
    pub fn new(kind: EdmKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> EdmKind {
        self.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Decode a wire JSON value; `path` names the field for error reporting
    pub fn deserialize(
        &self,
        json: &serde_json::Value,
        path: &str,
        _options: &CodecOptions,
    ) -> Result<ODataValue> {
        if json.is_null() {
            return Ok(ODataValue::Null);
        }

        match self.kind {
            EdmKind::Boolean => json
                .as_bool()
                .map(ODataValue::Boolean)
                .ok_or_else(|| ODataError::mismatch(path, self.type_name(), json)),
            EdmKind::Byte | EdmKind::SByte | EdmKind::Int16 | EdmKind::Int32 | EdmKind::Int64 => {
                self.decode_integer(json, path)
            }
            EdmKind::Single | EdmKind::Double | EdmKind::Decimal => self.decode_float(json, path),
            EdmKind::Opaque => Ok(ODataValue::Raw(json.clone())),
            _ => {
                let Some(text) = json.as_str() else {
                    return Err(ODataError::mismatch(path, self.type_name(), json));
                };
                if !self.is_well_formed(text) {
                    return Err(ODataError::TypeMismatch {
                        path: path.to_string(),
                        expected: self.type_name().to_string(),
                        found: format!("malformed string '{}'", text),
                    });
                }
                Ok(ODataValue::String(text.to_string()))
            }
        }
    }

    /// Encode a decoded value back into its wire JSON form
    pub fn serialize(
        &self,
        value: &ODataValue,
        path: &str,
        options: &CodecOptions,
    ) -> Result<serde_json::Value> {
        match (self.kind, value) {
            (_, ODataValue::Null) => Ok(serde_json::Value::Null),
            (_, ODataValue::Raw(raw)) => Ok(raw.clone()),
            (EdmKind::Boolean, ODataValue::Boolean(b)) => Ok(serde_json::Value::Bool(*b)),
            (kind, ODataValue::Int(i)) if kind.int_range().is_some() => {
                self.check_range(*i, path)?;
                if kind == EdmKind::Int64 && options.ieee754_compatible {
                    Ok(serde_json::Value::String(i.to_string()))
                } else {
                    Ok(serde_json::json!(*i))
                }
            }
            (kind, ODataValue::Int(i)) if kind.is_floating() => {
                self.serialize(&ODataValue::Decimal(i.to_string()), path, options)
            }
            (kind, ODataValue::Decimal(text)) if kind.is_floating() => {
                if kind == EdmKind::Decimal && options.ieee754_compatible {
                    Ok(serde_json::Value::String(text.clone()))
                } else {
                    decimal_to_json(text)
                        .ok_or_else(|| ODataError::value_mismatch(path, self.type_name(), value))
                }
            }
            (kind, ODataValue::Float(f)) if kind.is_floating() => {
                if kind == EdmKind::Decimal && options.ieee754_compatible && f.is_finite() {
                    Ok(serde_json::Value::String(f.to_string()))
                } else {
                    Ok(float_to_json(*f))
                }
            }
            (kind, ODataValue::String(s)) if is_text_kind(kind) => {
                Ok(serde_json::Value::String(s.clone()))
            }
            _ => Err(ODataError::value_mismatch(path, self.type_name(), value)),
        }
    }

    /// URL literal for a value of this kind (key predicates, function parameters)
    pub fn to_literal(&self, value: &ODataValue) -> Result<Literal> {
        let literal = match (self.kind, value) {
            (_, ODataValue::Null) => Literal::Null,
            (EdmKind::Boolean, ODataValue::Boolean(b)) => Literal::Boolean(*b),
            (kind, ODataValue::Int(i)) if kind.int_range().is_some() => Literal::Int(*i),
            (kind, ODataValue::Float(f)) if kind.is_floating() => Literal::Float(*f),
            (kind, ODataValue::Int(i)) if kind.is_floating() => Literal::Decimal(i.to_string()),
            (kind, ODataValue::Decimal(text)) if kind.is_floating() => Literal::Decimal(text.clone()),
            (EdmKind::String, ODataValue::String(s)) => Literal::String(s.clone()),
            (EdmKind::Guid, ODataValue::String(s)) => Literal::Guid(s.clone()),
            (EdmKind::Date, ODataValue::String(s)) => Literal::Date(s.clone()),
            (EdmKind::TimeOfDay, ODataValue::String(s)) => Literal::TimeOfDay(s.clone()),
            (EdmKind::DateTimeOffset, ODataValue::String(s)) => Literal::DateTimeOffset(s.clone()),
            (EdmKind::DateTime, ODataValue::String(s)) => Literal::DateTime(s.clone()),
            (EdmKind::Duration, ODataValue::String(s)) => Literal::Duration(s.clone()),
            (EdmKind::Binary, ODataValue::String(s)) => Literal::Binary(s.clone()),
            _ => return Err(ODataError::value_mismatch("", self.type_name(), value)),
        };
        Ok(literal)
    }

    fn decode_integer(&self, json: &serde_json::Value, path: &str) -> Result<ODataValue> {
        let parsed = match json {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let value = parsed.ok_or_else(|| ODataError::mismatch(path, self.type_name(), json))?;
        self.check_range(value, path)?;
        Ok(ODataValue::Int(value))
    }

    /// Finite numbers keep their written digits; only the specials become `Float`
    fn decode_float(&self, json: &serde_json::Value, path: &str) -> Result<ODataValue> {
        let decoded = match json {
            serde_json::Value::Number(n) => Some(ODataValue::Decimal(n.to_string())),
            serde_json::Value::String(s) => match s.trim() {
                "NaN" => Some(ODataValue::Float(f64::NAN)),
                "INF" => Some(ODataValue::Float(f64::INFINITY)),
                "-INF" => Some(ODataValue::Float(f64::NEG_INFINITY)),
                text if decimal_to_json(text).is_some() => {
                    Some(ODataValue::Decimal(text.to_string()))
                }
                text => text
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(ODataValue::Float),
            },
            _ => None,
        };
        decoded.ok_or_else(|| ODataError::mismatch(path, self.type_name(), json))
    }

    fn check_range(&self, value: i64, path: &str) -> Result<()> {
        if let Some((min, max)) = self.kind.int_range() {
            if value < min || value > max {
                return Err(ODataError::TypeMismatch {
                    path: path.to_string(),
                    expected: format!("{} in {}..={}", self.type_name(), min, max),
                    found: value.to_string(),
                });
            }
        }
        Ok(())
    }

    fn is_well_formed(&self, text: &str) -> bool {
        match self.kind {
            EdmKind::Binary => BASE64_RE.is_match(text),
            EdmKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
            EdmKind::TimeOfDay => {
                NaiveTime::parse_from_str(text, "%H:%M:%S%.f").is_ok()
                    || NaiveTime::parse_from_str(text, "%H:%M").is_ok()
            }
            EdmKind::DateTimeOffset => DateTime::parse_from_rfc3339(text).is_ok(),
            EdmKind::Duration => DURATION_RE.is_match(text),
            EdmKind::Guid => text.len() == 36 && Uuid::parse_str(text).is_ok(),
            _ => true,
        }
    }
}

fn is_text_kind(kind: EdmKind) -> bool {
    matches!(
        kind,
        EdmKind::String
            | EdmKind::Binary
            | EdmKind::Date
            | EdmKind::TimeOfDay
            | EdmKind::DateTimeOffset
            | EdmKind::DateTime
            | EdmKind::Duration
            | EdmKind::Guid
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec(kind: EdmKind) -> PrimitiveCodec {
        PrimitiveCodec::new(kind)
    }

    fn roundtrip(kind: EdmKind, raw: serde_json::Value) {
        let options = CodecOptions::default();
        let decoded = codec(kind).deserialize(&raw, "field", &options).unwrap();
        let encoded = codec(kind).serialize(&decoded, "field", &options).unwrap();
        assert_eq!(encoded, raw, "{:?} did not round-trip", kind);
    }

    #[test]
    fn test_wire_values_roundtrip() {
        roundtrip(EdmKind::Boolean, json!(true));
        roundtrip(EdmKind::Byte, json!(255));
        roundtrip(EdmKind::SByte, json!(-128));
        roundtrip(EdmKind::Int16, json!(-32768));
        roundtrip(EdmKind::Int32, json!(2147483647));
        roundtrip(EdmKind::Int64, json!(i64::MIN));
        roundtrip(EdmKind::Single, json!("INF"));
        roundtrip(EdmKind::Double, json!("-INF"));
        roundtrip(EdmKind::Double, json!("NaN"));
        roundtrip(EdmKind::Double, json!(3.1415926535897931));
        roundtrip(EdmKind::Decimal, json!(34.95));
        roundtrip(EdmKind::Double, json!(3000));
        roundtrip(EdmKind::Double, json!(3000.0));
        roundtrip(EdmKind::Decimal, json!(5));
        roundtrip(EdmKind::Single, json!(-0.5));
        roundtrip(EdmKind::String, json!("Say \"Hello\",\nthen go"));
        roundtrip(EdmKind::Binary, json!("T0RhdGE="));
        roundtrip(EdmKind::Date, json!("2012-12-03"));
        roundtrip(EdmKind::TimeOfDay, json!("07:59:59.999"));
        roundtrip(EdmKind::DateTimeOffset, json!("2012-12-03T07:16:23Z"));
        roundtrip(EdmKind::Duration, json!("P12DT23H59M59.999999999999S"));
        roundtrip(EdmKind::Guid, json!("01234567-89ab-cdef-0123-456789abcdef"));
        roundtrip(EdmKind::Opaque, json!({"type": "point", "coordinates": [142.1, 64.1]}));
    }

    #[test]
    fn test_values_roundtrip_through_wire() {
        let options = CodecOptions::default();
        let cases = [
            (EdmKind::Int64, ODataValue::Int(i64::MAX)),
            (EdmKind::Double, ODataValue::Float(f64::INFINITY)),
            (EdmKind::Single, ODataValue::Decimal("-0.5".into())),
            (EdmKind::Decimal, ODataValue::Decimal("12".into())),
            (EdmKind::String, ODataValue::Null),
        ];
        for (kind, value) in cases {
            let wire = codec(kind).serialize(&value, "v", &options).unwrap();
            assert_eq!(codec(kind).deserialize(&wire, "v", &options).unwrap(), value);
        }

        let wire = codec(EdmKind::Double)
            .serialize(&ODataValue::Float(f64::NAN), "v", &options)
            .unwrap();
        let back = codec(EdmKind::Double).deserialize(&wire, "v", &options).unwrap();
        assert!(back.as_float().unwrap().is_nan());
    }

    #[test]
    fn test_int64_as_string_when_ieee754_compatible() {
        let options = CodecOptions {
            ieee754_compatible: true,
            ..Default::default()
        };
        let int64 = codec(EdmKind::Int64);
        let decoded = int64.deserialize(&json!("9007199254740993"), "id", &options).unwrap();
        assert_eq!(decoded, ODataValue::Int(9007199254740993));
        assert_eq!(
            int64.serialize(&decoded, "id", &options).unwrap(),
            json!("9007199254740993")
        );
        // Int32 stays numeric
        assert_eq!(
            codec(EdmKind::Int32).serialize(&ODataValue::Int(5), "n", &options).unwrap(),
            json!(5)
        );
        assert_eq!(
            codec(EdmKind::Decimal)
                .serialize(&ODataValue::Float(34.95), "d", &options)
                .unwrap(),
            json!("34.95")
        );
    }

    #[test]
    fn test_decimal_strings_keep_their_digits() {
        let options = CodecOptions {
            ieee754_compatible: true,
            ..Default::default()
        };
        let decimal = codec(EdmKind::Decimal);
        for text in ["1.10", "3000", "79228162514264337593543950335"] {
            let decoded = decimal.deserialize(&json!(text), "price", &options).unwrap();
            assert_eq!(decoded, ODataValue::Decimal(text.to_string()));
            assert_eq!(decimal.serialize(&decoded, "price", &options).unwrap(), json!(text));
        }
        assert_eq!(
            decimal.serialize(&ODataValue::Int(5), "price", &options).unwrap(),
            json!("5")
        );
        assert_eq!(
            codec(EdmKind::Double)
                .serialize(&ODataValue::Int(5), "x", &CodecOptions::default())
                .unwrap(),
            json!(5)
        );
    }

    #[test]
    fn test_mismatch_carries_path() {
        let options = CodecOptions::default();
        let err = codec(EdmKind::Boolean)
            .deserialize(&json!("yes"), "Address.Verified", &options)
            .unwrap_err();
        match err {
            ODataError::TypeMismatch { path, expected, found } => {
                assert_eq!(path, "Address.Verified");
                assert_eq!(expected, "Edm.Boolean");
                assert_eq!(found, "string");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_integer_range_is_enforced() {
        let options = CodecOptions::default();
        assert!(codec(EdmKind::Byte).deserialize(&json!(-1), "b", &options).is_err());
        assert!(codec(EdmKind::SByte).deserialize(&json!(128), "b", &options).is_err());
        assert!(codec(EdmKind::Int32).deserialize(&json!(1.5), "b", &options).is_err());
    }

    #[test]
    fn test_malformed_text_kinds_rejected() {
        let options = CodecOptions::default();
        assert!(codec(EdmKind::Guid).deserialize(&json!("not-a-guid"), "g", &options).is_err());
        assert!(codec(EdmKind::Date).deserialize(&json!("2012-13-03"), "d", &options).is_err());
        assert!(codec(EdmKind::Duration).deserialize(&json!("12 days"), "d", &options).is_err());
        assert!(codec(EdmKind::String).deserialize(&json!(12), "s", &options).is_err());
        assert!(codec(EdmKind::Double).deserialize(&json!("Infinity"), "f", &options).is_err());
    }

    #[test]
    fn test_url_literals() {
        let string = codec(EdmKind::String)
            .to_literal(&ODataValue::String("O'Neil".into()))
            .unwrap();
        assert_eq!(string.to_string(), "'O''Neil'");
        let guid = codec(EdmKind::Guid)
            .to_literal(&ODataValue::String("01234567-89ab-cdef-0123-456789abcdef".into()))
            .unwrap();
        assert_eq!(guid.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
        let date = codec(EdmKind::Date)
            .to_literal(&ODataValue::String("2012-12-03".into()))
            .unwrap();
        assert_eq!(date.to_string(), "2012-12-03");
        assert!(codec(EdmKind::Int32).to_literal(&ODataValue::Boolean(true)).is_err());
    }
}
