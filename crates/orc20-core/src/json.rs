//! Lenient JSON decoding for inscription bodies
//!
//! Inscription bodies are user-authored, so decoding follows the tolerances the
//! protocol's reference indexer accepted:
//!
//! - unknown fields are ignored by the payload schemas
//! - a single trailing comma before `}` or `]` is accepted
//! - duplicate keys are rejected at every nesting level
//! - tokens after the root value are ignored
//! - numbers keep their text as written (`1.50` stays `1.50`)

use serde::de::{self, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Key under which serde_json's `arbitrary_precision` feature hands a number
/// to a visitor as a one-entry map holding the literal text
const NUMBER_TOKEN: &str = "$serde_json::private::Number";

/// Decode `input` into `T` with the lenient rules above
pub fn decode<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_value(parse_value(input)?)
}

/// Parse `input` into a JSON value with the lenient rules above
pub fn parse_value(input: &str) -> Result<Value, serde_json::Error> {
    let normalized = strip_trailing_commas(input);
    let mut deserializer = serde_json::Deserializer::from_str(&normalized);
    // No `end()` call: trailing tokens after the root value are ignored.
    let StrictValue(value) = StrictValue::deserialize(&mut deserializer)?;
    Ok(value)
}

/// Drop every comma (outside string literals) that directly precedes a
/// closing bracket. A doubled comma still leaves one behind and fails to parse.
pub fn strip_trailing_commas(input: &str) -> Cow<'_, str> {
    if !input.contains(',') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    for (at, c) in input.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if c == ',' {
            let next = input[at + 1..].trim_start().chars().next();
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(c);
    }
    Cow::Owned(out)
}

/// A JSON value whose objects were checked for duplicate keys
struct StrictValue(Value);

impl<'de> Deserialize<'de> for StrictValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(StrictVisitor).map(StrictValue)
    }
}

struct StrictVisitor;

impl<'de> Visitor<'de> for StrictVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Value, E> {
        Ok(Number::from_f64(v).map_or(Value::Null, Value::Number))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        StrictValue::deserialize(deserializer).map(|StrictValue(v)| v)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(StrictValue(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut object = Map::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == NUMBER_TOKEN && object.is_empty() {
                let text: String = map.next_value()?;
                return Number::from_str(&text)
                    .map(Value::Number)
                    .map_err(de::Error::custom);
            }
            let StrictValue(value) = map.next_value()?;
            if object.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate key `{key}`")));
            }
            object.insert(key, value);
        }
        Ok(Value::Object(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_single_trailing_comma() {
        assert_eq!(parse_value(r#"{"a":"1",}"#).unwrap(), json!({"a": "1"}));
        assert_eq!(
            parse_value(r#"{"n":["1","2" , ] , }"#).unwrap(),
            json!({"n": ["1", "2"]})
        );
    }

    #[test]
    fn rejects_double_trailing_comma() {
        assert!(parse_value(r#"{"a":"1",,}"#).is_err());
        assert!(parse_value(r#"["1",,]"#).is_err());
    }

    #[test]
    fn commas_inside_strings_are_untouched() {
        assert_eq!(
            parse_value(r#"{"a":",}","b":"x\",]"}"#).unwrap(),
            json!({"a": ",}", "b": "x\",]"})
        );
    }

    #[test]
    fn rejects_duplicate_keys_at_any_depth() {
        assert!(parse_value(r#"{"a":"1","a":"2"}"#).is_err());
        assert!(parse_value(r#"{"o":{"k":1,"k":2}}"#).is_err());
        assert!(parse_value(r#"{"a":"1","b":"2"}"#).is_ok());
    }

    #[test]
    fn ignores_trailing_tokens() {
        assert_eq!(
            parse_value(r#"{"a":"1"} trailing garbage {"#).unwrap(),
            json!({"a": "1"})
        );
    }

    #[test]
    fn numbers_keep_their_literal_text() {
        let value = parse_value(r#"{"big":123456789012345678901,"scaled":1.50,"neg":-7}"#).unwrap();
        assert_eq!(value["big"].to_string(), "123456789012345678901");
        assert_eq!(value["scaled"].to_string(), "1.50");
        assert_eq!(value["neg"].to_string(), "-7");
        assert!(parse_value(r#"{"n":1.0,"n":2}"#).is_err());
    }

    #[test]
    fn rejects_non_json() {
        assert!(parse_value("hello world").is_err());
        assert!(parse_value("").is_err());
    }
}
