//! Normalization of `action=browsebysubject` payloads.
//!
//! SMW returns a weakly-typed list of `(property, dataitem[])` pairs where
//! each data item carries an integer type tag. The transformer decodes that
//! into [`SmwValue`]s, keeping the scalar-versus-list arity intact because
//! the property parser treats the two differently.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::Error;

/// SMW internal subject suffix, e.g. `LSD#0#` or `Cannabis#10#`.
static INTERNAL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"#1?0#").expect("valid regex"));

/// One decoded SMW data item.
#[derive(Debug, Clone, PartialEq)]
pub enum SmwValue {
    /// Type tag `1`: a numeric value.
    Number(f64),
    /// Type tag `9`: a reference to another wiki page.
    Page(String),
    /// Type tag `2` and anything unrecognized: a raw string.
    Text(String),
    /// An empty data item list.
    Null,
}

impl SmwValue {
    /// The value as text, stringifying numbers; `None` for null.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SmwValue::Number(n) => Some(format_number(*n)),
            SmwValue::Page(s) | SmwValue::Text(s) => Some(s.clone()),
            SmwValue::Null => None,
        }
    }

    /// The value as a float, parsing numeric text; `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SmwValue::Number(n) => Some(*n),
            SmwValue::Page(s) | SmwValue::Text(s) => s.trim().parse().ok(),
            SmwValue::Null => None,
        }
    }
}

/// A property value preserving upstream arity.
#[derive(Debug, Clone, PartialEq)]
pub enum SmwSlot {
    /// The property carried exactly one data item.
    One(SmwValue),
    /// The property carried several data items.
    Many(Vec<SmwValue>),
}

impl SmwSlot {
    /// The first value regardless of arity.
    pub fn first(&self) -> Option<&SmwValue> {
        match self {
            SmwSlot::One(value) => Some(value),
            SmwSlot::Many(values) => values.first(),
        }
    }

    /// All values as a list, normalizing a scalar to a one-element list.
    pub fn values(&self) -> Vec<&SmwValue> {
        match self {
            SmwSlot::One(value) => vec![value],
            SmwSlot::Many(values) => values.iter().collect(),
        }
    }
}

/// A subject and its decoded property list, in payload order.
#[derive(Debug, Clone, PartialEq)]
pub struct SmwSubject {
    /// The page title, internal suffix stripped.
    pub subject: String,
    /// `(property name, value)` pairs; internal `_`-prefixed properties
    /// are already filtered out.
    pub properties: Vec<(String, SmwSlot)>,
}

/// Strips the SMW-internal `#0#`/`#10#` marker from a page identifier.
pub fn strip_internal(raw: &str) -> String {
    INTERNAL_PREFIX.replace(raw, "").into_owned()
}

/// Decodes a `browsebysubject` payload.
pub fn transform(payload: &Value) -> Result<SmwSubject, Error> {
    let query = payload
        .get("query")
        .ok_or_else(|| Error::payload("browsebysubject response has no `query`"))?;
    let subject = query
        .get("subject")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::payload("browsebysubject response has no `subject`"))?;
    let data = query
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::payload("browsebysubject response has no `data`"))?;

    let mut properties = Vec::with_capacity(data.len());
    for entry in data {
        let Some(property) = entry.get("property").and_then(Value::as_str) else {
            continue;
        };
        if property.starts_with('_') {
            continue;
        }
        let items: Vec<SmwValue> = entry
            .get("dataitem")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_item).collect())
            .unwrap_or_default();

        let slot = match items.len() {
            0 => SmwSlot::One(SmwValue::Null),
            1 => SmwSlot::One(items.into_iter().next().expect("one item")),
            _ => SmwSlot::Many(items),
        };
        properties.push((property.to_owned(), slot));
    }

    Ok(SmwSubject {
        subject: strip_internal(subject),
        properties,
    })
}

fn decode_item(item: &Value) -> SmwValue {
    let raw = item.get("item");
    match item.get("type").and_then(Value::as_i64) {
        Some(1) => raw
            .and_then(value_as_f64)
            .map(SmwValue::Number)
            .unwrap_or(SmwValue::Null),
        Some(9) => raw
            .map(value_as_string)
            .map(|s| SmwValue::Page(strip_internal(&s)))
            .unwrap_or(SmwValue::Null),
        _ => raw
            .map(value_as_string)
            .map(SmwValue::Text)
            .unwrap_or(SmwValue::Null),
    }
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders a float the way the wiki writes it, without a trailing `.0`
/// for integral values.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
