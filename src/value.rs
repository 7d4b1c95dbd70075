//! Raw document model.
//!
//! Records arrive as MongoDB Extended JSON (canonical or relaxed, as written by
//! `mongoexport`). Decoding turns the type wrappers (`$oid`, `$date`,
//! `$numberLong`, ...) into typed [`Value`]s so the classifier can tell an
//! `int32` from an `int64` or an object id from a plain string. Everything
//! that is not a recognized wrapper stays an ordinary [`Document`], which is
//! how DBRefs (`$ref` / `$id` / `$db`) survive decoding.
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};

pub type Document = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Timestamp { time: u32, increment: u32 },
    Binary { subtype: u8, base64: String },
    ObjectId(String),
    Array(Vec<Value>),
    Document(Document),
    // Decoded but outside what the classifier understands.
    Decimal128(String),
    Regex { pattern: String, options: String },
    JavaScript(String),
    Symbol(String),
    MinKey,
    MaxKey,
}

impl Value {
    /// Human name of the BSON kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Timestamp { .. } => "timestamp",
            Value::Binary { .. } => "binary",
            Value::ObjectId(_) => "objectId",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
            Value::Decimal128(_) => "decimal128",
            Value::Regex { .. } => "regex",
            Value::JavaScript(_) => "javascript",
            Value::Symbol(_) => "symbol",
            Value::MinKey => "minKey",
            Value::MaxKey => "maxKey",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOCATION TRAIL
// ————————————————————————————————————————————————————————————————————————————

/// Position inside a record, rendered JSONPath-style (`$.tags[2].name`).
///
/// Built on the stack while recursing so nothing is allocated unless an
/// error actually needs the path.
#[derive(Clone, Copy)]
pub enum Trail<'a> {
    Root,
    Field(&'a Trail<'a>, &'a str),
    Index(&'a Trail<'a>, usize),
}

impl<'a> Trail<'a> {
    pub fn field(&'a self, name: &'a str) -> Trail<'a> {
        Trail::Field(self, name)
    }
    pub fn index(&'a self, index: usize) -> Trail<'a> {
        Trail::Index(self, index)
    }
}

impl fmt::Display for Trail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trail::Root => write!(f, "$"),
            Trail::Field(parent, name) => write!(f, "{parent}.{name}"),
            Trail::Index(parent, index) => write!(f, "{parent}[{index}]"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// EXTENDED JSON
// ————————————————————————————————————————————————————————————————————————————

static OBJECT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").unwrap());

/// Decode one Extended JSON value.
pub fn from_extended_json(json: &Json) -> Result<Value> {
    decode(json, &Trail::Root)
}

/// Decode one Extended JSON record; the top level must be an object.
pub fn document_from_extended_json(json: &Json) -> Result<Option<Document>> {
    match decode(json, &Trail::Root)? {
        Value::Document(doc) => Ok(Some(doc)),
        _ => Ok(None),
    }
}

fn decode(json: &Json, at: &Trail<'_>) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else {
                // u64 beyond i64::MAX or a real float
                Value::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(xs) => Value::Array(
            xs.iter()
                .enumerate()
                .map(|(i, x)| decode(x, &at.index(i)))
                .collect::<Result<_>>()?,
        ),
        Json::Object(map) => match decode_wrapper(map, at)? {
            Some(value) => value,
            None => {
                let mut doc = Document::with_capacity(map.len());
                for (k, v) in map {
                    doc.insert(k.clone(), decode(v, &at.field(k))?);
                }
                Value::Document(doc)
            }
        },
    })
}

fn invalid(at: &Trail<'_>, message: impl Into<String>) -> Error {
    Error::ExtendedJson { path: at.to_string(), message: message.into() }
}

fn expect_str<'j>(json: &'j Json, at: &Trail<'_>, what: &str) -> Result<&'j str> {
    json.as_str().ok_or_else(|| invalid(at, format!("{what} must be a string")))
}

/// Recognize a type wrapper object. `Ok(None)` means "ordinary document".
fn decode_wrapper(map: &Map<String, Json>, at: &Trail<'_>) -> Result<Option<Value>> {
    let mut keys = map.keys().map(String::as_str).collect::<Vec<_>>();
    keys.sort_unstable();
    let value = match keys.as_slice() {
        ["$oid"] => {
            let s = expect_str(&map["$oid"], at, "$oid")?;
            if !OBJECT_ID_RE.is_match(s) {
                return Err(invalid(at, format!("`{s}` is not a 24 digit hex object id")));
            }
            Value::ObjectId(s.to_ascii_lowercase())
        }
        ["$date"] => Value::DateTime(decode_date(&map["$date"], at)?),
        ["$numberInt"] => {
            let s = expect_str(&map["$numberInt"], at, "$numberInt")?;
            Value::Int32(s.parse().map_err(|e| invalid(at, format!("$numberInt: {e}")))?)
        }
        ["$numberLong"] => {
            let s = expect_str(&map["$numberLong"], at, "$numberLong")?;
            Value::Int64(s.parse().map_err(|e| invalid(at, format!("$numberLong: {e}")))?)
        }
        ["$numberDouble"] => {
            let s = expect_str(&map["$numberDouble"], at, "$numberDouble")?;
            Value::Double(match s {
                "Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                "NaN" => f64::NAN,
                _ => s.parse().map_err(|e| invalid(at, format!("$numberDouble: {e}")))?,
            })
        }
        ["$numberDecimal"] => {
            Value::Decimal128(expect_str(&map["$numberDecimal"], at, "$numberDecimal")?.to_owned())
        }
        ["$binary"] => {
            let inner = map["$binary"]
                .as_object()
                .ok_or_else(|| invalid(at, "$binary must be an object"))?;
            let base64 = inner.get("base64").ok_or_else(|| invalid(at, "$binary.base64 missing"))?;
            let subtype = inner.get("subType").ok_or_else(|| invalid(at, "$binary.subType missing"))?;
            Value::Binary {
                subtype: decode_subtype(expect_str(subtype, at, "$binary.subType")?, at)?,
                base64: expect_str(base64, at, "$binary.base64")?.to_owned(),
            }
        }
        // legacy form
        ["$binary", "$type"] => Value::Binary {
            subtype: decode_subtype(expect_str(&map["$type"], at, "$type")?, at)?,
            base64: expect_str(&map["$binary"], at, "$binary")?.to_owned(),
        },
        ["$uuid"] => {
            // Kept as the textual form; only the binary kind matters here.
            Value::Binary { subtype: 4, base64: expect_str(&map["$uuid"], at, "$uuid")?.to_owned() }
        }
        ["$timestamp"] => {
            let ts = &map["$timestamp"];
            let field = |name: &str| {
                ts.get(name)
                    .and_then(Json::as_u64)
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| invalid(at, format!("$timestamp.{name} must be a u32")))
            };
            Value::Timestamp { time: field("t")?, increment: field("i")? }
        }
        ["$regularExpression"] => {
            let re = &map["$regularExpression"];
            Value::Regex {
                pattern: re.get("pattern").and_then(Json::as_str).unwrap_or_default().to_owned(),
                options: re.get("options").and_then(Json::as_str).unwrap_or_default().to_owned(),
            }
        }
        ["$options", "$regex"] if map["$regex"].is_string() => Value::Regex {
            pattern: expect_str(&map["$regex"], at, "$regex")?.to_owned(),
            options: expect_str(&map["$options"], at, "$options")?.to_owned(),
        },
        ["$code"] | ["$code", "$scope"] => {
            Value::JavaScript(expect_str(&map["$code"], at, "$code")?.to_owned())
        }
        ["$symbol"] => Value::Symbol(expect_str(&map["$symbol"], at, "$symbol")?.to_owned()),
        ["$minKey"] => Value::MinKey,
        ["$maxKey"] => Value::MaxKey,
        ["$undefined"] => Value::Undefined,
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn decode_subtype(hex: &str, at: &Trail<'_>) -> Result<u8> {
    u8::from_str_radix(hex, 16).map_err(|_| invalid(at, format!("bad binary subtype `{hex}`")))
}

fn decode_date(json: &Json, at: &Trail<'_>) -> Result<DateTime<Utc>> {
    let millis = match json {
        Json::String(s) => {
            return DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid(at, format!("$date `{s}`: {e}")));
        }
        Json::Number(n) => n.as_i64(),
        Json::Object(o) => o
            .get("$numberLong")
            .and_then(Json::as_str)
            .and_then(|s| s.parse::<i64>().ok()),
        _ => None,
    };
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .ok_or_else(|| invalid(at, "$date must be RFC 3339 text or milliseconds since epoch"))
}
