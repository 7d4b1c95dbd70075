//! Structural type inference over document samples.
//!
//! Each record is classified into a [`Type`] and folded into a running type
//! with [`Type::merge`]. The lattice is small:
//!
//! - `Nil`: nothing known yet (null, or an empty / all-null array).
//! - `Primitive`: one scalar kind.
//! - `Struct`: field name to type; grows monotonically.
//! - `Sequence`: one element type.
//! - `Mixed`: an irreducible union of two or more distinct types.
//!
//! Merging consumes both sides. Alternatives inside `Mixed` keep the order in
//! which they were first seen, so the fold within a target must stay
//! sequential.
pub mod arr;
pub mod mixed;
pub mod obj;
pub mod prim;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::value::{Document, Trail, Value};

pub use obj::StructType;
pub use prim::Primitive;

// ------------------------------ Lattice ---------------------------------- //

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Type {
    #[default]
    Nil,
    Primitive(Primitive),
    Struct(StructType),
    Sequence(Box<Type>),
    Mixed(Vec<Type>),
}

impl Type {
    pub fn sequence(element: Type) -> Self {
        Type::Sequence(Box::new(element))
    }

    /// True for `Nil` and for sequences that never saw a non-null element.
    pub fn is_nil(&self) -> bool {
        match self {
            Type::Nil => true,
            Type::Sequence(element) => element.is_nil(),
            Type::Mixed(alts) => {
                debug_assert!(alts.len() >= 2, "mixed type with fewer than two alternatives");
                false
            }
            Type::Primitive(_) | Type::Struct(_) => false,
        }
    }

    /// Fold `other` into `self`. Never fails.
    pub fn merge(self, other: Type) -> Type {
        if self.is_nil() {
            return other;
        }
        if other.is_nil() {
            return self;
        }
        match (self, other) {
            (Type::Primitive(a), Type::Primitive(b)) => prim::join(a, b),
            (Type::Struct(a), Type::Struct(b)) => Type::Struct(a.join(b)),
            (Type::Sequence(a), Type::Sequence(b)) => arr::join(*a, *b),
            (Type::Mixed(alts), other) => Type::Mixed(mixed::push(alts, other)),
            (left, right) => mixed::pair(left, right),
        }
    }
}

// ------------------------------ Observe ---------------------------------- //

/// Classify a single value.
pub fn observe_value(v: &Value) -> Result<Type> {
    observe_at(v, &Trail::Root)
}

/// Classify a whole record.
pub fn observe_document(doc: &Document) -> Result<Type> {
    observe_object(doc, &Trail::Root)
}

fn observe_at(v: &Value, at: &Trail<'_>) -> Result<Type> {
    Ok(match v {
        Value::Null | Value::Undefined => Type::Nil,
        Value::Bool(_) => Type::Primitive(Primitive::Bool),
        Value::Int32(_) => Type::Primitive(Primitive::Int32),
        Value::Int64(_) => Type::Primitive(Primitive::Int64),
        Value::Double(_) => Type::Primitive(Primitive::Double),
        Value::String(_) => Type::Primitive(Primitive::String),
        Value::DateTime(_) | Value::Timestamp { .. } => Type::Primitive(Primitive::Timestamp),
        Value::Binary { .. } => Type::Primitive(Primitive::Binary),
        Value::ObjectId(_) => Type::Primitive(Primitive::ObjectId),
        Value::Array(xs) => observe_array(xs, at)?,
        Value::Document(doc) => observe_object(doc, at)?,
        Value::Decimal128(_)
        | Value::Regex { .. }
        | Value::JavaScript(_)
        | Value::Symbol(_)
        | Value::MinKey
        | Value::MaxKey => {
            return Err(Error::Unclassifiable { kind: v.kind_name(), path: at.to_string() });
        }
    })
}

fn observe_array(xs: &[Value], at: &Trail<'_>) -> Result<Type> {
    let mut item = Type::Nil;
    for (i, el) in xs.iter().enumerate() {
        let ty = observe_at(el, &at.index(i))?;
        if ty.is_nil() {
            continue;
        }
        item = arr::join_items(item, ty);
    }
    Ok(Type::sequence(item))
}

const DBREF_KEYS: [&str; 3] = ["$db", "$ref", "$id"];

fn is_dbref(doc: &Document) -> bool {
    DBREF_KEYS
        .iter()
        .all(|k| doc.get(*k).is_some_and(|v| !v.is_null()))
}

fn observe_object(doc: &Document, at: &Trail<'_>) -> Result<Type> {
    if is_dbref(doc) {
        return Ok(Type::Primitive(Primitive::DbRef));
    }
    let mut obj = StructType::default();
    for (k, v) in doc {
        let ty = observe_at(v, &at.field(k))?;
        if ty.is_nil() {
            continue;
        }
        obj.fields.insert(k.clone(), ty);
    }
    Ok(Type::Struct(obj))
}

// ------------------------------- Front API -------------------------------- //

/// Running type for one target.
#[derive(Debug, Clone)]
pub struct Inference {
    state: Type,
    seen: u64,
}

impl Default for Inference {
    fn default() -> Self {
        Self::new()
    }
}

impl Inference {
    pub fn new() -> Self {
        Self { state: Type::Struct(StructType::default()), seen: 0 }
    }

    pub fn observe_document(&mut self, doc: &Document) -> Result<()> {
        let obs = observe_document(doc)?;
        let state = std::mem::take(&mut self.state);
        self.state = state.merge(obs);
        self.seen += 1;
        Ok(())
    }

    /// Records folded in so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn solve(self) -> Type {
        self.state
    }
}

pub fn infer_from_documents<'a, I>(docs: I) -> Result<Type>
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut inf = Inference::new();
    for doc in docs {
        inf.observe_document(doc)?;
    }
    Ok(inf.solve())
}

// ------------------------------- Tests ------------------------------------ //
