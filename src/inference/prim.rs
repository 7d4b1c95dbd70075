use serde::Serialize;

use super::{mixed, Type};

/// Scalar kinds a field can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Binary,
    Bool,
    Double,
    Int32,
    Int64,
    ObjectId,
    String,
    Timestamp,
    DbRef,
}

impl Primitive {
    pub fn is_integer(self) -> bool {
        matches!(self, Primitive::Int32 | Primitive::Int64)
    }
}

/// Numbers widen one way only: an integer next to a double becomes a double.
/// Integers of different widths stay distinct.
pub(super) fn join(a: Primitive, b: Primitive) -> Type {
    if a == b {
        return Type::Primitive(a);
    }
    match (a, b) {
        (Primitive::Double, i) | (i, Primitive::Double) if i.is_integer() => {
            Type::Primitive(Primitive::Double)
        }
        _ => mixed::pair(Type::Primitive(a), Type::Primitive(b)),
    }
}
