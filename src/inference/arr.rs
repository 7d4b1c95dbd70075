use super::{mixed, StructType, Type};

/// Merge two sequences given their element types.
///
/// Only struct elements are merged structurally; any other difference keeps
/// both sequences side by side as alternatives.
pub(super) fn join(a: Type, b: Type) -> Type {
    if a == b {
        return Type::sequence(a);
    }
    match (a, b) {
        (a @ (Type::Struct(_) | Type::Mixed(_)), Type::Struct(sb)) => {
            Type::sequence(join_items(a, Type::Struct(sb)))
        }
        (a, b) => mixed::pair(Type::sequence(a), Type::sequence(b)),
    }
}

/// Fold one more element type into the element type of a sequence.
pub(super) fn join_items(acc: Type, next: Type) -> Type {
    match (acc, next) {
        (Type::Mixed(alts), Type::Struct(sb)) => Type::Mixed(absorb_struct(alts, sb)),
        (acc, next) => acc.merge(next),
    }
}

/// Merge into the first struct alternative, or add the struct as a new one.
fn absorb_struct(mut alts: Vec<Type>, sb: StructType) -> Vec<Type> {
    match alts.iter().position(|t| matches!(t, Type::Struct(_))) {
        Some(i) => {
            let sa = std::mem::take(&mut alts[i]);
            alts[i] = sa.merge(Type::Struct(sb));
            alts
        }
        None => mixed::push(alts, Type::Struct(sb)),
    }
}
