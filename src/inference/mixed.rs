use super::Type;

/// Add `t` to an existing union unless an equal alternative is present.
///
/// A union pushed into a union is flattened so alternatives stay one level deep.
pub(super) fn push(mut alts: Vec<Type>, t: Type) -> Vec<Type> {
    match t {
        Type::Mixed(more) => {
            for t in more {
                alts = push(alts, t);
            }
        }
        t if t.is_nil() => {}
        t => {
            if !alts.contains(&t) {
                alts.push(t);
            }
        }
    }
    alts
}

/// Union of two non-nil types, `left` first.
pub(super) fn pair(left: Type, right: Type) -> Type {
    if left == right {
        return left;
    }
    match right {
        Type::Mixed(alts) => Type::Mixed(push(vec![left], Type::Mixed(alts))),
        right => Type::Mixed(vec![left, right]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Primitive;

    fn p(kind: Primitive) -> Type {
        Type::Primitive(kind)
    }

    #[test]
    fn push_ignores_duplicates_and_nil() {
        let alts = push(vec![p(Primitive::String), p(Primitive::Bool)], p(Primitive::String));
        let alts = push(alts, Type::Nil);
        assert_eq!(alts, vec![p(Primitive::String), p(Primitive::Bool)]);
    }

    #[test]
    fn unions_flatten() {
        let nested = Type::Mixed(vec![p(Primitive::Bool), p(Primitive::Int32)]);
        let alts = push(vec![p(Primitive::String), p(Primitive::Bool)], nested);
        assert_eq!(alts, vec![p(Primitive::String), p(Primitive::Bool), p(Primitive::Int32)]);
    }

    #[test]
    fn pair_with_union_on_the_right_keeps_left_first() {
        let right = Type::Mixed(vec![p(Primitive::Bool), p(Primitive::String)]);
        assert_eq!(
            pair(p(Primitive::String), right),
            Type::Mixed(vec![p(Primitive::String), p(Primitive::Bool)])
        );
    }
}
