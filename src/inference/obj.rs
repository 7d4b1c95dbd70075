use std::collections::BTreeMap;

use serde::Serialize;

use super::Type;

/// Inferred record shape. Fields only ever get added or widened.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StructType {
    pub fields: BTreeMap<String, Type>,
}

impl StructType {
    /// Union of both field sets; shared fields merge recursively.
    pub(super) fn join(mut self, other: StructType) -> StructType {
        for (k, fb) in other.fields {
            let merged = match self.fields.remove(&k) {
                Some(fa) => fa.merge(fb),
                None => fb,
            };
            self.fields.insert(k, merged);
        }
        self
    }
}

impl FromIterator<(String, Type)> for StructType {
    fn from_iter<I: IntoIterator<Item = (String, Type)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}
