//! Render an inferred [`Type`] as a Go-style declaration.
//!
//! ```text
//! User struct {
//! 	Age int64 `bson:"age,omitempty" json:"age,omitempty"`
//! 	Tags []string `bson:"tags,omitempty" json:"tags,omitempty"`
//! }
//! ```
//!
//! Fields are sorted by source name so output never depends on the order
//! records were observed in.
use std::collections::BTreeSet;
use std::fmt::Write;

use crate::inference::{Primitive, StructType, Type};
use crate::naming;

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Source field names dropped at every nesting level.
    pub ignored_fields: BTreeSet<String>,
    /// Annotate unions with their alternatives and note skipped field names.
    pub comments: bool,
}

impl RenderOptions {
    pub fn new<I, S>(ignored_fields: I, comments: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignored_fields: ignored_fields.into_iter().map(Into::into).collect(),
            comments,
        }
    }
}

pub fn primitive_name(p: Primitive) -> &'static str {
    match p {
        Primitive::Binary => "bson.Binary",
        Primitive::Bool => "bool",
        Primitive::Double => "float64",
        Primitive::Int32 => "int32",
        Primitive::Int64 => "int64",
        Primitive::ObjectId => "bson.ObjectId",
        Primitive::String => "string",
        Primitive::Timestamp => "time.Time",
        Primitive::DbRef => "mgo.DBRef",
    }
}

/// Declaration text for `ty` alone, without a name.
pub fn render(ty: &Type, opts: &RenderOptions) -> String {
    let mut out = String::new();
    write_type(&mut out, ty, opts, opts.comments, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    out.extend(std::iter::repeat_n('\t', depth));
}

/// `annotate` is off inside a union annotation; block comments do not nest.
fn write_type(out: &mut String, ty: &Type, opts: &RenderOptions, annotate: bool, depth: usize) {
    match ty {
        Type::Nil => out.push_str("nil"),
        Type::Primitive(p) => out.push_str(primitive_name(*p)),
        Type::Sequence(element) => {
            out.push_str("[]");
            write_type(out, element, opts, annotate, depth);
        }
        Type::Struct(obj) => write_struct(out, obj, opts, annotate, depth),
        Type::Mixed(alts) => {
            out.push_str("interface{}");
            if annotate {
                out.push_str(" /* ");
                for (i, alt) in alts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_type(out, alt, opts, false, depth);
                }
                out.push_str(" */");
            }
        }
    }
}

fn write_struct(
    out: &mut String,
    obj: &StructType,
    opts: &RenderOptions,
    annotate: bool,
    depth: usize,
) {
    let fields = obj
        .fields
        .iter()
        .filter(|(k, _)| !opts.ignored_fields.contains(k.as_str()))
        .collect::<Vec<_>>();
    if fields.is_empty() {
        out.push_str("struct {}");
        return;
    }
    out.push_str("struct {\n");
    // BTreeMap iteration is already sorted by source name.
    for (k, v) in fields {
        if !naming::is_valid_field_name(k) {
            tracing::debug!(field = %k, "skipping invalid field name");
            if annotate {
                indent(out, depth + 1);
                let _ = writeln!(out, "// skipping invalid field name {k}");
            }
            continue;
        }
        indent(out, depth + 1);
        out.push_str(&naming::make_field_name(k));
        out.push(' ');
        write_type(out, v, opts, annotate, depth + 1);
        let tag = escape_tag(k);
        let _ = writeln!(out, " `bson:\"{tag},omitempty\" json:\"{tag},omitempty\"`");
    }
    indent(out, depth);
    out.push('}');
}

fn escape_tag(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

// ————————————————————————————————————————————————————————————————————————————
// MULTI-TARGET OUTPUT
// ————————————————————————————————————————————————————————————————————————————

/// Accumulates one declaration per target.
pub struct Codegen<'a> {
    opts: &'a RenderOptions,
    out: String,
}

impl<'a> Codegen<'a> {
    pub fn new(opts: &'a RenderOptions) -> Self {
        Self { opts, out: String::new() }
    }

    /// Append `<name> <type>` followed by a blank line.
    pub fn emit(&mut self, ty: &Type, name: &str) {
        self.out.push_str(name);
        self.out.push(' ');
        write_type(&mut self.out, ty, self.opts, self.opts.comments, 0);
        self.out.push_str("\n\n");
    }

    pub fn into_string(self) -> String {
        self.out
    }
}
