//! Infer type declarations from samples of schema-less documents.
//!
//! Records are classified into a small type lattice ([`inference::Type`]),
//! folded per collection, and rendered as declarations ([`codegen`]).
pub mod cli;
pub mod codegen;
pub mod config;
pub mod error;
pub mod generator;
pub mod inference;
pub mod jq_exec;
pub mod naming;
pub mod path_de;
pub mod source;
pub mod value;

pub use codegen::{render, RenderOptions};
pub use config::{Collection, Config};
pub use error::{Error, Result};
pub use generator::{Declaration, Generator, Report};
pub use inference::{Inference, Primitive, StructType, Type};
pub use source::{FileSource, MemorySource, RecordSource};
pub use value::{Document, Value};
