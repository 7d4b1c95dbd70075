//! jq filters over input values, used to reshape exports before inference.
use std::fmt;

use jaq_core::{compile::Undefined, load, Compiler, Ctx, Filter, Native, RcIter};
use jaq_json::Val;
use serde_json::Value;

use crate::error::{Error, Result};

/// A jq program, compiled once and run per input value.
#[derive(Clone)]
pub struct JqFilter {
    source: String,
    filter: Filter<Native<Val>>,
}

impl fmt::Debug for JqFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JqFilter").field(&self.source).finish()
    }
}

impl JqFilter {
    /// Parse and compile `filter_src`, reporting syntax errors and unknown
    /// functions up front.
    pub fn compile(filter_src: &str) -> Result<Self> {
        let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = load::Arena::default();
        let program = load::File { code: filter_src, path: () };

        let modules = loader.load(&arena, program).map_err(format_parse_errors)?;

        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(format_undefined_errors)?;

        Ok(Self { source: filter_src.to_owned(), filter })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Every output of the filter for `input`, in order.
    pub fn run(&self, input: &Value) -> Result<Vec<Value>> {
        let inputs = RcIter::new(core::iter::empty());
        let outputs = self.filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

        let mut out = Vec::new();
        for item in outputs {
            let v = item.map_err(|e| Error::Jq(format!("`{}`: {e:?}", self.source)))?;
            out.push(Value::from(v));
        }
        Ok(out)
    }
}

fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    Error::Jq(s.trim_end().to_owned())
}

fn format_undefined_errors(errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>) -> Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    Error::Jq(s.trim_end().to_owned())
}
