//! Per-collection driver: pull records, fold them, render declarations.
use rayon::prelude::*;

use crate::codegen::{Codegen, RenderOptions};
use crate::config::{Collection, Config};
use crate::error::{Error, Result, TargetFailure, TargetFailures};
use crate::inference::{Inference, Type};
use crate::source::RecordSource;

/// The inferred type of one collection.
#[derive(Debug, Clone)]
pub struct Declaration {
    pub collection: String,
    pub name: String,
    pub ty: Type,
    pub records: u64,
}

/// Outcome of a run: declarations in config order, plus failures when the
/// run was allowed to continue past them.
#[derive(Debug, Default)]
pub struct Report {
    pub declarations: Vec<Declaration>,
    pub failures: Vec<TargetFailure>,
}

impl Report {
    pub fn render(&self, opts: &RenderOptions) -> String {
        let mut cg = Codegen::new(opts);
        for decl in &self.declarations {
            cg.emit(&decl.ty, &decl.name);
        }
        cg.into_string()
    }

    /// Fold collected failures into a single error.
    pub fn into_result(self) -> Result<Vec<Declaration>> {
        if self.failures.is_empty() {
            Ok(self.declarations)
        } else {
            Err(Error::Targets(TargetFailures(self.failures)))
        }
    }
}

pub struct Generator<'a, S> {
    config: &'a Config,
    source: S,
}

impl<'a, S: RecordSource> Generator<'a, S> {
    pub fn new(config: &'a Config, source: S) -> Self {
        Self { config, source }
    }

    /// Infer every configured collection.
    ///
    /// Without `keep_going` the first failing collection aborts the run.
    pub fn run(&self) -> Result<Report> {
        let results: Vec<(&Collection, Result<Declaration>)> = if self.config.parallel {
            self.config
                .collections
                .par_iter()
                .map(|c| (c, self.infer_collection(c)))
                .collect()
        } else if self.config.keep_going {
            self.config.collections.iter().map(|c| (c, self.infer_collection(c))).collect()
        } else {
            let mut out = Vec::with_capacity(self.config.collections.len());
            for c in &self.config.collections {
                out.push((c, Ok(self.infer_collection(c)?)));
            }
            out
        };

        let mut report = Report::default();
        for (collection, result) in results {
            match result {
                Ok(decl) => report.declarations.push(decl),
                Err(error) if self.config.keep_going => {
                    tracing::error!(collection = %collection.name, %error, "collection failed");
                    report.failures.push(TargetFailure { target: collection.name.clone(), error });
                }
                Err(error) => return Err(error),
            }
        }
        Ok(report)
    }

    /// Fold up to `limit` records of one collection.
    pub fn infer_collection(&self, collection: &Collection) -> Result<Declaration> {
        let limit = self.config.limit;
        tracing::info!(collection = %collection.name, limit, "inferring");

        let mut inf = Inference::new();
        let mut records = self.source.records(collection)?;
        while limit == 0 || inf.seen() < limit {
            let Some(record) = records.next() else { break };
            inf.observe_document(&record?)?;
        }

        let records = inf.seen();
        if records == 0 {
            tracing::warn!(collection = %collection.name, "no records; declaration will be empty");
        } else if limit != 0 && records == limit {
            tracing::debug!(collection = %collection.name, limit, "record limit reached");
        } else if limit != 0 {
            tracing::debug!(collection = %collection.name, records, limit, "supply ended before limit");
        }
        tracing::info!(collection = %collection.name, records, "inferred");

        Ok(Declaration {
            collection: collection.name.clone(),
            name: collection.declaration_name(),
            ty: inf.solve(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::value::{document_from_extended_json, Document};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn docs(values: Vec<serde_json::Value>) -> Vec<Document> {
        values
            .iter()
            .map(|v| document_from_extended_json(v).unwrap().unwrap())
            .collect()
    }

    fn config(collections: &[&str]) -> Config {
        Config {
            collections: collections.iter().map(|c| Collection::new(*c)).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn end_to_end_widening_then_union() {
        let source = MemorySource::new()
            .with_collection("samples", docs(vec![json!({"n": 1}), json!({"n": 2.5}), json!({"n": "x"})]));
        let mut cfg = config(&["samples"]);
        cfg.comments = true;
        let report = Generator::new(&cfg, source).run().unwrap();
        assert_eq!(report.declarations[0].records, 3);
        assert_eq!(
            report.render(&cfg.render_options()),
            "Samples struct {\n\
             \tN interface{} /* float64, string */ `bson:\"n,omitempty\" json:\"n,omitempty\"`\n\
             }\n\n"
        );
    }

    #[test]
    fn limit_caps_records_and_short_supply_is_fine() {
        let source = MemorySource::new()
            .with_collection("a", docs(vec![json!({"x": 1}), json!({"y": 2}), json!({"z": 3})]))
            .with_collection("b", docs(vec![json!({"x": 1})]));
        let mut cfg = config(&["a", "b"]);
        cfg.limit = 2;
        let decls = Generator::new(&cfg, source).run().unwrap().into_result().unwrap();
        assert_eq!(decls[0].records, 2);
        let Type::Struct(a) = &decls[0].ty else { panic!("expected struct") };
        assert_eq!(a.fields.keys().collect::<Vec<_>>(), ["x", "y"]);
        assert_eq!(decls[1].records, 1);
    }

    #[test]
    fn failure_aborts_by_default() {
        let source = MemorySource::new().with_collection("ok", docs(vec![json!({"x": 1})]));
        let cfg = config(&["missing", "ok"]);
        let err = Generator::new(&cfg, source).run().unwrap_err();
        assert!(matches!(err, Error::NoInput(name) if name == "missing"));
    }

    #[test]
    fn keep_going_reports_every_failure() {
        let bad = docs(vec![json!({"price": {"$numberDecimal": "1.5"}})]);
        let source = MemorySource::new()
            .with_collection("ok", docs(vec![json!({"x": 1})]))
            .with_collection("bad", bad);
        for parallel in [false, true] {
            let mut cfg = config(&["bad", "ok", "missing"]);
            cfg.keep_going = true;
            cfg.parallel = parallel;
            let report = Generator::new(&cfg, source.clone()).run().unwrap();
            assert_eq!(report.declarations.len(), 1);
            assert_eq!(report.declarations[0].name, "Ok");
            let failed = report.failures.iter().map(|f| f.target.as_str()).collect::<Vec<_>>();
            assert_eq!(failed, ["bad", "missing"]);
            assert!(matches!(report.into_result(), Err(Error::Targets(_))));
        }
    }

    #[test]
    fn parallel_run_keeps_config_order() {
        let mut source = MemorySource::new();
        let names = (0..8).map(|i| format!("c{i}")).collect::<Vec<_>>();
        for (i, name) in names.iter().enumerate() {
            source = source.with_collection(name, docs(vec![json!({ "f": i })]));
        }
        let mut cfg = config(&names.iter().map(String::as_str).collect::<Vec<_>>());
        cfg.parallel = true;
        let decls = Generator::new(&cfg, source).run().unwrap().declarations;
        let got = decls.iter().map(|d| d.collection.as_str()).collect::<Vec<_>>();
        assert_eq!(got, names.iter().map(String::as_str).collect::<Vec<_>>());
    }
}
