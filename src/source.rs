//! Record suppliers.
//!
//! The engine only needs a lazy stream of documents per collection. The
//! bundled [`FileSource`] reads `mongoexport` output: newline-delimited or
//! concatenated Extended JSON, or a single JSON array (`--jsonArray`).
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::Value as Json;

use crate::config::Collection;
use crate::error::{Error, Result};
use crate::jq_exec::JqFilter;
use crate::value::{self, Document};

pub type Records<'a> = Box<dyn Iterator<Item = Result<Document>> + 'a>;

/// Supplies the raw records of one collection, lazily and in order.
///
/// The caller applies any record cap and may stop pulling at any point.
pub trait RecordSource: Sync {
    fn records<'a>(&'a self, collection: &Collection) -> Result<Records<'a>>;
}

// ————————————————————————————————————————————————————————————————————————————
// FILES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default)]
pub struct FileSource {
    dir: PathBuf,
    json_pointer: Option<String>,
    jq: Option<JqFilter>,
}

impl FileSource {
    /// Collections without explicit `files` read `<dir>/<name>.json`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), ..Self::default() }
    }

    /// Select a sub-node of every input value before anything else.
    pub fn with_json_pointer(mut self, pointer: Option<String>) -> Self {
        self.json_pointer = pointer;
        self
    }

    /// Reshape every input value with a jq filter; each output is a record.
    pub fn with_jq(mut self, jq: Option<JqFilter>) -> Self {
        self.jq = jq;
        self
    }

    fn paths_for(&self, collection: &Collection) -> Result<Vec<PathBuf>> {
        if collection.files.is_empty() {
            return Ok(vec![self.dir.join(format!("{}.json", collection.name))]);
        }
        let paths = resolve_file_path_patterns(&collection.files)?;
        if paths.is_empty() {
            return Err(Error::NoInput(collection.name.clone()));
        }
        Ok(paths)
    }
}

impl RecordSource for FileSource {
    fn records<'a>(&'a self, collection: &Collection) -> Result<Records<'a>> {
        let paths = self.paths_for(collection)?;
        tracing::debug!(collection = %collection.name, files = paths.len(), "opening record files");
        Ok(Box::new(FileRecords {
            source: self,
            paths: paths.into(),
            current: None,
            pending: VecDeque::new(),
            index: 0,
            failed: false,
        }))
    }
}

type JsonStream = serde_json::StreamDeserializer<'static, serde_json::de::IoRead<BufReader<File>>, Json>;

struct OpenFile {
    path: PathBuf,
    stream: JsonStream,
}

/// Streams records across files one value at a time.
struct FileRecords<'a> {
    source: &'a FileSource,
    paths: VecDeque<PathBuf>,
    current: Option<OpenFile>,
    /// Records produced by one input value but not yet handed out.
    pending: VecDeque<Json>,
    /// Position of the next record in the current file, for diagnostics.
    index: u64,
    failed: bool,
}

impl FileRecords<'_> {
    fn open_next(&mut self) -> Result<bool> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(false);
        };
        let file = File::open(&path).map_err(|source| Error::Io { path: path.clone(), source })?;
        let stream = serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter::<Json>();
        self.current = Some(OpenFile { path, stream });
        self.index = 0;
        Ok(true)
    }

    /// Turn one top-level input value into zero or more pending records.
    fn expand(&mut self, value: Json) -> Result<()> {
        let value = match &self.source.json_pointer {
            Some(pointer) => match value.pointer(pointer) {
                Some(v) => v.clone(),
                None => return Ok(()),
            },
            None => value,
        };
        let values = match &self.source.jq {
            Some(jq) => jq.run(&value)?,
            None => vec![value],
        };
        for v in values {
            match v {
                Json::Array(items) => self.pending.extend(items),
                other => self.pending.push_back(other),
            }
        }
        Ok(())
    }

    fn next_record(&mut self) -> Result<Option<Document>> {
        loop {
            if let Some(json) = self.pending.pop_front() {
                let index = self.index;
                self.index += 1;
                return match value::document_from_extended_json(&json)? {
                    Some(doc) => Ok(Some(doc)),
                    None => Err(Error::NotADocument {
                        path: self.current.as_ref().map(|f| f.path.clone()).unwrap_or_default(),
                        index,
                        found: json_kind(&json),
                    }),
                };
            }
            let Some(open) = self.current.as_mut() else {
                if self.open_next()? {
                    continue;
                }
                return Ok(None);
            };
            match open.stream.next() {
                Some(Ok(value)) => self.expand(value)?,
                Some(Err(source)) => {
                    return Err(Error::Json { path: open.path.clone(), source });
                }
                None => {
                    tracing::trace!(path = %open.path.display(), records = self.index, "file exhausted");
                    self.current = None;
                }
            }
        }
    }
}

impl Iterator for FileRecords<'_> {
    type Item = Result<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(doc) => doc.map(Ok),
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IN MEMORY
// ————————————————————————————————————————————————————————————————————————————

/// Fixed documents per collection; handy for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: Vec<(String, Vec<Document>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, docs: Vec<Document>) -> Self {
        self.collections.push((name.into(), docs));
        self
    }
}

impl RecordSource for MemorySource {
    fn records<'a>(&'a self, collection: &Collection) -> Result<Records<'a>> {
        let (_, docs) = self
            .collections
            .iter()
            .find(|(name, _)| *name == collection.name)
            .ok_or_else(|| Error::NoInput(collection.name.clone()))?;
        Ok(Box::new(docs.iter().cloned().map(Ok)))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Expand literal paths and glob patterns, keeping argument order.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(Error::Glob(format!("pattern matched no files: {pattern}")));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

/// Read every record of one file; used by tests and small tools.
pub fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let source = FileSource::default();
    let mut collection = Collection::new(path.display().to_string());
    collection.files = vec![path.display().to_string()];
    source.records(&collection)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn ndjson_and_arrays_stream_as_records() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "users.json", "{\"a\": 1}\n{\"a\": {\"$numberInt\": \"2\"}}\n[{\"a\": 3}, {\"a\": 4}]\n");
        let source = FileSource::new(tmp.path());
        let docs = source
            .records(&Collection::new("users"))
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let values = docs.iter().map(|d| d["a"].clone()).collect::<Vec<_>>();
        assert_eq!(
            values,
            [Value::Int64(1), Value::Int32(2), Value::Int64(3), Value::Int64(4)]
        );
    }

    #[test]
    fn records_are_pulled_lazily() {
        let tmp = tempfile::tempdir().unwrap();
        // the broken tail is never reached
        write(tmp.path(), "c.json", "{\"a\": 1}\n{\"a\": 2}\n{oops");
        let source = FileSource::new(tmp.path());
        let taken = source.records(&Collection::new("c")).unwrap().take(2).collect::<Result<Vec<_>>>();
        assert_eq!(taken.unwrap().len(), 2);

        let all = source.records(&Collection::new("c")).unwrap().collect::<Vec<_>>();
        assert_eq!(all.len(), 3);
        assert!(matches!(all[2], Err(Error::Json { .. })));
    }

    #[test]
    fn globs_pointer_and_jq_shape_records() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "page-1.json", r#"{"data": {"items": [{"id": 1, "noise": true}]}}"#);
        write(tmp.path(), "page-2.json", r#"{"data": {"items": [{"id": 2}, {"id": 3}]}}"#);
        let mut collection = Collection::new("pages");
        collection.files = vec![format!("{}/page-*.json", tmp.path().display())];
        let source = FileSource::new(tmp.path())
            .with_json_pointer(Some("/data".into()))
            .with_jq(Some(JqFilter::compile(".items[] | {id}").unwrap()));
        let docs = source.records(&collection).unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.len() == 1 && d.contains_key("id")));
    }

    #[test]
    fn scalar_records_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write(tmp.path(), "bad.json", "{\"a\": 1}\n42\n");
        let err = read_documents(&path).unwrap_err();
        match err {
            Error::NotADocument { index, found, .. } => {
                assert_eq!(index, 1);
                assert_eq!(found, "number");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_inputs_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FileSource::new(tmp.path());
        let mut records = source.records(&Collection::new("absent")).unwrap();
        assert!(matches!(records.next(), Some(Err(Error::Io { .. }))));
        assert!(records.next().is_none());

        let mut collection = Collection::new("absent");
        collection.files = vec![format!("{}/*.ndjson", tmp.path().display())];
        assert!(matches!(source.records(&collection), Err(Error::Glob(_))));
    }

    #[test]
    fn memory_source_serves_named_collections() {
        let doc = Document::from_iter([("a".to_owned(), Value::Bool(true))]);
        let source = MemorySource::new().with_collection("x", vec![doc.clone()]);
        let got = source.records(&Collection::new("x")).unwrap().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(got, vec![doc]);
        assert!(matches!(source.records(&Collection::new("y")), Err(Error::NoInput(_))));
    }
}
