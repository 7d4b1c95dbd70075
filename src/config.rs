//! Run configuration, loaded from YAML.
//!
//! ```yaml
//! dir: ./dump
//! limit: 1000
//! comments: true
//! ignored_fields: [__v]
//! collections:
//!   - name: users
//!     struct: User
//!   - name: audit_log
//!     files: ["exports/audit-*.json"]
//! ```
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen::RenderOptions;
use crate::error::{Error, Result};
use crate::naming;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<name>.json` exports.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Records sampled per collection; 0 means all of them.
    #[serde(default)]
    pub limit: u64,

    /// Annotate unions and skipped field names in the output.
    #[serde(default)]
    pub comments: bool,

    /// Field names never emitted, at any depth.
    #[serde(default)]
    pub ignored_fields: Vec<String>,

    /// Infer collections on the rayon pool.
    #[serde(default)]
    pub parallel: bool,

    /// Continue with the remaining collections when one fails.
    #[serde(default)]
    pub keep_going: bool,

    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Collection {
    pub name: String,

    /// Declaration name; defaults to the normalized collection name.
    #[serde(default, rename = "struct")]
    pub struct_name: Option<String>,

    /// Literal paths or glob patterns overriding `<dir>/<name>.json`.
    #[serde(default)]
    pub files: Vec<String>,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), struct_name: None, files: Vec::new() }
    }

    pub fn declaration_name(&self) -> String {
        match &self.struct_name {
            Some(name) => name.clone(),
            None => naming::make_field_name(&self.name),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        let mut config = Self::from_yaml(&src)?;
        if let Some(parent) = path.parent() {
            config.rebase(parent);
        }
        Ok(config)
    }

    /// Anchor relative `dir` and `files` entries at `base`.
    pub fn rebase(&mut self, base: &Path) {
        if self.dir.is_relative() {
            self.dir = base.join(&self.dir);
        }
        for c in &mut self.collections {
            for file in &mut c.files {
                if Path::new(file.as_str()).is_relative() {
                    *file = base.join(file.as_str()).to_string_lossy().into_owned();
                }
            }
        }
    }

    pub fn from_yaml(src: &str) -> Result<Self> {
        let config: Self = crate::path_de::from_yaml_with_path(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.collections.is_empty() {
            return Err(Error::Config("no collections configured".into()));
        }
        let mut names = BTreeSet::new();
        for c in &self.collections {
            if c.name.trim().is_empty() {
                return Err(Error::Config("collection with an empty name".into()));
            }
            if !names.insert(c.name.as_str()) {
                return Err(Error::Config(format!("collection `{}` listed twice", c.name)));
            }
            if c.declaration_name().is_empty() {
                return Err(Error::Config(format!(
                    "collection `{}` needs an explicit `struct` name",
                    c.name
                )));
            }
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::new(self.ignored_fields.iter().cloned(), self.comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let config = Config::from_yaml(
            "dir: dump\n\
             limit: 50\n\
             comments: true\n\
             ignored_fields: [__v, _class]\n\
             collections:\n  \
               - name: users\n    \
                 struct: Account\n  \
               - name: audit_log\n    \
                 files: ['logs/*.json']\n",
        )
        .unwrap();
        assert_eq!(config.dir, PathBuf::from("dump"));
        assert_eq!(config.limit, 50);
        assert!(config.comments);
        assert!(!config.keep_going);
        assert_eq!(config.collections[0].declaration_name(), "Account");
        assert_eq!(config.collections[1].declaration_name(), "AuditLog");
        assert_eq!(config.collections[1].files, ["logs/*.json"]);
        let opts = config.render_options();
        assert!(opts.ignored_fields.contains("_class"));
        assert!(opts.comments);
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_yaml("collections: [{name: posts}]").unwrap();
        assert_eq!(config.dir, PathBuf::from("."));
        assert_eq!(config.limit, 0);
        assert!(!config.comments && !config.parallel);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        for src in [
            "collections: []",
            "collections: [{name: a}, {name: a}]",
            "collections: [{name: ' '}]",
            "collections: [{name: '!!!'}]",
            "collections: [{name: a, colour: red}]",
        ] {
            assert!(matches!(Config::from_yaml(src), Err(Error::Config(_))), "{src}");
        }
    }

    #[test]
    fn relative_dir_follows_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("schema.yaml");
        std::fs::write(&path, "dir: exports\ncollections: [{name: users}]\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.dir, tmp.path().join("exports"));
    }

    #[test]
    fn relative_files_follow_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("schema.yaml");
        std::fs::write(
            &path,
            "collections: [{name: logs, files: ['dump/logs-*.json', '/abs/logs.json']}]\n",
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(
            config.collections[0].files,
            [
                tmp.path().join("dump/logs-*.json").to_string_lossy().into_owned(),
                "/abs/logs.json".to_owned(),
            ]
        );
    }
}
