//! CLI: config-driven generation, or ad-hoc inference over export files.
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::codegen::RenderOptions;
use crate::config::{Collection, Config};
use crate::generator::{Generator, Report};
use crate::jq_exec::JqFilter;
use crate::source::FileSource;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer type declarations from MongoDB-style document exports
#[derive(Parser, Debug)]
#[command(name = "docschema", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer every collection listed in a YAML config
    Generate(GenerateOut),
    /// infer one declaration from JSON / NDJSON files
    Infer(InferOut),
    /// infer from JSON / NDJSON files and print the inferred type tree as JSON
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data/items)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// maximum number of records to sample (0 = all)
    #[arg(long, default_value_t = 0)]
    limit: u64,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct RenderSettings {
    /// annotate unions with their alternatives and note skipped field names
    #[arg(long)]
    comments: bool,

    /// field names to leave out of the declaration (any depth)
    #[arg(long = "ignore", value_name = "FIELD")]
    ignored_fields: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    /// YAML config describing the collections
    config: PathBuf,

    /// override the config's record limit
    #[arg(long)]
    limit: Option<u64>,

    /// force verbose annotations on
    #[arg(long)]
    comments: bool,

    /// continue with remaining collections when one fails
    #[arg(long)]
    keep_going: bool,

    /// infer collections in parallel
    #[arg(long)]
    parallel: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct InferOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    render_settings: RenderSettings,

    /// declaration name
    #[arg(long, default_value = "Root")]
    name: String,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn source(&self) -> anyhow::Result<FileSource> {
        let jq = match &self.jq_expr {
            Some(expr) => Some(JqFilter::compile(expr)?),
            None => None,
        };
        Ok(FileSource::new(".")
            .with_json_pointer(self.json_pointer.clone())
            .with_jq(jq))
    }

    fn config(&self, name: &str) -> Config {
        let mut collection = Collection::new(name);
        collection.struct_name = Some(name.to_owned());
        collection.files = self.input.clone();
        Config {
            limit: self.limit,
            collections: vec![collection],
            ..Config::default()
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let mut config = Config::load(&target.config)
                    .with_context(|| format!("loading {}", target.config.display()))?;
                if let Some(limit) = target.limit {
                    config.limit = limit;
                }
                config.comments |= target.comments;
                config.keep_going |= target.keep_going;
                config.parallel |= target.parallel;

                let source = FileSource::new(&config.dir);
                let report = Generator::new(&config, source).run()?;
                finish(report, &config.render_options(), target.out.as_deref())
            }
            Command::Infer(target) => {
                let config = target.input_settings.config(&target.name);
                let source = target.input_settings.source()?;
                let report = Generator::new(&config, source).run()?;
                let opts = RenderOptions::new(
                    target.render_settings.ignored_fields.iter().cloned(),
                    target.render_settings.comments,
                );
                finish(report, &opts, target.out.as_deref())
            }
            Command::Schema(target) => {
                let config = target.input_settings.config("Root");
                let source = target.input_settings.source()?;
                let decls = Generator::new(&config, source).run()?.into_result()?;
                let tree = decls.into_iter().next().map(|d| d.ty).unwrap_or_default();
                let schema_src = serde_json::to_string_pretty(&tree)?;
                write_output(target.out.as_deref(), &schema_src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Print what succeeded, then surface any collected failures.
fn finish(report: Report, opts: &RenderOptions, out: Option<&Path>) -> anyhow::Result<()> {
    let rendered = report.render(opts);
    write_output(out, rendered.trim_end())?;
    report.into_result()?;
    Ok(())
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            std::fs::write(out, format!("{text}\n"))
                .with_context(|| format!("writing {}", out.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}
