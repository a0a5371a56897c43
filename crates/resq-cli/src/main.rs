//! resq: translate resource-schema queries into entity-schema queries
//!
//! Reads a mapping file describing schemas and transformation graphs, then
//! translates JSON query trees, prints correlation tables, or coerces single
//! values from the command line.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use resq_ast::{Literal, QueryNode, WireValue};
use resq_schema::DataType;
use resq_translate::SchemaTranslator;

mod config;
mod error;
mod logging;
mod mapping_file;

use config::Config;
use error::CliError;
use mapping_file::MappingFile;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./resq.yaml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a JSON query tree into entity terms
    Translate {
        /// Mapping file with schemas, bindings and transformation graphs
        #[arg(long)]
        mapping: PathBuf,

        /// Resource schema the query is written against
        #[arg(long)]
        resource: String,

        /// Query file (reads stdin when omitted)
        #[arg(long)]
        query: Option<PathBuf>,
    },

    /// Print the correlation table of a resource schema
    Correlate {
        #[arg(long)]
        mapping: PathBuf,

        #[arg(long)]
        resource: String,
    },

    /// Coerce a single JSON value to a scalar type
    Coerce {
        /// Target type name (e.g. int32, bool, datetimetz, url)
        #[arg(long = "type")]
        type_name: String,

        /// JSON value; bare text is taken as a string
        #[arg(long)]
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref()).context("loading configuration")?;
    config.apply_logging_env();
    logging::init()?;

    match cli.command {
        Command::Translate {
            mapping,
            resource,
            query,
        } => translate(&config, &mapping, &resource, query.as_deref()),
        Command::Correlate { mapping, resource } => correlate(&config, &mapping, &resource),
        Command::Coerce { type_name, value } => coerce(&type_name, &value),
    }
}

fn translate(
    config: &Config,
    mapping: &Path,
    resource: &str,
    query: Option<&Path>,
) -> anyhow::Result<()> {
    let (registry, mapping) = MappingFile::load(mapping)
        .and_then(MappingFile::build)
        .with_context(|| format!("loading mapping file {}", mapping.display()))?;

    let text = match query {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading query file {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    let query: QueryNode = serde_json::from_str(&text).map_err(CliError::from)?;
    query
        .validate_shape()
        .map_err(|e| CliError::Input(e.to_string()))?;

    let translator = SchemaTranslator::with_config(&registry, &mapping, config.translator_config());
    let translated = translator.translate(&query, resource)?;

    log_event!(
        level: tracing::Level::INFO,
        event: "translation_completed",
        resource: resource,
        input: query.fingerprint(),
        output: translated.fingerprint()
    );
    println!("{}", serde_json::to_string_pretty(&translated)?);
    Ok(())
}

fn correlate(config: &Config, mapping: &Path, resource: &str) -> anyhow::Result<()> {
    let (registry, mapping) = MappingFile::load(mapping)
        .and_then(MappingFile::build)
        .with_context(|| format!("loading mapping file {}", mapping.display()))?;

    let translator = SchemaTranslator::with_config(&registry, &mapping, config.translator_config());
    let table = translator.correlations(resource)?;
    println!("{}", serde_json::to_string_pretty(&*table)?);
    Ok(())
}

fn coerce(type_name: &str, value: &str) -> anyhow::Result<()> {
    let target: DataType = type_name.parse()?;
    let literal = Literal::Wire(parse_wire(value)?);

    let coerced = resq_coerce::coerce(&target, &literal)?;
    println!("{}", serde_json::to_string_pretty(&coerced)?);
    Ok(())
}

/// JSON when it parses, otherwise the raw text as a wire string
fn parse_wire(value: &str) -> Result<WireValue, CliError> {
    let json = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    WireValue::try_from(json).map_err(CliError::Input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wire_values() {
        assert_eq!(parse_wire("true").unwrap(), WireValue::Bool(true));
        assert_eq!(parse_wire("\"42\"").unwrap(), WireValue::String("42".to_string()));
        assert_eq!(parse_wire("/a/b").unwrap(), WireValue::String("/a/b".to_string()));
        assert!(matches!(parse_wire("[1, 2]").unwrap(), WireValue::Array(items) if items.len() == 2));
        assert!(parse_wire("{\"a\": 1}").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from([
            "resq",
            "translate",
            "--mapping",
            "mapping.yaml",
            "--resource",
            "UserResource",
        ]);
        assert!(matches!(
            cli.command,
            Command::Translate { ref resource, query: None, .. } if resource == "UserResource"
        ));

        let cli = Cli::parse_from(["resq", "coerce", "--type", "int32", "--value", "123"]);
        assert!(matches!(cli.command, Command::Coerce { ref type_name, .. } if type_name == "int32"));
    }
}
