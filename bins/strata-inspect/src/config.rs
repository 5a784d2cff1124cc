use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use strata_api::{Partitioner, ProtocolVersion};

use crate::error::InspectError;

#[derive(Parser)]
#[command(name = "strata-inspect", about = "Decode query result rows described by a TOML fixture")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode and print every row
    Decode(DecodeArgs),
    /// Print the column definitions
    Columns(ColumnsArgs),
}

#[derive(Args, Clone, Debug)]
pub struct DecodeArgs {
    /// Path to the TOML fixture
    #[arg(long, env = "STRATA_FIXTURE")]
    pub fixture: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Clone, Debug)]
pub struct ColumnsArgs {
    /// Path to the TOML fixture
    #[arg(long, env = "STRATA_FIXTURE")]
    pub fixture: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

// ---- TOML fixture ----

#[derive(Debug, Deserialize)]
pub struct Fixture {
    /// Native protocol version the rows were encoded with (1-5).
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    /// Needed to read `token(...)` columns.
    #[serde(default)]
    pub partitioner: Option<Partitioner>,
    /// Default keyspace for user types and columns.
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    /// Default table for columns.
    #[serde(default)]
    pub table: String,
    /// User-defined types, in dependency order.
    #[serde(default)]
    pub types: Vec<TypeConfig>,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub rows: Vec<RowConfig>,
}

#[derive(Debug, Deserialize)]
pub struct TypeConfig {
    pub keyspace: Option<String>,
    pub name: String,
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub keyspace: Option<String>,
    pub table: Option<String>,
}

/// One row: a hex string per column, or `"null"`.
#[derive(Debug, Deserialize)]
pub struct RowConfig {
    pub values: Vec<String>,
}

fn default_keyspace() -> String {
    "ks".to_string()
}

impl Fixture {
    pub fn load(path: &str) -> Result<Self, InspectError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InspectError::Config { context: "read", detail: format!("'{path}': {e}") })?;
        Self::parse(&content).map_err(|e| match e {
            InspectError::Config { context, detail } => {
                InspectError::Config { context, detail: format!("'{path}': {detail}") }
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, InspectError> {
        toml::from_str(content).map_err(|e| InspectError::Config { context: "parse", detail: e.to_string() })
    }
}
