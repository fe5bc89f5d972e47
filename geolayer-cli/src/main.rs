//! GeoLayer CLI - command-line driver for the map-view engine.
//!
//! One-shot commands cover the server-side catalog (list, import, publish,
//! delete); the `session` command opens an interactive map view whose layer
//! state lives for the duration of the session.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use geolayer::client::ImportFormat;
use geolayer::config::EndpointConfig;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Clone, ValueEnum)]
enum FileFormat {
    /// GeoJSON feature collection (.geojson)
    Geojson,
    /// Zipped ESRI shapefile (.zip)
    Shapefile,
    /// FlatGeobuf (.fgb)
    Flatgeobuf,
}

impl From<FileFormat> for ImportFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Geojson => ImportFormat::GeoJson,
            FileFormat::Shapefile => ImportFormat::Shapefile,
            FileFormat::Flatgeobuf => ImportFormat::FlatGeobuf,
        }
    }
}

#[derive(Debug, Args)]
struct EndpointArgs {
    /// Base URL of the catalog / geoprocessing API
    #[arg(long, env = "GEOLAYER_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Base URL of the map server
    #[arg(
        long,
        env = "GEOLAYER_GEOSERVER_URL",
        default_value = "http://localhost:8080/geoserver"
    )]
    geoserver_url: String,

    /// Database schema holding imported tables
    #[arg(long, env = "GEOLAYER_SCHEMA", default_value = "public")]
    schema: String,

    /// Map server workspace
    #[arg(long, env = "GEOLAYER_WORKSPACE", default_value = "test_workspace")]
    workspace: String,

    /// Map server datastore
    #[arg(long, env = "GEOLAYER_DATASTORE", default_value = "test_datastore")]
    datastore: String,
}

impl EndpointArgs {
    fn into_config(self) -> EndpointConfig {
        EndpointConfig::new(self.api_url, self.geoserver_url)
            .with_schema(self.schema)
            .with_workspace(self.workspace)
            .with_datastore(self.datastore)
    }
}

#[derive(Subcommand)]
enum Command {
    /// List the tables in the configured schema
    Tables,

    /// Delete a table from the configured schema
    DeleteTable {
        /// Table name
        name: String,
    },

    /// Import a file as a new table and publish it as a servable layer
    Import {
        /// Path of the file to upload
        file: PathBuf,

        /// Table name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,

        /// File format
        #[arg(long, value_enum, default_value = "geojson")]
        format: FileFormat,
    },

    /// Publish an existing table as a servable layer
    Publish {
        /// Table name
        table: String,
    },

    /// Open an interactive map-view session
    Session,
}

#[derive(Parser)]
#[command(name = "geolayer")]
#[command(version = geolayer::VERSION)]
#[command(about = "Publish, style, and geoprocess map layers", long_about = None)]
struct Cli {
    #[command(flatten)]
    endpoints: EndpointArgs,

    /// Enable debug-level logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(cli.debug)?;
    let service = runner.service(cli.endpoints.into_config())?;

    match cli.command {
        Command::Tables => commands::tables(&service).await,
        Command::DeleteTable { name } => commands::delete_table(&service, &name).await,
        Command::Import { file, name, format } => {
            commands::import(&service, &file, name.as_deref(), format.into()).await
        }
        Command::Publish { table } => commands::publish(&service, &table).await,
        Command::Session => commands::session(&service).await,
    }
}
