use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// CLI arguments for popdb
#[derive(Debug, Parser)]
#[command(
    name = "popdb",
    version,
    about = "Load a gazetteer dump and estimate the population around a place"
)]
pub struct CliArgs {
    /// Path to the SQLite catalog (created if missing)
    #[arg(
        short = 'd',
        long = "database",
        env = "POPDB_DATABASE",
        default_value = "popdb.sqlite",
        global = true
    )]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a tab-separated GeoNames dump (.txt or .txt.gz) into the catalog
    Ingest {
        /// Dump file to read
        dump: PathBuf,

        /// Drop the existing catalog before loading
        #[arg(long)]
        rebuild: bool,

        /// Print the load report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate the population within a radius of a place
    Population {
        /// Exact place name as stored in the catalog
        place: String,

        /// Radius in kilometers
        radius: String,

        /// Print the full estimate as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a summary of the catalog contents
    Stats,

    /// Serve `GET /population?place=..&radius=..` over HTTP
    Serve {
        /// Address to bind
        #[arg(long, env = "POPDB_LISTEN", default_value = "127.0.0.1:8080")]
        listen: SocketAddr,

        /// Per-query timeout in milliseconds
        #[arg(long, env = "POPDB_QUERY_TIMEOUT_MS", default_value_t = 5_000)]
        query_timeout_ms: u64,

        /// Load this dump into a freshly rebuilt catalog before serving
        #[arg(long)]
        load: Option<PathBuf>,
    },
}
