use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Return documents of a resource type created or modified since a watermark
    Scan {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, help = "Resource type to match exactly, e.g. Patient")]
        resource_type: String,

        #[arg(
            long,
            help = "Watermark: epoch seconds, RFC 3339, local date-time or date; omit to match every document"
        )]
        since: Option<String>,

        #[arg(long, help = "Partition key ranges read in parallel")]
        concurrency: Option<usize>,

        #[arg(long, help = "Abort with not found on the first unavailable range")]
        strict: bool,

        #[arg(
            long,
            help = "JSON file mapping range ids to continuation tokens to resume from"
        )]
        resume: Option<PathBuf>,

        #[arg(
            long,
            help = "If specified, writes the documents to this file instead of stdout"
        )]
        output: Option<PathBuf>,

        #[arg(long, help = "If specified, writes the JSON scan report to this file")]
        report: Option<PathBuf>,
    },
    /// List the partition key ranges of a collection
    Ranges {
        #[command(flatten)]
        store: StoreArgs,
    },
}

/// Where to read from and how the scanner is configured.
#[derive(Args, Clone)]
pub struct StoreArgs {
    #[arg(long, help = "JSON fixture describing the document store")]
    pub fixture: PathBuf,

    #[arg(
        long,
        help = "Settings file path (defaults to ~/.feedscan/config.json when present)"
    )]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Load FEEDSCAN_* variables from this .env file")]
    pub env_file: Option<PathBuf>,

    #[arg(long, help = "Database id, overrides the configured default")]
    pub database: Option<String>,

    #[arg(long, help = "Collection id, overrides the configured default")]
    pub collection: Option<String>,
}
