//! Command-line argument parsing

use clap::Parser;

/// Every flag has a default, an environment variable, or a config-file
/// source; a bare `registry-mirror` invocation with a valid config file is
/// a complete run.
#[derive(Parser, Debug)]
#[command(name = "registry-mirror")]
#[command(about = "Mirror all images of a registry namespace into another, without overwriting")]
#[command(version, author)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(long = "config", help = "Path to JSON configuration file")]
    pub config: Option<String>,

    /// Source registry host
    #[arg(long = "source-host", help = "Source registry host (bare hostname)")]
    pub source_host: Option<String>,

    /// Source namespace (organization)
    #[arg(long = "source-namespace", help = "Source namespace to enumerate")]
    pub source_namespace: Option<String>,

    /// Source API token (or REGISTRY_MIRROR_SOURCE_TOKEN)
    #[arg(long = "source-token", help = "API token for the source registry")]
    pub source_token: Option<String>,

    /// Destination registry host
    #[arg(long = "dest-host", help = "Destination registry host (bare hostname)")]
    pub dest_host: Option<String>,

    /// Destination namespace (organization)
    #[arg(long = "dest-namespace", help = "Destination namespace to fill")]
    pub dest_namespace: Option<String>,

    /// Destination API token (or REGISTRY_MIRROR_DEST_TOKEN)
    #[arg(long = "dest-token", help = "API token for the destination registry")]
    pub dest_token: Option<String>,

    /// Retry attempts for failed operations
    #[arg(long = "retry", help = "Attempts per operation before giving up")]
    pub retry: Option<usize>,

    /// Delay between retry attempts in seconds
    #[arg(long = "retry-delay", help = "Fixed delay between retries, seconds")]
    pub retry_delay: Option<u64>,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(long = "quiet", short = 'q', help = "Suppress all non-error output")]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
