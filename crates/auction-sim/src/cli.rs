use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
pub struct Args {
    /// The log filter.
    #[clap(long, env, default_value = "warn,auction_sim=info,dutch_auction=debug")]
    pub log: String,

    /// At which log level logs should be printed to stderr instead of stdout.
    #[clap(long, env)]
    pub stderr_threshold: Option<tracing::Level>,

    /// Whether to use JSON format for the logs.
    #[clap(long, env, default_value = "false")]
    pub use_json_logs: bool,

    /// Path to the scenario file. This file should be in TOML format.
    #[clap(long, env)]
    pub config: PathBuf,

    /// Where to write the slug snapshots, one JSON object per line. Defaults
    /// to stdout.
    #[clap(long, env)]
    pub output: Option<PathBuf>,
}
