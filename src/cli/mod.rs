pub mod parser;
pub mod reader;

pub use parser::{ConfigError, MigrationConfig};

use clap::Parser;
use parser::parse_config;
use reader::{read_config, FileConfig};

/// Moves repositories, teams, members and webhooks from one or more GitHub
/// organizations into a single target organization.
#[derive(Parser, Debug, Default)]
#[clap(name = "orgshift", version)]
pub struct Args {
    /// Optional YAML file with defaults for any of the settings below
    #[clap(short, long, parse(from_os_str))]
    pub config: Option<std::path::PathBuf>,

    /// Comma separated source organizations
    #[clap(long, env = "SOURCE_ORGS")]
    pub source_orgs: Option<String>,

    #[clap(long, env = "TARGET_ORG")]
    pub target_org: Option<String>,

    /// Comma separated topics written to every migrated repository
    #[clap(long, env = "REPO_TOPICS")]
    pub topics: Option<String>,

    #[clap(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[clap(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Item operations kept in flight at once within a phase
    #[clap(long)]
    pub concurrency: Option<usize>,

    #[clap(long)]
    pub max_retries: Option<u32>,

    #[clap(long)]
    pub retry_delay_secs: Option<u64>,

    #[clap(long)]
    pub max_retry_delay_secs: Option<u64>,

    /// Stop after verification; source organizations are left untouched
    #[clap(long)]
    pub skip_decommission: bool,
}

pub fn run() -> Result<MigrationConfig, ConfigError> {
    let args = Args::parse();

    let file = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            read_config(&content)?
        }
        None => FileConfig::default(),
    };

    parse_config(args, file)
}
