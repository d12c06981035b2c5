use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use super::reader::FileConfig;
use super::Args;
use crate::catalog::Account;
use crate::client::{RetryPolicy, DEFAULT_API_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("no source organizations given")]
    NoSources,

    #[error("target organization `{0}` is also listed as a source")]
    TargetIsSource(String),

    #[error("invalid value for `{name}`: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct MigrationConfig {
    /// In the order given, duplicates removed.
    pub sources: Vec<Account>,
    pub target: Account,
    pub topics: Vec<String>,
    pub token: String,
    pub api_url: String,
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub skip_decommission: bool,
}

impl fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("sources", &self.sources)
            .field("target", &self.target)
            .field("topics", &self.topics)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("concurrency", &self.concurrency)
            .field("retry", &self.retry)
            .field("skip_decommission", &self.skip_decommission)
            .finish()
    }
}

/// Merges command line and environment values over the file values, then
/// validates the result.
pub fn parse_config(args: Args, file: FileConfig) -> Result<MigrationConfig, ConfigError> {
    let sources = match args.source_orgs {
        Some(raw) => split_list(&raw),
        None => file
            .source_orgs
            .ok_or(ConfigError::Missing("source-orgs"))?,
    };
    let sources = dedup_sources(sources);
    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }

    let target = args
        .target_org
        .or(file.target_org)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::Missing("target-org"))?;
    if sources.iter().any(|s| s.as_str() == target) {
        return Err(ConfigError::TargetIsSource(target));
    }

    let token = args
        .token
        .or(file.token)
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::Missing("token"))?;

    let topics = match args.topics {
        Some(raw) => split_list(&raw),
        None => file.topics.unwrap_or_default(),
    };

    let concurrency = args.concurrency.or(file.concurrency).unwrap_or(1);
    if concurrency == 0 {
        return Err(ConfigError::Invalid {
            name: "concurrency",
            message: "must be at least 1".to_string(),
        });
    }

    let defaults = RetryPolicy::default();
    let retry = RetryPolicy::new(
        args.max_retries
            .or(file.max_retries)
            .unwrap_or(defaults.max_retries),
        args.retry_delay_secs
            .or(file.retry_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.delay),
        args.max_retry_delay_secs
            .or(file.max_retry_delay_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.max_delay),
    );

    Ok(MigrationConfig {
        sources,
        target: Account::new(target),
        topics,
        token,
        api_url: args
            .api_url
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        concurrency,
        retry,
        skip_decommission: args.skip_decommission || file.skip_decommission.unwrap_or(false),
    })
}

/// Splits a comma separated value, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedup_sources(names: Vec<String>) -> Vec<Account> {
    let mut sources: Vec<Account> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if name.is_empty() || sources.iter().any(|s| s.as_str() == name) {
            continue;
        }
        sources.push(Account::new(name));
    }
    sources
}
