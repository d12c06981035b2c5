use serde::Deserialize;
use serde_yaml;

use super::parser::ConfigError;

/// Settings as written in the optional YAML file. Every field may be
/// overridden from the command line or the environment.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub source_orgs: Option<Vec<String>>,
    pub target_org: Option<String>,
    pub topics: Option<Vec<String>>,
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub max_retry_delay_secs: Option<u64>,
    pub skip_decommission: Option<bool>,
}

pub fn read_config(config: &str) -> Result<FileConfig, ConfigError> {
    if config.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    let deserialized_config: serde_yaml::Result<FileConfig> = serde_yaml::from_str(config);
    Ok(deserialized_config?)
}
