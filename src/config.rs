use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

pub const DEFAULT_BASE_URL: &str = "https://xkcd.com";
pub const DEFAULT_OUTPUT_ROOT: &str = "comics";
pub const DEFAULT_SUMMARY_PATH: &str = "README.md";
pub const DEFAULT_FETCH_COUNT: u32 = 20;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 1000;

pub const DEFAULT_RECORD_TEMPLATE: &str = "\
## $index$: $title$

![$title$]($image$)

[source]($url$)
";

pub const DEFAULT_SUMMARY_TEMPLATE: &str = "\
# Comic Archive

## Latest

$new$

## Random picks

$random1$

$random2$

$random3$
";

/// On-disk config shape. Every field is optional so a partial file only
/// overrides what it names.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output_root: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub request_delay_ms: Option<u64>,
    #[serde(default)]
    pub fetch_count: Option<u32>,
    #[serde(default)]
    pub summary_path: Option<String>,
    #[serde(default)]
    pub log_path: Option<String>,
    #[serde(default)]
    pub record_template: Option<String>,
    #[serde(default)]
    pub summary_template: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub output_root: Utf8PathBuf,
    pub base_url: String,
    pub request_delay: Duration,
    pub fetch_count: u32,
    pub summary_path: Utf8PathBuf,
    pub log_path: Utf8PathBuf,
    pub record_template: String,
    pub summary_template: String,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `comic-archiver.json` from the working directory, or an explicit
    /// path. An explicit path must exist; a missing default file falls back
    /// to built-in defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ArchiveError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("comic-archiver.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Self::resolve_config(Config::default()));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ArchiveError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ArchiveError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let output_root = Utf8PathBuf::from(
            config
                .output_root
                .unwrap_or_else(|| DEFAULT_OUTPUT_ROOT.to_string()),
        );
        let base_url = config
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let log_path = config
            .log_path
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| output_root.join("comic-archiver.log"));

        ResolvedConfig {
            output_root,
            base_url,
            request_delay: Duration::from_millis(
                config.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            ),
            fetch_count: config.fetch_count.unwrap_or(DEFAULT_FETCH_COUNT),
            summary_path: Utf8PathBuf::from(
                config
                    .summary_path
                    .unwrap_or_else(|| DEFAULT_SUMMARY_PATH.to_string()),
            ),
            log_path,
            record_template: config
                .record_template
                .unwrap_or_else(|| DEFAULT_RECORD_TEMPLATE.to_string()),
            summary_template: config
                .summary_template
                .unwrap_or_else(|| DEFAULT_SUMMARY_TEMPLATE.to_string()),
        }
    }

    /// Starter config written by `comic-archiver init`.
    pub fn starter_config() -> Config {
        Config {
            output_root: Some(DEFAULT_OUTPUT_ROOT.to_string()),
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            request_delay_ms: Some(DEFAULT_REQUEST_DELAY_MS),
            fetch_count: Some(DEFAULT_FETCH_COUNT),
            summary_path: Some(DEFAULT_SUMMARY_PATH.to_string()),
            log_path: None,
            record_template: None,
            summary_template: None,
        }
    }
}
