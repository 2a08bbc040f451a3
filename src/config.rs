//! Service configuration.
//!
//! Loaded from a YAML file, then overridden by `FEED_ACCESS_` environment
//! variables. Nested keys use a double underscore, e.g.
//! `FEED_ACCESS_STORAGE__ACCOUNT_KEY`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::Deserialize;

use crate::authorization::DEFAULT_AUTH_METHOD;
use crate::error::{Error, Result};
use crate::issuer::DEFAULT_PROBE_CONCURRENCY;
use crate::lookup::{FileLookup, Lookup, StaticLookup};
use crate::sas::{
    SharedKeySigner, DEFAULT_CLOCK_SKEW_MINUTES, MAX_CLOCK_SKEW_MINUTES, MAX_SAS_ACTIVE_TIME_IN_HRS,
};
use crate::secret::Secret;
use crate::validator::DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS;

const ENV_PREFIX: &str = "FEED_ACCESS_";

fn default_allowed_data_access_in_days() -> u32 {
    DEFAULT_ALLOWED_DATA_ACCESS_IN_DAYS
}

fn default_sas_active_time_in_hrs() -> u32 {
    8
}

fn default_clock_skew_minutes() -> i64 {
    DEFAULT_CLOCK_SKEW_MINUTES
}

fn default_accepted_auth_method() -> String {
    DEFAULT_AUTH_METHOD.to_string()
}

fn default_probe_concurrency() -> usize {
    DEFAULT_PROBE_CONCURRENCY
}

fn default_container() -> String {
    "partners".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_entitlements() -> BTreeMap<String, String> {
    BTreeMap::from([("TargetBase".to_string(), "client,patient".to_string())])
}

/// Object store the feeds live in.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Blob endpoint, e.g. `https://account.blob.core.windows.net`
    pub base_url: String,
    /// Container holding the partner folders
    #[serde(default = "default_container")]
    pub container: String,
    /// Storage account name, part of the signed resource
    pub account_name: String,
    /// Base64 storage account key
    pub account_key: Secret<String>,
    /// Timeout for a single existence probe
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedAccessConfig {
    /// How many days back a request may start
    #[serde(default = "default_allowed_data_access_in_days")]
    pub allowed_data_access_in_days: u32,
    /// Lifetime of each issued URL, at most one year
    #[serde(default = "default_sas_active_time_in_hrs")]
    pub sas_active_time_in_hrs: u32,
    /// How far signatures are back-dated, at most an hour
    #[serde(default = "default_clock_skew_minutes")]
    pub clock_skew_minutes: i64,
    /// The only authentication method accepted, compared case-insensitively
    #[serde(default = "default_accepted_auth_method")]
    pub accepted_auth_method: String,
    /// Existence probes in flight per request; 1 probes strictly in order
    #[serde(default = "default_probe_concurrency")]
    pub probe_concurrency: usize,
    /// Object store settings
    pub storage: StorageConfig,
    /// Principal name to partner
    #[serde(default)]
    pub partners: BTreeMap<String, String>,
    /// Partner to comma-separated feed names
    #[serde(default = "default_entitlements")]
    pub entitlements: BTreeMap<String, String>,
    /// JSON file replacing `partners` when set
    #[serde(default)]
    pub partners_file: Option<PathBuf>,
    /// JSON file replacing `entitlements` when set
    #[serde(default)]
    pub entitlements_file: Option<PathBuf>,
}

impl FeedAccessConfig {
    /// Loads and validates the configuration at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_yaml(&config_str)
    }

    /// Parses and validates a YAML document, applying environment overrides.
    pub fn from_yaml(config_str: &str) -> Result<Self> {
        let config: FeedAccessConfig = Figment::new()
            .merge(Yaml::string(config_str))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sas_active_time_in_hrs == 0 {
            return Err(Error::Config(
                "sas_active_time_in_hrs must be greater than zero".to_string(),
            ));
        }
        if self.sas_active_time_in_hrs > MAX_SAS_ACTIVE_TIME_IN_HRS {
            return Err(Error::Config(format!(
                "sas_active_time_in_hrs must be at most {MAX_SAS_ACTIVE_TIME_IN_HRS}"
            )));
        }
        if !(0..=MAX_CLOCK_SKEW_MINUTES).contains(&self.clock_skew_minutes) {
            return Err(Error::Config(format!(
                "clock_skew_minutes must be between 0 and {MAX_CLOCK_SKEW_MINUTES}"
            )));
        }
        if self.probe_concurrency == 0 {
            return Err(Error::Config(
                "probe_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.accepted_auth_method.trim().is_empty() {
            return Err(Error::Config("accepted_auth_method is empty".to_string()));
        }
        if self.storage.container.trim().is_empty() {
            return Err(Error::Config("storage.container is empty".to_string()));
        }

        let base_url = url::Url::parse(&self.storage.base_url).map_err(|e| {
            Error::Config(format!(
                "invalid storage.base_url {}: {}",
                self.storage.base_url, e
            ))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "storage.base_url must be http or https: {}",
                self.storage.base_url
            )));
        }

        SharedKeySigner::new(&self.storage.account_name, &self.storage.account_key)
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(())
    }

    /// Principal to partner table.
    pub fn partner_lookup(&self) -> Result<Arc<dyn Lookup>> {
        Self::table(&self.partners, self.partners_file.as_deref())
    }

    /// Partner to feeds table.
    pub fn entitlement_lookup(&self) -> Result<Arc<dyn Lookup>> {
        Self::table(&self.entitlements, self.entitlements_file.as_deref())
    }

    fn table(seed: &BTreeMap<String, String>, file: Option<&Path>) -> Result<Arc<dyn Lookup>> {
        match file {
            Some(path) => Ok(Arc::new(FileLookup::open(path)?)),
            None => Ok(Arc::new(StaticLookup::from_entries(
                seed.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            ))),
        }
    }
}
