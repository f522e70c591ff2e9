//!
//! # Partition controller configuration
//!
//! Parameters looked up in the following sequence (first value wins):
//!     1) explicit values set through the builder
//!     2) environment variables
//!     3) defaults from `weft_types::defaults`
//!

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use serde::Deserialize;

use weft_types::defaults::{
    DISK_CHECK_INTERVAL_MS, DISK_FREE_MIN_BYTES, ENV_WEFT_DATA_DIR,
    ENV_WEFT_DISK_CHECK_INTERVAL_MS, ENV_WEFT_DISK_FREE_MIN_BYTES,
    ENV_WEFT_HEALTH_CHECK_INTERVAL_MS, HEALTH_CHECK_INTERVAL_MS, WEFT_DATA_DIR,
};

#[derive(Builder, Debug, Clone, PartialEq, Eq, Deserialize)]
#[builder(build_fn(private, name = "build_impl"))]
pub struct PartitionConfig {
    /// directory holding partition data; watched by the disk space monitor
    #[builder(default = "default_data_dir()")]
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// free bytes below which processing is paused
    #[builder(default = "default_disk_free_min_bytes()")]
    #[serde(default = "default_disk_free_min_bytes")]
    pub disk_free_min_bytes: u64,

    #[builder(default = "default_disk_check_interval_ms()")]
    #[serde(default = "default_disk_check_interval_ms")]
    pub disk_check_interval_ms: u32,

    #[builder(default = "default_health_check_interval_ms()")]
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u32,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(env::var(ENV_WEFT_DATA_DIR).unwrap_or_else(|_| WEFT_DATA_DIR.to_owned()))
}

fn default_disk_free_min_bytes() -> u64 {
    env_or(ENV_WEFT_DISK_FREE_MIN_BYTES, DISK_FREE_MIN_BYTES)
}

fn default_disk_check_interval_ms() -> u32 {
    env_or(ENV_WEFT_DISK_CHECK_INTERVAL_MS, DISK_CHECK_INTERVAL_MS)
}

fn default_health_check_interval_ms() -> u32 {
    env_or(ENV_WEFT_HEALTH_CHECK_INTERVAL_MS, HEALTH_CHECK_INTERVAL_MS)
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl PartitionConfig {
    pub fn builder() -> PartitionConfigBuilder {
        PartitionConfigBuilder::default()
    }

    pub fn disk_check_interval(&self) -> Duration {
        Duration::from_millis(self.disk_check_interval_ms as u64)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms as u64)
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            disk_free_min_bytes: default_disk_free_min_bytes(),
            disk_check_interval_ms: default_disk_check_interval_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
        }
    }
}

impl PartitionConfigBuilder {
    /// Build a [`PartitionConfig`] with the current values.
    pub fn build(&self) -> PartitionConfig {
        // cannot fail, every field carries a default
        self.build_impl().expect("default partition config")
    }
}

#[cfg(test)]
mod test {

    use std::path::PathBuf;

    use super::PartitionConfig;

    #[test]
    fn test_builder_overrides() {
        let config = PartitionConfig::builder()
            .data_dir(PathBuf::from("/tmp/weft"))
            .disk_free_min_bytes(1024)
            .build();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/weft"));
        assert_eq!(config.disk_free_min_bytes, 1024);
        // untouched fields keep their defaults
        assert_eq!(
            config.health_check_interval_ms,
            PartitionConfig::default().health_check_interval_ms
        );
    }
}
