//! Scanner configuration.

use carrot_core::{CarrotError, Result};
use carrot_crypto::ViewTagSplit;

/// Environment variable overriding [`ScannerConfig::batch_size`].
pub const ENV_BATCH_SIZE: &str = "CARROT_SCAN_BATCH_SIZE";
/// Environment variable overriding [`ScannerConfig::workers`].
pub const ENV_WORKERS: &str = "CARROT_SCAN_WORKERS";
/// Environment variable overriding the view tag primary bits.
pub const ENV_VIEW_TAG_PRIMARY_BITS: &str = "CARROT_VIEW_TAG_PRIMARY_BITS";

/// Scanner configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerConfig {
    /// Enotes per worker batch
    pub batch_size: usize,
    /// Worker threads per round
    pub workers: usize,
    /// Whether to stop on first discovery
    pub stop_on_first: bool,
    /// Lowest block to scan (inclusive)
    pub from_block: Option<u64>,
    /// Highest block to scan (inclusive)
    pub to_block: Option<u64>,
    /// Primary/complementary view tag split
    pub view_tag_split: ViewTagSplit,
    /// Derive key images for discoveries (needs spend authority)
    pub key_images: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            batch_size: 256,
            workers: 4,
            stop_on_first: false,
            from_block: None,
            to_block: None,
            view_tag_split: ViewTagSplit::default(),
            key_images: false,
        }
    }
}

impl ScannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `CARROT_SCAN_*` environment variables.
    ///
    /// # Errors
    /// `ConfigError` if a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(size) = parse_var(&lookup, ENV_BATCH_SIZE)? {
            config.batch_size = size;
        }
        if let Some(workers) = parse_var(&lookup, ENV_WORKERS)? {
            config.workers = workers;
        }
        if let Some(bits) = parse_var(&lookup, ENV_VIEW_TAG_PRIMARY_BITS)? {
            config.view_tag_split = ViewTagSplit::new(bits)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the worker count.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Enables stopping on first discovery.
    pub fn stop_on_first(mut self) -> Self {
        self.stop_on_first = true;
        self
    }

    /// Restricts scanning to blocks `[from, to]`.
    pub fn block_range(mut self, from: u64, to: u64) -> Self {
        self.from_block = Some(from);
        self.to_block = Some(to);
        self
    }

    /// Sets the view tag split.
    pub fn view_tag_split(mut self, split: ViewTagSplit) -> Self {
        self.view_tag_split = split;
        self
    }

    /// Derives key images for every discovery.
    pub fn with_key_images(mut self) -> Self {
        self.key_images = true;
        self
    }

    /// Enotes handed out per round, across all workers.
    pub fn round_size(&self) -> usize {
        self.batch_size.saturating_mul(self.workers)
    }

    /// Whether `block` falls inside the configured range.
    pub fn includes_block(&self, block: u64) -> bool {
        self.from_block.map_or(true, |from| block >= from)
            && self.to_block.map_or(true, |to| block <= to)
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// `ConfigError` for a zero batch size or worker count, or an empty
    /// block range.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(CarrotError::ConfigError("batch size must be positive".into()));
        }
        if self.workers == 0 {
            return Err(CarrotError::ConfigError("worker count must be positive".into()));
        }
        if let (Some(from), Some(to)) = (self.from_block, self.to_block) {
            if from > to {
                return Err(CarrotError::ConfigError(format!(
                    "block range {from}..={to} is empty"
                )));
            }
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CarrotError::ConfigError(format!("{key}: cannot parse {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_builder() {
        let config = ScannerConfig::new()
            .batch_size(10)
            .workers(3)
            .stop_on_first()
            .block_range(5, 9)
            .with_key_images();
        assert_eq!(config.round_size(), 30);
        assert!(config.stop_on_first);
        assert!(config.key_images);
        assert!(config.includes_block(5));
        assert!(config.includes_block(9));
        assert!(!config.includes_block(4));
        assert!(!config.includes_block(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(ScannerConfig::new().batch_size(0).validate().is_err());
        assert!(ScannerConfig::new().workers(0).validate().is_err());
        assert!(ScannerConfig::new().block_range(9, 5).validate().is_err());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ScannerConfig::from_lookup(lookup(&[
            (ENV_BATCH_SIZE, "64"),
            (ENV_WORKERS, " 2 "),
            (ENV_VIEW_TAG_PRIMARY_BITS, "12"),
        ]))
        .unwrap();
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.workers, 2);
        assert_eq!(config.view_tag_split.primary_bits(), 12);
    }

    #[test]
    fn test_from_lookup_defaults_when_unset() {
        let config = ScannerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ScannerConfig::default());
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ScannerConfig::from_lookup(lookup(&[(ENV_WORKERS, "many")])).unwrap_err();
        assert!(matches!(err, CarrotError::ConfigError(_)));
        assert!(err.to_string().contains(ENV_WORKERS));

        assert!(ScannerConfig::from_lookup(lookup(&[(ENV_VIEW_TAG_PRIMARY_BITS, "25")])).is_err());
        assert!(ScannerConfig::from_lookup(lookup(&[(ENV_BATCH_SIZE, "0")])).is_err());
    }
}
