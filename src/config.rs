//! Louvain configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::loading::DEFAULT_BATCH_SIZE;

/// Settings for a [`Louvain`](crate::algo::Louvain) run.
///
/// Deserializes from camel-cased JSON; every field is optional:
///
/// ```
/// use colgraph::LouvainConfig;
///
/// let config = LouvainConfig::from_json(r#"{ "maxLevel": 3, "concurrency": 2 }"#).unwrap();
/// assert_eq!(config.max_level, 3);
/// assert_eq!(config.max_iterations, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LouvainConfig {
    /// Number of optimize-then-coarsen rounds.
    pub max_level: usize,
    /// Local-move iterations per round.
    pub max_iterations: usize,
    /// Worker threads.
    pub concurrency: usize,
    /// Modularity resolution; must be positive.
    pub resolution: f64,
    /// Stop before `max_level` once a round merges no nodes.
    pub early_stop: bool,
    /// Half-edges each import worker buffers while coarsening.
    pub batch_size: usize,
    /// Byte ceiling for tracked allocations.
    pub memory_limit: Option<usize>,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            max_level: 10,
            max_iterations: 10,
            concurrency: std::thread::available_parallelism().map_or(1, usize::from),
            resolution: 1.0,
            early_stop: false,
            batch_size: DEFAULT_BATCH_SIZE,
            memory_limit: None,
        }
    }
}

impl LouvainConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of levels.
    #[must_use]
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    /// Sets the iterations per level.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the worker count.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the resolution.
    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Enables stopping once a level merges nothing.
    #[must_use]
    pub fn with_early_stop(mut self, early_stop: bool) -> Self {
        self.early_stop = early_stop;
        self
    }

    /// Sets the import buffer length used while coarsening.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Caps tracked allocations at `bytes`.
    #[must_use]
    pub fn with_memory_limit(mut self, bytes: usize) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Checks every field, reporting the first invalid one.
    ///
    /// `max_level` and `max_iterations` may be zero: zero levels produce an
    /// empty dendrogram and zero iterations keep every node alone.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::invalid_config("concurrency", "must be > 0"));
        }
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::invalid_config(
                "resolution",
                format!("must be a positive number, got {}", self.resolution),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_config("batchSize", "must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LouvainConfig::default();
        assert_eq!(config.max_level, 10);
        assert_eq!(config.max_iterations, 10);
        assert_eq!(config.resolution, 1.0);
        assert!(!config.early_stop);
        assert!(config.concurrency >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_and_json_agree() {
        let built = LouvainConfig::default()
            .with_max_level(2)
            .with_max_iterations(5)
            .with_concurrency(3)
            .with_resolution(0.5)
            .with_early_stop(true)
            .with_batch_size(64)
            .with_memory_limit(1 << 20);
        let json = serde_json::to_string(&built).unwrap();
        assert!(json.contains("\"maxLevel\":2"));
        assert_eq!(LouvainConfig::from_json(&json).unwrap(), built);
    }

    #[test]
    fn rejects_invalid_values() {
        for json in [
            r#"{ "concurrency": 0 }"#,
            r#"{ "resolution": -1.0 }"#,
            r#"{ "batchSize": 0 }"#,
            r#"{ "maxLevels": 3 }"#,
            r#"{ "maxLevel": "three" }"#,
        ] {
            assert!(
                matches!(LouvainConfig::from_json(json), Err(Error::InvalidConfig { .. })),
                "{json}"
            );
        }
    }
}
