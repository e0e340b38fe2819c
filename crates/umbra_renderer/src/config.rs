//! Render configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use umbra_core::{PoolConfig, DEFAULT_EPSILON};

use crate::error::ConfigError;
use crate::order::{Bounds, OrderKind};
use crate::shadow::ShadowStrategy;

/// Everything a pipeline needs to know before a submission.
///
/// Missing JSON fields fall back to [`RenderConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Worker threads; 0 lets rayon pick.
    pub threads: usize,
    pub order: OrderKind,
    pub pools: PoolConfig,
    pub shadows: ShadowStrategy,
    /// Epsilon for surface kinds without an override in the scene's table.
    /// Applied by [`DirectTracer`](crate::DirectTracer) on every traversal.
    pub epsilon: f32,
    /// Samples per pixel; above 1 the samples are jittered.
    pub samples_per_pixel: u32,
    /// Seed for every per-thread generator; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            threads: 0,
            order: OrderKind::default(),
            pools: PoolConfig::default(),
            shadows: ShadowStrategy::default(),
            epsilon: DEFAULT_EPSILON,
            samples_per_pixel: 1,
            seed: None,
        }
    }
}

impl RenderConfig {
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_order(mut self, order: OrderKind) -> Self {
        self.order = order;
        self
    }

    pub fn with_pools(mut self, pools: PoolConfig) -> Self {
        self.pools = pools;
        self
    }

    pub fn with_shadows(mut self, shadows: ShadowStrategy) -> Self {
        self.shadows = shadows;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The full image as a viewport.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&text)?;
        log::info!("Loaded render config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::Invalid("samples_per_pixel must be at least 1".into()));
        }
        if self.pools.capacity == 0 {
            return Err(ConfigError::Invalid("pool capacity must be at least 1".into()));
        }
        if let OrderKind::Spiral { bucket_size: 0 } = self.order {
            return Err(ConfigError::Invalid("spiral bucket_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::OverflowPolicy;

    #[test]
    fn test_default_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RenderConfig::from_json_str(
            r#"{
                "width": 64,
                "order": { "kind": "spiral", "bucket_size": 8 },
                "pools": { "capacity": 4, "overflow": { "policy": "fixed" } },
                "shadows": "basic",
                "seed": 42
            }"#,
        )
        .unwrap();

        assert_eq!(config.width, 64);
        assert_eq!(config.height, 240);
        assert_eq!(config.order, OrderKind::Spiral { bucket_size: 8 });
        assert_eq!(config.pools.capacity, 4);
        assert_eq!(config.pools.overflow, OverflowPolicy::Fixed);
        assert_eq!(config.shadows, ShadowStrategy::Basic);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RenderConfig::from_json_str(r#"{ "epsilon": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RenderConfig::from_json_str(r#"{ "samples_per_pixel": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RenderConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = RenderConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_builder() {
        let config = RenderConfig::default()
            .with_resolution(8, 4)
            .with_threads(2)
            .with_seed(7);
        assert_eq!(config.bounds().area(), 32);
        assert_eq!(config.threads, 2);
        assert_eq!(config.seed, Some(7));
    }
}
