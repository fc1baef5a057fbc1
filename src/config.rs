//! Cascade build configuration
//!
//! # Example
//!
//! ```
//! use bloom_cascade::CascadeConfigBuilder;
//!
//! let config = CascadeConfigBuilder::new()
//!     .fp_rate(0.1)
//!     .max_levels(32)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.max_levels, 32);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CascadeError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Base false positive rate every level is sized for, in (0, 1)
    pub fp_rate: f64,
    /// Upper bound on the number of levels a build may produce
    pub max_levels: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            fp_rate: 0.5,
            max_levels: 64,
        }
    }
}

impl CascadeConfig {
    pub fn new(fp_rate: f64, max_levels: usize) -> Result<Self, CascadeError> {
        let config = Self {
            fp_rate,
            max_levels,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CascadeError> {
        // also rejects NaN
        if !(self.fp_rate > 0.0 && self.fp_rate < 1.0) {
            return Err(CascadeError::InvalidFalsePositiveRate { rate: self.fp_rate });
        }

        // level 0 and level 1 are always built
        if self.max_levels < 2 {
            return Err(CascadeError::InvalidLevelLimit {
                limit: self.max_levels,
            });
        }

        Ok(())
    }

    pub fn with_fp_rate(mut self, fp_rate: f64) -> Self {
        self.fp_rate = fp_rate;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }
}

/// Fluent builder for [`CascadeConfig`]; `build` validates.
#[derive(Clone, Debug, Default)]
pub struct CascadeConfigBuilder {
    config: CascadeConfig,
}

impl CascadeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fp_rate(mut self, fp_rate: f64) -> Self {
        self.config.fp_rate = fp_rate;
        self
    }

    pub fn max_levels(mut self, max_levels: usize) -> Self {
        self.config.max_levels = max_levels;
        self
    }

    pub fn build(self) -> Result<CascadeConfig, CascadeError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
