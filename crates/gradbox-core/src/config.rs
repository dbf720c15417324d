//! Configuration for backward passes and numerical differentiation.

use crate::error::{GradError, Result};

/// Order in which pending functions are taken off the backward worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackwardOrder {
    /// Always process the pending function with the highest generation.
    ///
    /// A function is only processed once every function that could still
    /// route a gradient into its outputs has run, so fan-in contributions
    /// are fully summed before they are propagated further.
    #[default]
    Generation,
    /// Process the most recently enqueued function first.
    ///
    /// Ignores generations entirely. Graphs where a variable feeds more
    /// than one function can propagate partial sums with this order; it is
    /// kept for diagnosing scheduling problems only.
    Insertion,
}

/// Configuration for a backward pass.
#[derive(Debug, Clone, Default)]
pub struct BackwardConfig {
    /// Worklist ordering
    pub order: BackwardOrder,
}

impl BackwardConfig {
    /// Create a builder starting from the default configuration.
    pub fn builder() -> BackwardConfigBuilder {
        BackwardConfigBuilder::new()
    }
}

/// Builder for [`BackwardConfig`].
#[derive(Debug, Clone, Default)]
pub struct BackwardConfigBuilder {
    config: BackwardConfig,
}

impl BackwardConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worklist ordering.
    pub fn order(mut self, order: BackwardOrder) -> Self {
        self.config.order = order;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> BackwardConfig {
        self.config
    }
}

/// Configuration for central-difference numerical differentiation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericalDiffConfig {
    /// Half-width of the difference interval
    pub eps: f64,
}

impl NumericalDiffConfig {
    /// Create a configuration with the given step, which must be finite and
    /// strictly positive.
    pub fn new(eps: f64) -> Result<Self> {
        if !eps.is_finite() || eps <= 0.0 {
            return Err(GradError::invalid_configuration(
                "eps",
                eps,
                "must be finite and strictly positive",
            ));
        }
        Ok(Self { eps })
    }
}

impl Default for NumericalDiffConfig {
    fn default() -> Self {
        Self { eps: 1e-4 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backward_defaults() {
        let config = BackwardConfig::default();
        assert_eq!(config.order, BackwardOrder::Generation);
    }

    #[test]
    fn test_backward_builder() {
        let config = BackwardConfig::builder()
            .order(BackwardOrder::Insertion)
            .build();
        assert_eq!(config.order, BackwardOrder::Insertion);
    }

    #[test]
    fn test_numerical_diff_config() {
        assert_eq!(NumericalDiffConfig::default().eps, 1e-4);
        assert_eq!(NumericalDiffConfig::new(1e-6).unwrap().eps, 1e-6);

        assert!(NumericalDiffConfig::new(0.0).is_err());
        assert!(NumericalDiffConfig::new(-1e-3).is_err());
        assert!(NumericalDiffConfig::new(f64::NAN).is_err());
    }
}
