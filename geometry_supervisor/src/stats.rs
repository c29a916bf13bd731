//! Named statistics collected during a supervision step.

use std::collections::{BTreeMap, VecDeque};

use burn::prelude::*;
use burn::tensor::ElementConversion;
use serde::{Deserialize, Serialize};

/// Scalar statistics keyed by name (`eikonal_loss`, `psnr`, ...).
///
/// Values stay on the device as tensors of shape `[1]` so recording a
/// statistic never forces a host sync.
#[derive(Debug, Clone)]
pub struct ScalarStats<B: Backend> {
    values: BTreeMap<String, Tensor<B, 1>>,
}

impl<B: Backend> Default for ScalarStats<B> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<B: Backend> ScalarStats<B> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a statistic, replacing any previous value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Tensor<B, 1>) {
        self.values.insert(name.into(), value);
    }

    /// Get a statistic tensor.
    pub fn get(&self, name: &str) -> Option<&Tensor<B, 1>> {
        self.values.get(name)
    }

    /// Read a statistic back to the host.
    pub fn value(&self, name: &str) -> Option<f32> {
        self.values
            .get(name)
            .map(|t| t.clone().into_scalar().elem::<f32>())
    }

    /// Whether a statistic with this name was recorded.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of recorded statistics.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Statistic names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Read every statistic back to the host.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            values: self
                .values
                .iter()
                .map(|(name, t)| (name.clone(), t.clone().into_scalar().elem::<f32>()))
                .collect(),
        }
    }

    /// Log all statistics on one line.
    pub fn log(&self, prefix: &str) {
        log::info!("{} {}", prefix, self.summary());
    }
}

/// Image statistics keyed by name, `[batch, height, width, channels]`.
#[derive(Debug, Clone)]
pub struct ImageStats<B: Backend> {
    images: BTreeMap<String, Tensor<B, 4>>,
}

impl<B: Backend> Default for ImageStats<B> {
    fn default() -> Self {
        Self {
            images: BTreeMap::new(),
        }
    }
}

impl<B: Backend> ImageStats<B> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an image.
    pub fn insert(&mut self, name: impl Into<String>, image: Tensor<B, 4>) {
        self.images.insert(name.into(), image);
    }

    /// Get an image.
    pub fn get(&self, name: &str) -> Option<&Tensor<B, 4>> {
        self.images.get(name)
    }

    /// Number of recorded images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Host-side copy of a step's scalar statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Values keyed by statistic name.
    pub values: BTreeMap<String, f32>,
}

impl StatsSummary {
    /// Get a value.
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (name, value) in &self.values {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}={:.6}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

/// Output of a full supervision step.
#[derive(Debug, Clone)]
pub struct SupervisorOutput<B: Backend> {
    /// Total loss (scalar).
    pub loss: Tensor<B, 1>,
    /// Scalar statistics recorded during the step.
    pub scalar_stats: ScalarStats<B>,
    /// Image statistics recorded during the step.
    pub image_stats: ImageStats<B>,
}

impl<B: Backend> SupervisorOutput<B> {
    /// Get the loss as a scalar value.
    pub fn loss_value(&self) -> f32 {
        self.loss.clone().into_scalar().elem::<f32>()
    }
}

/// Running average of scalar statistics over a fixed window of steps.
///
/// Each statistic keeps its own window, so a term that is only active on
/// some steps is averaged over the steps where it was recorded.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    window_size: usize,
    history: BTreeMap<String, VecDeque<f32>>,
    total_steps: usize,
}

impl StatsTracker {
    /// Create a new tracker.
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            history: BTreeMap::new(),
            total_steps: 0,
        }
    }

    /// Add the statistics of one step.
    pub fn add(&mut self, summary: &StatsSummary) {
        for (name, value) in &summary.values {
            let window = self.history.entry(name.clone()).or_default();
            if window.len() >= self.window_size {
                window.pop_front();
            }
            window.push_back(*value);
        }
        self.total_steps += 1;
    }

    /// Average of each statistic over the window.
    pub fn average(&self) -> StatsSummary {
        StatsSummary {
            values: self
                .history
                .iter()
                .filter(|(_, window)| !window.is_empty())
                .map(|(name, window)| {
                    (name.clone(), window.iter().sum::<f32>() / window.len() as f32)
                })
                .collect(),
        }
    }

    /// Get total number of steps.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}
