//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// GPS coordinates in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Advisory tasks served by the platform, one trained predictor each
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Fertilizer,
    Irrigation,
    Pest,
    Yield,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Fertilizer, Task::Irrigation, Task::Pest, Task::Yield];

    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Fertilizer => "fertilizer",
            Task::Irrigation => "irrigation",
            Task::Pest => "pest",
            Task::Yield => "yield",
        }
    }

    /// URL prefix the task's endpoints are mounted under
    pub fn route_prefix(&self) -> &'static str {
        match self {
            Task::Fertilizer => "/fertilizer",
            Task::Irrigation => "/irrigation",
            Task::Pest => "/pest_control",
            Task::Yield => "/yield_prediction",
        }
    }

    /// Whether the predictor is a classifier (exposes class probabilities)
    pub fn is_classification(&self) -> bool {
        !matches!(self, Task::Yield)
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
