//! ClassifiedRecord - Classifier output
//!
//! A sample labelled with the road-surface condition it represents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ContractError, SensorSample};

/// Road-surface condition
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoadState {
    #[default]
    Smooth,
    Bump,
    Pothole,
}

impl RoadState {
    /// All variants, in reporting order
    pub const ALL: [RoadState; 3] = [RoadState::Smooth, RoadState::Bump, RoadState::Pothole];

    /// Persisted / wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Bump => "bump",
            Self::Pothole => "pothole",
        }
    }

    /// Whether this state marks a surface anomaly
    pub fn is_anomaly(&self) -> bool {
        !matches!(self, Self::Smooth)
    }
}

impl fmt::Display for RoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadState {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "smooth" => Ok(Self::Smooth),
            "bump" => Ok(Self::Bump),
            "pothole" => Ok(Self::Pothole),
            other => Err(ContractError::Other(format!("unknown road state '{other}'"))),
        }
    }
}

/// Classified record
///
/// Created once per classification and never mutated afterwards; `id` is
/// only ever populated by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    /// Storage identity (absent until stored)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Road-surface condition
    pub road_state: RoadState,

    /// Representative sample (middle of the classification window)
    pub sample: SensorSample,
}

impl ClassifiedRecord {
    /// Create a record without storage identity
    pub fn new(road_state: RoadState, sample: SensorSample) -> Self {
        Self {
            id: None,
            road_state,
            sample,
        }
    }

    /// Attach a storage identity (persistence layer only)
    pub fn with_id(self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}
