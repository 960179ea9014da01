// Drivetrain topology selection

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{DriveError, Result};

/// Physical arrangement of the drive actuators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    /// Two sides, tank-style
    Differential,
    /// Three omni wheels
    Killough,
    /// Four mecanum wheels
    Mecanum,
}

impl Topology {
    pub const ALL: [Topology; 3] = [Topology::Differential, Topology::Killough, Topology::Mecanum];

    /// Number of actuator bindings this topology is built from
    pub fn actuator_count(self) -> usize {
        match self {
            Topology::Differential => 2,
            Topology::Killough => 3,
            Topology::Mecanum => 4,
        }
    }

    /// Driven with (x, y, rotation) rather than (left, right)
    pub fn is_holonomic(self) -> bool {
        matches!(self, Topology::Killough | Topology::Mecanum)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Topology::Differential => "differential",
            Topology::Killough => "killough",
            Topology::Mecanum => "mecanum",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topology {
    type Err = DriveError;

    fn from_str(tag: &str) -> Result<Self> {
        Topology::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag.trim()))
            .ok_or_else(|| DriveError::UnsupportedDrivetrain(tag.to_string()))
    }
}

/// Pick the topology implied by a number of actuator bindings
///
/// 2 is Differential, 3 is Killough, 4 is Mecanum.
pub fn select_topology(actuators: usize) -> Result<Topology> {
    Topology::ALL
        .into_iter()
        .find(|t| t.actuator_count() == actuators)
        .ok_or_else(|| {
            DriveError::InvalidConfiguration(format!(
                "Must be 2 (differential), 3 (killough), or 4 (mecanum) actuators, got {}",
                actuators
            ))
        })
}
