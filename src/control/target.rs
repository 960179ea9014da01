// What the PID output means for the drivetrain

use serde::{Deserialize, Serialize};

use crate::drive::BaseIndependent;

/// Physical meaning of the PID loop's output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PidTarget {
    /// Drive at a fixed speed, PID output steers
    Heading { cruise_speed: f64 },
    /// PID output is the forward speed, no turning
    Distance,
}

impl Default for PidTarget {
    fn default() -> Self {
        PidTarget::Heading { cruise_speed: 0.0 }
    }
}

impl BaseIndependent for PidTarget {
    fn speed_turn(&self, pid_output: f64) -> (f64, f64) {
        match *self {
            PidTarget::Heading { cruise_speed } => (cruise_speed, pid_output),
            PidTarget::Distance => (pid_output, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_steers() {
        let target = PidTarget::Heading { cruise_speed: 0.6 };
        assert_eq!(target.speed_turn(0.2), (0.6, 0.2));
    }

    #[test]
    fn test_distance_drives_straight() {
        assert_eq!(PidTarget::Distance.speed_turn(-0.3), (-0.3, 0.0));
    }

    #[test]
    fn test_config_format() {
        let target: PidTarget = serde_json::from_str(r#"{"kind":"heading","cruise_speed":0.4}"#).unwrap();
        assert_eq!(target, PidTarget::Heading { cruise_speed: 0.4 });
        let target: PidTarget = serde_json::from_str(r#"{"kind":"distance"}"#).unwrap();
        assert_eq!(target, PidTarget::Distance);
    }
}
