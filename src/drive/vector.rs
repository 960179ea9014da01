// Canonical 4-component drive command and per-axis inversion

use serde::{Deserialize, Serialize};

/// Drive command in stick order `{lX, lY, rX, rY}`, each in [-1, 1]
///
/// Every topology consumes this same shape; unused slots stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StickVector {
    pub lx: f64,
    pub ly: f64,
    pub rx: f64,
    pub ry: f64,
}

impl StickVector {
    pub const ZERO: StickVector = StickVector::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(lx: f64, ly: f64, rx: f64, ry: f64) -> Self {
        Self { lx, ly, rx, ry }
    }

    /// True when every component is exactly zero
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|&v| v == 0.0)
    }

    /// Returns components as array [lx, ly, rx, ry]
    pub fn as_array(&self) -> [f64; 4] {
        [self.lx, self.ly, self.rx, self.ry]
    }
}

/// Which of the four stick components get negated before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvertMask {
    pub lx: bool,
    pub ly: bool,
    pub rx: bool,
    pub ry: bool,
}

impl InvertMask {
    pub const NONE: InvertMask = InvertMask::new(false, false, false, false);

    pub const fn new(lx: bool, ly: bool, rx: bool, ry: bool) -> Self {
        Self { lx, ly, rx, ry }
    }

    /// Negate each flagged component
    pub fn apply(&self, v: StickVector) -> StickVector {
        let flip = |value: f64, invert: bool| if invert { -value } else { value };
        StickVector {
            lx: flip(v.lx, self.lx),
            ly: flip(v.ly, self.ly),
            rx: flip(v.rx, self.rx),
            ry: flip(v.ry, self.ry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_detection() {
        assert!(StickVector::ZERO.is_zero());
        assert!(StickVector::default().is_zero());
        assert!(!StickVector::new(0.0, 0.0, 0.0, -0.01).is_zero());
    }

    #[test]
    fn test_invert_each_configuration() {
        let v = StickVector::new(0.1, -0.2, 0.3, -0.4);
        // Walk every combination of the four flags
        for bits in 0u8..16 {
            let mask = InvertMask::new(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            let out = mask.apply(v).as_array();
            let flags = [mask.lx, mask.ly, mask.rx, mask.ry];
            for i in 0..4 {
                let expected = if flags[i] { -v.as_array()[i] } else { v.as_array()[i] };
                assert_eq!(out[i], expected, "mask {:04b} component {}", bits, i);
            }
        }
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_string(&StickVector::new(0.0, 0.5, 0.25, 0.0)).unwrap();
        assert_eq!(json, r#"{"lx":0.0,"ly":0.5,"rx":0.25,"ry":0.0}"#);

        let mask: InvertMask = serde_json::from_str(r#"{"ly":true}"#).unwrap();
        assert_eq!(mask, InvertMask::new(false, true, false, false));
    }
}
