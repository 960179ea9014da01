// Axis reads with dead-band suppression

/// Anything that exposes raw analog axes in [-1, 1]
pub trait InputDevice {
    /// Raw value of `axis`, in [-1, 1]
    fn read_axis(&self, axis: usize) -> f64;
}

impl<T: InputDevice + ?Sized> InputDevice for &T {
    fn read_axis(&self, axis: usize) -> f64 {
        (**self).read_axis(axis)
    }
}

/// Suppress `raw` inside `(-deadband, deadband)` and rescale the rest
///
/// Output is 0 at the dead-band edge and reaches ±1 at `raw = ±1`, so the
/// usable range is continuous across the boundary.
pub fn normalize(raw: f64, deadband: f64) -> f64 {
    let magnitude = raw.abs();
    if magnitude < deadband {
        return 0.0;
    }

    let scaled = (magnitude - deadband) / (1.0 - deadband);
    scaled.copysign(raw)
}

/// Read `axis` from `device` and pass it through [`normalize`]
pub fn axis_with_deadband<D: InputDevice + ?Sized>(device: &D, axis: usize, deadband: f64) -> f64 {
    normalize(device.read_axis(axis), deadband)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;
    const DEADBANDS: [f64; 5] = [0.0, 0.05, 0.1, 0.25, 0.9];

    #[test]
    fn test_inside_deadband_is_zero() {
        assert_eq!(normalize(0.04, 0.05), 0.0);
        assert_eq!(normalize(-0.04, 0.05), 0.0);
        assert_eq!(normalize(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_boundary_is_zero() {
        for &d in &DEADBANDS {
            assert!(normalize(d, d).abs() < EPS, "+boundary for {}", d);
            assert!(normalize(-d, d).abs() < EPS, "-boundary for {}", d);
        }
    }

    #[test]
    fn test_just_above_boundary_is_continuous() {
        for &d in &DEADBANDS {
            let out = normalize(d + 1e-6, d);
            assert!(out > 0.0, "output should be positive just past {}", d);
            assert!(out < 1e-4, "jump discontinuity at {}: {}", d, out);

            let out = normalize(-(d + 1e-6), d);
            assert!(out < 0.0 && out > -1e-4);
        }
    }

    #[test]
    fn test_full_scale() {
        for &d in &DEADBANDS {
            assert!((normalize(1.0, d) - 1.0).abs() < EPS);
            assert!((normalize(-1.0, d) + 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_sign_preserved_and_linear() {
        // Halfway between 0.2 and 1.0 maps to 0.5
        assert!((normalize(0.6, 0.2) - 0.5).abs() < EPS);
        assert!((normalize(-0.6, 0.2) + 0.5).abs() < EPS);
    }

    struct Fixed([f64; 2]);

    impl InputDevice for Fixed {
        fn read_axis(&self, axis: usize) -> f64 {
            self.0[axis]
        }
    }

    #[test]
    fn test_axis_with_deadband_reads_device() {
        let device = Fixed([0.03, 1.0]);
        assert_eq!(axis_with_deadband(&device, 0, 0.05), 0.0);
        assert!((axis_with_deadband(&device, 1, 0.05) - 1.0).abs() < EPS);
    }
}
