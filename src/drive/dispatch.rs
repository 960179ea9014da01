// Route the final stick vector to the physical drive call

use tracing::debug;

use super::error::Result;
use super::topology::Topology;
use super::vector::{InvertMask, StickVector};

/// Physical drive calls; inputs in [-1, 1], idempotent under repeats
pub trait DriveActuator {
    /// Tank-drive semantics: one speed per side
    fn tank(&mut self, left: f64, right: f64) -> Result<()>;

    /// Cartesian semantics: strafe, forward, rotate
    fn cartesian(&mut self, x: f64, y: f64, rotation: f64) -> Result<()>;
}

impl<A: DriveActuator + ?Sized> DriveActuator for &mut A {
    fn tank(&mut self, left: f64, right: f64) -> Result<()> {
        (**self).tank(left, right)
    }

    fn cartesian(&mut self, x: f64, y: f64, rotation: f64) -> Result<()> {
        (**self).cartesian(x, y, rotation)
    }
}

impl<A: DriveActuator + ?Sized> DriveActuator for Box<A> {
    fn tank(&mut self, left: f64, right: f64) -> Result<()> {
        (**self).tank(left, right)
    }

    fn cartesian(&mut self, x: f64, y: f64, rotation: f64) -> Result<()> {
        (**self).cartesian(x, y, rotation)
    }
}

/// Apply `inverts` and send `vector` to the call `topology` uses
///
/// This is the only place inversion happens. Differential reads `(lY, rY)`;
/// holonomic drives read `(lX, lY, rX)`.
pub fn dispatch<A: DriveActuator + ?Sized>(
    vector: StickVector,
    inverts: InvertMask,
    topology: Topology,
    actuator: &mut A,
) -> Result<StickVector> {
    let v = inverts.apply(vector);
    debug!("Dispatching {:?} to {} drive", v, topology);

    match topology {
        Topology::Differential => actuator.tank(v.ly, v.ry)?,
        Topology::Mecanum | Topology::Killough => actuator.cartesian(v.lx, v.ly, v.rx)?,
    }

    Ok(v)
}
