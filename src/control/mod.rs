// Closed-loop control feeding the drivetrain's autonomous mode

mod pid;
mod target;

pub use pid::{PidController, PidLoop, PidLoopState, PidSource};
pub use target::PidTarget;
