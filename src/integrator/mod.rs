//! Input integration
//!
//! Turns stick and trigger deflections into controllable positions: the
//! deflection sets the speed at which a position moves. A background loop
//! polls the captured axis state at a fixed rate, drops readings inside the
//! dead zone and accumulates the rest, raising a per-position change flag
//! that consumers clear by querying it.

pub mod step;
pub mod worker;

pub use crate::config::AxisPolicy;
pub use step::{contributions, Contribution, Position, Positions, PRIORITY};
pub use worker::InputIntegrator;
