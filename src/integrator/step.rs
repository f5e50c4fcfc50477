//! Single integration step
//!
//! Pure functions deciding which axes contribute to which position in one
//! tick. The threaded [`InputIntegrator`](super::InputIntegrator) applies
//! their output.

use crate::capture::input::types::{Axis, AxisState};
use crate::config::AxisPolicy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Integrated variable. Both triggers drive `Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    X,
    Y,
    Z,
    RX,
    RY,
    CrossX,
    CrossY,
}

impl Position {
    pub const COUNT: usize = 7;

    pub const ALL: [Position; Position::COUNT] = [
        Position::X,
        Position::Y,
        Position::Z,
        Position::RX,
        Position::RY,
        Position::CrossX,
        Position::CrossY,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Position::X => "X",
            Position::Y => "Y",
            Position::Z => "Z",
            Position::RX => "RX",
            Position::RY => "RY",
            Position::CrossX => "crossX",
            Position::CrossY => "crossY",
        }
    }

    /// Position driven by an axis, and the sign applied to its reading.
    ///
    /// The Z trigger pulls `Z` down, the RZ trigger pushes it up.
    pub fn driven_by(axis: Axis) -> (Position, f64) {
        match axis {
            Axis::X => (Position::X, 1.0),
            Axis::Y => (Position::Y, 1.0),
            Axis::RX => (Position::RX, 1.0),
            Axis::RY => (Position::RY, 1.0),
            Axis::Z => (Position::Z, -1.0),
            Axis::RZ => (Position::Z, 1.0),
            Axis::CrossX => (Position::CrossX, 1.0),
            Axis::CrossY => (Position::CrossY, 1.0),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("Unknown position: {}", s))
    }
}

/// Snapshot of every integrated position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Positions {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub rx: f64,
    pub ry: f64,
    pub cross_x: f64,
    pub cross_y: f64,
}

impl Positions {
    pub fn get(&self, position: Position) -> f64 {
        match position {
            Position::X => self.x,
            Position::Y => self.y,
            Position::Z => self.z,
            Position::RX => self.rx,
            Position::RY => self.ry,
            Position::CrossX => self.cross_x,
            Position::CrossY => self.cross_y,
        }
    }
}

impl From<[f64; Position::COUNT]> for Positions {
    fn from(values: [f64; Position::COUNT]) -> Self {
        Self {
            x: values[Position::X.index()],
            y: values[Position::Y.index()],
            z: values[Position::Z.index()],
            rx: values[Position::RX.index()],
            ry: values[Position::RY.index()],
            cross_x: values[Position::CrossX.index()],
            cross_y: values[Position::CrossY.index()],
        }
    }
}

/// Evaluation order of the axes. Under [`AxisPolicy::FirstMatch`] only the
/// first axis outside the dead zone in this order contributes.
pub const PRIORITY: [Axis; 8] = [
    Axis::X,
    Axis::Y,
    Axis::Z,
    Axis::RX,
    Axis::RY,
    Axis::RZ,
    Axis::CrossX,
    Axis::CrossY,
];

/// One axis reading to be added to a position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub axis: Axis,
    pub position: Position,
    pub delta: f64,
}

/// Contributions of one tick, in [`PRIORITY`] order.
///
/// A reading contributes when its absolute value is strictly greater than
/// `dead_zone`. NaN readings never contribute.
pub fn contributions(state: &AxisState, dead_zone: f64, policy: AxisPolicy) -> Vec<Contribution> {
    let active = PRIORITY.into_iter().filter_map(|axis| {
        let reading = state.get(axis);
        if reading.abs() > dead_zone {
            let (position, sign) = Position::driven_by(axis);
            Some(Contribution {
                axis,
                position,
                delta: sign * reading,
            })
        } else {
            None
        }
    });

    match policy {
        AxisPolicy::Combine => active.collect(),
        AxisPolicy::FirstMatch => active.take(1).collect(),
    }
}
