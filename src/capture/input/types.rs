use serde::{Deserialize, Serialize};

/// Raw event as read from an input device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Device event code (e.g. "ABS_X", "BTN_SOUTH")
    pub code: String,
    /// Raw device reading
    pub state: i32,
}

impl RawEvent {
    pub fn new(code: impl Into<String>, state: i32) -> Self {
        Self {
            code: code.into(),
            state,
        }
    }
}

/// Physical gamepad axes tracked by the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    RX,
    RY,
    Z,
    RZ,
    CrossX,
    CrossY,
}

impl Axis {
    pub const ALL: [Axis; 8] = [
        Axis::X,
        Axis::Y,
        Axis::RX,
        Axis::RY,
        Axis::Z,
        Axis::RZ,
        Axis::CrossX,
        Axis::CrossY,
    ];

    /// Map a device event code to an axis
    pub fn from_code(code: &str) -> Option<Axis> {
        match code {
            "ABS_X" => Some(Axis::X),
            "ABS_Y" => Some(Axis::Y),
            "ABS_RX" => Some(Axis::RX),
            "ABS_RY" => Some(Axis::RY),
            "ABS_Z" => Some(Axis::Z),
            "ABS_RZ" => Some(Axis::RZ),
            "ABS_HAT0X" => Some(Axis::CrossX),
            "ABS_HAT0Y" => Some(Axis::CrossY),
            _ => None,
        }
    }

    /// Normalization divisor applied to raw readings.
    ///
    /// Sticks are signed 16-bit (to [-1, 1]), triggers unsigned 8-bit
    /// (to [0, 1]), the directional pad already reports -1/0/1.
    pub fn divisor(self) -> f64 {
        match self {
            Axis::X | Axis::Y | Axis::RX | Axis::RY => 32768.0,
            Axis::Z | Axis::RZ => 255.0,
            Axis::CrossX | Axis::CrossY => 1.0,
        }
    }

    /// Normalize a raw reading. Out-of-range readings are not clamped.
    pub fn normalize(self, state: i32) -> f64 {
        state as f64 / self.divisor()
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::RX => "RX",
            Axis::RY => "RY",
            Axis::Z => "Z",
            Axis::RZ => "RZ",
            Axis::CrossX => "crossX",
            Axis::CrossY => "crossY",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Latest normalized reading of every axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisState {
    pub x: f64,
    pub y: f64,
    pub rx: f64,
    pub ry: f64,
    pub z: f64,
    pub rz: f64,
    pub cross_x: f64,
    pub cross_y: f64,
}

impl AxisState {
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::RX => self.rx,
            Axis::RY => self.ry,
            Axis::Z => self.z,
            Axis::RZ => self.rz,
            Axis::CrossX => self.cross_x,
            Axis::CrossY => self.cross_y,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        let slot = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::RX => &mut self.rx,
            Axis::RY => &mut self.ry,
            Axis::Z => &mut self.z,
            Axis::RZ => &mut self.rz,
            Axis::CrossX => &mut self.cross_x,
            Axis::CrossY => &mut self.cross_y,
        };
        *slot = value;
    }

    /// Apply a raw event. Returns the axis it updated, or `None` if the
    /// event code is not an axis.
    pub fn apply(&mut self, event: &RawEvent) -> Option<Axis> {
        let axis = Axis::from_code(&event.code)?;
        self.set(axis, axis.normalize(event.state));
        Some(axis)
    }
}
