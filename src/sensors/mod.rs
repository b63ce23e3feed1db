//! Sensor collaborators and the math applied to their readings.
//!
//! - `environment`: temperature/humidity/pressure readings, corrections, demo source
//! - `inclinometer`: pitch/roll orientation, smoothing, horizon geometry, demo source

pub mod environment;
pub mod inclinometer;

pub use environment::{Climate, DemoEnvironment, Reading, Sensor, SensorUnavailable};
pub use inclinometer::{DemoOrientation, Horizon, Inclinometer, Orientation, OrientationFilter, OrientationSource};
