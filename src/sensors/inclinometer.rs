//! Pitch/roll orientation and the artificial-horizon geometry.
//!
//! # Pipeline
//!
//! ```text
//! OrientationSource ──▶ OrientationFilter ──▶ Horizon::from_orientation
//!   (degrees)            (warm-up, EMA, x2)     (screen-edge points)
//! ```
//!
//! The horizon is a screen-wide line through the center, shifted down by the
//! pitch and rotated by the roll, then extended to the left and right edges.

use embedded_graphics::prelude::Point;
#[allow(unused_imports)]
use micromath::F32Ext;

use crate::config::{CENTER_Y, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Orientation in whole degrees.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Orientation {
    pub pitch: i32,
    pub roll: i32,
}

impl Orientation {
    pub const LEVEL: Self = Self { pitch: 0, roll: 0 };

    pub const fn new(
        pitch: i32,
        roll: i32,
    ) -> Self {
        Self { pitch, roll }
    }
}

/// Raw orientation collaborator (IMU or demo generator).
pub trait OrientationSource {
    fn sample(&mut self) -> Orientation;
}

// =============================================================================
// Demo Source
// =============================================================================

const DEMO_MAX_PITCH: i32 = 16;
const DEMO_PITCH_STEP: i32 = 2;
const DEMO_MAX_ROLL: i32 = 5;
const DEMO_ROLL_STEP: i32 = 1;

/// Ping-pong sweep of one axis between `-max` and `max`.
#[derive(Clone, Copy, Debug)]
struct Sweep {
    value: i32,
    max: i32,
    step: i32,
    reversing: bool,
}

impl Sweep {
    const fn new(
        max: i32,
        step: i32,
    ) -> Self {
        Self {
            value: 0,
            max,
            step,
            reversing: false,
        }
    }

    fn next(&mut self) -> i32 {
        if !self.reversing && self.value < self.max {
            self.value += self.step;
            if self.value == self.max {
                self.reversing = true;
            }
        } else if self.reversing && self.value > -self.max {
            self.value -= self.step;
            if self.value == -self.max {
                self.reversing = false;
            }
        }
        self.value
    }
}

/// Rocks the vehicle back and forth: pitch ±16° in 2° steps, roll ±5° in 1° steps.
#[derive(Clone, Copy, Debug)]
pub struct DemoOrientation {
    pitch: Sweep,
    roll: Sweep,
}

impl DemoOrientation {
    pub const fn new() -> Self {
        Self {
            pitch: Sweep::new(DEMO_MAX_PITCH, DEMO_PITCH_STEP),
            roll: Sweep::new(DEMO_MAX_ROLL, DEMO_ROLL_STEP),
        }
    }
}

impl Default for DemoOrientation {
    fn default() -> Self { Self::new() }
}

impl OrientationSource for DemoOrientation {
    fn sample(&mut self) -> Orientation { Orientation::new(self.pitch.next(), self.roll.next()) }
}

// =============================================================================
// Smoothing
// =============================================================================

/// Samples accumulated before the filter reports anything but level.
pub const WARMUP_SAMPLES: u8 = 5;

/// Exponential moving average weights (previous average, new sample).
const HISTORY_WEIGHT: f32 = 0.8;
const SAMPLE_WEIGHT: f32 = 0.2;

/// Exaggeration applied to pitch and roll so small angles are readable.
pub const PITCH_SCALING: f32 = 2.0;
pub const ROLL_SCALING: f32 = 2.0;

/// Exponential smoothing with a short warm-up.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrientationFilter {
    samples: u8,
    pitch: f32,
    roll: f32,
}

impl OrientationFilter {
    pub const fn new() -> Self {
        Self {
            samples: 0,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    /// Feed one raw sample and get the displayed orientation.
    pub fn update(
        &mut self,
        raw: Orientation,
    ) -> Orientation {
        if self.samples < WARMUP_SAMPLES {
            self.samples += 1;
            let n = f32::from(self.samples);
            self.pitch = (self.pitch + raw.pitch as f32) / n;
            self.roll = (self.roll + raw.roll as f32) / n;
            return Orientation::LEVEL;
        }

        self.pitch = self.pitch * HISTORY_WEIGHT + raw.pitch as f32 * SAMPLE_WEIGHT;
        self.roll = self.roll * HISTORY_WEIGHT + raw.roll as f32 * SAMPLE_WEIGHT;
        Orientation::new((self.pitch * PITCH_SCALING) as i32, (self.roll * ROLL_SCALING) as i32)
    }
}

/// A source plus its smoothing filter.
pub struct Inclinometer<S> {
    source: S,
    filter: OrientationFilter,
}

impl<S: OrientationSource> Inclinometer<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            filter: OrientationFilter::new(),
        }
    }

    /// Sample the source and return the smoothed orientation.
    pub fn sample(&mut self) -> Orientation {
        let raw = self.source.sample();
        self.filter.update(raw)
    }
}

// =============================================================================
// Horizon Geometry
// =============================================================================

/// Segment between two points.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    pub const fn new(
        p1: Point,
        p2: Point,
    ) -> Self {
        Self { p1, p2 }
    }

    /// Rotate around the segment midpoint by `degrees` (positive tilts the
    /// left end down on screen).
    pub fn rotate(
        self,
        degrees: f32,
    ) -> Self {
        let theta = degrees.to_radians();
        let (sin, cos) = (theta.sin(), theta.cos());
        let cx = (self.p1.x + self.p2.x) as f32 / 2.0;
        let cy = (self.p1.y + self.p2.y) as f32 / 2.0;

        let turn = |p: Point| {
            let tx = p.x as f32 - cx;
            let ty = p.y as f32 - cy;
            Point::new(
                (tx * cos + ty * sin + cx).round() as i32,
                (-tx * sin + ty * cos + cy).round() as i32,
            )
        };
        Self::new(turn(self.p1), turn(self.p2))
    }

    /// Intersection of the two infinite lines, `None` if parallel.
    pub fn intersection(
        self,
        other: Self,
    ) -> Option<Point> {
        let det = |a: Point, b: Point| a.x * b.y - a.y * b.x;

        let x_diff = Point::new(self.p1.x - self.p2.x, other.p1.x - other.p2.x);
        let y_diff = Point::new(self.p1.y - self.p2.y, other.p1.y - other.p2.y);
        let div = det(x_diff, y_diff);
        if div == 0 {
            return None;
        }

        let d = Point::new(det(self.p1, self.p2), det(other.p1, other.p2));
        Some(Point::new(det(d, x_diff) / div, det(d, y_diff) / div))
    }
}

/// Horizon endpoints on the left and right screen edges.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Horizon {
    pub left: Point,
    pub right: Point,
}

impl Horizon {
    pub fn from_orientation(orientation: Orientation) -> Self {
        let width = SCREEN_WIDTH as i32;
        let height = SCREEN_HEIGHT as i32;
        let y = CENTER_Y + orientation.pitch;

        let line = Line::new(Point::new(0, y), Point::new(width, y)).rotate(orientation.roll as f32);
        let left_edge = Line::new(Point::new(0, 0), Point::new(0, height));
        let right_edge = Line::new(Point::new(width, 0), Point::new(width, height));

        Self {
            left: line.intersection(left_edge).unwrap_or(line.p1),
            right: line.intersection(right_edge).unwrap_or(line.p2),
        }
    }

    /// Height of the horizon at the screen center.
    pub fn center_y(&self) -> i32 { (self.left.y + self.right.y) / 2 }
}

// =============================================================================
// Unit Tests
// =============================================================================
