//! Environmental readings (BME68x-class sensor) and their corrections.
//!
//! The sensor sits next to the RP2350 and reads warm, so the raw temperature
//! is offset and the relative humidity re-derived from the dew point:
//!
//! ```text
//! corrected = raw - 9
//! dew_point = raw - (100 - humidity) / 5
//! humidity' = 100 - 5 * (corrected - dew_point)     (clamped to 0..=100)
//! ```

use core::fmt;

#[allow(unused_imports)]
use micromath::F32Ext;

use crate::record::Unit;

/// Offset subtracted from the raw temperature (board self-heating).
pub const TEMPERATURE_OFFSET_C: f32 = 9.0;

/// Station altitude used for the sea-level pressure adjustment.
pub const ALTITUDE_M: f32 = 0.0;

/// One raw sample.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct Reading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_pa: f32,
    pub gas_resistance_ohm: f32,
    /// Gas heater reached its target; values before that are not trusted.
    pub heat_stable: bool,
}

/// The sensor did not deliver a sample.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct SensorUnavailable;

impl fmt::Display for SensorUnavailable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str("sensor unavailable")
    }
}

/// Environmental sensor collaborator.
pub trait Sensor {
    fn sample(&mut self) -> Result<Reading, SensorUnavailable>;
}

impl<S: Sensor + ?Sized> Sensor for &mut S {
    fn sample(&mut self) -> Result<Reading, SensorUnavailable> { (**self).sample() }
}

/// Convert Celsius to Fahrenheit.
#[inline]
pub fn celsius_to_fahrenheit(celsius: f32) -> f32 { celsius * 9.0 / 5.0 + 32.0 }

/// Adjust station pressure (hPa) to sea level.
pub fn adjust_to_sea_level(
    pressure_hpa: f32,
    temperature_c: f32,
    altitude_m: f32,
) -> f32 {
    pressure_hpa + (pressure_hpa * 9.80665 * altitude_m) / (287.0 * (273.0 + temperature_c + altitude_m / 400.0))
}

/// Corrected values shown on the environment screen.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Climate {
    pub temperature_c: f32,
    pub dew_point_c: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
}

impl Climate {
    /// Apply the corrections. Returns `None` until the heater is stable.
    pub fn from_reading(reading: &Reading) -> Option<Self> {
        if !reading.heat_stable {
            return None;
        }

        let temperature_c = reading.temperature_c - TEMPERATURE_OFFSET_C;
        let dew_point_c = reading.temperature_c - (100.0 - reading.humidity_pct) / 5.0;
        let humidity_pct = (100.0 - 5.0 * (temperature_c - dew_point_c)).clamp(0.0, 100.0);
        let pressure_hpa = adjust_to_sea_level(reading.pressure_pa / 100.0, reading.temperature_c, ALTITUDE_M);

        Some(Self {
            temperature_c,
            dew_point_c,
            humidity_pct,
            pressure_hpa,
        })
    }

    /// Temperature in the requested unit.
    pub fn temperature(
        &self,
        unit: Unit,
    ) -> f32 {
        match unit {
            Unit::Celsius => self.temperature_c,
            Unit::Fahrenheit => celsius_to_fahrenheit(self.temperature_c),
        }
    }
}

// =============================================================================
// Demo Source
// =============================================================================

/// Time until the demo heater reports stable.
pub const DEMO_WARMUP_MS: u32 = 1500;

/// Sine-wave environment used in place of the real sensor.
///
/// Values are a function of time only, so the display animates at the same
/// speed regardless of frame rate.
pub struct DemoEnvironment {
    clock: fn() -> u32,
}

impl DemoEnvironment {
    /// `clock` returns milliseconds since boot.
    pub const fn new(clock: fn() -> u32) -> Self { Self { clock } }

    /// Reading at a given time.
    pub fn reading_at(now_ms: u32) -> Reading {
        let t = now_ms as f32 / 1000.0;
        Reading {
            temperature_c: 30.0 + 4.0 * (t * 0.05).sin(),
            humidity_pct: 45.0 + 10.0 * (t * 0.03).sin(),
            pressure_pa: 101_325.0 + 300.0 * (t * 0.01).sin(),
            gas_resistance_ohm: 50_000.0 + 20_000.0 * (t * 0.02).sin().abs(),
            heat_stable: now_ms >= DEMO_WARMUP_MS,
        }
    }
}

impl Sensor for DemoEnvironment {
    fn sample(&mut self) -> Result<Reading, SensorUnavailable> { Ok(Self::reading_at((self.clock)())) }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stable(
        temperature_c: f32,
        humidity_pct: f32,
    ) -> Reading {
        Reading {
            temperature_c,
            humidity_pct,
            pressure_pa: 101_325.0,
            gas_resistance_ohm: 50_000.0,
            heat_stable: true,
        }
    }

    fn close(
        a: f32,
        b: f32,
    ) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_corrections() {
        let climate = Climate::from_reading(&stable(30.0, 40.0)).unwrap();
        assert!(close(climate.temperature_c, 21.0));
        assert!(close(climate.dew_point_c, 18.0));
        assert!(close(climate.humidity_pct, 85.0));
        assert!(close(climate.pressure_hpa, 1013.25));
    }

    #[test]
    fn test_humidity_clamped() {
        let climate = Climate::from_reading(&stable(30.0, 90.0)).unwrap();
        assert!(close(climate.humidity_pct, 100.0));
    }

    #[test]
    fn test_unstable_heater_has_no_data() {
        let reading = Reading {
            heat_stable: false,
            ..stable(30.0, 40.0)
        };
        assert!(Climate::from_reading(&reading).is_none());
    }

    #[test]
    fn test_fahrenheit() {
        assert!(close(celsius_to_fahrenheit(0.0), 32.0));
        assert!(close(celsius_to_fahrenheit(100.0), 212.0));
        assert!(close(celsius_to_fahrenheit(-40.0), -40.0));

        let climate = Climate::from_reading(&stable(30.0, 40.0)).unwrap();
        assert!(close(climate.temperature(Unit::Fahrenheit), 69.8));
        assert!(close(climate.temperature(Unit::Celsius), 21.0));
    }

    #[test]
    fn test_sea_level_adjustment() {
        assert!(close(adjust_to_sea_level(1000.0, 15.0, 0.0), 1000.0));
        let adjusted = adjust_to_sea_level(1000.0, 15.0, 100.0);
        assert!((adjusted - 1011.85).abs() < 0.05);
    }

    #[test]
    fn test_demo_warms_up() {
        assert!(!DemoEnvironment::reading_at(0).heat_stable);
        assert!(DemoEnvironment::reading_at(DEMO_WARMUP_MS).heat_stable);

        let mut sensor = DemoEnvironment::new(|| 60_000);
        let reading = sensor.sample().unwrap();
        assert!(reading.heat_stable);
        assert!((26.0..=34.0).contains(&reading.temperature_c));
        assert!((35.0..=55.0).contains(&reading.humidity_pct));
    }
}
