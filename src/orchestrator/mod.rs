//! View state machine, input handling and persistence decisions.
//!
//! - `view`: Splash / Environment / Inclinometer
//! - `input`: button to command mapping
//! - `diagnostics`: counters shown by the overlay
//!
//! # Cycle
//!
//! The producer loop drives the orchestrator once per frame:
//!
//! ```text
//! process_buttons ─▶ handle_input ─▶ tick ─▶ render (into the free buffer)
//!                                                   │
//!                                publish ◀──────────┘
//!                                   │
//!                        persist_if_changed
//! ```
//!
//! # Persistence
//!
//! `(mode, unit)` is compared against the last value known to be on flash and
//! appended only when it differs. The cached value is updated only after the
//! append succeeds. A failed append is retried no sooner than
//! [`PERSIST_RETRY_MS`] later, and at most [`PERSIST_MAX_ATTEMPTS`] times for
//! the same value; a new value starts a fresh set of attempts.

mod diagnostics;
mod input;
mod view;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::DrawTarget;

pub use diagnostics::Diagnostics;
pub use input::{Button, InputResult, InputSource, process_buttons};
pub use view::View;

use crate::config::{PERSIST_MAX_ATTEMPTS, PERSIST_RETRY_MS, SPLASH_HOLD_MS};
use crate::record::{Mode, PersistentRecord, Unit};
use crate::render::screens::{draw_diagnostics_overlay, draw_environment, draw_inclinometer, draw_splash};
use crate::sensors::{Climate, Horizon, Inclinometer, OrientationSource, Sensor};
use crate::storage::{AppendReport, FlashError, FlashLog, FlashRegion, ScanResult, ScanSource};

/// Result of one [`Orchestrator::persist_if_changed`] call.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum PersistOutcome {
    /// Current state already on flash.
    Unchanged,
    /// Appended.
    Written(AppendReport),
    /// Append failed; the cache is untouched.
    Failed(FlashError),
    /// Waiting for the retry interval after a failure.
    Backoff,
    /// Attempts for this value are used up.
    GaveUp,
}

/// Retry bookkeeping for the value currently being persisted.
#[derive(Clone, Copy, Debug)]
struct PersistRetry {
    value: PersistentRecord,
    attempts: u8,
    last_attempt_ms: u32,
}

/// Runtime state of the instrument cluster.
pub struct Orchestrator {
    view: View,
    /// Selected mode and unit.
    current: PersistentRecord,
    /// Last value known to be on flash.
    last_persisted: PersistentRecord,
    overlay: bool,
    splash_started_ms: u32,
    retry: Option<PersistRetry>,
    diagnostics: Diagnostics,
}

impl Orchestrator {
    /// Start at the splash with the state recovered by the boot scan.
    pub fn new(
        scan: &ScanResult,
        now_ms: u32,
    ) -> Self {
        match scan.source {
            ScanSource::Default => info!("no stored state, using defaults"),
            ScanSource::Stored { slot } => info!("restored {} from slot {}", scan.record, slot),
            ScanSource::Corrupt { slot, byte } => warn!("slot {} holds corrupt record {:#x}, using defaults", slot, byte),
            ScanSource::ReadFailed(error) => warn!("state scan failed: {}, using defaults", error),
        }

        Self {
            view: View::Splash,
            current: scan.record,
            last_persisted: scan.record,
            overlay: false,
            splash_started_ms: now_ms,
            retry: None,
            diagnostics: Diagnostics {
                flash_slot: scan.first_free_slot,
                ..Diagnostics::default()
            },
        }
    }

    #[inline]
    pub const fn view(&self) -> View { self.view }

    #[inline]
    pub const fn mode(&self) -> Mode { self.current.mode }

    #[inline]
    pub const fn unit(&self) -> Unit { self.current.unit }

    /// Last value known to be on flash.
    #[inline]
    pub const fn last_persisted(&self) -> PersistentRecord { self.last_persisted }

    #[inline]
    pub const fn overlay_visible(&self) -> bool { self.overlay }

    #[inline]
    pub const fn diagnostics(&self) -> &Diagnostics { &self.diagnostics }

    /// Timing counters are filled in by the firmware loop.
    #[inline]
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics { &mut self.diagnostics }

    fn leave_splash(&mut self) {
        self.view = View::for_mode(self.current.mode);
        info!("splash done, showing {}", self.view);
    }

    /// Apply one poll's worth of commands.
    pub fn handle_input(
        &mut self,
        input: InputResult,
    ) {
        if input.select_mode {
            if self.view == View::Splash {
                self.leave_splash();
            } else {
                self.current.mode = self.current.mode.toggle();
                self.view = View::for_mode(self.current.mode);
                info!("mode -> {}", self.current.mode);
            }
        }

        if input.cycle_unit {
            self.current.unit = self.current.unit.toggle();
            info!("unit -> {}", self.current.unit);
        }

        if input.toggle_diagnostics {
            self.overlay = !self.overlay;
        }
    }

    /// Advance time-based transitions (the splash hold).
    pub fn tick(
        &mut self,
        now_ms: u32,
    ) {
        if self.view == View::Splash && now_ms.wrapping_sub(self.splash_started_ms) >= SPLASH_HOLD_MS {
            self.leave_splash();
        }
    }

    /// Draw the current view, plus the overlay when enabled.
    ///
    /// Only the collaborator the view needs is sampled.
    pub fn render<D, S, O>(
        &mut self,
        display: &mut D,
        sensor: &mut S,
        inclinometer: &mut Inclinometer<O>,
        logs: &[&str],
    ) where
        D: DrawTarget<Color = Rgb565>,
        S: Sensor,
        O: OrientationSource,
    {
        match self.view {
            View::Splash => draw_splash(display),
            View::Environment => {
                let climate = match sensor.sample() {
                    Ok(reading) => Climate::from_reading(&reading),
                    Err(_) => {
                        self.diagnostics.sensor_misses = self.diagnostics.sensor_misses.wrapping_add(1);
                        debug!("environment sensor unavailable");
                        None
                    }
                };
                draw_environment(display, climate.as_ref(), self.current.unit);
            }
            View::Inclinometer => {
                let orientation = inclinometer.sample();
                draw_inclinometer(display, &Horizon::from_orientation(orientation));
            }
        }

        if self.overlay {
            draw_diagnostics_overlay(display, &self.diagnostics, logs);
        }
    }

    /// Append `(mode, unit)` to the log if it differs from what is on flash.
    pub fn persist_if_changed<R: FlashRegion>(
        &mut self,
        log: &mut FlashLog<R>,
        now_ms: u32,
    ) -> PersistOutcome {
        let wanted = self.current;
        if wanted == self.last_persisted {
            self.retry = None;
            return PersistOutcome::Unchanged;
        }

        let retry = match self.retry {
            Some(retry) if retry.value == wanted => {
                if retry.attempts >= PERSIST_MAX_ATTEMPTS {
                    return PersistOutcome::GaveUp;
                }
                if now_ms.wrapping_sub(retry.last_attempt_ms) < PERSIST_RETRY_MS {
                    return PersistOutcome::Backoff;
                }
                retry
            }
            _ => PersistRetry {
                value: wanted,
                attempts: 0,
                last_attempt_ms: now_ms,
            },
        };

        match log.append(wanted) {
            Ok(report) => {
                self.last_persisted = wanted;
                self.retry = None;
                self.diagnostics.flash_slot = log.next_slot();
                self.diagnostics.flash_erases = log.erase_count();
                info!("persisted {} in slot {}", wanted, report.slot);
                PersistOutcome::Written(report)
            }
            Err(error) => {
                let attempts = retry.attempts + 1;
                self.retry = Some(PersistRetry {
                    value: wanted,
                    attempts,
                    last_attempt_ms: now_ms,
                });
                self.diagnostics.flash_failures = self.diagnostics.flash_failures.wrapping_add(1);
                self.diagnostics.flash_slot = log.next_slot();
                self.diagnostics.flash_erases = log.erase_count();
                warn!("persist attempt {} failed: {}", attempts, error);
                PersistOutcome::Failed(error)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;

    use super::input::tests::ScriptedInput;
    use super::*;
    use crate::config::{ERASE_BLOCK_SIZE, FRAME_BYTES};
    use crate::pipeline::FramePipeline;
    use crate::render::colors::{BLACK, SKY_BLUE_DAY, WHITE, YELLOW};
    use crate::render::tests::{blank_frame, count_in};
    use crate::render::{Frame, FrameRenderer};
    use crate::sensors::{DemoEnvironment, DemoOrientation, Reading, SensorUnavailable};
    use crate::storage::RamFlash;

    type Flash = RamFlash<ERASE_BLOCK_SIZE>;

    /// Region that fails the next `failures` programs, then behaves.
    struct FlakyFlash {
        inner: Flash,
        failures: u32,
    }

    impl FlakyFlash {
        fn new(failures: u32) -> Self {
            Self {
                inner: Flash::new(),
                failures,
            }
        }
    }

    impl FlashRegion for FlakyFlash {
        fn capacity(&self) -> usize { self.inner.capacity() }

        fn write_granule(&self) -> usize { self.inner.write_granule() }

        fn single_program(&self) -> bool { self.inner.single_program() }

        fn read(
            &mut self,
            offset: usize,
            buf: &mut [u8],
        ) -> Result<(), FlashError> {
            self.inner.read(offset, buf)
        }

        fn program(
            &mut self,
            offset: usize,
            bytes: &[u8],
        ) -> Result<(), FlashError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(FlashError::Timeout);
            }
            self.inner.program(offset, bytes)
        }

        fn erase(&mut self) -> Result<(), FlashError> { self.inner.erase() }
    }

    struct NoSensor;

    impl Sensor for NoSensor {
        fn sample(&mut self) -> Result<Reading, SensorUnavailable> { Err(SensorUnavailable) }
    }

    fn stable_sensor() -> DemoEnvironment { DemoEnvironment::new(|| 60_000) }

    fn boot<R: FlashRegion>(region: R) -> (FlashLog<R>, Orchestrator) {
        let (log, scan) = FlashLog::mount(region);
        let orchestrator = Orchestrator::new(&scan, 0);
        (log, orchestrator)
    }

    fn press(
        orchestrator: &mut Orchestrator,
        button: Button,
    ) {
        let mut input = ScriptedInput::default();
        input.press(button);
        orchestrator.handle_input(process_buttons(&mut input));
    }

    // -------------------------------------------------------------------------
    // View state machine
    // -------------------------------------------------------------------------

    #[test]
    fn test_splash_holds_then_shows_restored_mode() {
        let mut flash = Flash::new();
        let record = PersistentRecord::new(Mode::Inclinometer, Unit::Fahrenheit);
        flash.program(0, &record.encode()).unwrap();

        let (_log, mut orchestrator) = boot(flash);
        assert_eq!(orchestrator.view(), View::Splash);
        assert_eq!(orchestrator.unit(), Unit::Fahrenheit);

        orchestrator.tick(SPLASH_HOLD_MS - 1);
        assert_eq!(orchestrator.view(), View::Splash);
        orchestrator.tick(SPLASH_HOLD_MS);
        assert_eq!(orchestrator.view(), View::Inclinometer);
    }

    #[test]
    fn test_select_mode_ends_splash_without_toggling() {
        let (_log, mut orchestrator) = boot(Flash::new());
        press(&mut orchestrator, Button::A);
        assert_eq!(orchestrator.view(), View::Environment);
        assert_eq!(orchestrator.mode(), Mode::Environment);

        press(&mut orchestrator, Button::A);
        assert_eq!(orchestrator.view(), View::Inclinometer);
        assert_eq!(orchestrator.mode(), Mode::Inclinometer);
    }

    #[test]
    fn test_unit_and_overlay_buttons() {
        let (_log, mut orchestrator) = boot(Flash::new());
        orchestrator.tick(SPLASH_HOLD_MS);

        press(&mut orchestrator, Button::B);
        assert_eq!(orchestrator.unit(), Unit::Fahrenheit);
        press(&mut orchestrator, Button::X);
        assert!(orchestrator.overlay_visible());
        press(&mut orchestrator, Button::X);
        assert!(!orchestrator.overlay_visible());

        // Y does nothing
        press(&mut orchestrator, Button::Y);
        assert_eq!(orchestrator.view(), View::Environment);
        assert_eq!(orchestrator.unit(), Unit::Fahrenheit);
    }

    #[test]
    fn test_tick_survives_clock_wrap() {
        let (_log, scan) = FlashLog::mount(Flash::new());
        let mut orchestrator = Orchestrator::new(&scan, u32::MAX - 10);
        orchestrator.tick(5);
        assert_eq!(orchestrator.view(), View::Splash);
        orchestrator.tick(SPLASH_HOLD_MS);
        assert_eq!(orchestrator.view(), View::Environment);
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    #[test]
    fn test_unchanged_state_is_never_written() {
        let (mut log, mut orchestrator) = boot(Flash::new());
        orchestrator.tick(SPLASH_HOLD_MS);
        for now in 0..100 {
            assert_eq!(orchestrator.persist_if_changed(&mut log, now), PersistOutcome::Unchanged);
        }

        // Toggling back and forth between two calls is also a no-op
        press(&mut orchestrator, Button::B);
        press(&mut orchestrator, Button::B);
        assert_eq!(orchestrator.persist_if_changed(&mut log, 100), PersistOutcome::Unchanged);
        assert_eq!(log.region().program_count(), 0);
    }

    #[test]
    fn test_change_is_written_once() {
        let (mut log, mut orchestrator) = boot(Flash::new());
        orchestrator.tick(SPLASH_HOLD_MS);
        press(&mut orchestrator, Button::A);

        let outcome = orchestrator.persist_if_changed(&mut log, 1000);
        assert_eq!(outcome, PersistOutcome::Written(AppendReport { slot: 0, erased: false }));
        assert_eq!(orchestrator.persist_if_changed(&mut log, 1001), PersistOutcome::Unchanged);
        assert_eq!(log.region().program_count(), 2);
        assert_eq!(orchestrator.last_persisted().mode, Mode::Inclinometer);
        assert_eq!(orchestrator.diagnostics().flash_slot, 1);

        // Reboot sees the new state
        let scan = log.scan();
        assert_eq!(scan.record, PersistentRecord::new(Mode::Inclinometer, Unit::Celsius));
    }

    #[test]
    fn test_failure_keeps_cache_and_backs_off() {
        let (mut log, mut orchestrator) = boot(FlakyFlash::new(1));
        press(&mut orchestrator, Button::B);

        assert_eq!(orchestrator.persist_if_changed(&mut log, 0), PersistOutcome::Failed(FlashError::Timeout));
        assert_eq!(orchestrator.last_persisted(), PersistentRecord::DEFAULT);
        assert_eq!(orchestrator.diagnostics().flash_failures, 1);

        assert_eq!(orchestrator.persist_if_changed(&mut log, 10), PersistOutcome::Backoff);
        assert_eq!(orchestrator.persist_if_changed(&mut log, PERSIST_RETRY_MS - 1), PersistOutcome::Backoff);

        let outcome = orchestrator.persist_if_changed(&mut log, PERSIST_RETRY_MS);
        assert!(matches!(outcome, PersistOutcome::Written(_)));
        assert_eq!(orchestrator.last_persisted().unit, Unit::Fahrenheit);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let (mut log, mut orchestrator) = boot(FlakyFlash::new(u32::MAX));
        orchestrator.tick(SPLASH_HOLD_MS);
        press(&mut orchestrator, Button::B);

        let mut now = 0;
        for _ in 0..PERSIST_MAX_ATTEMPTS {
            assert!(matches!(orchestrator.persist_if_changed(&mut log, now), PersistOutcome::Failed(_)));
            now += PERSIST_RETRY_MS;
        }
        assert_eq!(orchestrator.persist_if_changed(&mut log, now), PersistOutcome::GaveUp);
        assert_eq!(orchestrator.diagnostics().flash_failures, u32::from(PERSIST_MAX_ATTEMPTS));

        // A different value gets fresh attempts
        press(&mut orchestrator, Button::A);
        assert!(matches!(orchestrator.persist_if_changed(&mut log, now), PersistOutcome::Failed(_)));
    }

    #[test]
    fn test_reverting_clears_retry_state() {
        let (mut log, mut orchestrator) = boot(FlakyFlash::new(1));
        press(&mut orchestrator, Button::B);
        assert!(matches!(orchestrator.persist_if_changed(&mut log, 0), PersistOutcome::Failed(_)));

        press(&mut orchestrator, Button::B);
        assert_eq!(orchestrator.persist_if_changed(&mut log, 1), PersistOutcome::Unchanged);

        // Same value again starts a new attempt immediately
        press(&mut orchestrator, Button::B);
        assert!(matches!(orchestrator.persist_if_changed(&mut log, 2), PersistOutcome::Written(_)));
    }

    // -------------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------------

    fn render_once(
        orchestrator: &mut Orchestrator,
        sensor: &mut impl Sensor,
        logs: &[&str],
    ) -> Box<Frame> {
        let mut frame = blank_frame();
        let mut inclinometer = Inclinometer::new(DemoOrientation::new());
        let mut renderer = FrameRenderer::from_frame(&mut frame);
        orchestrator.render(&mut renderer, sensor, &mut inclinometer, logs);
        frame
    }

    #[test]
    fn test_sensor_miss_renders_no_data() {
        let (_log, mut orchestrator) = boot(Flash::new());
        orchestrator.tick(SPLASH_HOLD_MS);

        let mut frame = render_once(&mut orchestrator, &mut NoSensor, &[]);
        let renderer = FrameRenderer::from_frame(&mut frame);
        assert_eq!(count_in(&renderer, renderer.bounding_box(), YELLOW), 0);
        assert_eq!(orchestrator.diagnostics().sensor_misses, 1);

        let mut frame = render_once(&mut orchestrator, &mut stable_sensor(), &[]);
        let renderer = FrameRenderer::from_frame(&mut frame);
        assert!(count_in(&renderer, renderer.bounding_box(), YELLOW) > 0);
        assert_eq!(orchestrator.diagnostics().sensor_misses, 1);
    }

    #[test]
    fn test_inclinometer_view_and_overlay() {
        let (_log, mut orchestrator) = boot(Flash::new());
        press(&mut orchestrator, Button::A);
        press(&mut orchestrator, Button::A);
        assert_eq!(orchestrator.view(), View::Inclinometer);

        let mut frame = render_once(&mut orchestrator, &mut NoSensor, &[]);
        let renderer = FrameRenderer::from_frame(&mut frame);
        assert_eq!(renderer.pixel(20, 20), Some(SKY_BLUE_DAY));
        assert_eq!(orchestrator.diagnostics().sensor_misses, 0);

        press(&mut orchestrator, Button::X);
        let mut frame = render_once(&mut orchestrator, &mut NoSensor, &["hello"]);
        let renderer = FrameRenderer::from_frame(&mut frame);
        let first_line = Rectangle::new(Point::zero(), Size::new(120, 10));
        assert!(count_in(&renderer, first_line, WHITE) > 0);
        assert!(count_in(&renderer, first_line, BLACK) > 0);
    }

    #[test]
    fn test_full_cycle_through_pipeline() {
        let pipeline = Box::new(FramePipeline::new([0u8; FRAME_BYTES], [0u8; FRAME_BYTES]));
        let (mut producer, mut presenter) = pipeline.split().unwrap();
        let (mut log, mut orchestrator) = boot(Flash::new());
        let mut sensor = stable_sensor();
        let mut inclinometer = Inclinometer::new(DemoOrientation::new());
        let mut input = ScriptedInput::default();

        let script = [
            (0, None, BLACK),
            (1200, None, BLACK),
            (1300, Some(Button::A), SKY_BLUE_DAY),
            (1400, Some(Button::B), SKY_BLUE_DAY),
        ];
        for (now, button, expected) in script {
            if let Some(button) = button {
                input.press(button);
            }
            orchestrator.handle_input(process_buttons(&mut input));
            orchestrator.tick(now);

            let mut frame = producer.begin_frame().unwrap();
            orchestrator.render(&mut FrameRenderer::from_frame(frame.buffer()), &mut sensor, &mut inclinometer, &[]);
            frame.finish();
            producer.try_publish().unwrap();

            let shown = presenter.try_take().unwrap();
            let mut copy = Box::new(*shown.buffer());
            assert_eq!(FrameRenderer::from_frame(&mut copy).pixel(10, 10), Some(expected));
            shown.complete(100);

            orchestrator.persist_if_changed(&mut log, now);
        }

        assert_eq!(pipeline.presented_count(), 4);
        assert_eq!(log.region().program_count(), 4);
        assert_eq!(log.scan().record, PersistentRecord::new(Mode::Inclinometer, Unit::Fahrenheit));
    }
}
