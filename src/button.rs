//! Button debounce handling for the display board.
//!
//! Provides time-based edge detection with debouncing to prevent
//! multiple triggers from contact bounce on physical buttons.

use embassy_rp::gpio::Input;
use embassy_time::{Duration, Instant};
use jimny_io::config::DEBOUNCE_MS;
use jimny_io::orchestrator::{Button, InputSource};

/// Button debounce state with time-based edge detection.
pub struct ButtonState {
    was_pressed: bool,
    last_change: Option<Instant>,
}

impl ButtonState {
    /// Create a new button state (not pressed).
    pub const fn new() -> Self {
        Self {
            was_pressed: false,
            last_change: None,
        }
    }

    /// Returns true only on the falling edge (button just pressed).
    ///
    /// Buttons are active-low, so `is_low()` means pressed.
    pub fn just_pressed(
        &mut self,
        is_low: bool,
    ) -> bool {
        if is_low == self.was_pressed {
            return false;
        }

        if let Some(last) = self.last_change
            && last.elapsed() < Duration::from_millis(DEBOUNCE_MS)
        {
            return false;
        }

        self.was_pressed = is_low;
        self.last_change = Some(Instant::now());
        is_low
    }
}

impl Default for ButtonState {
    fn default() -> Self { Self::new() }
}

/// The four face buttons (GPIO12-15, pulled up, active-low).
pub struct GpioButtons<'d> {
    pins: [Input<'d>; 4],
    states: [ButtonState; 4],
}

impl<'d> GpioButtons<'d> {
    pub fn new(
        a: Input<'d>,
        b: Input<'d>,
        x: Input<'d>,
        y: Input<'d>,
    ) -> Self {
        Self {
            pins: [a, b, x, y],
            states: [const { ButtonState::new() }; 4],
        }
    }
}

impl InputSource for GpioButtons<'_> {
    fn was_pressed(
        &mut self,
        button: Button,
    ) -> bool {
        let idx = match button {
            Button::A => 0,
            Button::B => 1,
            Button::X => 2,
            Button::Y => 3,
        };
        let is_low = self.pins[idx].is_low();
        self.states[idx].just_pressed(is_low)
    }
}
