//! Button mapping.
//!
//! Buttons are debounced and edge-detected by the [`InputSource`]; this module
//! only maps presses to commands.
//!
//! | Button | Command |
//! |--------|---------|
//! | A | select mode (ends the splash early) |
//! | B | cycle temperature unit |
//! | X | toggle diagnostics overlay |
//! | Y | unused |

/// Face buttons of the display board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Button {
    A,
    B,
    X,
    Y,
}

/// Edge-triggered, debounced button collaborator.
pub trait InputSource {
    /// `true` once per physical press.
    fn was_pressed(
        &mut self,
        button: Button,
    ) -> bool;
}

impl<I: InputSource + ?Sized> InputSource for &mut I {
    fn was_pressed(
        &mut self,
        button: Button,
    ) -> bool {
        (**self).was_pressed(button)
    }
}

/// Commands raised by one poll of the buttons.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct InputResult {
    /// A: switch Environment/Inclinometer, or leave the splash.
    pub select_mode: bool,
    /// B: switch Celsius/Fahrenheit.
    pub cycle_unit: bool,
    /// X: show or hide the diagnostics overlay.
    pub toggle_diagnostics: bool,
}

impl InputResult {
    #[inline]
    pub const fn is_empty(&self) -> bool { !(self.select_mode || self.cycle_unit || self.toggle_diagnostics) }
}

/// Poll every button once.
pub fn process_buttons<I: InputSource>(input: &mut I) -> InputResult {
    let result = InputResult {
        select_mode: input.was_pressed(Button::A),
        cycle_unit: input.was_pressed(Button::B),
        toggle_diagnostics: input.was_pressed(Button::X),
    };
    // Y has no command; drain its edge
    let _ = input.was_pressed(Button::Y);
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Scripted input: each poll pops the presses queued for that button.
    #[derive(Default)]
    pub(crate) struct ScriptedInput {
        pending: Vec<Button>,
        pub(crate) polls: Vec<Button>,
    }

    impl ScriptedInput {
        pub(crate) fn press(
            &mut self,
            button: Button,
        ) {
            self.pending.push(button);
        }
    }

    impl InputSource for ScriptedInput {
        fn was_pressed(
            &mut self,
            button: Button,
        ) -> bool {
            self.polls.push(button);
            match self.pending.iter().position(|b| *b == button) {
                Some(index) => {
                    self.pending.remove(index);
                    true
                }
                None => false,
            }
        }
    }

    #[test]
    fn test_no_presses() {
        let mut input = ScriptedInput::default();
        assert!(process_buttons(&mut input).is_empty());
        assert_eq!(input.polls, [Button::A, Button::B, Button::X, Button::Y]);
    }

    #[test]
    fn test_button_mapping() {
        let mut input = ScriptedInput::default();
        input.press(Button::A);
        input.press(Button::X);
        input.press(Button::Y);
        let result = process_buttons(&mut input);
        assert_eq!(
            result,
            InputResult {
                select_mode: true,
                cycle_unit: false,
                toggle_diagnostics: true,
            }
        );

        // Edges are consumed
        assert!(process_buttons(&mut input).is_empty());
    }
}
