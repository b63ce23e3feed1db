//! Full-screen views.

use crate::record::Mode;

/// What the producer draws this frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum View {
    /// Boot splash, held for a fixed time.
    Splash,
    Environment,
    Inclinometer,
}

impl View {
    /// View that shows a persisted mode.
    #[inline]
    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Environment => Self::Environment,
            Mode::Inclinometer => Self::Inclinometer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mode() {
        assert_eq!(View::for_mode(Mode::Environment), View::Environment);
        assert_eq!(View::for_mode(Mode::Inclinometer), View::Inclinometer);
    }
}
