//! Display layout constants.
//!
//! The panel is a square 240x240 ST7789 driven in RGB565, so one frame is
//! 115,200 bytes and both off-screen buffers together take 230,400 bytes of
//! the RP2350's 520KB SRAM.

/// Display width in pixels.
pub const SCREEN_WIDTH: u32 = 240;

/// Display height in pixels.
pub const SCREEN_HEIGHT: u32 = 240;

/// Horizontal center of the screen.
pub const CENTER_X: i32 = SCREEN_WIDTH as i32 / 2;

/// Vertical center of the screen.
pub const CENTER_Y: i32 = SCREEN_HEIGHT as i32 / 2;

/// Bytes per pixel (RGB565).
pub const BYTES_PER_PIXEL: usize = 2;

/// Size of one off-screen frame in bytes.
pub const FRAME_BYTES: usize = SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize * BYTES_PER_PIXEL;

/// Line height of the diagnostics overlay text.
pub const OVERLAY_LINE_HEIGHT: i32 = 12;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size() {
        assert_eq!(FRAME_BYTES, 115_200);
        assert_eq!(CENTER_X, 120);
        assert_eq!(CENTER_Y, 120);
    }

    #[test]
    fn test_frame_is_word_aligned() {
        // Framebuffer clears write two pixels per 32-bit word
        assert_eq!(FRAME_BYTES % 4, 0);
    }
}
