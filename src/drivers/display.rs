//! Display configuration for the 1.3" 240x240 display board (ST7789).
//!
//! Pin mapping:
//! - DC: GPIO16
//! - CS: GPIO17
//! - CLK: GPIO18 (SPI0 CLK)
//! - MOSI: GPIO19 (SPI0 TX)
//! - Backlight: GPIO20
//! - Buttons A/B/X/Y: GPIO12-15 (active-low)
//! - RGB LED: GPIO6/7/8 (active-low)
//! - Reset: Tied to RUN pin (resets with Pico)

use embassy_rp::spi::Config as SpiConfig;

/// SPI configuration for the ST7789 display.
/// The ST7789 supports up to 62.5MHz SPI clock.
pub fn display_spi_config() -> SpiConfig {
    let mut config = SpiConfig::default();
    config.frequency = 62_500_000;
    config
}
