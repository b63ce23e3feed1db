//! Hardware drivers for the instrument cluster.
//!
//! - `st7789`: async ST7789 flusher with DMA
//! - `display`: SPI configuration and pinout of the 240x240 display board

mod display;
mod st7789;

pub use display::display_spi_config;
pub use st7789::St7789Flusher;
