//! Async ST7789 flusher for embassy-rp.
//!
//! Owns the SPI peripheral and sends whole frames with one DMA transfer.
//! Frames are drawn elsewhere (see `jimny_io::render::FrameRenderer`) in the
//! panel's wire format, so flushing never touches pixel data.
//!
//! The window is set to full screen once during [`St7789Flusher::init`], so a
//! flush is a single `RAMWR` followed by the frame bytes.

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::SPI0;
use embassy_rp::spi::{Async, Spi};
use embassy_time::Timer;
use jimny_io::config::{SCREEN_HEIGHT, SCREEN_WIDTH};

// ST7789 Commands
const SWRESET: u8 = 0x01;
const SLPOUT: u8 = 0x11;
const NORON: u8 = 0x13;
const INVON: u8 = 0x21;
const DISPON: u8 = 0x29;
const CASET: u8 = 0x2A;
const RASET: u8 = 0x2B;
const RAMWR: u8 = 0x2C;
const MADCTL: u8 = 0x36;
const COLMOD: u8 = 0x3A;

/// Portrait, top-left origin; the square panel needs no rotation.
const MADCTL_DEFAULT: u8 = 0x00;

/// ST7789 display flusher.
///
/// Owned by the present task on core 1.
pub struct St7789Flusher<'d> {
    spi: Spi<'d, SPI0, Async>,
    dc: Output<'d>,
    cs: Output<'d>,
}

impl<'d> St7789Flusher<'d> {
    /// Create a new flusher from SPI and control pins.
    pub fn new(
        spi: Spi<'d, SPI0, Async>,
        dc: Output<'d>,
        cs: Output<'d>,
    ) -> Self {
        Self { spi, dc, cs }
    }

    /// Initialize the display hardware.
    pub async fn init(&mut self) {
        self.write_command(SWRESET).await;
        Timer::after_millis(150).await;

        self.write_command(SLPOUT).await;
        Timer::after_millis(10).await;

        // RGB565
        self.write_command(COLMOD).await;
        self.write_data(&[0x55]).await;

        self.write_command(MADCTL).await;
        self.write_data(&[MADCTL_DEFAULT]).await;

        // The IPS panel is wired inverted
        self.write_command(INVON).await;
        Timer::after_millis(10).await;

        self.write_command(NORON).await;
        Timer::after_millis(10).await;

        self.write_command(DISPON).await;
        Timer::after_millis(10).await;

        self.set_window(0, 0, SCREEN_WIDTH as u16, SCREEN_HEIGHT as u16).await;
    }

    /// Send a command byte (DC low, CS low during transfer).
    async fn write_command(
        &mut self,
        cmd: u8,
    ) {
        self.cs.set_low();
        self.dc.set_low();
        self.spi.write(&[cmd]).await.ok();
        self.cs.set_high();
    }

    /// Send data bytes (DC high, CS low during transfer).
    async fn write_data(
        &mut self,
        data: &[u8],
    ) {
        self.cs.set_low();
        self.dc.set_high();
        self.spi.write(data).await.ok();
        self.cs.set_high();
    }

    async fn set_window(
        &mut self,
        x: u16,
        y: u16,
        w: u16,
        h: u16,
    ) {
        let x1 = x + w - 1;
        let y1 = y + h - 1;

        self.write_command(CASET).await;
        self.write_data(&[(x >> 8) as u8, x as u8, (x1 >> 8) as u8, x1 as u8])
            .await;

        self.write_command(RASET).await;
        self.write_data(&[(y >> 8) as u8, y as u8, (y1 >> 8) as u8, y1 as u8])
            .await;
    }

    /// Send one frame to the display via DMA.
    pub async fn flush_buffer(
        &mut self,
        buffer: &[u8],
    ) {
        self.cs.set_low();
        self.dc.set_low();
        // Single command byte: blocking is cheaper than a DMA setup
        self.spi.blocking_write(&[RAMWR]).ok();
        self.dc.set_high();
        self.spi.write(buffer).await.ok();
        self.cs.set_high();
    }
}
