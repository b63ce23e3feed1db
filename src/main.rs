//! Jimny I/O firmware for Raspberry Pi Pico 2 (RP2350)
//!
//! Instrument cluster on a 240x240 ST7789 display board: outside climate,
//! an inclinometer, and a diagnostics overlay.
//!
//! # Architecture
//!
//! Two off-screen frames are handed between the cores by a
//! [`FramePipeline`]:
//! - Core 0: polls buttons, advances the view state machine, renders the next
//!   frame, publishes it, then persists (mode, unit) if it changed
//! - Core 1: takes each published frame and sends it to the display via DMA
//!
//! The backlight stays off until the first frame has been presented.
//!
//! # Button Controls
//!
//! - **A**: Switch Environment / Inclinometer (ends the splash early)
//! - **B**: Switch Celsius / Fahrenheit
//! - **X**: Toggle the diagnostics overlay
//! - **Y**: Unused
//!
//! On a host target this binary only prints a hint; the firmware and its
//! dependencies are ARM-only.

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]
// Crate-level lints (match lib.rs for consistency)
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

// Modules only used in the binary (not testable on host)
#[cfg(target_arch = "arm")]
mod log_buffer;

#[cfg(target_arch = "arm")]
mod button;
#[cfg(target_arch = "arm")]
mod drivers;
#[cfg(target_arch = "arm")]
mod tasks;

#[cfg(target_arch = "arm")]
use {
    defmt::info,
    embassy_executor::{Executor, Spawner},
    embassy_rp::flash::{Blocking, Flash},
    embassy_rp::gpio::{Input, Level, Output, Pull},
    embassy_rp::multicore::{Stack, spawn_core1},
    embassy_rp::spi::Spi,
    embassy_time::{Duration, Instant},
    jimny_io::config::timing::HEARTBEAT_MS,
    jimny_io::config::{FLASH_SIZE, FRAME_BYTES, STATE_REGION_OFFSET, STATE_REGION_SIZE},
    jimny_io::memory::MemoryStats,
    jimny_io::orchestrator::process_buttons,
    jimny_io::render::{Frame, FrameRenderer},
    jimny_io::sensors::{DemoEnvironment, DemoOrientation, Inclinometer},
    jimny_io::storage::NorFlashRegion,
    jimny_io::{FlashLog, FramePipeline, Orchestrator, PersistOutcome, PipelineError},
    static_cell::StaticCell,
    {defmt_rtt as _, panic_probe as _},
};

#[cfg(target_arch = "arm")]
use crate::button::GpioButtons;
#[cfg(target_arch = "arm")]
use crate::drivers::{St7789Flusher, display_spi_config};
#[cfg(target_arch = "arm")]
use crate::tasks::{FRAME_DONE, FRAME_READY, present_task};

// Program metadata for `picotool info`
#[cfg(target_arch = "arm")]
#[unsafe(link_section = ".bi_entries")]
#[used]
pub static PICOTOOL_ENTRIES: [embassy_rp::binary_info::EntryAddr; 4] = [
    embassy_rp::binary_info::rp_program_name!(c"jimny-io"),
    embassy_rp::binary_info::rp_program_description!(c"Jimny I/O instrument cluster on a 240x240 ST7789 display"),
    embassy_rp::binary_info::rp_cargo_version!(),
    embassy_rp::binary_info::rp_program_build_attribute!(),
];

/// Both off-screen frames and their handoff state.
#[cfg(target_arch = "arm")]
static PIPELINE: FramePipeline<Frame> = FramePipeline::new([0; FRAME_BYTES], [0; FRAME_BYTES]);

#[cfg(target_arch = "arm")]
static mut CORE1_STACK: Stack<8192> = Stack::new();

#[cfg(target_arch = "arm")]
static EXECUTOR1: StaticCell<Executor> = StaticCell::new();

/// Milliseconds since boot. Wraps after ~49 days; consumers use wrapping math.
#[cfg(target_arch = "arm")]
fn now_ms() -> u32 { Instant::now().as_millis() as u32 }

#[cfg(target_arch = "arm")]
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Jimny I/O starting...");

    let p = embassy_rp::init(Default::default());

    // RGB LED (active-low: Low = ON), green is the heartbeat
    let mut _led_r = Output::new(p.PIN_6, Level::High);
    let mut led_g = Output::new(p.PIN_7, Level::High);
    let mut _led_b = Output::new(p.PIN_8, Level::High);

    // Display pins: CS=17, DC=16, CLK=18, MOSI=19, Backlight=20
    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_16, Level::Low);
    // Off until the first frame is on the panel
    let mut backlight = Output::new(p.PIN_20, Level::Low);

    // Async SPI with DMA (TX-only, display doesn't need MISO)
    let spi = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, display_spi_config());

    let mut flusher = St7789Flusher::new(spi, dc, cs);
    flusher.init().await;
    log_info!("Display initialized");

    // Persisted state: last erase block of the QSPI flash
    let flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(p.FLASH);
    let region = NorFlashRegion::new(flash, STATE_REGION_OFFSET, STATE_REGION_SIZE)
        .expect("state region must be erase-block aligned and inside flash");
    let (mut state_log, scan) = FlashLog::mount(region);
    log_info!("State scanned, next slot {}", scan.first_free_slot);

    let (mut producer, presenter) = PIPELINE.split().expect("pipeline split twice");

    // Presenter on core 1. Blocking flash operations pause it.
    spawn_core1(
        p.CORE1,
        unsafe { &mut *core::ptr::addr_of_mut!(CORE1_STACK) },
        move || {
            let executor1 = EXECUTOR1.init(Executor::new());
            executor1.run(|spawner| spawner.spawn(present_task(presenter, flusher)).unwrap());
        },
    );
    info!("Core 1 started");

    // Buttons (active-low with internal pull-up): A=12, B=13, X=14, Y=15
    let mut buttons = GpioButtons::new(
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
        Input::new(p.PIN_14, Pull::Up),
        Input::new(p.PIN_15, Pull::Up),
    );

    let mut environment = DemoEnvironment::new(now_ms);
    let mut inclinometer = Inclinometer::new(DemoOrientation::new());
    let mut orchestrator = Orchestrator::new(&scan, now_ms());

    let mut backlight_on = false;
    let mut last_profile_log = Instant::now();

    log_info!("Main loop starting");

    loop {
        let loop_start = Instant::now();
        let now = now_ms();

        let input = process_buttons(&mut buttons);
        orchestrator.handle_input(input);
        orchestrator.tick(now);

        // Render into the buffer the presenter does not own
        let render_start = Instant::now();
        let mut frame = match producer.begin_frame() {
            Ok(frame) => frame,
            Err(_) => {
                FRAME_DONE.wait().await;
                continue;
            }
        };
        {
            let mut display = FrameRenderer::from_frame(frame.buffer());
            log_buffer::with_recent(|logs| {
                orchestrator.render(&mut display, &mut environment, &mut inclinometer, logs);
            });
        }
        frame.finish();
        let render_us = render_start.elapsed().as_micros() as u32;

        // At most one frame in flight: wait for the previous presentation
        loop {
            match producer.try_publish() {
                Ok(_) => {
                    FRAME_READY.signal(());
                    break;
                }
                Err(PipelineError::WouldBlock) => FRAME_DONE.wait().await,
                Err(error) => {
                    log_error!("Publish failed: {}", error);
                    break;
                }
            }
        }

        match orchestrator.persist_if_changed(&mut state_log, now) {
            PersistOutcome::Written(report) => {
                if report.erased {
                    log_info!("State block erased");
                }
            }
            PersistOutcome::Failed(error) => log_warn!("State save failed: {}", error),
            _ => {}
        }

        if !backlight_on && PIPELINE.presented_count() >= 1 {
            backlight.set_high();
            backlight_on = true;
            log_info!("Backlight on");
        }

        let diagnostics = orchestrator.diagnostics_mut();
        diagnostics.render_us = render_us;
        diagnostics.present_us = PIPELINE.last_present_us();
        diagnostics.frames_presented = PIPELINE.presented_count();
        diagnostics.stack_used_kb = MemoryStats::collect().stack_used_kb();
        diagnostics.loop_us = loop_start.elapsed().as_micros() as u32;

        // Log profiling data every 2 seconds
        if last_profile_log.elapsed() >= Duration::from_secs(2) {
            let diagnostics = orchestrator.diagnostics();
            info!(
                "PROFILE: loop={}us render={}us present={}us frames={} view={}",
                diagnostics.loop_us,
                diagnostics.render_us,
                diagnostics.present_us,
                diagnostics.frames_presented,
                orchestrator.view()
            );
            last_profile_log = Instant::now();
        }

        // Toggle the heartbeat LED to show the loop is running
        if (now / HEARTBEAT_MS).is_multiple_of(2) {
            led_g.set_low(); // ON
        } else {
            led_g.set_high(); // OFF
        }
    }
}

#[cfg(not(target_arch = "arm"))]
fn main() {
    println!("jimny is firmware for the RP2350; build it with `--target thumbv8m.main-none-eabihf`.");
    println!("Host tests: cargo test --lib");
}
