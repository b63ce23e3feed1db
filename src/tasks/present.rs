//! Frame presentation on core 1.
//!
//! The producer on core 0 publishes a finished frame through the pipeline and
//! raises [`FRAME_READY`]. This task takes the frame, sends it to the display
//! and raises [`FRAME_DONE`] once the buffer is free to draw into again.
//!
//! The signals only wake the other side. Ownership of the buffers is decided
//! by the pipeline, so a stale or coalesced signal is harmless.

use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;
use jimny_io::pipeline::Presenter;
use jimny_io::render::Frame;

use crate::drivers::St7789Flusher;

/// Raised by the producer after a successful publish.
pub static FRAME_READY: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Raised by the presenter after each completed frame.
pub static FRAME_DONE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::task]
pub async fn present_task(
    mut presenter: Presenter<'static, Frame>,
    mut flusher: St7789Flusher<'static>,
) {
    info!("Present task started on core 1");

    loop {
        FRAME_READY.wait().await;

        while let Some(frame) = presenter.try_take() {
            let start = Instant::now();
            flusher.flush_buffer(frame.buffer()).await;
            frame.complete(start.elapsed().as_micros() as u32);
            FRAME_DONE.signal(());
        }
    }
}
