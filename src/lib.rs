//! Jimny I/O library - testable modules for the instrument cluster firmware.
//!
//! This library contains the core logic that can be tested on the host machine.
//! The binary (`main.rs`) uses this library and adds the embedded-specific code.
//!
//! - [`record`]: 4-byte persisted (mode, unit) record and its bit layout
//! - [`storage`]: append-only flash log with scan-on-boot and erase rollover
//! - [`pipeline`]: two-buffer producer/presenter handoff
//! - [`orchestrator`]: view state machine, input mapping, persistence decisions
//! - [`sensors`]: environment readings and inclinometer orientation
//! - [`render`]: RGB565 framebuffer target and the full-screen views
//! - [`memory`]: stack and static RAM accounting for the overlay
//!
//! # Testing
//!
//! Run tests on host with:
//! ```bash
//! cargo test --lib --target x86_64-unknown-linux-gnu  # Linux/macOS
//! cargo test --lib --target x86_64-pc-windows-msvc    # Windows
//! ```
//!
//! Tests run with `std` enabled (via `cfg_attr`), allowing use of the standard
//! test framework while the actual firmware runs as `no_std`.

// Use no_std only when NOT testing (tests need std for the test harness)
#![cfg_attr(not(test), no_std)]
// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

#[macro_use]
mod log;

pub mod config;
pub mod memory;
pub mod orchestrator;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod sensors;
pub mod storage;

pub use orchestrator::{Diagnostics, Orchestrator, PersistOutcome, View};
pub use pipeline::{BufferId, BufferState, FramePipeline, PipelineError};
pub use record::{Mode, PersistentRecord, Unit};
pub use storage::{FlashError, FlashLog, FlashRegion};
