//! Two-buffer frame handoff between the render core and the present core.
//!
//! The producer draws into one buffer while the presenter drains the other to
//! the display. Ownership of each buffer moves through a strict handshake:
//!
//! ```text
//!            begin_frame          finish            try_take          complete
//!   Idle ───────────────▶ Rendering ─────▶ Ready ──────────▶ Presented ─────────▶ (done)
//!    ▲                                                                            │
//!    └───────────── reused once the other buffer enters Rendering ◀──────────────┘
//! ```
//!
//! # Handshake
//!
//! - `ready` token: the producer publishes the id of a finished buffer
//!   (`Release`); the presenter takes it (`Acquire`).
//! - `done` token: the presenter bumps the presented counter after it has
//!   finished reading (`Release`); the producer only publishes the next buffer
//!   once the counter caught up with everything it published (`Acquire`).
//!
//! Frames are therefore presented in production order, none twice, and the
//! presenter never reads a buffer that is being drawn. The atomics decide
//! ownership on their own; the firmware adds `Signal`s purely for wake-ups.

use core::cell::UnsafeCell;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

const NO_TOKEN: u8 = 0;

/// Identity of one of the two frame buffers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum BufferId {
    A,
    B,
}

impl BufferId {
    /// Array index (0 or 1).
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// The other buffer.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    const fn token(self) -> u8 { self.index() as u8 + 1 }

    const fn from_token(token: u8) -> Option<Self> {
        match token {
            1 => Some(Self::A),
            2 => Some(Self::B),
            _ => None,
        }
    }
}

/// Lifecycle state of one buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
#[repr(u8)]
pub enum BufferState {
    Idle = 0,
    /// Producer is drawing into it.
    Rendering = 1,
    /// Finished, waiting for the presenter.
    ReadyForPresentation = 2,
    /// Taken by the presenter (being or already sent to the display).
    Presented = 3,
}

impl BufferState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Rendering,
            2 => Self::ReadyForPresentation,
            3 => Self::Presented,
            _ => Self::Idle,
        }
    }
}

/// Handshake protocol signals. None of them is fatal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum PipelineError {
    /// A finished frame has not been published yet.
    FramePending,
    /// The buffer to draw into is still owned by the presenter.
    PresenterBusy,
    /// The previously published frame has not been presented yet.
    WouldBlock,
    /// Nothing finished to publish.
    OutOfOrder,
}

impl fmt::Display for PipelineError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::FramePending => "finished frame not published yet",
            Self::PresenterBusy => "buffer still owned by presenter",
            Self::WouldBlock => "previous frame not presented yet",
            Self::OutOfOrder => "no finished frame to publish",
        })
    }
}

// =============================================================================
// Shared Pipeline
// =============================================================================

/// Two buffers plus the handshake state. Lives in a `static` on the device.
pub struct FramePipeline<T> {
    buffers: [UnsafeCell<T>; 2],
    states: [AtomicU8; 2],
    ready: AtomicU8,
    produced: AtomicU32,
    presented: AtomicU32,
    last_present_us: AtomicU32,
    split: AtomicBool,
}

// SAFETY: Buffer access is serialized by the handshake. The producer holds
// `&mut T` only for a buffer that is not published or in flight, the presenter
// holds `&T` only for the buffer it took the ready token for.
unsafe impl<T: Send> Sync for FramePipeline<T> {}

impl<T> FramePipeline<T> {
    pub const fn new(
        a: T,
        b: T,
    ) -> Self {
        Self {
            buffers: [UnsafeCell::new(a), UnsafeCell::new(b)],
            states: [
                AtomicU8::new(BufferState::Idle as u8),
                AtomicU8::new(BufferState::Idle as u8),
            ],
            ready: AtomicU8::new(NO_TOKEN),
            produced: AtomicU32::new(0),
            presented: AtomicU32::new(0),
            last_present_us: AtomicU32::new(0),
            split: AtomicBool::new(false),
        }
    }

    /// Hand out the two endpoints. Succeeds exactly once.
    pub fn split(&self) -> Option<(Producer<'_, T>, Presenter<'_, T>)> {
        if self.split.swap(true, Ordering::AcqRel) {
            return None;
        }
        let producer = Producer {
            pipeline: self,
            next: BufferId::A,
            pending: None,
            in_flight: None,
            published: 0,
        };
        Some((producer, Presenter { pipeline: self }))
    }

    /// Current state of a buffer.
    #[inline]
    pub fn state(
        &self,
        id: BufferId,
    ) -> BufferState {
        BufferState::from_u8(self.states[id.index()].load(Ordering::Acquire))
    }

    /// Frames finished by the producer.
    #[inline]
    pub fn produced_count(&self) -> u32 { self.produced.load(Ordering::Relaxed) }

    /// Frames fully presented. The first frame gates the backlight.
    #[inline]
    pub fn presented_count(&self) -> u32 { self.presented.load(Ordering::Acquire) }

    /// Duration of the last presentation in microseconds (informational).
    #[inline]
    pub fn last_present_us(&self) -> u32 { self.last_present_us.load(Ordering::Relaxed) }

    fn set_state(
        &self,
        id: BufferId,
        state: BufferState,
    ) {
        self.states[id.index()].store(state as u8, Ordering::Release);
    }
}

// =============================================================================
// Producer Side
// =============================================================================

/// Render-core endpoint.
pub struct Producer<'a, T> {
    pipeline: &'a FramePipeline<T>,
    /// Buffer the next frame is drawn into.
    next: BufferId,
    /// Finished but not yet published.
    pending: Option<BufferId>,
    /// Published, possibly still being presented.
    in_flight: Option<BufferId>,
    published: u32,
}

impl<'a, T> Producer<'a, T> {
    /// Whether everything published so far has been presented.
    #[inline]
    pub fn presenter_idle(&self) -> bool { self.pipeline.presented.load(Ordering::Acquire) >= self.published }

    /// Start drawing the next frame into the buffer the presenter does not own.
    pub fn begin_frame(&mut self) -> Result<RenderFrame<'_, 'a, T>, PipelineError> {
        if self.pending.is_some() {
            return Err(PipelineError::FramePending);
        }
        let id = self.next;
        if self.in_flight == Some(id) && !self.presenter_idle() {
            return Err(PipelineError::PresenterBusy);
        }

        self.pipeline.set_state(id, BufferState::Rendering);
        Ok(RenderFrame {
            producer: self,
            id,
            finished: false,
        })
    }

    /// Publish the finished frame to the presenter.
    ///
    /// Only succeeds once the previously published frame is done, which keeps
    /// at most one frame in flight.
    pub fn try_publish(&mut self) -> Result<BufferId, PipelineError> {
        let Some(id) = self.pending else {
            return Err(PipelineError::OutOfOrder);
        };
        if !self.presenter_idle() {
            return Err(PipelineError::WouldBlock);
        }

        self.pipeline.ready.store(id.token(), Ordering::Release);
        self.published += 1;
        self.pending = None;
        self.in_flight = Some(id);
        self.next = id.other();
        Ok(id)
    }
}

/// Exclusive access to the buffer being drawn.
///
/// Dropping the guard without [`finish`](Self::finish) abandons the frame and
/// returns the buffer to `Idle`.
pub struct RenderFrame<'p, 'a, T> {
    producer: &'p mut Producer<'a, T>,
    id: BufferId,
    finished: bool,
}

impl<T> RenderFrame<'_, '_, T> {
    #[inline]
    pub const fn id(&self) -> BufferId { self.id }

    /// Buffer to draw into.
    #[inline]
    pub fn buffer(&mut self) -> &mut T {
        // SAFETY: The buffer is in `Rendering`; the presenter only touches the
        // buffer named by the ready token, which is never this one.
        unsafe { &mut *self.producer.pipeline.buffers[self.id.index()].get() }
    }

    /// Mark drawing complete (`Rendering → ReadyForPresentation`).
    pub fn finish(mut self) { self.finished = true; }
}

impl<T> Drop for RenderFrame<'_, '_, T> {
    fn drop(&mut self) {
        let pipeline = self.producer.pipeline;
        if self.finished {
            pipeline.set_state(self.id, BufferState::ReadyForPresentation);
            pipeline.produced.fetch_add(1, Ordering::Relaxed);
            self.producer.pending = Some(self.id);
        } else {
            pipeline.set_state(self.id, BufferState::Idle);
        }
    }
}

// =============================================================================
// Presenter Side
// =============================================================================

/// Present-core endpoint.
pub struct Presenter<'a, T> {
    pipeline: &'a FramePipeline<T>,
}

impl<'a, T> Presenter<'a, T> {
    /// Take the published frame, if any.
    pub fn try_take(&mut self) -> Option<PresentFrame<'_, T>> {
        let id = BufferId::from_token(self.pipeline.ready.swap(NO_TOKEN, Ordering::AcqRel))?;
        let previous = self.pipeline.states[id.index()].swap(BufferState::Presented as u8, Ordering::AcqRel);
        debug_assert_eq!(BufferState::from_u8(previous), BufferState::ReadyForPresentation);

        Some(PresentFrame {
            pipeline: self.pipeline,
            id,
        })
    }
}

/// Read access to a frame being presented.
///
/// Dropping the guard publishes the done token; [`complete`](Self::complete)
/// also records how long the presentation took.
pub struct PresentFrame<'p, T> {
    pipeline: &'p FramePipeline<T>,
    id: BufferId,
}

impl<T> PresentFrame<'_, T> {
    #[inline]
    pub const fn id(&self) -> BufferId { self.id }

    /// Buffer to send to the display.
    #[inline]
    pub fn buffer(&self) -> &T {
        // SAFETY: The producer does not draw into a published buffer until
        // the done token for it has been observed.
        unsafe { &*self.pipeline.buffers[self.id.index()].get() }
    }

    /// Finish presentation and record its duration.
    pub fn complete(
        self,
        elapsed_us: u32,
    ) {
        self.pipeline.last_present_us.store(elapsed_us, Ordering::Relaxed);
    }
}

impl<T> Drop for PresentFrame<'_, T> {
    fn drop(&mut self) { self.pipeline.presented.fetch_add(1, Ordering::Release); }
}

// =============================================================================
// Unit Tests
// =============================================================================
