//! retrace - Replay engine for recorded graphics traces
//!
//! Drives a previously recorded sequence of graphics-API calls against live
//! native windows and a real GPU backend, reproducing the visual output of
//! the original program without re-running it. The consumer is a generated
//! replay executable: it hands the engine a [`Trace`] (an ordered sequence of
//! recorded operations plus the name of a binary resource file) and the
//! engine replays it frame by frame.
//!
//! # Architecture
//!
//! - [`ResourceBlob`] - the trace's binary resource file, loaded once and
//!   served as read-only byte ranges
//! - [`SurfaceContext`] - one native window plus its graphics surface and the
//!   handle table mapping trace-time object handles to backend objects
//! - [`Gpu`] - process-wide, one-time backend bring-up (adapter, device,
//!   capability validation), run lazily on first surface creation
//! - [`Replay`] - the orchestrator: owns the step sequence, the surface
//!   registry, and the blob; executes one recorded operation per frame
//!   iteration, presents every surface, and paces the loop
//!
//! Recorded operations execute strictly in trace order, one per iteration,
//! on a single control thread. A window-close event or the end of the
//! sequence terminates the loop; environment failures (no adapter, missing
//! capability, unloadable resource file) are fatal.

pub mod app;
pub mod blob;
pub mod error;
pub mod gpu;
pub mod handle;
pub mod replay;
pub mod step;
pub mod surface;

pub use app::run;
pub use blob::{BlobError, ResourceBlob};
pub use error::ReplayError;
pub use gpu::Gpu;
pub use handle::{HandleTable, NativeObject, ObjectHandle, SurfaceHandle};
pub use replay::{FRAME_INTERVAL, Replay, ReplayState, Trace};
pub use step::{ReplayContext, Step, step};
pub use surface::{
    DEFAULT_SURFACE_HEIGHT, DEFAULT_SURFACE_WIDTH, NativeSurface, SurfaceBackend, SurfaceContext,
};
