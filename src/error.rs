//! Error types for the replay engine
//!
//! Every variant here is an unrecoverable environment condition: replay
//! fidelity cannot be guaranteed, so the error is reported and the process
//! terminates. Trace-consistency problems (out-of-range resource reads,
//! unmapped handles) are not errors at this level; they surface as `None`
//! at the call site.

use crate::blob::BlobError;

/// Fatal replay engine error.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The resource blob could not be loaded before the loop started.
    #[error(transparent)]
    Blob(#[from] BlobError),

    /// Native window creation failed.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    /// Graphics surface creation failed for a window.
    #[error("graphics surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// No graphics adapter compatible with the replay surfaces exists.
    #[error("no compatible graphics adapter: {0}")]
    Adapter(String),

    /// The adapter lacks a capability recorded operations depend on.
    #[error("required graphics capability missing: {0}")]
    Capability(String),

    /// Device creation failed after a suitable adapter was found.
    #[error("graphics device creation failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    /// The native event loop could not be created or run.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}
