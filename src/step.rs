//! Recorded operations
//!
//! A trace is replayed as an ordered sequence of opaque steps, one per frame
//! iteration. Each step receives the orchestrator through [`ReplayContext`]
//! and performs whatever backend work and handle-table or resource-blob
//! access it was recorded with. The engine never inspects what a step does;
//! it only sequences and invokes them.

use crate::blob::ResourceBlob;
use crate::error::ReplayError;
use crate::handle::SurfaceHandle;
use crate::replay::Surfaces;
use crate::surface::{SurfaceBackend, SurfaceContext};

/// One recorded operation.
///
/// Steps are externally generated and run to completion on the single
/// control thread; an `Err` is an unrecoverable environment condition that
/// terminates the run.
pub type Step = Box<dyn FnMut(&mut ReplayContext<'_>) -> Result<(), ReplayError>>;

/// Box a closure as a recorded operation.
pub fn step<F>(f: F) -> Step
where
    F: FnMut(&mut ReplayContext<'_>) -> Result<(), ReplayError> + 'static,
{
    Box::new(f)
}

/// The orchestrator as seen by a recorded operation.
///
/// Borrows the orchestrator's surface registry and resource blob for the
/// duration of one step, together with the windowing backend needed to
/// create surfaces mid-run.
pub struct ReplayContext<'a> {
    pub(crate) trace_name: &'a str,
    pub(crate) blob: &'a ResourceBlob,
    pub(crate) surfaces: &'a mut Surfaces,
    pub(crate) backend: &'a mut dyn SurfaceBackend,
}

impl ReplayContext<'_> {
    /// Create and register the surface context for a previously unseen
    /// trace surface handle, and make it current.
    pub fn create_context(
        &mut self,
        handle: SurfaceHandle,
    ) -> Result<&mut SurfaceContext, ReplayError> {
        self.surfaces.create(self.backend, self.trace_name, handle)
    }

    /// Make the surface context for `handle` current, resizing it when
    /// explicit dimensions differ from its stored size.
    ///
    /// Precondition: the trace created `handle` in an earlier step.
    pub fn make_context_current(
        &mut self,
        handle: SurfaceHandle,
        dimensions: Option<(u32, u32)>,
    ) -> &mut SurfaceContext {
        self.surfaces.make_current(handle, dimensions)
    }

    /// The surface context backend calls are currently bound to.
    pub fn current_context(&mut self) -> Option<&mut SurfaceContext> {
        self.surfaces.current_mut()
    }

    /// Read `length` bytes at `offset` from the trace's resource blob.
    /// `None` when the range is out of bounds; never partial data.
    pub fn get_resource(&self, offset: usize, length: usize) -> Option<&[u8]> {
        self.blob.read(offset, length)
    }

    /// Display name of the trace being replayed.
    pub fn trace_name(&self) -> &str {
        self.trace_name
    }
}
