//! Replay orchestrator
//!
//! Owns the ordered step sequence, the surface registry, and the resource
//! blob, and drives the frame loop: classify pending native events, execute
//! the next recorded operation, present every live surface in creation
//! order, pace. Recorded operations execute strictly in trace order, one per
//! iteration - later operations depend on handle-table state established by
//! earlier ones.

use std::time::Duration;

use hashbrown::HashMap;
use winit::event::WindowEvent;

use crate::blob::ResourceBlob;
use crate::error::ReplayError;
use crate::gpu::Gpu;
use crate::handle::SurfaceHandle;
use crate::step::{ReplayContext, Step};
use crate::surface::{SurfaceBackend, SurfaceContext};

/// Fixed pacing interval between frame iterations.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// A recorded trace: the inputs a generated replay executable hands the
/// engine.
pub struct Trace {
    /// Display name, used for window titles and diagnostics.
    pub name: String,
    /// Name of the resource file expected next to the executable.
    pub resource_file: String,
    /// The recorded operations, in trace order. Immutable for the run.
    pub steps: Vec<Step>,
}

/// Orchestrator life cycle. `Idle` is pre-construction and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayState {
    /// Between iterations with steps remaining.
    Running,
    /// A recorded operation is executing.
    Stepping,
    /// The last step has run; its presentation completes this iteration.
    Draining,
    /// The loop is finished; no further steps or presents.
    Stopped,
}

/// Registry of all surface contexts, keyed by trace surface handle.
///
/// Presentation iterates in creation order, so contexts live in a vec with a
/// handle index alongside. The current-context marker models the backend's
/// context-current semantics: backend calls bind to whichever context was
/// most recently created or made current.
#[derive(Default)]
pub struct Surfaces {
    entries: Vec<SurfaceContext>,
    by_handle: HashMap<SurfaceHandle, usize>,
    current: Option<usize>,
}

impl Surfaces {
    /// Create and register the context for a previously unseen handle, and
    /// mark it current (creation makes a context current natively).
    pub fn create(
        &mut self,
        backend: &mut dyn SurfaceBackend,
        trace_name: &str,
        handle: SurfaceHandle,
    ) -> Result<&mut SurfaceContext, ReplayError> {
        debug_assert!(
            !self.by_handle.contains_key(&handle),
            "trace created surface handle {} twice",
            handle.0
        );

        let context = SurfaceContext::new(backend, trace_name, handle)?;
        let index = self.entries.len();
        self.entries.push(context);
        self.by_handle.insert(handle, index);
        self.current = Some(index);
        Ok(&mut self.entries[index])
    }

    /// Make the context for `handle` current, applying an optional resize.
    ///
    /// Precondition: `handle` was created by an earlier step. The trace is
    /// trusted; a lookup miss is a bug in the generated sequence.
    pub fn make_current(
        &mut self,
        handle: SurfaceHandle,
        dimensions: Option<(u32, u32)>,
    ) -> &mut SurfaceContext {
        let index = *self
            .by_handle
            .get(&handle)
            .expect("make_current on a surface handle the trace never created");
        self.current = Some(index);
        let context = &mut self.entries[index];
        context.make_current(dimensions);
        context
    }

    /// The context backend calls are currently bound to.
    pub fn current_mut(&mut self) -> Option<&mut SurfaceContext> {
        let index = self.current?;
        Some(&mut self.entries[index])
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&SurfaceContext> {
        self.by_handle.get(&handle).map(|&i| &self.entries[i])
    }

    /// Present every live context, in creation order.
    pub fn present_all(&mut self) {
        for context in &mut self.entries {
            context.present();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The replay engine: step sequence, surface registry, resource blob.
pub struct Replay {
    trace_name: String,
    blob: ResourceBlob,
    steps: Vec<Step>,
    cursor: usize,
    state: ReplayState,
    surfaces: Surfaces,
}

impl Replay {
    /// Construct a replay over an already-loaded resource blob.
    pub fn new(trace_name: impl Into<String>, blob: ResourceBlob, steps: Vec<Step>) -> Self {
        Self {
            trace_name: trace_name.into(),
            blob,
            steps,
            cursor: 0,
            state: ReplayState::Running,
            surfaces: Surfaces::default(),
        }
    }

    /// Classify one pending native window event.
    ///
    /// Returns `true` when the event terminates the replay (close request or
    /// destroyed window). Every other event kind is logged and ignored;
    /// unrecognized events never stop or corrupt replay.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                tracing::info!("window close requested, stopping replay");
                self.state = ReplayState::Stopped;
                true
            }
            _ => {
                tracing::debug!("window event: {event:?}");
                false
            }
        }
    }

    /// Run one frame iteration: next step, then present all surfaces.
    ///
    /// Does nothing once the replay is stopped (a terminating event observed
    /// before this iteration suppresses both the step and the presents).
    pub fn frame(&mut self, backend: &mut dyn SurfaceBackend) -> Result<(), ReplayError> {
        if self.state != ReplayState::Running {
            return Ok(());
        }

        self.issue_next_step(backend)?;
        self.surfaces.present_all();

        if self.state == ReplayState::Draining {
            tracing::info!("trace '{}' complete: {} steps replayed", self.trace_name, self.cursor);
            self.state = ReplayState::Stopped;
        }
        Ok(())
    }

    /// Execute the next recorded operation and advance the cursor.
    ///
    /// Non-fatal backend errors raised by the step are drained from a
    /// validation scope and logged; they never stop replay.
    pub fn issue_next_step(&mut self, backend: &mut dyn SurfaceBackend) -> Result<(), ReplayError> {
        let Some(step) = self.steps.get_mut(self.cursor) else {
            // Empty sequence; nothing to replay.
            self.state = ReplayState::Draining;
            return Ok(());
        };

        tracing::debug!("step {}", self.cursor);
        self.state = ReplayState::Stepping;

        let mut cx = ReplayContext {
            trace_name: &self.trace_name,
            blob: &self.blob,
            surfaces: &mut self.surfaces,
            backend,
        };

        // Device captured before the step runs so push/pop stay balanced
        // even when the step itself brings the backend up.
        let scope_device = Gpu::get().map(|gpu| gpu.device().clone());
        if let Some(device) = &scope_device {
            device.push_error_scope(wgpu::ErrorFilter::Validation);
        }

        let result = step(&mut cx);

        if let Some(device) = &scope_device
            && let Some(error) = pollster::block_on(device.pop_error_scope())
        {
            tracing::warn!("backend error after step {}: {error}", self.cursor);
        }
        result?;

        self.cursor += 1;
        self.state = if self.cursor == self.steps.len() {
            ReplayState::Draining
        } else {
            ReplayState::Running
        };
        Ok(())
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == ReplayState::Stopped
    }

    /// Index of the next step to execute; equals the step count once the
    /// sequence has fully replayed.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn blob(&self) -> &ResourceBlob {
        &self.blob
    }

    pub fn trace_name(&self) -> &str {
        &self.trace_name
    }
}
