//! Event-loop glue between the orchestrator and winit
//!
//! winit owns the native event queue and delivers events through
//! `ApplicationHandler` callbacks; the handler here forwards them into the
//! orchestrator and runs one frame iteration per pacing tick. All decision
//! logic lives in [`Replay`]; this module only adapts it to the callback
//! model.

use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::blob::ResourceBlob;
use crate::error::ReplayError;
use crate::replay::{FRAME_INTERVAL, Replay, Trace};
use crate::surface::WinitBackend;

struct ReplayApp {
    replay: Replay,
    next_frame: Instant,
    /// First fatal error raised by a frame, carried out of the loop.
    error: Option<ReplayError>,
}

impl ReplayApp {
    fn new(replay: Replay) -> Self {
        Self {
            replay,
            next_frame: Instant::now(),
            error: None,
        }
    }
}

impl ApplicationHandler for ReplayApp {
    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {
        // Surfaces are created by recorded operations, not up front.
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        // A close on any surface stops the whole replay, before the next
        // step runs.
        if self.replay.handle_window_event(&event) {
            event_loop.exit();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.replay.is_stopped() {
            event_loop.exit();
            return;
        }

        let now = Instant::now();
        if now >= self.next_frame {
            let mut backend = WinitBackend::new(event_loop);
            if let Err(e) = self.replay.frame(&mut backend) {
                tracing::error!("fatal replay error: {e}");
                self.error = Some(e);
                event_loop.exit();
                return;
            }
            self.next_frame = now + FRAME_INTERVAL;

            if self.replay.is_stopped() {
                event_loop.exit();
                return;
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}

/// Replay a trace to completion.
///
/// Loads the resource blob (before any window exists - a missing blob is the
/// one failure a generated executable maps to exit code 1), then drives the
/// native event loop until the sequence drains or a close event arrives.
pub fn run(trace: Trace) -> Result<(), ReplayError> {
    let blob = ResourceBlob::load(&trace.resource_file)?;
    let replay = Replay::new(trace.name, blob, trace.steps);

    let event_loop = EventLoop::new()?;
    let mut app = ReplayApp::new(replay);
    event_loop.run_app(&mut app)?;

    match app.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
