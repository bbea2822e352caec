//! Orchestrator frame-loop tests against mock native surfaces
//!
//! The windowing/graphics backend sits behind the `NativeSurface` /
//! `SurfaceBackend` traits, so the loop's ordering guarantees are observable
//! without a GPU: step execution order, termination on close events, and
//! presentation order across surfaces.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use winit::event::WindowEvent;

use retrace::{
    NativeSurface, Replay, ReplayError, ReplayState, ResourceBlob, Step, SurfaceBackend,
    SurfaceHandle, step,
};

type EventLog = Rc<RefCell<Vec<String>>>;

struct TestSurface {
    title: String,
    size: (u32, u32),
    log: EventLog,
}

impl NativeSurface for TestSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.log
            .borrow_mut()
            .push(format!("resize {} {}x{}", self.title, width, height));
    }

    fn frame_view(&mut self) -> Option<&wgpu::TextureView> {
        None
    }

    fn depth_view(&self) -> Option<&wgpu::TextureView> {
        None
    }

    fn present(&mut self) {
        self.log.borrow_mut().push(format!("present {}", self.title));
    }
}

struct TestBackend {
    log: EventLog,
}

impl SurfaceBackend for TestBackend {
    fn create_surface(
        &mut self,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn NativeSurface>, ReplayError> {
        self.log.borrow_mut().push(format!("create {title}"));
        Ok(Box::new(TestSurface {
            title: title.to_string(),
            size: (width, height),
            log: self.log.clone(),
        }))
    }
}

fn test_blob(bytes: &[u8]) -> ResourceBlob {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    ResourceBlob::load_from(file.path()).unwrap()
}

fn replay_with_steps(steps: Vec<Step>) -> (Replay, TestBackend, EventLog) {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let backend = TestBackend { log: log.clone() };
    let replay = Replay::new("trace", test_blob(&[0; 16]), steps);
    (replay, backend, log)
}

#[test]
fn test_steps_execute_in_order_exactly_once() {
    let executed: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let steps: Vec<Step> = (0..5)
        .map(|i| {
            let executed = executed.clone();
            step(move |_cx| {
                executed.borrow_mut().push(i);
                Ok(())
            })
        })
        .collect();

    let (mut replay, mut backend, _log) = replay_with_steps(steps);
    assert_eq!(replay.state(), ReplayState::Running);

    // One step per frame iteration, never batched.
    for frame in 0..5 {
        replay.frame(&mut backend).unwrap();
        assert_eq!(executed.borrow().len(), frame + 1);
    }

    assert_eq!(*executed.borrow(), vec![0, 1, 2, 3, 4]);
    assert_eq!(replay.cursor(), 5);
    assert_eq!(replay.state(), ReplayState::Stopped);

    // Further iterations are no-ops.
    replay.frame(&mut backend).unwrap();
    assert_eq!(*executed.borrow(), vec![0, 1, 2, 3, 4]);
    assert_eq!(replay.cursor(), 5);
}

#[test]
fn test_close_event_halts_before_next_step() {
    let executed: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let steps: Vec<Step> = (0..10)
        .map(|i| {
            let executed = executed.clone();
            step(move |cx| {
                if i == 0 {
                    cx.create_context(SurfaceHandle(1))?;
                }
                executed.borrow_mut().push(i);
                Ok(())
            })
        })
        .collect();

    let (mut replay, mut backend, log) = replay_with_steps(steps);
    replay.frame(&mut backend).unwrap();
    replay.frame(&mut backend).unwrap();
    assert_eq!(executed.borrow().len(), 2);

    assert!(replay.handle_window_event(&WindowEvent::CloseRequested));
    assert_eq!(replay.state(), ReplayState::Stopped);

    // No step after the terminating event, and no further presents either.
    let presents_at_stop = log.borrow().len();
    replay.frame(&mut backend).unwrap();
    assert_eq!(executed.borrow().len(), 2);
    assert_eq!(replay.cursor(), 2);
    assert_eq!(log.borrow().len(), presents_at_stop);
}

#[test]
fn test_destroyed_window_also_stops() {
    let (mut replay, _backend, _log) = replay_with_steps(vec![step(|_cx| Ok(()))]);
    assert!(replay.handle_window_event(&WindowEvent::Destroyed));
    assert!(replay.is_stopped());
}

#[test]
fn test_other_events_are_ignored() {
    let (mut replay, mut backend, _log) = replay_with_steps(vec![step(|_cx| Ok(()))]);

    assert!(!replay.handle_window_event(&WindowEvent::Focused(true)));
    assert!(!replay.handle_window_event(&WindowEvent::Moved((10, 10).into())));
    assert_eq!(replay.state(), ReplayState::Running);

    // The loop still replays to completion afterwards.
    replay.frame(&mut backend).unwrap();
    assert_eq!(replay.state(), ReplayState::Stopped);
    assert_eq!(replay.cursor(), 1);
}

#[test]
fn test_presents_every_surface_in_creation_order() {
    let steps: Vec<Step> = vec![
        step(|cx| {
            cx.create_context(SurfaceHandle(1))?;
            Ok(())
        }),
        step(|cx| {
            cx.create_context(SurfaceHandle(2))?;
            Ok(())
        }),
        // Surface 1 becomes current again; presentation order must not care.
        step(|cx| {
            cx.make_context_current(SurfaceHandle(1), None);
            Ok(())
        }),
    ];

    let (mut replay, mut backend, log) = replay_with_steps(steps);
    for _ in 0..3 {
        replay.frame(&mut backend).unwrap();
    }

    assert_eq!(replay.surfaces().len(), 2);
    assert_eq!(
        *log.borrow(),
        vec![
            "create trace : 1",
            "present trace : 1",
            "create trace : 2",
            "present trace : 1",
            "present trace : 2",
            "present trace : 1",
            "present trace : 2",
        ]
    );
}

#[test]
fn test_make_current_resizes_only_on_new_dimensions() {
    let steps: Vec<Step> = vec![
        step(|cx| {
            cx.create_context(SurfaceHandle(1))?;
            Ok(())
        }),
        // Same size as creation: no native resize.
        step(|cx| {
            cx.make_context_current(SurfaceHandle(1), Some((800, 480)));
            Ok(())
        }),
        step(|cx| {
            cx.make_context_current(SurfaceHandle(1), Some((1024, 576)));
            Ok(())
        }),
    ];

    let (mut replay, mut backend, log) = replay_with_steps(steps);
    for _ in 0..3 {
        replay.frame(&mut backend).unwrap();
    }

    let resizes: Vec<_> = log
        .borrow()
        .iter()
        .filter(|entry| entry.starts_with("resize"))
        .cloned()
        .collect();
    assert_eq!(resizes, vec!["resize trace : 1 1024x576"]);
    assert_eq!(
        replay.surfaces().get(SurfaceHandle(1)).unwrap().size(),
        (1024, 576)
    );
}

#[test]
fn test_steps_read_the_resource_blob() {
    let seen: Rc<RefCell<Vec<Option<Vec<u8>>>>> = Rc::new(RefCell::new(Vec::new()));
    let steps: Vec<Step> = vec![{
        let seen = seen.clone();
        step(move |cx| {
            seen.borrow_mut().push(cx.get_resource(4, 4).map(<[u8]>::to_vec));
            seen.borrow_mut().push(cx.get_resource(14, 4).map(<[u8]>::to_vec));
            Ok(())
        })
    }];

    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let mut backend = TestBackend { log: log.clone() };
    let blob = test_blob(&[10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25]);
    let mut replay = Replay::new("trace", blob, steps);
    replay.frame(&mut backend).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![Some(vec![14, 15, 16, 17]), None]
    );
}

#[test]
fn test_empty_trace_drains_immediately() {
    let (mut replay, mut backend, _log) = replay_with_steps(Vec::new());
    replay.frame(&mut backend).unwrap();
    assert_eq!(replay.state(), ReplayState::Stopped);
    assert_eq!(replay.cursor(), 0);
}

#[test]
fn test_fatal_step_error_propagates() {
    let steps: Vec<Step> = vec![step(|_cx| {
        Err(ReplayError::Capability("test capability".into()))
    })];

    let (mut replay, mut backend, _log) = replay_with_steps(steps);
    let err = replay.frame(&mut backend).unwrap_err();
    assert!(matches!(err, ReplayError::Capability(_)));
}
