//! retrace-player - demo replay executable
//!
//! Real replay executables are generated by the offline trace tool: the
//! generator emits a step sequence and a resource blob, links them against
//! the engine, and calls [`retrace::run`]. This binary stands in for one of
//! those executables with a small built-in trace (one surface, animated
//! clears fed from blob bytes, a mid-run resize) so the engine can be run
//! and observed end to end.
//!
//! # Usage
//!
//! ```bash
//! retrace-player
//! retrace-player --frames 600
//! ```
//!
//! The demo resource file is written next to the executable on first run.
//! Exit code 0 on clean termination, 1 if the resource blob cannot be
//! loaded.

use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;

use retrace::{
    Gpu, NativeObject, ObjectHandle, ReplayError, ResourceBlob, Step, SurfaceHandle, Trace, step,
};

/// Resource file the demo trace reads its clear colors from.
const DEMO_RESOURCE_FILE: &str = "retrace-demo.bin";

/// Color entries in the demo resource file (4 bytes each).
const DEMO_COLOR_COUNT: usize = 256;

#[derive(Parser)]
#[command(name = "retrace-player")]
#[command(author, version, about = "Demo player for the retrace replay engine")]
struct Args {
    /// Number of animated frames in the demo trace
    #[arg(long, default_value = "240")]
    frames: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = ensure_demo_resources() {
        tracing::error!("failed to prepare demo resources: {e:#}");
        return ExitCode::FAILURE;
    }

    match retrace::run(demo_trace(args.frames)) {
        Ok(()) => ExitCode::SUCCESS,
        // Generated players report an unloadable blob as exit code 1.
        Err(e @ ReplayError::Blob(_)) => {
            tracing::error!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!("replay failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Write the demo resource file next to the executable if it is missing:
/// a ramp of RGBA colors the clear steps page through.
fn ensure_demo_resources() -> anyhow::Result<()> {
    let path = ResourceBlob::resource_path(DEMO_RESOURCE_FILE)?;
    if path.exists() {
        return Ok(());
    }

    let mut bytes = Vec::with_capacity(DEMO_COLOR_COUNT * 4);
    for i in 0..DEMO_COLOR_COUNT {
        let t = i as f32 / (DEMO_COLOR_COUNT - 1) as f32;
        bytes.push((t * 255.0) as u8);
        bytes.push(((1.0 - t) * 255.0) as u8);
        bytes.push(((t * std::f32::consts::TAU).sin().abs() * 255.0) as u8);
        bytes.push(0xFF);
    }

    std::fs::write(&path, &bytes)
        .with_context(|| format!("writing demo resource file {}", path.display()))?;
    tracing::info!("wrote demo resource file {}", path.display());
    Ok(())
}

/// Build the demo trace the way a generated sequence would look: one step
/// per frame iteration, surfaces and objects addressed by trace handles.
fn demo_trace(frames: usize) -> Trace {
    let mut steps: Vec<Step> = Vec::with_capacity(frames + 2);

    steps.push(step(|cx| {
        cx.create_context(SurfaceHandle(1))?;
        Ok(())
    }));

    steps.push(step(upload_vertex_data));

    for frame in 0..frames {
        if frame == frames / 2 {
            // A trace recorded against a larger surface: resize on
            // make-current.
            steps.push(step(|cx| {
                cx.make_context_current(SurfaceHandle(1), Some((1024, 576)));
                Ok(())
            }));
        }
        steps.push(clear_step((frame % DEMO_COLOR_COUNT) * 4));
    }

    Trace {
        name: "demo".into(),
        resource_file: DEMO_RESOURCE_FILE.into(),
        steps,
    }
}

/// Create a vertex buffer from blob bytes and bind it to object handle 1.
fn upload_vertex_data(cx: &mut retrace::ReplayContext<'_>) -> Result<(), ReplayError> {
    let Some(gpu) = Gpu::get() else {
        return Ok(());
    };

    let buffer = gpu.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("Demo Vertex Buffer"),
        size: 256,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    if let Some(bytes) = cx.get_resource(0, 256) {
        gpu.queue().write_buffer(&buffer, 0, bytes);
    }

    if let Some(context) = cx.current_context() {
        context.bind_object(ObjectHandle(1), NativeObject::Buffer(buffer));
    }
    Ok(())
}

/// Clear the current surface to the color stored at `offset` in the blob.
fn clear_step(offset: usize) -> Step {
    step(move |cx| {
        let color = cx
            .get_resource(offset, 4)
            .map(|b| wgpu::Color {
                r: b[0] as f64 / 255.0,
                g: b[1] as f64 / 255.0,
                b: b[2] as f64 / 255.0,
                a: b[3] as f64 / 255.0,
            })
            .unwrap_or(wgpu::Color::BLACK);

        let context = cx.make_context_current(SurfaceHandle(1), None);
        let Some(gpu) = Gpu::get() else {
            return Ok(());
        };
        let Some(view) = context.frame_view() else {
            return Ok(());
        };

        let mut encoder = gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Demo Clear"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        gpu.queue().submit(std::iter::once(encoder.finish()));
        Ok(())
    })
}
