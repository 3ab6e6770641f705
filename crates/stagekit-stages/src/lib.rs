//! # StageKit Stages
//!
//! The demo stages, described as data and driven by a frame scheduler.
//!
//! ## Overview
//!
//! - [`StageSpec`]: shader pair, vertex streams, indices, uniforms, camera,
//!   spin and clear state for one demo
//! - [`catalog`]: the built-in stages, from a flat red triangle to a lit,
//!   textured, spinning cube
//! - [`PreparedStage`]: one-shot setup against a [`stagekit_gl::RenderContext`]
//!   and per-frame drawing
//! - [`FrameScheduler`]: the periodic redraw loop, with a [`StopHandle`]
//!
//! ```no_run
//! use std::ops::ControlFlow;
//! use std::time::Duration;
//!
//! use stagekit_common::CanvasConfig;
//! use stagekit_gl::RecordingContext;
//! use stagekit_stages::{catalog, FrameScheduler, PreparedStage};
//!
//! # async fn demo() -> stagekit_common::Result<()> {
//! let mut ctx = RecordingContext::new(640, 480);
//! let spec = catalog::by_name("rotating-cube")?;
//! let mut stage = PreparedStage::setup(&mut ctx, &spec, CanvasConfig::default())?;
//!
//! let scheduler = FrameScheduler::new(Duration::from_millis(16)).with_max_frames(60);
//! scheduler
//!     .run(|_| match stage.render_frame(&mut ctx) {
//!         Ok(()) => ControlFlow::Continue(()),
//!         Err(_) => ControlFlow::Break(()),
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod scheduler;
pub mod shaders;
pub mod spec;
pub mod stage;

pub use scheduler::{FrameScheduler, FrameStats, RunningLoop, StopHandle, MIN_FRAME_INTERVAL};
pub use spec::{
    CameraSpec, DrawMode, SpinSpec, StageSpec, StageSpecBuilder, TextureSpec, UniformInit,
    VertexStream,
};
pub use stage::PreparedStage;
