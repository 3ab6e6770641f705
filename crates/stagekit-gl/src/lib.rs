//! # StageKit GL
//!
//! The WebGL2 surface the StageKit demos are written against.
//!
//! ## Features
//!
//! - **RenderContext**: the minimal capability set a demo needs (shaders,
//!   programs, buffers, vertex attributes, uniforms, textures, draws)
//! - **RecordingContext**: an in-memory implementation that validates GLSL
//!   superficially and records every draw, used headless and in tests
//! - **Binding helpers**: [`compile_program`], [`upload_vertex_buffer`],
//!   [`upload_index_buffer`]
//! - **Textures**: asynchronous image decode with a render-thread upload step
//! - **Web backend** (feature `web`): `RenderContext` for
//!   `web_sys::WebGl2RenderingContext`
//!
//! ## Failure policy
//!
//! Missing inputs (lost context, empty shader source, object creation
//! returning nothing) short-circuit with a [`GlError`]. Shader compile and
//! link problems do not: they are logged and reported in a
//! [`CompileReport`], and the program is still returned.

use thiserror::Error;

pub mod binding;
pub mod constants;
pub mod context;
mod glsl;
pub mod recording;
pub mod texture;

#[cfg(feature = "web")]
pub mod web;

pub use binding::{
    compile_program, upload_index_buffer, upload_vertex_buffer, CompileReport, IndexData,
    LinkedProgram, VertexAttrib, FLOAT_BYTES, MAX_STRIDE_BYTES,
};
pub use context::{BufferTarget, BufferUsage, IndexType, RenderContext, ShaderKind};
pub use recording::{DrawCall, DrawState, GlObject, RecordingContext, UniformValue};
pub use texture::{load_texture, DecodedImage, PendingTexture, TextureSource, TextureState};

// ==================== Errors ====================

/// Errors that can occur while setting up GL state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlError {
    /// The rendering context is gone (never acquired or lost).
    #[error("Context lost")]
    ContextLost,

    /// A required input or GL object is absent.
    #[error("Missing dependency: {0}")]
    MissingDependency(&'static str),

    /// A vertex attribute descriptor does not fit its stride.
    #[error(
        "Invalid layout for attribute '{name}': {size} components at offset {offset} with stride {stride}"
    )]
    InvalidAttributeLayout {
        name: String,
        size: u32,
        stride: u32,
        offset: u32,
    },

    /// Texture image could not be read or decoded.
    #[error("Texture decode error: {0}")]
    TextureDecode(String),
}

impl GlError {
    /// True for failures caused by an absent context, source or object.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, GlError::ContextLost | GlError::MissingDependency(_))
    }
}

/// Result type for GL setup operations.
pub type GlResult<T> = Result<T, GlError>;
