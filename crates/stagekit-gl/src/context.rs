//! The rendering-context capability surface.
//!
//! Everything a stage does to the GPU goes through [`RenderContext`]. The
//! context is always passed explicitly; nothing here holds one globally.

use std::fmt;

use crate::constants;

/// Shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl ShaderKind {
    pub fn to_gl(self) -> u32 {
        match self {
            ShaderKind::Vertex => constants::VERTEX_SHADER,
            ShaderKind::Fragment => constants::FRAGMENT_SHADER,
        }
    }

    /// Label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "Vertex shader",
            ShaderKind::Fragment => "Fragment shader",
        }
    }
}

/// Buffer binding point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Per-vertex attribute data.
    Array,
    /// Indices consumed by `draw_elements`.
    ElementArray,
}

impl BufferTarget {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferTarget::Array => constants::ARRAY_BUFFER,
            BufferTarget::ElementArray => constants::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Upload usage hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    Static,
    Dynamic,
    Stream,
}

impl BufferUsage {
    pub fn to_gl(self) -> u32 {
        match self {
            BufferUsage::Static => constants::STATIC_DRAW,
            BufferUsage::Dynamic => constants::DYNAMIC_DRAW,
            BufferUsage::Stream => constants::STREAM_DRAW,
        }
    }
}

/// Element width of an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    UnsignedByte,
    UnsignedShort,
}

impl IndexType {
    pub fn to_gl(self) -> u32 {
        match self {
            IndexType::UnsignedByte => constants::UNSIGNED_BYTE,
            IndexType::UnsignedShort => constants::UNSIGNED_SHORT,
        }
    }

    pub fn size_in_bytes(self) -> usize {
        match self {
            IndexType::UnsignedByte => 1,
            IndexType::UnsignedShort => 2,
        }
    }
}

/// Minimal WebGL2 capability set used by the binding helpers and stages.
///
/// Creation calls return `None` where WebGL returns `null` (typically after
/// context loss). Uniform setters accept `None` locations and ignore them,
/// as WebGL does for uniforms the linker dropped.
pub trait RenderContext {
    type Shader: Clone + fmt::Debug;
    type Program: Clone + fmt::Debug;
    type Buffer: Clone + fmt::Debug;
    type Texture: Clone + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    fn is_context_lost(&self) -> bool;

    /// String-valued context parameter (`VERSION`, `VENDOR`, `RENDERER`, ...).
    fn parameter_string(&self, pname: u32) -> Option<String>;

    // Shaders
    fn create_shader(&mut self, kind: ShaderKind) -> Option<Self::Shader>;
    fn shader_source(&mut self, shader: &Self::Shader, source: &str);
    fn compile_shader(&mut self, shader: &Self::Shader);
    fn shader_info_log(&self, shader: &Self::Shader) -> Option<String>;

    // Programs
    fn create_program(&mut self) -> Option<Self::Program>;
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&mut self, program: &Self::Program);
    fn program_info_log(&self, program: &Self::Program) -> Option<String>;
    fn use_program(&mut self, program: Option<&Self::Program>);
    /// Attribute slot for `name`, or -1 when the program has no such attribute.
    fn attrib_location(&self, program: &Self::Program, name: &str) -> i32;
    fn uniform_location(&self, program: &Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    // Buffers
    fn create_buffer(&mut self) -> Option<Self::Buffer>;
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&Self::Buffer>);
    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&mut self, buffer: &Self::Buffer);

    // Vertex attributes
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&mut self, index: u32);
    /// Constant value used while the attribute array is disabled.
    fn vertex_attrib4f(&mut self, index: u32, x: f32, y: f32, z: f32, w: f32);

    // Uniforms
    fn uniform1i(&mut self, location: Option<&Self::UniformLocation>, x: i32);
    fn uniform3f(&mut self, location: Option<&Self::UniformLocation>, x: f32, y: f32, z: f32);
    fn uniform4f(
        &mut self,
        location: Option<&Self::UniformLocation>,
        x: f32,
        y: f32,
        z: f32,
        w: f32,
    );
    /// Column-major, never transposed.
    fn uniform_matrix4fv(&mut self, location: Option<&Self::UniformLocation>, value: &[f32; 16]);

    // Textures
    fn create_texture(&mut self) -> Option<Self::Texture>;
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: u32, texture: Option<&Self::Texture>);
    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32);
    /// Pixel unpacking state, e.g. `UNPACK_ALIGNMENT`.
    fn pixel_storei(&mut self, pname: u32, param: i32);
    #[allow(clippy::too_many_arguments)]
    fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: u32,
        height: u32,
        format: u32,
        type_: u32,
        pixels: &[u8],
    );
    fn delete_texture(&mut self, texture: &Self::Texture);

    // Fixed-function state
    fn enable(&mut self, cap: u32);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&mut self, mask: u32);

    // Drawing
    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32);
    fn draw_elements(&mut self, mode: u32, count: i32, index_type: IndexType, offset: i32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_mapping() {
        assert_eq!(ShaderKind::Vertex.to_gl(), constants::VERTEX_SHADER);
        assert_eq!(BufferTarget::ElementArray.to_gl(), constants::ELEMENT_ARRAY_BUFFER);
        assert_eq!(BufferUsage::default().to_gl(), constants::STATIC_DRAW);
        assert_eq!(IndexType::UnsignedShort.to_gl(), constants::UNSIGNED_SHORT);
        assert_eq!(IndexType::UnsignedByte.size_in_bytes(), 1);
        assert_eq!(IndexType::UnsignedShort.size_in_bytes(), 2);
    }
}
