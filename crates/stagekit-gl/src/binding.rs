//! Program and buffer setup shared by every stage.

use tracing::{debug, error, info, warn};

use crate::constants;
use crate::context::{BufferTarget, BufferUsage, IndexType, RenderContext, ShaderKind};
use crate::{GlError, GlResult};

/// Size of one `f32` component in bytes.
pub const FLOAT_BYTES: u32 = 4;

/// Largest stride `vertexAttribPointer` accepts, in bytes.
pub const MAX_STRIDE_BYTES: u32 = 255;

/// Where a named float attribute sits inside an interleaved vertex buffer.
///
/// `size`, `stride` and `offset` count `f32` components, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexAttrib {
    pub name: String,
    pub size: u32,
    pub stride: u32,
    pub offset: u32,
}

impl VertexAttrib {
    /// Describe an attribute, rejecting layouts that read past their stride
    /// or whose stride exceeds [`MAX_STRIDE_BYTES`].
    pub fn new(name: impl Into<String>, size: u32, stride: u32, offset: u32) -> GlResult<Self> {
        let name = name.into();
        let past_stride = offset.checked_add(size).map_or(true, |end| end > stride);
        let stride_too_wide = stride
            .checked_mul(FLOAT_BYTES)
            .map_or(true, |bytes| bytes > MAX_STRIDE_BYTES);
        if !(1..=4).contains(&size) || past_stride || stride_too_wide {
            return Err(GlError::InvalidAttributeLayout {
                name,
                size,
                stride,
                offset,
            });
        }
        Ok(Self {
            name,
            size,
            stride,
            offset,
        })
    }

    /// Attribute that is the only thing in its buffer.
    pub fn packed(name: impl Into<String>, size: u32) -> GlResult<Self> {
        Self::new(name, size, size, 0)
    }

    pub fn byte_stride(&self) -> u32 {
        self.stride * FLOAT_BYTES
    }

    pub fn byte_offset(&self) -> u32 {
        self.offset * FLOAT_BYTES
    }
}

/// Info logs gathered while building a program. Empty logs read `"OK"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub vertex: String,
    pub fragment: String,
    pub link: String,
}

impl CompileReport {
    const OK: &'static str = "OK";

    /// True when neither stage nor the linker had anything to say.
    pub fn is_clean(&self) -> bool {
        self.vertex == Self::OK && self.fragment == Self::OK && self.link == Self::OK
    }
}

/// A program handle together with how it got built.
#[derive(Debug, Clone)]
pub struct LinkedProgram<P> {
    pub program: P,
    pub report: CompileReport,
}

fn log_or_ok(log: Option<String>) -> String {
    match log {
        Some(log) if !log.trim().is_empty() => log,
        _ => CompileReport::OK.to_string(),
    }
}

fn compile_stage<C: RenderContext>(
    ctx: &mut C,
    kind: ShaderKind,
    source: &str,
) -> GlResult<(C::Shader, String)> {
    let missing = match kind {
        ShaderKind::Vertex => ("vertex shader source", "vertex shader object"),
        ShaderKind::Fragment => ("fragment shader source", "fragment shader object"),
    };
    if source.trim().is_empty() {
        error!("{} source is missing", kind.label());
        return Err(GlError::MissingDependency(missing.0));
    }

    let Some(shader) = ctx.create_shader(kind) else {
        error!("Failed to create {}", kind.label().to_lowercase());
        return Err(GlError::MissingDependency(missing.1));
    };
    ctx.shader_source(&shader, source);
    ctx.compile_shader(&shader);

    let log = log_or_ok(ctx.shader_info_log(&shader));
    if log == CompileReport::OK {
        info!("{}: {}", kind.label(), log);
    } else {
        warn!("{}: {}", kind.label(), log.trim_end());
    }
    Ok((shader, log))
}

/// Compile both stages, link them and make the program current.
///
/// Compile and link problems are logged and kept in the returned
/// [`CompileReport`]; the program is returned regardless. Only a lost
/// context, an empty source or a failed object creation is an error.
pub fn compile_program<C: RenderContext>(
    ctx: &mut C,
    vertex_source: &str,
    fragment_source: &str,
) -> GlResult<LinkedProgram<C::Program>> {
    if ctx.is_context_lost() {
        error!("Cannot compile program: rendering context is lost");
        return Err(GlError::ContextLost);
    }

    let (vertex_shader, vertex_log) = compile_stage(ctx, ShaderKind::Vertex, vertex_source)?;
    let (fragment_shader, fragment_log) =
        compile_stage(ctx, ShaderKind::Fragment, fragment_source)?;

    let Some(program) = ctx.create_program() else {
        error!("Failed to create program");
        return Err(GlError::MissingDependency("program object"));
    };
    ctx.attach_shader(&program, &vertex_shader);
    ctx.attach_shader(&program, &fragment_shader);
    ctx.link_program(&program);

    let link_log = log_or_ok(ctx.program_info_log(&program));
    if link_log == CompileReport::OK {
        debug!("Program linked");
    } else {
        warn!("Program link: {}", link_log.trim_end());
    }
    ctx.use_program(Some(&program));

    Ok(LinkedProgram {
        program,
        report: CompileReport {
            vertex: vertex_log,
            fragment: fragment_log,
            link: link_log,
        },
    })
}

/// Upload interleaved float vertex data and point each named attribute at it.
///
/// One buffer is created per call, even when `attributes` is empty.
/// Locations are looked up now; call again after relinking. Attributes the
/// program does not expose are skipped with a warning.
pub fn upload_vertex_buffer<C: RenderContext>(
    ctx: &mut C,
    program: &C::Program,
    data: &[f32],
    attributes: &[VertexAttrib],
) -> GlResult<C::Buffer> {
    if ctx.is_context_lost() {
        error!("Cannot upload vertex buffer: rendering context is lost");
        return Err(GlError::ContextLost);
    }
    let Some(buffer) = ctx.create_buffer() else {
        error!("Failed to create vertex buffer");
        return Err(GlError::MissingDependency("vertex buffer object"));
    };

    let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_ne_bytes()).collect();
    ctx.bind_buffer(BufferTarget::Array, Some(&buffer));
    ctx.buffer_data(BufferTarget::Array, &bytes, BufferUsage::Static);

    for attrib in attributes {
        let location = ctx.attrib_location(program, &attrib.name);
        if location < 0 {
            warn!(attribute = %attrib.name, "Attribute not found in program, skipping");
            continue;
        }
        ctx.vertex_attrib_pointer(
            location as u32,
            attrib.size as i32,
            constants::FLOAT,
            false,
            attrib.byte_stride() as i32,
            attrib.byte_offset() as i32,
        );
        ctx.enable_vertex_attrib_array(location as u32);
        debug!(
            attribute = %attrib.name,
            location,
            stride = attrib.byte_stride(),
            offset = attrib.byte_offset(),
            "Bound attribute"
        );
    }

    Ok(buffer)
}

/// Index data for `draw_elements`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl IndexData {
    pub fn index_type(&self) -> IndexType {
        match self {
            IndexData::U8(_) => IndexType::UnsignedByte,
            IndexData::U16(_) => IndexType::UnsignedShort,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            IndexData::U8(v) => v.len(),
            IndexData::U16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            IndexData::U8(v) => v.clone(),
            IndexData::U16(v) => v.iter().flat_map(|i| i.to_ne_bytes()).collect(),
        }
    }
}

/// Upload indices into a fresh element buffer and leave it bound.
pub fn upload_index_buffer<C: RenderContext>(
    ctx: &mut C,
    indices: &IndexData,
) -> GlResult<C::Buffer> {
    if ctx.is_context_lost() {
        error!("Cannot upload index buffer: rendering context is lost");
        return Err(GlError::ContextLost);
    }
    let Some(buffer) = ctx.create_buffer() else {
        error!("Failed to create index buffer");
        return Err(GlError::MissingDependency("index buffer object"));
    };

    ctx.bind_buffer(BufferTarget::ElementArray, Some(&buffer));
    ctx.buffer_data(
        BufferTarget::ElementArray,
        &indices.to_bytes(),
        BufferUsage::Static,
    );
    debug!(count = indices.len(), index_type = ?indices.index_type(), "Uploaded indices");

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingContext;

    const VS: &str = "attribute vec3 position;\nattribute vec3 color;\nvoid main() { gl_Position = vec4(position, 1.0); }";
    const FS: &str = "precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0); }";

    #[test]
    fn test_vertex_attrib_layout_validation() {
        let attrib = VertexAttrib::new("color", 3, 6, 3).unwrap();
        assert_eq!(attrib.byte_stride(), 24);
        assert_eq!(attrib.byte_offset(), 12);

        assert!(matches!(
            VertexAttrib::new("color", 3, 6, 4),
            Err(GlError::InvalidAttributeLayout { offset: 4, .. })
        ));
        assert!(VertexAttrib::new("position", 0, 3, 0).is_err());
        assert!(VertexAttrib::new("position", 5, 8, 0).is_err());
    }

    #[test]
    fn test_vertex_attrib_rejects_huge_layouts() {
        assert!(matches!(
            VertexAttrib::new("a", 1, 4, u32::MAX),
            Err(GlError::InvalidAttributeLayout { offset: u32::MAX, .. })
        ));
        assert!(VertexAttrib::new("a", 4, u32::MAX, 0).is_err());
        // 64 floats is 256 bytes, one past the limit
        assert!(VertexAttrib::new("a", 4, 64, 0).is_err());
        assert_eq!(VertexAttrib::new("a", 4, 63, 59).unwrap().byte_stride(), 252);
    }

    #[test]
    fn test_packed_attrib() {
        let attrib = VertexAttrib::packed("position", 3).unwrap();
        assert_eq!((attrib.stride, attrib.offset), (3, 0));
        assert_eq!(attrib.byte_stride(), 12);
    }

    #[test]
    fn test_compile_program_clean_report() {
        let mut ctx = RecordingContext::new(4, 4);
        let linked = compile_program(&mut ctx, VS, FS).unwrap();
        assert!(linked.report.is_clean());
        assert_eq!(ctx.state().current_program, Some(linked.program));
    }

    #[test]
    fn test_compile_program_rejects_empty_source() {
        let mut ctx = RecordingContext::new(4, 4);
        assert_eq!(
            compile_program(&mut ctx, "", FS).unwrap_err(),
            GlError::MissingDependency("vertex shader source")
        );
        assert_eq!(
            compile_program(&mut ctx, VS, "  ").unwrap_err(),
            GlError::MissingDependency("fragment shader source")
        );
    }

    #[test]
    fn test_index_data() {
        let bytes = IndexData::U8(vec![0, 1, 2]);
        assert_eq!(bytes.index_type(), IndexType::UnsignedByte);
        assert_eq!(bytes.to_bytes(), vec![0, 1, 2]);

        let shorts = IndexData::U16(vec![1, 256]);
        assert_eq!(shorts.index_type(), IndexType::UnsignedShort);
        assert_eq!(shorts.len(), 2);
        assert_eq!(shorts.to_bytes().len(), 4);
        assert!(IndexData::U16(Vec::new()).is_empty());
    }

    #[test]
    fn test_upload_index_buffer_binds_element_array() {
        let mut ctx = RecordingContext::new(4, 4);
        let buffer = upload_index_buffer(&mut ctx, &IndexData::U16(vec![0, 1, 2])).unwrap();
        assert_eq!(ctx.state().current_element_buffer, Some(buffer));
        assert_eq!(ctx.get_buffer_data(&buffer).unwrap().data.len(), 6);
    }
}
