//! In-memory [`RenderContext`] that records what a stage does.
//!
//! No pixels are produced. Objects, bindings, attribute state and uniform
//! values are tracked the way WebGL specifies them, and every clear and draw
//! is appended to a log together with a snapshot of the state it used.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};

use crate::constants;
use crate::context::{BufferTarget, BufferUsage, IndexType, RenderContext, ShaderKind};
use crate::glsl;

const MAX_VERTEX_ATTRIBS: usize = 16;
const MAX_TEXTURE_UNITS: usize = 16;
const MAX_VERTEX_ATTRIB_STRIDE: i32 = 255;

// ==================== Object IDs ====================

/// Handle for any object the recording context owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlObject(u32);

impl GlObject {
    fn new() -> Self {
        static COUNTER: AtomicU32 = AtomicU32::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

// ==================== Shader ====================

/// Shader data.
#[derive(Debug, Clone)]
pub struct ShaderData {
    pub kind: ShaderKind,
    pub source: String,
    pub compiled: bool,
    pub info_log: String,
    pub deleted: bool,
}

impl ShaderData {
    fn new(kind: ShaderKind) -> Self {
        Self {
            kind,
            source: String::new(),
            compiled: false,
            info_log: String::new(),
            deleted: false,
        }
    }
}

// ==================== Program ====================

/// Program data.
#[derive(Debug, Clone, Default)]
pub struct ProgramData {
    pub vertex_shader: Option<GlObject>,
    pub fragment_shader: Option<GlObject>,
    pub linked: bool,
    pub info_log: String,
    /// Active attributes after the last successful link.
    pub attributes: HashMap<String, AttributeInfo>,
    /// Active uniforms after the last successful link.
    pub uniforms: HashMap<String, UniformInfo>,
}

/// Attribute info.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: i32,
    pub glsl_type: String,
}

/// Uniform info.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub location: GlObject,
    pub glsl_type: String,
}

// ==================== Buffer ====================

/// Buffer data.
#[derive(Debug, Clone)]
pub struct BufferData {
    pub target: Option<BufferTarget>,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
    pub deleted: bool,
}

impl BufferData {
    fn new() -> Self {
        Self {
            target: None,
            usage: BufferUsage::Static,
            data: Vec::new(),
            deleted: false,
        }
    }
}

// ==================== Texture ====================

/// Texture data.
#[derive(Debug, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: u32,
    pub internal_format: u32,
    pub data: Vec<u8>,
    pub mag_filter: u32,
    pub min_filter: u32,
    pub wrap_s: u32,
    pub wrap_t: u32,
    pub deleted: bool,
}

impl TextureData {
    fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            format: constants::RGBA,
            internal_format: constants::RGBA,
            data: Vec::new(),
            mag_filter: constants::LINEAR,
            min_filter: constants::NEAREST_MIPMAP_LINEAR,
            wrap_s: constants::REPEAT,
            wrap_t: constants::REPEAT,
            deleted: false,
        }
    }
}

// ==================== Vertex Attribute ====================

/// Vertex attribute slot.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexAttribPointer {
    pub enabled: bool,
    pub size: i32,
    pub type_: u32,
    pub normalized: bool,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<GlObject>,
    /// Value read while the array is disabled.
    pub current_value: [f32; 4],
}

impl Default for VertexAttribPointer {
    fn default() -> Self {
        Self {
            enabled: false,
            size: 4,
            type_: constants::FLOAT,
            normalized: false,
            stride: 0,
            offset: 0,
            buffer: None,
            current_value: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

// ==================== Context State ====================

/// Context state.
#[derive(Debug, Clone)]
pub struct GlState {
    pub clear_color: [f32; 4],
    pub viewport: [i32; 4],
    pub blend_enabled: bool,
    pub cull_face_enabled: bool,
    pub depth_test_enabled: bool,
    pub scissor_test_enabled: bool,
    pub current_program: Option<GlObject>,
    pub current_array_buffer: Option<GlObject>,
    pub current_element_buffer: Option<GlObject>,
    pub active_texture: u32,
    pub texture_units: Vec<Option<GlObject>>,
    pub vertex_attribs: Vec<VertexAttribPointer>,
    /// Row alignment for `tex_image_2d` source data.
    pub unpack_alignment: u32,
}

impl Default for GlState {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 0.0],
            viewport: [0, 0, 0, 0],
            blend_enabled: false,
            cull_face_enabled: false,
            depth_test_enabled: false,
            scissor_test_enabled: false,
            current_program: None,
            current_array_buffer: None,
            current_element_buffer: None,
            active_texture: 0,
            texture_units: vec![None; MAX_TEXTURE_UNITS],
            vertex_attribs: vec![VertexAttribPointer::default(); MAX_VERTEX_ATTRIBS],
            unpack_alignment: 4,
        }
    }
}

/// Bytes `tex_image_2d` reads: every row but the last is padded to
/// `alignment`.
fn unpacked_len(width: u32, height: u32, channels: u32, alignment: u32) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let row = width as usize * channels as usize;
    let alignment = alignment.max(1) as usize;
    let pitch = row.div_ceil(alignment) * alignment;
    pitch * (height as usize - 1) + row
}

// ==================== Draw Call ====================

/// A recorded clear or draw.
#[derive(Debug, Clone)]
pub enum DrawCall {
    Clear {
        mask: u32,
        color: [f32; 4],
    },
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
        program: GlObject,
        state: Box<DrawState>,
    },
    DrawElements {
        mode: u32,
        count: i32,
        index_type: IndexType,
        offset: i32,
        program: GlObject,
        state: Box<DrawState>,
    },
}

impl DrawCall {
    /// Snapshot for draws, `None` for clears.
    pub fn state(&self) -> Option<&DrawState> {
        match self {
            DrawCall::Clear { .. } => None,
            DrawCall::DrawArrays { state, .. } | DrawCall::DrawElements { state, .. } => {
                Some(state)
            }
        }
    }
}

/// State captured for a draw call.
#[derive(Debug, Clone)]
pub struct DrawState {
    pub viewport: [i32; 4],
    pub depth_test_enabled: bool,
    pub cull_face_enabled: bool,
    pub vertex_attribs: Vec<VertexAttribPointer>,
    pub element_buffer: Option<GlObject>,
    pub uniforms: HashMap<GlObject, UniformValue>,
    pub texture_units: Vec<Option<GlObject>>,
}

/// Uniform value.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

// ==================== Recording Context ====================

/// The recording rendering context.
#[derive(Debug)]
pub struct RecordingContext {
    pub width: u32,
    pub height: u32,
    state: GlState,
    shaders: HashMap<GlObject, ShaderData>,
    programs: HashMap<GlObject, ProgramData>,
    buffers: HashMap<GlObject, BufferData>,
    textures: HashMap<GlObject, TextureData>,
    uniform_values: HashMap<GlObject, UniformValue>,
    draw_calls: Vec<DrawCall>,
    last_error: u32,
    lost: bool,
}

impl RecordingContext {
    /// Create a context for a canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        let state = GlState {
            viewport: [0, 0, width as i32, height as i32],
            ..GlState::default()
        };

        Self {
            width,
            height,
            state,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            uniform_values: HashMap::new(),
            draw_calls: Vec::new(),
            last_error: constants::NO_ERROR,
            lost: false,
        }
    }

    /// Simulate `WEBGL_lose_context.loseContext()`.
    pub fn lose_context(&mut self) {
        debug!("recording context lost");
        self.lost = true;
    }

    /// Get and clear the error.
    pub fn get_error(&mut self) -> u32 {
        let err = self.last_error;
        self.last_error = constants::NO_ERROR;
        err
    }

    fn set_error(&mut self, code: u32) {
        // GL keeps the first error until it is read
        if self.last_error == constants::NO_ERROR {
            self.last_error = code;
        }
    }

    /// Current state.
    pub fn state(&self) -> &GlState {
        &self.state
    }

    /// Attribute slot `index`.
    pub fn vertex_attrib(&self, index: u32) -> Option<&VertexAttribPointer> {
        self.state.vertex_attribs.get(index as usize)
    }

    /// Value last written to a uniform location.
    pub fn uniform_value(&self, location: &GlObject) -> Option<&UniformValue> {
        self.uniform_values.get(location)
    }

    /// Value last written to the named uniform of `program`.
    pub fn uniform_value_by_name(&self, program: &GlObject, name: &str) -> Option<&UniformValue> {
        let info = self.programs.get(program)?.uniforms.get(name)?;
        self.uniform_values.get(&info.location)
    }

    /// Recorded clears and draws, oldest first.
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    /// Get draw calls and clear them.
    pub fn take_draw_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.draw_calls)
    }

    /// Get buffer data.
    pub fn get_buffer_data(&self, buffer: &GlObject) -> Option<&BufferData> {
        self.buffers.get(buffer)
    }

    /// Number of buffers created and not deleted.
    pub fn live_buffer_count(&self) -> usize {
        self.buffers.values().filter(|b| !b.deleted).count()
    }

    /// Get texture data.
    pub fn get_texture_data(&self, texture: &GlObject) -> Option<&TextureData> {
        self.textures.get(texture)
    }

    /// Get shader data.
    pub fn get_shader_data(&self, shader: &GlObject) -> Option<&ShaderData> {
        self.shaders.get(shader)
    }

    /// Get program data.
    pub fn get_program_data(&self, program: &GlObject) -> Option<&ProgramData> {
        self.programs.get(program)
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<GlObject> {
        match target {
            BufferTarget::Array => self.state.current_array_buffer,
            BufferTarget::ElementArray => self.state.current_element_buffer,
        }
    }

    fn bound_texture(&self) -> Option<GlObject> {
        self.state
            .texture_units
            .get(self.state.active_texture as usize)
            .copied()
            .flatten()
    }

    fn snapshot(&self) -> DrawState {
        DrawState {
            viewport: self.state.viewport,
            depth_test_enabled: self.state.depth_test_enabled,
            cull_face_enabled: self.state.cull_face_enabled,
            vertex_attribs: self.state.vertex_attribs.clone(),
            element_buffer: self.state.current_element_buffer,
            uniforms: self.uniform_values.clone(),
            texture_units: self.state.texture_units.clone(),
        }
    }

    fn set_uniform(&mut self, location: Option<&GlObject>, value: UniformValue) {
        if self.lost {
            return;
        }
        if let Some(location) = location {
            trace!(location = location.id(), ?value, "uniform");
            self.uniform_values.insert(*location, value);
        }
    }
}

impl RenderContext for RecordingContext {
    type Shader = GlObject;
    type Program = GlObject;
    type Buffer = GlObject;
    type Texture = GlObject;
    type UniformLocation = GlObject;

    fn is_context_lost(&self) -> bool {
        self.lost
    }

    fn parameter_string(&self, pname: u32) -> Option<String> {
        match pname {
            constants::VERSION => Some("WebGL 2.0 (StageKit recording)".to_string()),
            constants::VENDOR => Some("StageKit".to_string()),
            constants::RENDERER => Some("StageKit recording context".to_string()),
            constants::SHADING_LANGUAGE_VERSION => Some("WebGL GLSL ES 3.00".to_string()),
            _ => None,
        }
    }

    // ==================== Shaders ====================

    fn create_shader(&mut self, kind: ShaderKind) -> Option<GlObject> {
        if self.lost {
            return None;
        }
        let shader = GlObject::new();
        self.shaders.insert(shader, ShaderData::new(kind));
        debug!(shader = shader.id(), ?kind, "created shader");
        Some(shader)
    }

    fn shader_source(&mut self, shader: &GlObject, source: &str) {
        match self.shaders.get_mut(shader) {
            Some(data) => data.source = source.to_string(),
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: &GlObject) {
        let Some(data) = self.shaders.get_mut(shader) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        match glsl::check_source(data.kind, &data.source) {
            Ok(()) => {
                data.compiled = true;
                data.info_log.clear();
            }
            Err(log) => {
                data.compiled = false;
                data.info_log = log;
            }
        }
    }

    fn shader_info_log(&self, shader: &GlObject) -> Option<String> {
        self.shaders.get(shader).map(|d| d.info_log.clone())
    }

    // ==================== Programs ====================

    fn create_program(&mut self) -> Option<GlObject> {
        if self.lost {
            return None;
        }
        let program = GlObject::new();
        self.programs.insert(program, ProgramData::default());
        debug!(program = program.id(), "created program");
        Some(program)
    }

    fn attach_shader(&mut self, program: &GlObject, shader: &GlObject) {
        let Some(kind) = self.shaders.get(shader).map(|s| s.kind) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        let Some(program_data) = self.programs.get_mut(program) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        let slot = match kind {
            ShaderKind::Vertex => &mut program_data.vertex_shader,
            ShaderKind::Fragment => &mut program_data.fragment_shader,
        };
        if slot.is_some() {
            // one shader per stage
            self.set_error(constants::INVALID_OPERATION);
        } else {
            *slot = Some(*shader);
        }
    }

    fn link_program(&mut self, program: &GlObject) {
        let Some(data) = self.programs.get(program) else {
            self.set_error(constants::INVALID_VALUE);
            return;
        };
        let vertex = data.vertex_shader.and_then(|s| self.shaders.get(&s));
        let fragment = data.fragment_shader.and_then(|s| self.shaders.get(&s));

        let outcome = match (vertex, fragment) {
            (Some(vs), Some(fs)) if vs.compiled && fs.compiled => {
                let vertex_interface = glsl::scan_interface(ShaderKind::Vertex, &vs.source);
                let fragment_interface = glsl::scan_interface(ShaderKind::Fragment, &fs.source);
                Ok((vertex_interface, fragment_interface))
            }
            (Some(_), Some(_)) => Err("Failed to link: one or more attached shaders did not compile"),
            _ => Err("Failed to link: missing vertex or fragment shader"),
        };

        let Some(data) = self.programs.get_mut(program) else {
            return;
        };
        data.attributes.clear();
        data.uniforms.clear();

        match outcome {
            Ok((vertex_interface, fragment_interface)) => {
                for (index, decl) in vertex_interface.attributes.into_iter().enumerate() {
                    data.attributes.insert(
                        decl.name.clone(),
                        AttributeInfo {
                            name: decl.name,
                            location: index as i32,
                            glsl_type: decl.glsl_type,
                        },
                    );
                }
                for decl in vertex_interface
                    .uniforms
                    .into_iter()
                    .chain(fragment_interface.uniforms)
                {
                    data.uniforms.entry(decl.name.clone()).or_insert_with(|| UniformInfo {
                        name: decl.name,
                        location: GlObject::new(),
                        glsl_type: decl.glsl_type,
                    });
                }
                data.linked = true;
                data.info_log.clear();
                debug!(
                    program = program.id(),
                    attributes = data.attributes.len(),
                    uniforms = data.uniforms.len(),
                    "linked program"
                );
            }
            Err(message) => {
                data.linked = false;
                data.info_log = message.to_string();
            }
        }
    }

    fn program_info_log(&self, program: &GlObject) -> Option<String> {
        self.programs.get(program).map(|d| d.info_log.clone())
    }

    fn use_program(&mut self, program: Option<&GlObject>) {
        if let Some(p) = program {
            if !self.programs.get(p).is_some_and(|d| d.linked) {
                self.set_error(constants::INVALID_OPERATION);
                return;
            }
        }
        self.state.current_program = program.copied();
    }

    fn attrib_location(&self, program: &GlObject, name: &str) -> i32 {
        self.programs
            .get(program)
            .and_then(|d| d.attributes.get(name))
            .map(|info| info.location)
            .unwrap_or(-1)
    }

    fn uniform_location(&self, program: &GlObject, name: &str) -> Option<GlObject> {
        self.programs
            .get(program)?
            .uniforms
            .get(name)
            .map(|info| info.location)
    }

    // ==================== Buffers ====================

    fn create_buffer(&mut self) -> Option<GlObject> {
        if self.lost {
            return None;
        }
        let buffer = GlObject::new();
        self.buffers.insert(buffer, BufferData::new());
        debug!(buffer = buffer.id(), "created buffer");
        Some(buffer)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<&GlObject>) {
        if let Some(b) = buffer {
            if !self.buffers.get(b).is_some_and(|d| !d.deleted) {
                self.set_error(constants::INVALID_OPERATION);
                return;
            }
        }
        match target {
            BufferTarget::Array => self.state.current_array_buffer = buffer.copied(),
            BufferTarget::ElementArray => self.state.current_element_buffer = buffer.copied(),
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        let Some(buffer) = self.bound_buffer(target) else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(buf_data) = self.buffers.get_mut(&buffer) {
            buf_data.target = Some(target);
            buf_data.usage = usage;
            buf_data.data = data.to_vec();
        }
    }

    fn delete_buffer(&mut self, buffer: &GlObject) {
        if let Some(data) = self.buffers.get_mut(buffer) {
            data.deleted = true;
            data.data.clear();
        }
        if self.state.current_array_buffer == Some(*buffer) {
            self.state.current_array_buffer = None;
        }
        if self.state.current_element_buffer == Some(*buffer) {
            self.state.current_element_buffer = None;
        }
    }

    // ==================== Vertex Attributes ====================

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        type_: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        if index as usize >= self.state.vertex_attribs.len()
            || !(1..=4).contains(&size)
            || !(0..=MAX_VERTEX_ATTRIB_STRIDE).contains(&stride)
            || offset < 0
        {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(buffer) = self.state.current_array_buffer else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        let slot = &mut self.state.vertex_attribs[index as usize];
        slot.size = size;
        slot.type_ = type_;
        slot.normalized = normalized;
        slot.stride = stride;
        slot.offset = offset;
        slot.buffer = Some(buffer);
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        match self.state.vertex_attribs.get_mut(index as usize) {
            Some(slot) => slot.enabled = true,
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    fn vertex_attrib4f(&mut self, index: u32, x: f32, y: f32, z: f32, w: f32) {
        match self.state.vertex_attribs.get_mut(index as usize) {
            Some(slot) => slot.current_value = [x, y, z, w],
            None => self.set_error(constants::INVALID_VALUE),
        }
    }

    // ==================== Uniforms ====================

    fn uniform1i(&mut self, location: Option<&GlObject>, x: i32) {
        self.set_uniform(location, UniformValue::Int(x));
    }

    fn uniform3f(&mut self, location: Option<&GlObject>, x: f32, y: f32, z: f32) {
        self.set_uniform(location, UniformValue::Vec3([x, y, z]));
    }

    fn uniform4f(&mut self, location: Option<&GlObject>, x: f32, y: f32, z: f32, w: f32) {
        self.set_uniform(location, UniformValue::Vec4([x, y, z, w]));
    }

    fn uniform_matrix4fv(&mut self, location: Option<&GlObject>, value: &[f32; 16]) {
        self.set_uniform(location, UniformValue::Mat4(*value));
    }

    // ==================== Textures ====================

    fn create_texture(&mut self) -> Option<GlObject> {
        if self.lost {
            return None;
        }
        let texture = GlObject::new();
        self.textures.insert(texture, TextureData::new());
        debug!(texture = texture.id(), "created texture");
        Some(texture)
    }

    fn active_texture(&mut self, unit: u32) {
        match unit.checked_sub(constants::TEXTURE0) {
            Some(index) if (index as usize) < MAX_TEXTURE_UNITS => {
                self.state.active_texture = index
            }
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn bind_texture(&mut self, target: u32, texture: Option<&GlObject>) {
        if target != constants::TEXTURE_2D {
            self.set_error(constants::INVALID_ENUM);
            return;
        }
        let unit = self.state.active_texture as usize;
        if let Some(slot) = self.state.texture_units.get_mut(unit) {
            *slot = texture.copied();
        }
    }

    fn tex_parameteri(&mut self, target: u32, pname: u32, param: i32) {
        if target != constants::TEXTURE_2D {
            self.set_error(constants::INVALID_ENUM);
            return;
        }
        let Some(tex) = self.bound_texture() else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(tex_data) = self.textures.get_mut(&tex) {
            match pname {
                constants::TEXTURE_MAG_FILTER => tex_data.mag_filter = param as u32,
                constants::TEXTURE_MIN_FILTER => tex_data.min_filter = param as u32,
                constants::TEXTURE_WRAP_S => tex_data.wrap_s = param as u32,
                constants::TEXTURE_WRAP_T => tex_data.wrap_t = param as u32,
                _ => self.last_error = constants::INVALID_ENUM,
            }
        }
    }

    fn pixel_storei(&mut self, pname: u32, param: i32) {
        match pname {
            constants::UNPACK_ALIGNMENT => match param {
                1 | 2 | 4 | 8 => self.state.unpack_alignment = param as u32,
                _ => self.set_error(constants::INVALID_VALUE),
            },
            constants::UNPACK_FLIP_Y_WEBGL => {}
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn tex_image_2d(
        &mut self,
        target: u32,
        _level: i32,
        internal_format: u32,
        width: u32,
        height: u32,
        format: u32,
        _type_: u32,
        pixels: &[u8],
    ) {
        if target != constants::TEXTURE_2D {
            self.set_error(constants::INVALID_ENUM);
            return;
        }
        let channels = if format == constants::RGB { 3 } else { 4 };
        if pixels.len() < unpacked_len(width, height, channels, self.state.unpack_alignment) {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        let Some(tex) = self.bound_texture() else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        if let Some(tex_data) = self.textures.get_mut(&tex) {
            tex_data.width = width;
            tex_data.height = height;
            tex_data.internal_format = internal_format;
            tex_data.format = format;
            tex_data.data = pixels.to_vec();
        }
    }

    fn delete_texture(&mut self, texture: &GlObject) {
        if let Some(data) = self.textures.get_mut(texture) {
            data.deleted = true;
            data.data.clear();
        }
        for slot in &mut self.state.texture_units {
            if *slot == Some(*texture) {
                *slot = None;
            }
        }
    }

    // ==================== State ====================

    fn enable(&mut self, cap: u32) {
        match cap {
            constants::BLEND => self.state.blend_enabled = true,
            constants::CULL_FACE => self.state.cull_face_enabled = true,
            constants::DEPTH_TEST => self.state.depth_test_enabled = true,
            constants::SCISSOR_TEST => self.state.scissor_test_enabled = true,
            _ => self.set_error(constants::INVALID_ENUM),
        }
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.state.clear_color = [r, g, b, a];
    }

    fn clear(&mut self, mask: u32) {
        if self.lost {
            return;
        }
        let known = constants::COLOR_BUFFER_BIT
            | constants::DEPTH_BUFFER_BIT
            | constants::STENCIL_BUFFER_BIT;
        if mask & !known != 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        self.draw_calls.push(DrawCall::Clear {
            mask,
            color: self.state.clear_color,
        });
    }

    // ==================== Drawing ====================

    fn draw_arrays(&mut self, mode: u32, first: i32, count: i32) {
        if self.lost {
            return;
        }
        if first < 0 || count < 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(program) = self.state.current_program else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        let state = self.snapshot();
        self.draw_calls.push(DrawCall::DrawArrays {
            mode,
            first,
            count,
            program,
            state: Box::new(state),
        });
    }

    fn draw_elements(&mut self, mode: u32, count: i32, index_type: IndexType, offset: i32) {
        if self.lost {
            return;
        }
        if count < 0 || offset < 0 {
            self.set_error(constants::INVALID_VALUE);
            return;
        }
        let Some(program) = self.state.current_program else {
            self.set_error(constants::INVALID_OPERATION);
            return;
        };
        // indices must lie inside the bound element buffer
        let available = self
            .state
            .current_element_buffer
            .and_then(|b| self.buffers.get(&b))
            .map(|b| b.data.len());
        let needed = count as usize * index_type.size_in_bytes() + offset as usize;
        if available.map_or(true, |len| len < needed) {
            self.set_error(constants::INVALID_OPERATION);
            return;
        }
        let state = self.snapshot();
        self.draw_calls.push(DrawCall::DrawElements {
            mode,
            count,
            index_type,
            offset,
            program,
            state: Box::new(state),
        });
    }
}
